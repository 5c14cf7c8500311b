pub mod utils;
pub use chm_coreg::{Error, Result};

pub mod proc;
pub use proc::*;

pub mod cli;
