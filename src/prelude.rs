pub use crate::{Error, Result};

pub use crate::config::*;
pub use crate::error::*;
pub use crate::geometry::*;
pub use crate::raster::*;
#[cfg(feature = "gdal")]
pub use crate::reader::*;

pub use crate::histogram::*;
pub use crate::stats::*;

pub use crate::apply::*;
pub use crate::horizontal::*;
pub use crate::mi::*;
pub use crate::overlap::*;
pub use crate::vertical::*;
