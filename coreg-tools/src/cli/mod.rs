pub mod args;
pub mod progress;
pub use progress::Progress;
pub mod counters;
pub use counters::{Counter, DetailCounter};

use std::fmt::Display;

/// Single line reported for a fatal error, with its context
/// chain.
pub fn error_message<E: Display>(e: &E) -> String {
    format!("Error: {:#}", e)
}

#[inline]
pub fn unwrap_or_exit<T, E: Display>(res: Result<T, E>) -> T {
    match res {
        Err(e) => {
            eprintln!("{}", error_message(&e));
            std::process::exit(1)
        }
        Ok(t) => t,
    }
}

/// Log to stderr at the level given by `RUST_LOG`, or
/// `info` if unset.
pub fn init_logging() -> crate::Result<flexi_logger::LoggerHandle> {
    Ok(flexi_logger::Logger::try_with_env_or_str("info")?
        .log_to_stderr()
        .start()?)
}

#[macro_export]
macro_rules! sync_main {
    ($name:expr) => {
        fn main() {
            let _logger = $crate::cli::unwrap_or_exit($crate::cli::init_logging());
            $crate::cli::unwrap_or_exit({ $name });
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{format_err, Context};

    #[test]
    fn error_is_reported_once_with_context() {
        let res: crate::Result<()> = Err(format_err!("no overlap")).context("reading inputs");
        let msg = error_message(&res.unwrap_err());
        assert_eq!(msg, "Error: reading inputs: no overlap");
        assert_eq!(msg.matches("no overlap").count(), 1);
    }
}
