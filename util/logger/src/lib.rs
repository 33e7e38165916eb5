//! Quarry logging facade.
//!
//! This crate is a wrapper of the crate [`log`].
//!
//! [`log`]: https://docs.rs/log/*/log/index.html
//!
//! Components log through these macros so the logging backend can be swapped
//! in one place; the macros forward to the `log` macros of the same name.

pub use log::{self as internal, Level, SetLoggerError};

/// Logs a message at the trace level using the default target.
///
/// # Examples
///
/// ```
/// use quarry_logger::trace;
///
/// # let tip = 42;
/// trace!("current tip: {}", tip);
/// ```
#[macro_export(local_inner_macros)]
macro_rules! trace {
    ($( $args:tt )*) => {
        $crate::internal::trace!($( $args )*);
    }
}

/// Logs a message at the debug level using the default target.
///
/// # Examples
///
/// ```
/// use quarry_logger::debug;
///
/// # let tip = 42;
/// debug!("current tip: {}", tip);
/// ```
#[macro_export(local_inner_macros)]
macro_rules! debug {
    ($( $args:tt )*) => {
        $crate::internal::debug!($( $args )*);
    }
}

/// Logs a message at the info level using the default target.
///
/// # Examples
///
/// ```
/// use quarry_logger::info;
///
/// # let tip = 42;
/// info!("current tip: {}", tip);
/// ```
#[macro_export(local_inner_macros)]
macro_rules! info {
    ($( $args:tt )*) => {
        $crate::internal::info!($( $args )*);
    }
}

/// Logs a message at the warn level using the default target.
///
/// # Examples
///
/// ```
/// use quarry_logger::warn;
///
/// let warn_description = "Invalid Input";
///
/// warn!("Warning! {}!", warn_description);
/// ```
#[macro_export(local_inner_macros)]
macro_rules! warn {
    ($( $args:tt )*) => {
        $crate::internal::warn!($( $args )*);
    }
}

/// Logs a message at the error level using the default target.
///
/// # Examples
///
/// ```
/// use quarry_logger::error;
///
/// # let err = "oh no";
/// error!("Error: {}", err);
/// ```
#[macro_export(local_inner_macros)]
macro_rules! error {
    ($( $args:tt )*) => {
        $crate::internal::error!($( $args )*);
    }
}
