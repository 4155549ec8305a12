//! Macros for conveyor error handling.
//!
//! Provides convenience macros for creating and returning
//! [`crate::error::ConveyorError`] instances with reduced boilerplate.

/// Creates a [`crate::error::ConveyorError`] from an error kind and description.
///
/// An optional third argument adds dynamic detail, and `source:` attaches an
/// originating error.
#[macro_export]
macro_rules! conveyor_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::ConveyorError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::ConveyorError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::ConveyorError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::ConveyorError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates and returns a [`crate::error::ConveyorError`] from the current function.
///
/// Combines error creation with an early return. Supports the same optional
/// detail and source arguments as [`conveyor_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::conveyor_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::conveyor_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::conveyor_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::conveyor_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
