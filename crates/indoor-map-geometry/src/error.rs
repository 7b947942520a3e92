#![warn(missing_docs)]

//! Error types for the geometry library.
//!
//! This module defines the errors returned when a view transform is
//! configured with parameters that cannot produce an invertible mapping.

use core::fmt;

/// Errors that can occur when constructing a view transform.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Error for an invalid scale factor.
    /// This variant is returned when the pixels-per-meter scale is zero or not finite.
    InvalidScale(&'static str),
    /// Error for an invalid pixel offset.
    /// This variant is returned when an offset is NaN or infinite.
    InvalidOffset(&'static str),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::InvalidScale(msg) => write!(f, "Invalid view scale: {}", msg),
            TransformError::InvalidOffset(msg) => write!(f, "Invalid view offset: {}", msg),
        }
    }
}

impl core::error::Error for TransformError {}
