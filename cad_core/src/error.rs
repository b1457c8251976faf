//! Error types for cad_core operations.
//!
//! A small dependency-free enum so the crate stays usable without std.

use core::fmt;

/// Errors that can occur during cad_core operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CadCoreError {
    /// An operation that needs at least one point received none.
    EmptyInput,
    /// More samples were requested than points are available.
    SampleCountExceeded {
        /// Number of samples requested.
        requested: usize,
        /// Number of points available.
        available: usize,
    },
    /// A point index referenced a position past the end of the input.
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Length of the indexed slice.
        len: usize,
    },
}

impl fmt::Display for CadCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CadCoreError::EmptyInput => write!(f, "input point set is empty"),
            CadCoreError::SampleCountExceeded {
                requested,
                available,
            } => {
                write!(
                    f,
                    "requested {} samples but only {} points are available",
                    requested, available
                )
            }
            CadCoreError::IndexOutOfBounds { index, len } => {
                write!(f, "point index {} out of bounds for length {}", index, len)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CadCoreError {}

/// Result type alias for cad_core operations.
pub type Result<T> = core::result::Result<T, CadCoreError>;
