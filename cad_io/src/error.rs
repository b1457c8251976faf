//! Error types for cad_io operations.
//!
//! Provides specific error variants for mesh parsing, writing and sampling failures.

use core::fmt;

use cad_core::CadCoreError;

/// Errors that can occur during cad_io operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CadIoError {
    /// I/O error while reading or writing a file.
    Io(String),

    /// STL content rejected by the reader (truncated binary, broken ASCII facet).
    MalformedStl(String),

    /// Malformed text input (OBJ, XYZ point files).
    Parse {
        /// 1-based line number where parsing failed.
        line: usize,
        /// Description of the problem.
        message: &'static str,
    },

    /// The mesh has no triangles.
    EmptyMesh,

    /// The mesh has zero extent or zero area where a positive value is required.
    DegenerateMesh {
        /// Description of the degeneracy.
        message: &'static str,
    },

    /// Error raised by the core geometry routines.
    Core(CadCoreError),
}

impl fmt::Display for CadIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CadIoError::Io(msg) => write!(f, "I/O error: {}", msg),
            CadIoError::MalformedStl(msg) => write!(f, "malformed STL: {}", msg),
            CadIoError::Parse { line, message } => {
                write!(f, "parse error on line {}: {}", line, message)
            }
            CadIoError::EmptyMesh => write!(f, "mesh has no triangles"),
            CadIoError::DegenerateMesh { message } => write!(f, "degenerate mesh: {}", message),
            CadIoError::Core(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CadIoError {}

impl From<std::io::Error> for CadIoError {
    fn from(err: std::io::Error) -> Self {
        CadIoError::Io(err.to_string())
    }
}

impl From<CadCoreError> for CadIoError {
    fn from(err: CadCoreError) -> Self {
        CadIoError::Core(err)
    }
}

/// Result type alias for cad_io operations.
pub type Result<T> = core::result::Result<T, CadIoError>;
