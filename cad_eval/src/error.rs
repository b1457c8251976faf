//! Error types for metric evaluation.

use core::fmt;

use cad_io::CadIoError;

/// Errors that can occur while computing metrics.
#[derive(Debug, Clone, PartialEq)]
pub enum CadEvalError {
    /// One of the compared point sets is empty.
    EmptyPointSet,

    /// A point has a NaN or infinite coordinate, so it has no nearest neighbour.
    NonFinitePoint,

    /// The IoU lattice resolution must be at least 1.
    ZeroResolution,

    /// Both solids have zero volume, so IoU is undefined.
    DegenerateUnion {
        /// Volume of the reference mesh.
        gt_volume: f32,
        /// Volume of the reconstructed mesh.
        pred_volume: f32,
    },

    /// Loading, sampling or normalizing a mesh failed.
    Mesh(CadIoError),
}

impl fmt::Display for CadEvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CadEvalError::EmptyPointSet => write!(f, "cannot compare an empty point set"),
            CadEvalError::NonFinitePoint => {
                write!(f, "point set contains a non-finite coordinate")
            }
            CadEvalError::ZeroResolution => write!(f, "IoU resolution must be positive"),
            CadEvalError::DegenerateUnion {
                gt_volume,
                pred_volume,
            } => write!(
                f,
                "union volume is not positive (reference {}, reconstruction {})",
                gt_volume, pred_volume
            ),
            CadEvalError::Mesh(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CadEvalError {}

impl From<CadIoError> for CadEvalError {
    fn from(err: CadIoError) -> Self {
        CadEvalError::Mesh(err)
    }
}

/// Result type alias for metric evaluation.
pub type Result<T> = core::result::Result<T, CadEvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CadEvalError::DegenerateUnion {
            gt_volume: 0.0,
            pred_volume: 0.0,
        };
        assert!(format!("{}", err).starts_with("union volume is not positive"));
        assert_eq!(
            format!("{}", CadEvalError::from(CadIoError::EmptyMesh)),
            "mesh has no triangles"
        );
    }
}
