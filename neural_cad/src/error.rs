//! Error types for neural_cad.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, running or executing the model.
#[derive(Error, Debug)]
pub enum NeuralCadError {
    /// Filesystem or process I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A safetensors file could not be parsed.
    #[error("safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    /// Mesh loading or sampling failed.
    #[error("mesh error: {0}")]
    Mesh(#[from] cad_io::CadIoError),

    /// Checkpoint directory does not exist.
    #[error("checkpoint directory not found: {0}")]
    CheckpointNotFound(PathBuf),

    /// A required tensor is absent from every checkpoint file.
    #[error("tensor `{0}` not found in checkpoint")]
    MissingTensor(String),

    /// Stored tensor has an unexpected shape.
    #[error("tensor `{name}` has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Tensor name.
        name: String,
        /// Expected shape.
        expected: Vec<usize>,
        /// Shape found in the file.
        got: Vec<usize>,
    },

    /// Stored tensor uses a dtype the loader does not convert.
    #[error("tensor `{name}` has unsupported dtype {dtype}")]
    UnsupportedDtype {
        /// Tensor name.
        name: String,
        /// Dtype as reported by the file.
        dtype: String,
    },

    /// Tokenizer file failed to load or decode.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// A marker token is missing from the vocabulary.
    #[error("token `{0}` is not in the vocabulary")]
    UnknownToken(String),

    /// Generated text lacks the begin or end marker.
    #[error("generated text has no `{marker}` marker")]
    MissingMarker {
        /// The marker that was not found.
        marker: String,
    },

    /// Point mask sentinels do not form the expected prefix.
    #[error("invalid point mask: {message}")]
    InvalidPointMask {
        /// Description of the violation.
        message: String,
    },

    /// Point cloud size differs from the configured count.
    #[error("expected {expected} points, got {got}")]
    PointCountMismatch {
        /// Configured number of points.
        expected: usize,
        /// Number of points supplied.
        got: usize,
    },

    /// Embedding widths of the collaborating modules disagree.
    #[error("hidden size mismatch: token embeddings {embedding}, encoder or decoder {encoder}")]
    HiddenSizeMismatch {
        /// Width of the token embedding table.
        embedding: usize,
        /// Width of the point encoder output or decoder input.
        encoder: usize,
    },

    /// The decoder reported a failure.
    #[error("decoder error: {0}")]
    Decoder(String),

    /// The program did not finish within the time limit.
    #[error("program execution timed out after {seconds} s")]
    ExecutionTimeout {
        /// Configured limit.
        seconds: u64,
    },

    /// The interpreter exited unsuccessfully.
    #[error("program execution failed (exit code {code:?}): {stderr}")]
    ExecutionFailed {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The program does not parse.
    #[error("syntax error in generated program: {0}")]
    SyntaxError(String),

    /// The interpreter succeeded but an expected output file is missing.
    #[error("execution produced no artifact at {0}")]
    MissingArtifact(PathBuf),
}

/// Result type for neural_cad operations.
pub type Result<T> = std::result::Result<T, NeuralCadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = NeuralCadError::ShapeMismatch {
            name: "projection.weight".into(),
            expected: vec![64, 51],
            got: vec![64, 50],
        };
        assert_eq!(
            err.to_string(),
            "tensor `projection.weight` has shape [64, 50], expected [64, 51]"
        );

        let err = NeuralCadError::MissingMarker {
            marker: "<|endoftext|>".into(),
        };
        assert_eq!(err.to_string(), "generated text has no `<|endoftext|>` marker");
    }

    #[test]
    fn test_from_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(matches!(NeuralCadError::from(io), NeuralCadError::Io(_)));
        let mesh = NeuralCadError::from(cad_io::CadIoError::EmptyMesh);
        assert!(matches!(mesh, NeuralCadError::Mesh(_)));
    }
}
