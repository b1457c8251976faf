//! # neural_cad
//!
//! Point cloud to CAD program generation with Burn.
//!
//! A fixed-size point cloud sampled from a mesh is encoded into one embedding
//! per point, spliced into the decoder's input sequence in place of
//! placeholder tokens, and a causal language model continues the sequence
//! with the source of a CAD program. The program is then run by an external
//! scripting kernel that exports the solid for evaluation.
//!
//! ## Features
//!
//! - **Fourier point encoder**: `PointEncoder<B>` with a fixed power-of-two
//!   frequency bank and a single linear projection
//! - **Sequence fusion**: sentinel-marked placeholder positions replaced by
//!   point embeddings
//! - **Generation pipeline**: `CadRecode<B, D, T>` with greedy decoding over
//!   any `CausalDecoder` and `Tokenizer`
//! - **Checkpoints**: split and consolidated safetensors layouts
//! - **Execution**: time-bounded child-process runs of generated programs
//!
//! ## Quick Start
//!
//! ```ignore
//! use neural_cad::prelude::*;
//! use burn::backend::NdArray;
//!
//! let device = Default::default();
//! let layout = CheckpointLayout::detect("checkpoints/cad-recode")?;
//! let config = CadRecodeConfig::new(PointEncoderConfig::new(1536));
//! let encoder = load_point_encoder::<NdArray>(&config.encoder, &layout, &device)?;
//! let embedding = load_token_embeddings::<NdArray>(&layout, &device)?;
//! let tokenizer = load_tokenizer("checkpoints/cad-recode/tokenizer.json")?;
//!
//! let pipeline = CadRecode::new(config, embedding, encoder, my_decoder, tokenizer, device)?;
//! let generated = pipeline.generate_program(&cloud)?;
//!
//! let executor = CodeExecutor::new(ExecutionConfig::new());
//! let artifacts = executor.execute_blocking(&generated.program)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! cad_core (pure math)
//!     │
//!     ├──────────────────┬──────────────────┐
//!     ▼                  ▼                  ▼
//! cad_io             cad_eval          neural_cad
//! (meshes, clouds)   (metrics)         (encoder, pipeline, exec)
//! ```
//!
//! ## Feature Flags
//!
//! - `ndarray` (default): CPU backend
//! - `wgpu`: GPU backend via WebGPU
//! - `exec` (default): program execution with tokio

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod config;
pub mod error;
#[cfg(feature = "exec")]
pub mod exec;
pub mod model;
pub mod nn;

pub use checkpoint::{load_point_encoder, load_token_embeddings, save_point_encoder, CheckpointLayout};
pub use config::{CadRecodeConfig, ExecutionConfig, PointEncoderConfig, Precision, TokenMarkers};
pub use error::{NeuralCadError, Result};
#[cfg(feature = "exec")]
pub use exec::{CodeExecutor, ExecutionArtifacts};
pub use model::{CadRecode, CausalDecoder, DecoderOutput, GeneratedProgram, Tokenizer};
pub use nn::{FrequencyBank, PointEncoder};

pub use cad_core::Point3;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::checkpoint::{
        load_point_encoder, load_token_embeddings, save_point_encoder, CheckpointLayout,
    };
    pub use crate::config::{
        CadRecodeConfig, ExecutionConfig, GenerationConfig, PointEncoderConfig, Precision,
        TokenMarkers,
    };
    pub use crate::error::{NeuralCadError, Result};
    #[cfg(feature = "exec")]
    pub use crate::exec::{CodeExecutor, ExecutionArtifacts};
    pub use crate::model::{
        extract_program, load_tokenizer, points_to_tensor, CadRecode, CausalDecoder,
        DecoderOutput, GeneratedProgram, Tokenizer, VocabTokenizer,
    };
    pub use crate::nn::{
        fuse_point_embeddings, resolve_point_mask, FrequencyBank, FusedInputs, PointEncoder,
    };

    pub use cad_core::Point3;
    pub use cad_io::{PointCloudSampler, TriangleMesh};
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_public_api() {
        let config = CadRecodeConfig::new(PointEncoderConfig::new(16));
        assert_eq!(config.num_points, 256);
        assert_eq!(config.encoder.feature_dim(), 51);
        assert_eq!(config.markers.begin, "<|im_start|>");
    }

    #[test]
    fn test_encoder_creation() {
        let device = Default::default();
        let encoder = PointEncoderConfig::new(16).init::<TestBackend>(&device);
        assert_eq!(encoder.feature_dim(), 51);
        assert_eq!(encoder.hidden_dim(), 16);
    }
}
