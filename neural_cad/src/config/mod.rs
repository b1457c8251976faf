//! Configuration types for neural_cad.
//!
//! Burn-style configuration structs for the point encoder, the generation
//! pipeline and program execution. All of them save to and load from JSON.

mod exec;
mod model;

pub use exec::ExecutionConfig;
pub use model::{
    CadRecodeConfig, GenerationConfig, PointEncoderConfig, Precision, TokenMarkers,
    DEFAULT_NUM_BANDS,
};
