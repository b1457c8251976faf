//! Model and generation configuration types.

use burn::config::Config;
use serde::{Deserialize, Serialize};

/// Number of Fourier frequencies per axis.
pub const DEFAULT_NUM_BANDS: usize = 8;

/// Numeric precision of the Fourier feature computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    /// Features computed by the backend in its float type.
    Single,
    /// Features and projection computed in `f64` on the host; only the
    /// embeddings are cast to the backend float type.
    #[default]
    Double,
}

/// Configuration for the Fourier point encoder.
#[derive(Config, Debug)]
pub struct PointEncoderConfig {
    /// Output width, equal to the decoder's hidden size.
    pub hidden_dim: usize,

    /// Number of frequencies `2^0 .. 2^(num_bands - 1)`.
    #[config(default = "DEFAULT_NUM_BANDS")]
    pub num_bands: usize,

    /// Precision of the sin/cos features.
    #[config(default = "Precision::Double")]
    pub precision: Precision,
}

impl PointEncoderConfig {
    /// Width of the features before projection: `3 + 2 * 3 * num_bands`.
    pub fn feature_dim(&self) -> usize {
        3 + 2 * 3 * self.num_bands
    }
}

/// Special tokens framing the prompt and the generated program.
#[derive(Config, Debug)]
pub struct TokenMarkers {
    /// Token after the point placeholders; the program follows it.
    #[config(default = "String::from(\"<|im_start|>\")")]
    pub begin: String,

    /// Token terminating the program.
    #[config(default = "String::from(\"<|endoftext|>\")")]
    pub end: String,

    /// Padding token, used as the point placeholder.
    #[config(default = "String::from(\"<|im_end|>\")")]
    pub pad: String,
}

/// Decoding budget.
#[derive(Config, Debug)]
pub struct GenerationConfig {
    /// Maximum number of generated tokens after the prompt.
    #[config(default = 768)]
    pub max_new_tokens: usize,
}

/// Configuration of the complete point-cloud to program pipeline.
#[derive(Config, Debug)]
pub struct CadRecodeConfig {
    /// Point encoder settings.
    pub encoder: PointEncoderConfig,

    /// Marker tokens.
    #[config(default = "TokenMarkers::new()")]
    pub markers: TokenMarkers,

    /// Decoding settings.
    #[config(default = "GenerationConfig::new()")]
    pub generation: GenerationConfig,

    /// Points per cloud.
    #[config(default = 256)]
    pub num_points: usize,
}
