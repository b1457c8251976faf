//! Neural network modules.
//!
//! - [`encoder`]: Fourier point encoder
//! - [`fusion`]: point embedding splicing and mask resolution

pub mod encoder;
pub mod fusion;

pub use encoder::{FrequencyBank, PointEncoder};
pub use fusion::{
    fuse_point_embeddings, point_prefix_len, resolve_point_mask, FusedInputs, ATTEND, IGNORE,
    POINT_SENTINEL,
};
