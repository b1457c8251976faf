//! Splicing point embeddings into the token embedding sequence.
//!
//! The prompt starts with one placeholder token per point, marked `-1` in the
//! attention mask. Fusion overwrites those positions with the encoded points
//! (point `i` lands at position `i`) and turns every sentinel into a regular
//! "attend" entry, so the decoder only ever sees `0` and `1`.

use burn::prelude::*;

use crate::error::{NeuralCadError, Result};

/// Mask value marking a point placeholder position.
pub const POINT_SENTINEL: i64 = -1;

/// Mask value for positions the decoder attends to.
pub const ATTEND: i64 = 1;

/// Mask value for padding the decoder ignores.
pub const IGNORE: i64 = 0;

/// Decoder inputs after fusion.
#[derive(Debug, Clone)]
pub struct FusedInputs<B: Backend> {
    /// Input embeddings `[batch, seq, hidden]`.
    pub embeds: Tensor<B, 3>,
    /// Attention mask `[batch, seq]` containing only [`ATTEND`] and [`IGNORE`].
    pub mask: Tensor<B, 2, Int>,
    /// Number of leading point positions.
    pub num_points: usize,
}

/// Length of the leading run of sentinels in one mask row.
///
/// # Errors
/// [`NeuralCadError::InvalidPointMask`] when a sentinel appears after the
/// leading run.
pub fn point_prefix_len(mask: &[i64]) -> Result<usize> {
    let len = mask.iter().take_while(|&&m| m == POINT_SENTINEL).count();
    if let Some(offset) = mask[len..].iter().position(|&m| m == POINT_SENTINEL) {
        return Err(NeuralCadError::InvalidPointMask {
            message: format!(
                "sentinel at position {} follows a non-point position",
                len + offset
            ),
        });
    }
    Ok(len)
}

/// Replace every sentinel with [`ATTEND`].
pub fn resolve_point_mask<B: Backend>(mask: Tensor<B, 2, Int>) -> Tensor<B, 2, Int> {
    let sentinels = mask.clone().equal_elem(POINT_SENTINEL);
    mask.mask_fill(sentinels, ATTEND)
}

/// Overwrite the leading placeholder embeddings with point embeddings.
///
/// `token_embeds` is `[batch, seq, hidden]`, `point_embeds` is
/// `[batch, points, hidden]` and `mask` is `[batch, seq]`. Every mask row must
/// start with exactly `points` sentinels and contain no others.
pub fn fuse_point_embeddings<B: Backend>(
    token_embeds: Tensor<B, 3>,
    point_embeds: Tensor<B, 3>,
    mask: Tensor<B, 2, Int>,
) -> Result<FusedInputs<B>> {
    let [batch, seq, hidden] = token_embeds.dims();
    let [point_batch, num_points, point_hidden] = point_embeds.dims();
    let [mask_batch, mask_seq] = mask.dims();

    if point_hidden != hidden {
        return Err(NeuralCadError::HiddenSizeMismatch {
            embedding: hidden,
            encoder: point_hidden,
        });
    }
    if point_batch != batch || mask_batch != batch || mask_seq != seq {
        return Err(NeuralCadError::InvalidPointMask {
            message: format!(
                "embeddings [{}, {}], points [{}, {}], mask [{}, {}]",
                batch, seq, point_batch, num_points, mask_batch, mask_seq
            ),
        });
    }

    let values: Vec<i64> = mask.to_data().iter::<i64>().collect();
    for (row_idx, row) in values.chunks(seq.max(1)).enumerate() {
        let prefix = point_prefix_len(row)?;
        if prefix != num_points {
            return Err(NeuralCadError::InvalidPointMask {
                message: format!(
                    "row {} has {} point positions for {} points",
                    row_idx, prefix, num_points
                ),
            });
        }
    }

    let embeds = if num_points == 0 {
        token_embeds
    } else {
        token_embeds.slice_assign([0..batch, 0..num_points, 0..hidden], point_embeds)
    };

    Ok(FusedInputs {
        embeds,
        mask: resolve_point_mask(mask),
        num_points,
    })
}
