//! The causal language model seam.
//!
//! The transformer itself is an external collaborator; the pipeline only needs
//! next-token logits from input embeddings plus an opaque incremental state.

use burn::prelude::*;

use crate::error::Result;

/// Result of one decoder step.
#[derive(Debug, Clone)]
pub struct DecoderOutput<B: Backend, S> {
    /// Logits `[batch, seq, vocab]` for the positions fed in this step.
    pub logits: Tensor<B, 3>,
    /// State to pass to the next step.
    pub state: S,
}

/// A causal decoder driven by input embeddings.
///
/// The first call receives the whole fused prompt and `state = None`. Every
/// later call receives only the embeddings of newly appended tokens, the full
/// attention mask so far and the state returned by the previous call.
pub trait CausalDecoder<B: Backend> {
    /// Incremental decoding state (key/value cache or equivalent).
    type State;

    /// Width of the input embeddings.
    fn hidden_size(&self) -> usize;

    /// Run one step.
    fn forward(
        &self,
        embeds: Tensor<B, 3>,
        mask: Tensor<B, 2, Int>,
        state: Option<Self::State>,
    ) -> Result<DecoderOutput<B, Self::State>>;
}
