//! The composed point-cloud to program pipeline.
//!
//! [`CadRecode`] owns the token embedding table, the point encoder, the decoder
//! and the tokenizer, and calls them in a fixed order:
//!
//! 1. build the prompt: one pad token per point, then the begin marker
//! 2. embed the prompt, encode the points, fuse (first step only)
//! 3. decode greedily, feeding back one token at a time with the decoder state
//! 4. decode ids to text and cut the program out between the markers

use burn::nn::Embedding;
use burn::prelude::*;
use burn::tensor::{ElementConversion, TensorData};
use cad_core::Point3;

use crate::config::CadRecodeConfig;
use crate::error::{NeuralCadError, Result};
use crate::model::decoder::CausalDecoder;
use crate::model::extract::extract_program;
use crate::model::tokenizer::Tokenizer;
use crate::nn::{fuse_point_embeddings, FusedInputs, PointEncoder, ATTEND, POINT_SENTINEL};

/// Pack a point cloud into a `[1, points, 3]` tensor.
pub fn points_to_tensor<B: Backend>(points: &[Point3], device: &B::Device) -> Tensor<B, 3> {
    let flat: Vec<f32> = points.iter().flat_map(|p| p.as_array()).collect();
    Tensor::from_data(TensorData::new(flat, [1, points.len(), 3]), device)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MarkerIds {
    pad: u32,
    begin: u32,
    end: u32,
}

/// Output of [`CadRecode::generate_program`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    /// Prompt ids followed by the generated ids.
    pub ids: Vec<u32>,
    /// Decoded text of `ids`, special tokens included.
    pub text: String,
    /// Program source between the markers.
    pub program: String,
}

/// Point cloud to CAD program generator (batch size 1, greedy decoding).
pub struct CadRecode<B: Backend, D: CausalDecoder<B>, T: Tokenizer> {
    config: CadRecodeConfig,
    embedding: Embedding<B>,
    encoder: PointEncoder<B>,
    decoder: D,
    tokenizer: T,
    ids: MarkerIds,
    device: B::Device,
}

impl<B: Backend, D: CausalDecoder<B>, T: Tokenizer> CadRecode<B, D, T> {
    /// Assemble the pipeline.
    ///
    /// # Errors
    /// [`NeuralCadError::UnknownToken`] if a marker is not in the vocabulary,
    /// [`NeuralCadError::HiddenSizeMismatch`] if the embedding, encoder and
    /// decoder widths disagree.
    pub fn new(
        config: CadRecodeConfig,
        embedding: Embedding<B>,
        encoder: PointEncoder<B>,
        decoder: D,
        tokenizer: T,
        device: B::Device,
    ) -> Result<Self> {
        let lookup = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| NeuralCadError::UnknownToken(token.to_string()))
        };
        let ids = MarkerIds {
            pad: lookup(&config.markers.pad)?,
            begin: lookup(&config.markers.begin)?,
            end: lookup(&config.markers.end)?,
        };

        let embedding_width = embedding.weight.val().dims()[1];
        for width in [encoder.hidden_dim(), decoder.hidden_size()] {
            if width != embedding_width {
                return Err(NeuralCadError::HiddenSizeMismatch {
                    embedding: embedding_width,
                    encoder: width,
                });
            }
        }

        Ok(Self {
            config,
            embedding,
            encoder,
            decoder,
            tokenizer,
            ids,
            device,
        })
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &CadRecodeConfig {
        &self.config
    }

    /// The point encoder.
    pub fn encoder(&self) -> &PointEncoder<B> {
        &self.encoder
    }

    /// The decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// The tokenizer.
    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Prompt ids and mask: `num_points` pad ids marked with the sentinel,
    /// then the begin marker marked as attended.
    pub fn prompt(&self) -> (Vec<u32>, Vec<i64>) {
        let n = self.config.num_points;
        let mut ids = vec![self.ids.pad; n];
        ids.push(self.ids.begin);
        let mut mask = vec![POINT_SENTINEL; n];
        mask.push(ATTEND);
        (ids, mask)
    }

    fn embed(&self, ids: &[u32]) -> Tensor<B, 3> {
        let ids: Vec<i64> = ids.iter().map(|&id| id as i64).collect();
        let len = ids.len();
        let ids = Tensor::<B, 2, Int>::from_data(TensorData::new(ids, [1, len]), &self.device);
        self.embedding.forward(ids)
    }

    fn mask_tensor(&self, mask: &[i64]) -> Tensor<B, 2, Int> {
        Tensor::from_data(TensorData::new(mask.to_vec(), [1, mask.len()]), &self.device)
    }

    /// Embed the prompt, encode `points` and fuse them.
    pub fn prefill(&self, points: &[Point3]) -> Result<FusedInputs<B>> {
        if points.len() != self.config.num_points {
            return Err(NeuralCadError::PointCountMismatch {
                expected: self.config.num_points,
                got: points.len(),
            });
        }
        let (ids, mask) = self.prompt();
        let token_embeds = self.embed(&ids);
        let point_embeds = self
            .encoder
            .forward(points_to_tensor(points, &self.device));
        fuse_point_embeddings(token_embeds, point_embeds, self.mask_tensor(&mask))
    }

    /// Greedy decoding. Returns the prompt ids followed by the generated ids,
    /// the end marker included when it was produced within the budget.
    pub fn generate(&self, points: &[Point3]) -> Result<Vec<u32>> {
        let fused = self.prefill(points)?;
        let (mut ids, _) = self.prompt();
        let mut mask = vec![ATTEND; ids.len()];
        let budget = self.config.generation.max_new_tokens;

        let mut output = self.decoder.forward(fused.embeds, fused.mask, None)?;
        for step in 0..budget {
            let next = greedy_token(&output.logits)?;
            ids.push(next);
            if next == self.ids.end || step + 1 == budget {
                break;
            }
            mask.push(ATTEND);
            output = self.decoder.forward(
                self.embed(&[next]),
                self.mask_tensor(&mask),
                Some(output.state),
            )?;
        }

        log::debug!(
            "Generated {} tokens after a {}-token prompt",
            ids.len() - self.config.num_points - 1,
            self.config.num_points + 1
        );
        Ok(ids)
    }

    /// Generate, decode and extract the program.
    ///
    /// # Errors
    /// [`NeuralCadError::MissingMarker`] when the decoded text is malformed;
    /// there is no retry.
    pub fn generate_program(&self, points: &[Point3]) -> Result<GeneratedProgram> {
        let ids = self.generate(points)?;
        let text = self.tokenizer.decode(&ids)?;
        let program = extract_program(&text, &self.config.markers)?;
        Ok(GeneratedProgram { ids, text, program })
    }
}

/// Highest-scoring id at the last position of `[1, seq, vocab]` logits.
fn greedy_token<B: Backend>(logits: &Tensor<B, 3>) -> Result<u32> {
    let [batch, seq, vocab] = logits.dims();
    if batch != 1 || seq == 0 || vocab == 0 {
        return Err(NeuralCadError::Decoder(format!(
            "expected logits [1, seq, vocab], got [{}, {}, {}]",
            batch, seq, vocab
        )));
    }
    let last = logits
        .clone()
        .slice([0..1, seq - 1..seq, 0..vocab])
        .reshape([vocab]);
    let id: i64 = last.argmax(0).into_scalar().elem();
    Ok(id as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_points_to_tensor_layout() {
        let device = Default::default();
        let pts = [Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)];
        let t = points_to_tensor::<TestBackend>(&pts, &device);
        assert_eq!(t.dims(), [1, 2, 3]);
        assert_eq!(
            t.into_data().to_vec::<f32>().unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_greedy_token_uses_last_position() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![9.0f32, 0.0, 0.0, 0.0, 0.0, 3.0], [1, 2, 3]),
            &device,
        );
        assert_eq!(greedy_token(&logits).unwrap(), 2);

        let bad = Tensor::<TestBackend, 3>::zeros([2, 1, 3], &device);
        assert!(matches!(greedy_token(&bad), Err(NeuralCadError::Decoder(_))));
    }
}
