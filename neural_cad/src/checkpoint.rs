//! Checkpoint discovery and weight loading from safetensors files.
//!
//! Two directory layouts are recognised:
//!
//! - **split**: base model shards, an optional `adapter/` directory and a
//!   separate `point_encoder.safetensors` holding exactly
//!   `projection.weight [H, 51]` and `projection.bias [H]`
//! - **consolidated**: every tensor in the directory's `*.safetensors` shards,
//!   with the encoder tensors under the `point_encoder.` prefix

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Param;
use burn::nn::Embedding;
use burn::prelude::*;
use burn::tensor::TensorData;
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensorError, SafeTensors};

use crate::config::PointEncoderConfig;
use crate::error::{NeuralCadError, Result};
use crate::nn::PointEncoder;

/// File holding the point encoder in a split checkpoint.
pub const POINT_ENCODER_FILE: &str = "point_encoder.safetensors";

/// Adapter directory in a split checkpoint.
pub const ADAPTER_DIR: &str = "adapter";

/// Name prefix of the encoder tensors in a consolidated checkpoint.
pub const POINT_ENCODER_PREFIX: &str = "point_encoder.";

/// Token embedding table of the base model.
pub const TOKEN_EMBEDDINGS: &str = "model.embed_tokens.weight";

const PROJECTION_WEIGHT: &str = "projection.weight";
const PROJECTION_BIAS: &str = "projection.bias";

/// How the weights of a checkpoint directory are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointLayout {
    /// Base model shards plus a separate point encoder file.
    Split {
        /// Base model shards.
        weight_files: Vec<PathBuf>,
        /// The point encoder file.
        encoder_file: PathBuf,
        /// Adapter directory, when present.
        adapter_dir: Option<PathBuf>,
    },
    /// All tensors in one set of shards.
    Consolidated {
        /// Every shard.
        files: Vec<PathBuf>,
    },
}

impl CheckpointLayout {
    /// Inspect `dir` and decide its layout.
    ///
    /// # Errors
    /// [`NeuralCadError::CheckpointNotFound`] if `dir` is not a directory, or
    /// holds neither a point encoder file nor any shard.
    pub fn detect<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(NeuralCadError::CheckpointNotFound(dir.to_path_buf()));
        }

        let encoder_file = dir.join(POINT_ENCODER_FILE);
        let mut shards = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_shard = path.is_file()
                && path.extension().is_some_and(|ext| ext == "safetensors")
                && path != encoder_file;
            if is_shard {
                shards.push(path);
            }
        }
        shards.sort();

        let layout = if encoder_file.is_file() {
            let adapter = dir.join(ADAPTER_DIR);
            Self::Split {
                weight_files: shards,
                encoder_file,
                adapter_dir: adapter.is_dir().then_some(adapter),
            }
        } else if shards.is_empty() {
            return Err(NeuralCadError::CheckpointNotFound(dir.to_path_buf()));
        } else {
            Self::Consolidated { files: shards }
        };

        log::info!("Detected {} checkpoint in {:?}", layout.kind(), dir);
        Ok(layout)
    }

    /// `"split"` or `"consolidated"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Split { .. } => "split",
            Self::Consolidated { .. } => "consolidated",
        }
    }

    /// Shards holding the base model tensors.
    pub fn weight_files(&self) -> &[PathBuf] {
        match self {
            Self::Split { weight_files, .. } => weight_files,
            Self::Consolidated { files } => files,
        }
    }

    /// Adapter directory of a split checkpoint.
    pub fn adapter_dir(&self) -> Option<&Path> {
        match self {
            Self::Split { adapter_dir, .. } => adapter_dir.as_deref(),
            Self::Consolidated { .. } => None,
        }
    }
}

/// A tensor read from disk and widened to `f32`.
#[derive(Debug, Clone, PartialEq)]
struct HostTensor {
    shape: Vec<usize>,
    values: Vec<f32>,
}

fn decode_values(name: &str, view: &TensorView<'_>) -> Result<Vec<f32>> {
    let bytes = view.data();
    match view.dtype() {
        Dtype::F32 => Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        Dtype::BF16 => Ok(bytes
            .chunks_exact(2)
            .map(|b| f32::from_bits((u16::from_le_bytes([b[0], b[1]]) as u32) << 16))
            .collect()),
        other => Err(NeuralCadError::UnsupportedDtype {
            name: name.to_string(),
            dtype: format!("{:?}", other),
        }),
    }
}

/// Look `name` up in each file in turn.
fn find_tensor(files: &[PathBuf], name: &str) -> Result<Option<HostTensor>> {
    for path in files {
        let bytes = fs::read(path)?;
        let tensors = SafeTensors::deserialize(&bytes)?;
        match tensors.tensor(name) {
            Ok(view) => {
                log::debug!("Found `{}` in {:?}", name, path);
                return Ok(Some(HostTensor {
                    shape: view.shape().to_vec(),
                    values: decode_values(name, &view)?,
                }));
            }
            Err(SafeTensorError::TensorNotFound(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(None)
}

fn to_tensor<B: Backend, const D: usize>(
    name: &str,
    host: HostTensor,
    expected: [usize; D],
    device: &B::Device,
) -> Result<Tensor<B, D>> {
    if host.shape.len() != D {
        return Err(NeuralCadError::ShapeMismatch {
            name: name.to_string(),
            expected: expected.to_vec(),
            got: host.shape,
        });
    }
    let data = TensorData::new(host.values, host.shape).convert::<B::FloatElem>();
    Ok(Tensor::from_data(data, device))
}

/// Load the point encoder, falling back to random projection weights when the
/// encoder file or its tensors are missing.
///
/// # Errors
/// Shape and dtype mismatches of tensors that are present.
pub fn load_point_encoder<B: Backend>(
    config: &PointEncoderConfig,
    layout: &CheckpointLayout,
    device: &B::Device,
) -> Result<PointEncoder<B>> {
    let (files, prefix) = match layout {
        CheckpointLayout::Split { encoder_file, .. } => {
            if !encoder_file.is_file() {
                log::warn!(
                    "Point encoder file {:?} missing, using random projection weights",
                    encoder_file
                );
                return Ok(PointEncoder::new(config, device));
            }
            (std::slice::from_ref(encoder_file), "")
        }
        CheckpointLayout::Consolidated { files } => (files.as_slice(), POINT_ENCODER_PREFIX),
    };

    let weight_name = format!("{}{}", prefix, PROJECTION_WEIGHT);
    let bias_name = format!("{}{}", prefix, PROJECTION_BIAS);
    let (weight, bias) = match (
        find_tensor(files, &weight_name)?,
        find_tensor(files, &bias_name)?,
    ) {
        (Some(weight), Some(bias)) => (weight, bias),
        _ => {
            log::warn!(
                "Tensors `{}`/`{}` not found, using random projection weights",
                weight_name,
                bias_name
            );
            return Ok(PointEncoder::new(config, device));
        }
    };

    let weight = to_tensor::<B, 2>(
        &weight_name,
        weight,
        [config.hidden_dim, config.feature_dim()],
        device,
    )?;
    let bias = to_tensor::<B, 1>(&bias_name, bias, [config.hidden_dim], device)?;
    let encoder = PointEncoder::from_weights(config, weight, bias)?;
    log::info!(
        "Loaded point encoder ({} -> {})",
        encoder.feature_dim(),
        encoder.hidden_dim()
    );
    Ok(encoder)
}

/// Load the base model's token embedding table `[vocab, hidden]`.
///
/// # Errors
/// [`NeuralCadError::MissingTensor`] when no shard holds it.
pub fn load_token_embeddings<B: Backend>(
    layout: &CheckpointLayout,
    device: &B::Device,
) -> Result<Embedding<B>> {
    let host = find_tensor(layout.weight_files(), TOKEN_EMBEDDINGS)?
        .ok_or_else(|| NeuralCadError::MissingTensor(TOKEN_EMBEDDINGS.to_string()))?;
    let expected = match host.shape.as_slice() {
        [vocab, hidden] => [*vocab, *hidden],
        _ => [0, 0],
    };
    let weight = to_tensor::<B, 2>(TOKEN_EMBEDDINGS, host, expected, device)?;
    log::info!("Loaded token embeddings {:?}", weight.dims());
    Ok(Embedding {
        weight: Param::from_tensor(weight),
    })
}

/// Write the encoder projection as `projection.weight` / `projection.bias`
/// (`f32`), the split-layout encoder file format.
pub fn save_point_encoder<B: Backend, P: AsRef<Path>>(
    encoder: &PointEncoder<B>,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let (weight, bias) = encoder.weights();

    let mut buffers = vec![(PROJECTION_WEIGHT, weight.dims().to_vec(), f32_bytes(weight))];
    if let Some(bias) = bias {
        buffers.push((PROJECTION_BIAS, bias.dims().to_vec(), f32_bytes(bias)));
    }

    let mut views = Vec::with_capacity(buffers.len());
    for (name, shape, bytes) in &buffers {
        views.push((name.to_string(), TensorView::new(Dtype::F32, shape.clone(), bytes)?));
    }
    let serialized = safetensors::serialize(views, &None)?;
    fs::write(path, serialized)?;

    log::info!("Saved point encoder to {:?}", path);
    Ok(())
}

fn f32_bytes<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<u8> {
    tensor
        .into_data()
        .iter::<f32>()
        .flat_map(f32::to_le_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_f32(path: &Path, tensors: &[(&str, Vec<usize>, Vec<f32>)]) {
        let bytes: Vec<(String, Vec<usize>, Vec<u8>)> = tensors
            .iter()
            .map(|(n, s, v)| {
                (
                    n.to_string(),
                    s.clone(),
                    v.iter().flat_map(|x| x.to_le_bytes()).collect(),
                )
            })
            .collect();
        let views: HashMap<String, TensorView<'_>> = bytes
            .iter()
            .map(|(n, s, b)| (n.clone(), TensorView::new(Dtype::F32, s.clone(), b).unwrap()))
            .collect();
        fs::write(path, safetensors::serialize(&views, &None).unwrap()).unwrap();
    }

    #[test]
    fn test_detect_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = CheckpointLayout::detect(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, NeuralCadError::CheckpointNotFound(_)));

        let err = CheckpointLayout::detect(dir.path()).unwrap_err();
        assert!(matches!(err, NeuralCadError::CheckpointNotFound(_)));
    }

    #[test]
    fn test_detect_split_with_adapter() {
        let dir = tempfile::tempdir().unwrap();
        write_f32(&dir.path().join("model.safetensors"), &[("a", vec![1], vec![1.0])]);
        write_f32(&dir.path().join(POINT_ENCODER_FILE), &[("b", vec![1], vec![1.0])]);
        fs::create_dir(dir.path().join(ADAPTER_DIR)).unwrap();

        let layout = CheckpointLayout::detect(dir.path()).unwrap();
        assert_eq!(layout.kind(), "split");
        assert_eq!(layout.weight_files(), &[dir.path().join("model.safetensors")]);
        assert_eq!(layout.adapter_dir(), Some(dir.path().join(ADAPTER_DIR).as_path()));
    }

    #[test]
    fn test_detect_consolidated_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["model-00002.safetensors", "model-00001.safetensors"] {
            write_f32(&dir.path().join(name), &[("a", vec![1], vec![1.0])]);
        }
        fs::write(dir.path().join("config.json"), "{}").unwrap();

        let layout = CheckpointLayout::detect(dir.path()).unwrap();
        assert_eq!(
            layout,
            CheckpointLayout::Consolidated {
                files: vec![
                    dir.path().join("model-00001.safetensors"),
                    dir.path().join("model-00002.safetensors"),
                ]
            }
        );
        assert!(layout.adapter_dir().is_none());
    }

    #[test]
    fn test_decode_bf16() {
        let values = [1.0f32, -2.5, 0.15625];
        let bytes: Vec<u8> = values
            .iter()
            .flat_map(|v| ((v.to_bits() >> 16) as u16).to_le_bytes())
            .collect();
        let view = TensorView::new(Dtype::BF16, vec![3], &bytes).unwrap();
        assert_eq!(decode_values("t", &view).unwrap(), values.to_vec());
    }

    #[test]
    fn test_decode_unsupported_dtype() {
        let bytes = [0u8; 8];
        let view = TensorView::new(Dtype::I64, vec![1], &bytes).unwrap();
        assert!(matches!(
            decode_values("t", &view),
            Err(NeuralCadError::UnsupportedDtype { .. })
        ));
    }

    #[test]
    fn test_find_tensor_across_shards() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.safetensors");
        let b = dir.path().join("b.safetensors");
        write_f32(&a, &[("x", vec![1], vec![1.0])]);
        write_f32(&b, &[("y", vec![2], vec![2.0, 3.0])]);

        let found = find_tensor(&[a.clone(), b], "y").unwrap().unwrap();
        assert_eq!(found.shape, vec![2]);
        assert_eq!(found.values, vec![2.0, 3.0]);
        assert!(find_tensor(&[a], "y").unwrap().is_none());
    }
}
