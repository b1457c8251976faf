//! Fourier point encoder.
//!
//! Each point `(x, y, z)` becomes
//!
//! ```text
//! [x, y, z,
//!  sin(x*f0) .. sin(x*f7), sin(y*f0) .. sin(y*f7), sin(z*f0) .. sin(z*f7),
//!  cos(x*f0) .. cos(x*f7), cos(y*f0) .. cos(y*f7), cos(z*f0) .. cos(z*f7)]
//! ```
//!
//! with `f_i = 2^i`, followed by a single affine projection to the decoder's
//! hidden width. There is no other nonlinearity and no normalization.

use burn::module::{Ignored, Module, Param};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::TensorData;

use crate::config::{PointEncoderConfig, Precision};
use crate::error::{NeuralCadError, Result};

/// Fixed frequency multipliers shared by every point and axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyBank {
    multipliers: Vec<f64>,
}

impl FrequencyBank {
    /// Bank `2^0, 2^1, .., 2^(count - 1)`.
    pub fn powers_of_two(count: usize) -> Self {
        let multipliers = (0..count).map(|i| (1u64 << i) as f64).collect();
        Self { multipliers }
    }

    /// The multipliers in ascending order.
    pub fn multipliers(&self) -> &[f64] {
        &self.multipliers
    }

    /// Number of multipliers.
    pub fn len(&self) -> usize {
        self.multipliers.len()
    }

    /// Whether the bank is empty.
    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }

    /// Width of the features of one point.
    pub fn feature_dim(&self) -> usize {
        3 + 2 * 3 * self.len()
    }

    /// Append the features of one point to `out`.
    pub fn encode_into(&self, point: [f64; 3], out: &mut Vec<f64>) {
        out.extend_from_slice(&point);
        for c in point {
            out.extend(self.multipliers.iter().map(|f| (c * f).sin()));
        }
        for c in point {
            out.extend(self.multipliers.iter().map(|f| (c * f).cos()));
        }
    }
}

/// Maps point clouds `[batch, points, 3]` to embeddings `[batch, points, hidden]`.
#[derive(Module, Debug)]
pub struct PointEncoder<B: Backend> {
    projection: Linear<B>,
    bank: Ignored<FrequencyBank>,
    precision: Ignored<Precision>,
}

impl PointEncoderConfig {
    /// Initialize an encoder with random projection weights.
    pub fn init<B: Backend>(&self, device: &B::Device) -> PointEncoder<B> {
        PointEncoder::new(self, device)
    }
}

impl<B: Backend> PointEncoder<B> {
    /// Create an encoder with randomly initialized projection weights.
    pub fn new(config: &PointEncoderConfig, device: &B::Device) -> Self {
        let projection = LinearConfig::new(config.feature_dim(), config.hidden_dim).init(device);
        Self {
            projection,
            bank: Ignored(FrequencyBank::powers_of_two(config.num_bands)),
            precision: Ignored(config.precision),
        }
    }

    /// Create an encoder from stored projection weights.
    ///
    /// `weight` is laid out `[hidden, features]` (output-major), `bias` is `[hidden]`.
    pub fn from_weights(
        config: &PointEncoderConfig,
        weight: Tensor<B, 2>,
        bias: Tensor<B, 1>,
    ) -> Result<Self> {
        let expected = vec![config.hidden_dim, config.feature_dim()];
        let got = weight.dims().to_vec();
        if got != expected {
            return Err(NeuralCadError::ShapeMismatch {
                name: "projection.weight".into(),
                expected,
                got,
            });
        }
        let [bias_len] = bias.dims();
        if bias_len != config.hidden_dim {
            return Err(NeuralCadError::ShapeMismatch {
                name: "projection.bias".into(),
                expected: vec![config.hidden_dim],
                got: vec![bias_len],
            });
        }

        let projection = Linear {
            weight: Param::from_tensor(weight.transpose()),
            bias: Some(Param::from_tensor(bias)),
        };
        Ok(Self {
            projection,
            bank: Ignored(FrequencyBank::powers_of_two(config.num_bands)),
            precision: Ignored(config.precision),
        })
    }

    /// Pre-projection features `[batch, points, feature_dim]`.
    pub fn features(&self, points: Tensor<B, 3>) -> Tensor<B, 3> {
        match *self.precision {
            Precision::Single => self.features_on_backend(points),
            Precision::Double => self.features_on_host(points),
        }
    }

    fn features_on_backend(&self, points: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, num_points, dim] = points.dims();
        let bands = self.bank.len();
        let multipliers: Vec<f32> = self.bank.multipliers().iter().map(|&f| f as f32).collect();
        let freqs = Tensor::<B, 1>::from_data(TensorData::new(multipliers, [bands]), &points.device())
            .reshape([1, 1, 1, bands]);

        // [batch, points, 3, bands] flattened axis-major.
        let scaled = (points.clone().reshape([batch, num_points, dim, 1]) * freqs)
            .reshape([batch, num_points, dim * bands]);

        Tensor::cat(vec![points, scaled.clone().sin(), scaled.cos()], 2)
    }

    fn features_on_host(&self, points: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, num_points, _] = points.dims();
        let device = points.device();
        let features = self.host_features(points);
        let width = self.bank.feature_dim();
        let data = TensorData::new(features, [batch, num_points, width]).convert::<B::FloatElem>();
        Tensor::from_data(data, &device)
    }

    fn host_features(&self, points: Tensor<B, 3>) -> Vec<f64> {
        let coords: Vec<f64> = points.into_data().iter::<f64>().collect();
        let mut features = Vec::with_capacity(coords.len() / 3 * self.bank.feature_dim());
        for p in coords.chunks_exact(3) {
            self.bank.encode_into([p[0], p[1], p[2]], &mut features);
        }
        features
    }

    fn project_on_host(&self, points: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, num_points, _] = points.dims();
        let device = points.device();
        let features = self.host_features(points);
        let width = self.bank.feature_dim();
        let hidden = self.hidden_dim();

        // Linear stores its weight as [features, hidden].
        let weight: Vec<f64> = self.projection.weight.val().into_data().iter::<f64>().collect();
        let bias: Vec<f64> = match &self.projection.bias {
            Some(b) => b.val().into_data().iter::<f64>().collect(),
            None => vec![0.0; hidden],
        };

        let mut out = Vec::with_capacity(batch * num_points * hidden);
        for row in features.chunks_exact(width) {
            let start = out.len();
            out.extend_from_slice(&bias);
            let acc = &mut out[start..];
            for (f, w_row) in row.iter().zip(weight.chunks_exact(hidden.max(1))) {
                for (a, w) in acc.iter_mut().zip(w_row) {
                    *a += f * w;
                }
            }
        }

        let data = TensorData::new(out, [batch, num_points, hidden]).convert::<B::FloatElem>();
        Tensor::from_data(data, &device)
    }

    /// Encode points into embeddings `[batch, points, hidden]`.
    ///
    /// With [`Precision::Double`] both the features and the projection are
    /// evaluated in `f64` on the host, and only the embeddings are cast to the
    /// backend float type.
    pub fn forward(&self, points: Tensor<B, 3>) -> Tensor<B, 3> {
        match *self.precision {
            Precision::Single => self.projection.forward(self.features_on_backend(points)),
            Precision::Double => self.project_on_host(points),
        }
    }

    /// Width of the features before projection.
    pub fn feature_dim(&self) -> usize {
        self.bank.feature_dim()
    }

    /// Output width.
    pub fn hidden_dim(&self) -> usize {
        self.projection.weight.val().dims()[1]
    }

    /// The frequency bank.
    pub fn bank(&self) -> &FrequencyBank {
        &self.bank
    }

    /// Projection weight `[hidden, features]` and bias `[hidden]`.
    pub fn weights(&self) -> (Tensor<B, 2>, Option<Tensor<B, 1>>) {
        (
            self.projection.weight.val().transpose(),
            self.projection.bias.as_ref().map(|b| b.val()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn cloud(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 3> {
        Tensor::from_data(
            TensorData::new(
                vec![0.5f32, -0.25, 1.0, -1.0, 0.0, 0.75, 0.1, 0.2, -0.3, 0.9, -0.9, 0.33],
                [1, 4, 3],
            ),
            device,
        )
    }

    fn values<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_bank_is_powers_of_two() {
        let bank = FrequencyBank::powers_of_two(8);
        assert_eq!(bank.multipliers(), &[1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0]);
        assert_eq!(bank.feature_dim(), 51);
    }

    #[test]
    fn test_feature_layout() {
        let device = Default::default();
        let encoder = PointEncoderConfig::new(16).init::<TestBackend>(&device);
        let features = encoder.features(cloud(&device));
        assert_eq!(features.dims(), [1, 4, 51]);

        let f = values(features);
        let (x, y, z) = (0.5f64, -0.25f64, 1.0f64);
        assert_eq!(&f[..3], &[0.5, -0.25, 1.0]);
        assert!((f[3] as f64 - x.sin()).abs() < 1e-6);
        assert!((f[4] as f64 - (2.0 * x).sin()).abs() < 1e-6);
        assert!((f[3 + 8] as f64 - y.sin()).abs() < 1e-6);
        assert!((f[3 + 16 + 7] as f64 - (128.0 * z).sin()).abs() < 1e-6);
        assert!((f[27] as f64 - x.cos()).abs() < 1e-6);
        assert!((f[27 + 8 + 1] as f64 - (2.0 * y).cos()).abs() < 1e-6);
        assert!((f[50] as f64 - (128.0 * z).cos()).abs() < 1e-6);
    }

    #[test]
    fn test_single_and_double_agree() {
        let device = Default::default();
        let double = PointEncoderConfig::new(8).init::<TestBackend>(&device);
        let single = PointEncoderConfig::new(8)
            .with_precision(Precision::Single)
            .init::<TestBackend>(&device);
        let a = values(double.features(cloud(&device)));
        let b = values(single.features(cloud(&device)));
        for (u, v) in a.iter().zip(&b) {
            assert!((u - v).abs() < 1e-4, "{} vs {}", u, v);
        }
    }

    #[test]
    fn test_forward_shape_and_determinism() {
        let device = Default::default();
        let encoder = PointEncoderConfig::new(32).init::<TestBackend>(&device);
        assert_eq!(encoder.hidden_dim(), 32);
        assert_eq!(encoder.feature_dim(), 51);

        let first = encoder.forward(cloud(&device));
        assert_eq!(first.dims(), [1, 4, 32]);
        let second = encoder.forward(cloud(&device));
        assert_eq!(values(first), values(second));
    }

    #[test]
    fn test_from_weights_applies_projection() {
        let device = Default::default();
        let config = PointEncoderConfig::new(2);
        let mut w = vec![0.0f32; 2 * 51];
        w[0] = 1.0; // out0 = x
        w[51 + 3] = 1.0; // out1 = sin(x)
        let weight = Tensor::from_data(TensorData::new(w, [2, 51]), &device);
        let bias = Tensor::from_data(TensorData::new(vec![0.5f32, 0.0], [2]), &device);
        let encoder = PointEncoder::<TestBackend>::from_weights(&config, weight, bias).unwrap();

        let out = values(encoder.forward(cloud(&device)));
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!((out[1] - 0.5f32.sin()).abs() < 1e-6);
        assert!((out[2] - (-0.5)).abs() < 1e-6);

        let (w_back, b_back) = encoder.weights();
        assert_eq!(w_back.dims(), [2, 51]);
        assert_eq!(values(b_back.unwrap()), vec![0.5, 0.0]);
    }

    #[test]
    fn test_double_precision_projects_before_casting() {
        let device = Default::default();
        let config = PointEncoderConfig::new(1);
        // out = 1e6 * sin(x) - 479425.5, which cancels to a few hundredths at
        // x = 0.5 and exposes any f32 rounding of sin(x) before the product.
        let mut w = vec![0.0f32; 51];
        w[3] = 1.0e6;
        let weight = Tensor::from_data(TensorData::new(w, [1, 51]), &device);
        let bias = Tensor::from_data(TensorData::new(vec![-479_425.5f32], [1]), &device);
        let encoder = PointEncoder::<TestBackend>::from_weights(&config, weight, bias).unwrap();

        let out = values(encoder.forward(cloud(&device)));
        let expected = 1.0e6 * 0.5f64.sin() - 479_425.5;
        assert!((out[0] as f64 - expected).abs() < 1e-4, "{} vs {}", out[0], expected);

        let rounded_first = 1.0e6 * (0.5f64.sin() as f32) as f64 - 479_425.5;
        assert!((rounded_first - expected).abs() > 1e-3);
    }

    #[test]
    fn test_from_weights_rejects_bad_shapes() {
        let device = Default::default();
        let config = PointEncoderConfig::new(4);
        let weight = Tensor::<TestBackend, 2>::zeros([4, 50], &device);
        let bias = Tensor::<TestBackend, 1>::zeros([4], &device);
        let err = PointEncoder::from_weights(&config, weight, bias).unwrap_err();
        assert!(matches!(err, NeuralCadError::ShapeMismatch { .. }));

        let weight = Tensor::<TestBackend, 2>::zeros([4, 51], &device);
        let bias = Tensor::<TestBackend, 1>::zeros([3], &device);
        let err = PointEncoder::from_weights(&config, weight, bias).unwrap_err();
        assert!(matches!(err, NeuralCadError::ShapeMismatch { .. }));
    }
}
