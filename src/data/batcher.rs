// ============================================================
// Layer 4 — Fingerprint Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec of
// FingerprintSamples into tensors.
//
// How batching works here:
//   Input:  N samples, each with K scaled RSS readings
//   Output: rss tensor [N, K], optional power tensor [N, P],
//           and two target tensors [N, 1] (x and y)
//
// Every sample in a dataset has the same width, so the flat
// Vec can be reshaped directly.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::FingerprintSample;

/// A batch of fingerprints ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct FingerprintBatch<B: Backend> {
    /// Scaled RSS readings — shape: [batch_size, n_access_points]
    pub rss: Tensor<B, 2>,

    /// Scaled TX power — shape: [batch_size, n_power_columns]
    pub power: Option<Tensor<B, 2>>,

    /// Scaled x targets — shape: [batch_size, 1]
    pub target_x: Tensor<B, 2>,

    /// Scaled y targets — shape: [batch_size, 1]
    pub target_y: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct FingerprintBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> FingerprintBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn matrix(&self, values: Vec<f32>, rows: usize, cols: usize) -> Tensor<B, 2> {
        Tensor::<B, 2>::from_data(TensorData::new(values, [rows, cols]), &self.device)
    }
}

impl<B: Backend> Batcher<FingerprintSample, FingerprintBatch<B>> for FingerprintBatcher<B> {
    fn batch(&self, items: Vec<FingerprintSample>) -> FingerprintBatch<B> {
        let batch_size = items.len();
        let n_rss      = items.first().map(|s| s.rss.len()).unwrap_or(0);

        let rss_flat: Vec<f32> = items.iter().flat_map(|s| s.rss.iter().copied()).collect();
        let rss = self.matrix(rss_flat, batch_size, n_rss);

        // Power is all-or-nothing within a dataset
        let power = match items.first().and_then(|s| s.power.as_ref()) {
            Some(first) => {
                let n_power = first.len();
                let flat: Vec<f32> = items
                    .iter()
                    .flat_map(|s| s.power.iter().flatten().copied())
                    .collect();
                Some(self.matrix(flat, batch_size, n_power))
            }
            None => None,
        };

        let xs: Vec<f32> = items.iter().map(|s| s.target[0]).collect();
        let ys: Vec<f32> = items.iter().map(|s| s.target[1]).collect();

        FingerprintBatch {
            rss,
            power,
            target_x: self.matrix(xs, batch_size, 1),
            target_y: self.matrix(ys, batch_size, 1),
        }
    }
}
