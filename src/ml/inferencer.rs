// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Maps one raw fingerprint to a coordinate:
//
//   raw RSS (missing allowed)
//       → fill with the training sentinel
//       → scale with the fitted RSS scaler (flattened)
//       → forward pass
//       → inverse-transform through the coordinate scaler
//
// The same path serves the trainer's predict() and the
// `predict` command, which rebuilds the model from a checkpoint.

use anyhow::Result;
use burn::{prelude::*, tensor::TensorData};
use ndarray::{Array2, ArrayView2};

use crate::data::dataset::FittedScalers;
use crate::domain::fingerprint::Coordinate;
use crate::error::{PipelineError, PipelineResult};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::PositioningModel;

type InferBackend = burn::backend::NdArray;

pub struct Inferencer {
    model:   PositioningModel<InferBackend>,
    scalers: FittedScalers,
    device:  burn::backend::ndarray::NdArrayDevice,
}

impl Inferencer {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device    = burn::backend::ndarray::NdArrayDevice::default();
        let model_cfg = ckpt_manager.load_model_config()?;
        let scalers   = ckpt_manager.load_scalers()?;

        let model: PositioningModel<InferBackend> = model_cfg.init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!(
            "Model loaded from checkpoint ({:?}, {} APs)",
            model.layout(),
            scalers.access_points.len()
        );
        Ok(Self { model, scalers, device })
    }

    pub fn access_points(&self) -> &[String] {
        &self.scalers.access_points
    }

    pub fn predict(
        &self,
        rss:   &[Option<f64>],
        power: Option<&[Option<f64>]>,
    ) -> PipelineResult<Coordinate> {
        predict_coordinate(&self.model, &self.scalers, rss, power, &self.device)
    }
}

/// Scale one raw fingerprint into model inputs.
pub fn encode_fingerprint(
    scalers: &FittedScalers,
    rss:     &[Option<f64>],
    power:   Option<&[Option<f64>]>,
) -> PipelineResult<(Array2<f64>, Option<Array2<f64>>)> {
    let rss = fill_row(rss, scalers.access_points.len(), scalers.missing_rss_value)?;
    let rss = scalers.rss.transform_flat(rss.view())?;

    let power = match (&scalers.power, power) {
        (Some(scaler), Some(values)) => {
            let row = fill_row(values, scalers.power_columns.len(), scalers.missing_rss_value)?;
            Some(scaler.transform_flat(row.view())?)
        }
        _ => None,
    };

    Ok((rss, power))
}

pub fn predict_coordinate<B: Backend>(
    model:   &PositioningModel<B>,
    scalers: &FittedScalers,
    rss:     &[Option<f64>],
    power:   Option<&[Option<f64>]>,
    device:  &B::Device,
) -> PipelineResult<Coordinate> {
    let (rss, power) = encode_fingerprint(scalers, rss, power)?;
    if model.has_merge() && power.is_none() {
        return Err(PipelineError::MissingPowerFeatures);
    }

    let output = model.forward(
        matrix_to_tensor(rss.view(), device),
        power.map(|p| matrix_to_tensor(p.view(), device)),
    );
    let x = tensor_to_vec(output.x)?;
    let y = tensor_to_vec(output.y)?;

    let scaled = Array2::from_shape_vec((1, 2), vec![x[0] as f64, y[0] as f64])
        .map_err(|e| PipelineError::Tensor(e.to_string()))?;
    let coords = scalers.coords.inverse_transform(scaled.view())?;

    let coordinate = Coordinate::new(coords[[0, 0]], coords[[0, 1]]);
    tracing::debug!("Predicted {}", coordinate);
    Ok(coordinate)
}

fn fill_row(values: &[Option<f64>], expected: usize, sentinel: f64) -> PipelineResult<Array2<f64>> {
    if values.len() != expected {
        return Err(PipelineError::DimensionMismatch { expected, actual: values.len() });
    }
    let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(sentinel)).collect();
    Array2::from_shape_vec((1, expected), filled).map_err(|e| PipelineError::Tensor(e.to_string()))
}

pub(crate) fn matrix_to_tensor<B: Backend>(m: ArrayView2<f64>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = m.dim();
    let values: Vec<f32> = m.iter().map(|&v| v as f32).collect();
    Tensor::<B, 2>::from_data(TensorData::new(values, [rows, cols]), device)
}

pub(crate) fn tensor_to_vec<B: Backend, const D: usize>(t: Tensor<B, D>) -> PipelineResult<Vec<f32>> {
    t.into_data()
        .to_vec::<f32>()
        .map_err(|e| PipelineError::Tensor(format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::FittedScaler;
    use crate::ml::model::{BranchLayout, PositioningModelConfig};

    type TestBackend = burn::backend::NdArray;

    fn scalers(with_power: bool) -> FittedScalers {
        FittedScalers {
            rss:               FittedScaler::Standard { mean: vec![-80.0], scale: vec![10.0] },
            power:             with_power.then(|| FittedScaler::Standard { mean: vec![15.0], scale: vec![5.0] }),
            coords:            FittedScaler::Standard { mean: vec![10.0, 20.0], scale: vec![2.0, 4.0] },
            missing_rss_value: -100.0,
            access_points:     vec!["AP1".into(), "AP2".into()],
            power_columns:     if with_power { vec!["TX_AP1".into(), "TX_AP2".into()] } else { Vec::new() },
        }
    }

    #[test]
    fn test_encode_fills_and_scales() {
        let (rss, power) = encode_fingerprint(&scalers(false), &[Some(-70.0), None], None).unwrap();
        // -70 → 1.0, missing → -100 → -2.0
        assert_eq!(rss.dim(), (1, 2));
        assert!((rss[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((rss[[0, 1]] + 2.0).abs() < 1e-12);
        assert!(power.is_none());
    }

    #[test]
    fn test_encode_rejects_wrong_width() {
        let err = encode_fingerprint(&scalers(false), &[Some(-70.0)], None).unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_predict_returns_coordinate_in_building_units() {
        let device = Default::default();
        let model: PositioningModel<TestBackend> =
            PositioningModelConfig::new(2, 0, BranchLayout::SingleBranch).init(&device);
        let c = predict_coordinate(&model, &scalers(false), &[Some(-75.0), Some(-85.0)], None, &device)
            .unwrap();
        assert!(c.x.is_finite() && c.y.is_finite());
    }

    #[test]
    fn test_dual_branch_predict_needs_power() {
        let device = Default::default();
        let model: PositioningModel<TestBackend> =
            PositioningModelConfig::new(2, 2, BranchLayout::DualBranch).init(&device);
        let err = predict_coordinate(&model, &scalers(true), &[Some(-75.0), None], None, &device)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingPowerFeatures));

        let ok = predict_coordinate(
            &model,
            &scalers(true),
            &[Some(-75.0), None],
            Some(&[Some(20.0), None][..]),
            &device,
        );
        assert!(ok.is_ok());
    }
}
