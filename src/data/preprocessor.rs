// ============================================================
// Layer 4 — Feature Preprocessors (Scalers)
// ============================================================
// Scales RSS readings and coordinates before they reach the
// network, and maps predictions back to building units.
//
// Three preprocessors are supported:
//   standard_scaler  (v - mean) / std        invertible
//   min_max_scaler   (v - min) / (max - min)  invertible
//   normalization    row / ||row||₂           stateless, NOT invertible
//
// Fitting returns a FittedScaler: an immutable value holding
// the learned parameters. Whoever transformed a matrix must keep
// that exact value around to inverse-transform it later.
//
// Two fitting modes:
//   column-wise   one statistic per column (coordinates)
//   flattened     every value of the matrix treated as one
//                 1-D distribution (RSS, so all APs share a scale)
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use std::str::FromStr;

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Which scaling method to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessorKind {
    StandardScaler,
    MinMaxScaler,
    Normalization,
}

impl PreprocessorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StandardScaler => "standard_scaler",
            Self::MinMaxScaler   => "min_max_scaler",
            Self::Normalization  => "normalization",
        }
    }

    /// Fit one set of parameters per column of `data`.
    pub fn fit(&self, data: ArrayView2<f64>) -> PipelineResult<FittedScaler> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(PipelineError::EmptyInput);
        }

        let fitted = match self {
            Self::StandardScaler => {
                let mut mean  = Vec::with_capacity(data.ncols());
                let mut scale = Vec::with_capacity(data.ncols());
                for col in data.axis_iter(Axis(1)) {
                    let n = col.len() as f64;
                    let m = col.sum() / n;
                    let var = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
                    mean.push(m);
                    scale.push(non_zero(var.sqrt()));
                }
                FittedScaler::Standard { mean, scale }
            }
            Self::MinMaxScaler => {
                let mut min   = Vec::with_capacity(data.ncols());
                let mut range = Vec::with_capacity(data.ncols());
                for col in data.axis_iter(Axis(1)) {
                    let lo = col.iter().copied().fold(f64::INFINITY, f64::min);
                    let hi = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    min.push(lo);
                    range.push(non_zero(hi - lo));
                }
                FittedScaler::MinMax { min, range }
            }
            Self::Normalization => FittedScaler::Normalizer { n_features: data.ncols() },
        };

        Ok(fitted)
    }

    /// Fit a single statistic over every value of `data`.
    pub fn fit_flat(&self, data: ArrayView2<f64>) -> PipelineResult<FittedScaler> {
        let flat = Array2::from_shape_vec((data.len(), 1), data.iter().copied().collect())
            .map_err(|_| PipelineError::EmptyInput)?;
        self.fit(flat.view())
    }
}

impl FromStr for PreprocessorKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard_scaler" => Ok(Self::StandardScaler),
            "min_max_scaler"  => Ok(Self::MinMaxScaler),
            "normalization"   => Ok(Self::Normalization),
            other             => Err(PipelineError::UnsupportedPreprocessor(other.to_string())),
        }
    }
}

impl std::fmt::Display for PreprocessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Constant columns would divide by zero; scale them by 1 instead.
fn non_zero(v: f64) -> f64 {
    if v.abs() < f64::EPSILON { 1.0 } else { v }
}

/// Learned scaling parameters. One entry per fitted column
/// (a single entry when fitted with `fit_flat`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedScaler {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, range: Vec<f64> },
    Normalizer { n_features: usize },
}

impl FittedScaler {
    pub fn kind(&self) -> PreprocessorKind {
        match self {
            Self::Standard { .. }   => PreprocessorKind::StandardScaler,
            Self::MinMax { .. }     => PreprocessorKind::MinMaxScaler,
            Self::Normalizer { .. } => PreprocessorKind::Normalization,
        }
    }

    pub fn is_invertible(&self) -> bool {
        !matches!(self, Self::Normalizer { .. })
    }

    /// Number of columns this scaler was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            Self::Standard { mean, .. } => mean.len(),
            Self::MinMax { min, .. }    => min.len(),
            Self::Normalizer { n_features } => *n_features,
        }
    }

    /// Column-wise transform. `data` must have `n_features()` columns.
    pub fn transform(&self, data: ArrayView2<f64>) -> PipelineResult<Array2<f64>> {
        self.check_columns(data.ncols())?;

        let out = match self {
            Self::Standard { mean, scale } => {
                let mut out = data.to_owned();
                for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
                    col.mapv_inplace(|v| (v - mean[j]) / scale[j]);
                }
                out
            }
            Self::MinMax { min, range } => {
                let mut out = data.to_owned();
                for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
                    col.mapv_inplace(|v| (v - min[j]) / range[j]);
                }
                out
            }
            Self::Normalizer { .. } => {
                let mut out = data.to_owned();
                for mut row in out.axis_iter_mut(Axis(0)) {
                    let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                    if norm > 0.0 {
                        row.mapv_inplace(|v| v / norm);
                    }
                }
                out
            }
        };

        Ok(out)
    }

    /// Undo `transform`. Fails for the normalizer, which drops row norms.
    pub fn inverse_transform(&self, data: ArrayView2<f64>) -> PipelineResult<Array2<f64>> {
        self.check_columns(data.ncols())?;

        let mut out = data.to_owned();
        match self {
            Self::Standard { mean, scale } => {
                for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
                    col.mapv_inplace(|v| v * scale[j] + mean[j]);
                }
            }
            Self::MinMax { min, range } => {
                for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
                    col.mapv_inplace(|v| v * range[j] + min[j]);
                }
            }
            Self::Normalizer { .. } => {
                return Err(PipelineError::NotInvertible(PreprocessorKind::Normalization.name()));
            }
        }
        Ok(out)
    }

    /// Apply a scaler fitted with `fit_flat` to every value of `data`,
    /// keeping its shape.
    pub fn transform_flat(&self, data: ArrayView2<f64>) -> PipelineResult<Array2<f64>> {
        self.check_columns(1)?;
        let flat = self.transform(column_view(&data).view())?;
        reshape_like(flat, data.dim())
    }

    fn check_columns(&self, actual: usize) -> PipelineResult<()> {
        let expected = self.n_features();
        if expected != actual {
            return Err(PipelineError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Copy a matrix into a single column, row-major.
fn column_view(data: &ArrayView2<f64>) -> Array2<f64> {
    let values: Vec<f64> = data.iter().copied().collect();
    let n = values.len();
    Array2::from_shape_vec((n, 1), values).unwrap_or_else(|_| Array2::zeros((0, 1)))
}

fn reshape_like(flat: Array2<f64>, dim: (usize, usize)) -> PipelineResult<Array2<f64>> {
    let values: Vec<f64> = flat.iter().copied().collect();
    Array2::from_shape_vec(dim, values).map_err(|_| PipelineError::DimensionMismatch {
        expected: dim.0 * dim.1,
        actual:   flat.len(),
    })
}
