// ============================================================
// Layer 4 — Processed Dataset
// ============================================================
// What the loader hands to the trainer:
//
//   ProcessedDataset
//     ├── training: FeatureSplit  (raw + scaled RSS, power, coords)
//     └── testing:  FeatureSplit  (same layout, same scalers)
//
// FingerprintDataset wraps a Vec of scaled samples so Burn's
// DataLoader can call .get(index) and .len() on it.
//
// Reference: Burn Book §4 (Datasets)

use std::path::Path;
use std::sync::Arc;

use burn::data::dataset::Dataset;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::{FittedScaler, PreprocessorKind};
use crate::error::{PipelineError, PipelineResult};

/// Raw and scaled ground-truth coordinates for one split.
/// `coords` is `n × 2` with columns `[xr, yr]`.
#[derive(Debug, Clone)]
pub struct CoordinateLabels {
    pub coords:        Array2<f64>,
    pub coords_scaled: Array2<f64>,
    pub coords_scaler: Arc<FittedScaler>,
}

/// Transmit power matrices for one split.
#[derive(Debug, Clone)]
pub struct PowerFeatures {
    pub power_scaled: Array2<f64>,
    pub power_scaler: Arc<FittedScaler>,
}

/// Everything the trainer needs from one split (train or test).
/// Scalers are shared with the other split; they were fitted on
/// the training rows only.
#[derive(Debug, Clone)]
pub struct FeatureSplit {
    pub rss:        Array2<f64>,
    pub rss_scaled: Array2<f64>,
    pub rss_scaler: Arc<FittedScaler>,
    pub power:      Option<PowerFeatures>,
    pub labels:     CoordinateLabels,
}

impl FeatureSplit {
    pub fn len(&self) -> usize {
        self.rss.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One scaled sample per row, ready for the Burn data loader.
    pub fn samples(&self) -> Vec<FingerprintSample> {
        let power = self.power.as_ref().map(|p| &p.power_scaled);

        self.rss_scaled
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(i, row)| FingerprintSample {
                rss:    row.iter().map(|&v| v as f32).collect(),
                power:  power.map(|p| p.row(i).iter().map(|&v| v as f32).collect()),
                target: [
                    self.labels.coords_scaled[[i, 0]] as f32,
                    self.labels.coords_scaled[[i, 1]] as f32,
                ],
            })
            .collect()
    }
}

/// Output of the loader: both splits plus the column layout.
#[derive(Debug, Clone)]
pub struct ProcessedDataset {
    pub training:          FeatureSplit,
    pub testing:           FeatureSplit,
    pub access_points:     Vec<String>,
    pub power_columns:     Vec<String>,
    pub missing_rss_value: f64,
    pub preprocessor:      PreprocessorKind,
}

impl ProcessedDataset {
    pub fn has_power(&self) -> bool {
        self.training.power.is_some()
    }

    /// Copy of the fitted parameters, for persisting next to a checkpoint.
    pub fn scalers(&self) -> FittedScalers {
        FittedScalers {
            rss:               (*self.training.rss_scaler).clone(),
            power:             self.training.power.as_ref().map(|p| (*p.power_scaler).clone()),
            coords:            (*self.training.labels.coords_scaler).clone(),
            missing_rss_value: self.missing_rss_value,
            access_points:     self.access_points.clone(),
            power_columns:     self.power_columns.clone(),
        }
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            training_rows: self.training.len(),
            testing_rows:  self.testing.len(),
            access_points: self.access_points.len(),
            power_columns: self.power_columns.len(),
            preprocessor:  self.preprocessor,
        }
    }

    /// Write the processed splits to `dir` as `training.csv` and
    /// `testing.csv`: scaled RSS, scaled power, then raw and scaled
    /// coordinates.
    pub fn save(&self, dir: &Path) -> PipelineResult<()> {
        std::fs::create_dir_all(dir).map_err(|source| PipelineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for (name, split) in [("training.csv", &self.training), ("testing.csv", &self.testing)] {
            let path = dir.join(name);
            let mut writer = csv::Writer::from_path(&path)?;

            let mut header: Vec<String> = self.access_points.clone();
            if split.power.is_some() {
                header.extend(self.power_columns.iter().cloned());
            }
            header.extend(["xr", "yr", "xr_scaled", "yr_scaled"].map(String::from));
            writer.write_record(&header)?;

            for i in 0..split.len() {
                let mut row: Vec<String> =
                    split.rss_scaled.row(i).iter().map(|v| v.to_string()).collect();
                if let Some(power) = &split.power {
                    row.extend(power.power_scaled.row(i).iter().map(|v| v.to_string()));
                }
                row.extend(split.labels.coords.row(i).iter().map(|v| v.to_string()));
                row.extend(split.labels.coords_scaled.row(i).iter().map(|v| v.to_string()));
                writer.write_record(&row)?;
            }

            writer.flush().map_err(|source| PipelineError::Io { path: path.clone(), source })?;
            tracing::debug!("Saved {} rows to '{}'", split.len(), path.display());
        }

        Ok(())
    }
}

/// Row and column counts reported by the `load` command.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub training_rows: usize,
    pub testing_rows:  usize,
    pub access_points: usize,
    pub power_columns: usize,
    pub preprocessor:  PreprocessorKind,
}

/// Fitted scalers plus what is needed to encode a raw fingerprint
/// the same way the training data was encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScalers {
    pub rss:               FittedScaler,
    pub power:             Option<FittedScaler>,
    pub coords:            FittedScaler,
    pub missing_rss_value: f64,
    pub access_points:     Vec<String>,
    pub power_columns:     Vec<String>,
}

/// One scaled training example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintSample {
    pub rss:    Vec<f32>,
    pub power:  Option<Vec<f32>>,
    /// Scaled `[x, y]`
    pub target: [f32; 2],
}

pub struct FingerprintDataset {
    samples: Vec<FingerprintSample>,
}

impl FingerprintDataset {
    pub fn new(samples: Vec<FingerprintSample>) -> Self { Self { samples } }
}

impl Dataset<FingerprintSample> for FingerprintDataset {
    fn get(&self, index: usize) -> Option<FingerprintSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
