// ============================================================
// Layer 4 — Fingerprint Loader
// ============================================================
// Turns raw fingerprint rows into scaled train/test matrices.
//
//   FingerprintSource  → rows + column layout
//       │
//       ▼
//   floor filter       → keep rows recorded on one floor
//       │
//       ▼
//   split + sample     → disjoint train / test sets
//       │
//       ▼
//   fill               → missing readings become the sentinel
//       │
//       ▼
//   scale              → RSS (flattened), TX power (flattened),
//                        coordinates (column-wise)
//
// All scalers are fitted on the training split and reused for
// the test split.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::path::PathBuf;
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::dataset::{CoordinateLabels, FeatureSplit, PowerFeatures, ProcessedDataset};
use crate::data::preprocessor::{FittedScaler, PreprocessorKind};
use crate::data::source::CsvFingerprintSource;
use crate::data::splitter::{make_rng, sample_fraction, split_train_test};
use crate::domain::fingerprint::FingerprintRecord;
use crate::domain::traits::FingerprintSource;
use crate::error::{PipelineError, PipelineResult};

/// Settings for one loader run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// CSV file, or a directory containing `data.csv`
    pub data_path:         PathBuf,
    pub floor:             i64,
    pub test_size:         f64,
    /// Fraction of each split to keep after splitting
    pub frac:              f64,
    /// Value written in place of a missing RSS or power reading
    pub missing_rss_value: f64,
    pub preprocessor:      PreprocessorKind,
    pub seed:              Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_path:         PathBuf::from("datas"),
            floor:             1,
            test_size:         0.2,
            frac:              1.0,
            missing_rss_value: -100.0,
            preprocessor:      PreprocessorKind::StandardScaler,
            seed:              None,
        }
    }
}

impl LoaderConfig {
    fn validate(&self) -> PipelineResult<()> {
        if !(0.0..1.0).contains(&self.test_size) {
            return Err(PipelineError::InvalidFraction { name: "test_size", value: self.test_size });
        }
        if !(self.frac > 0.0 && self.frac <= 1.0) {
            return Err(PipelineError::InvalidFraction { name: "frac", value: self.frac });
        }
        Ok(())
    }
}

pub struct FingerprintLoader<S> {
    source: S,
    config: LoaderConfig,
}

impl FingerprintLoader<CsvFingerprintSource> {
    /// Loader reading the CSV named by `config.data_path`
    pub fn from_config(config: LoaderConfig) -> Self {
        let source = CsvFingerprintSource::new(&config.data_path);
        tracing::debug!("Reading fingerprints from '{}'", source.path().display());
        Self { source, config }
    }
}

impl<S: FingerprintSource> FingerprintLoader<S> {
    pub fn new(source: S, config: LoaderConfig) -> Self {
        Self { source, config }
    }

    /// Run the full pipeline and return both processed splits.
    pub fn load(&self) -> PipelineResult<ProcessedDataset> {
        let cfg = &self.config;
        cfg.validate()?;

        let (schema, records) = self.source.load_all()?;
        let total = records.len();

        let on_floor: Vec<FingerprintRecord> =
            records.into_iter().filter(|r| r.floor == cfg.floor).collect();
        if on_floor.is_empty() {
            return Err(PipelineError::EmptyFloor(cfg.floor));
        }
        tracing::info!("Floor {}: {} of {} rows", cfg.floor, on_floor.len(), total);
        let missing: usize = on_floor.iter().map(FingerprintRecord::missing_rss).sum();
        tracing::debug!("{} missing RSS readings will be set to {}", missing, cfg.missing_rss_value);

        let mut rng = make_rng(cfg.seed);
        let (train, test) = split_train_test(on_floor, cfg.test_size, &mut rng);
        let train = sample_fraction(train, cfg.frac, &mut rng);
        let test  = sample_fraction(test, cfg.frac, &mut rng);

        let n_ap = schema.access_points.len();
        let rss_train = fill_missing(&train, n_ap, cfg.missing_rss_value, |r| &r.rss);
        let rss_test  = fill_missing(&test, n_ap, cfg.missing_rss_value, |r| &r.rss);

        // One statistic over every AP reading, not one per AP
        let rss_scaler = Arc::new(cfg.preprocessor.fit_flat(rss_train.view())?);
        let rss_train_scaled = rss_scaler.transform_flat(rss_train.view())?;
        let rss_test_scaled  = rss_scaler.transform_flat(rss_test.view())?;

        let (power_train, power_test) = if schema.power_columns.is_empty() {
            (None, None)
        } else {
            let n_tx   = schema.power_columns.len();
            let raw_tr = fill_missing(&train, n_tx, cfg.missing_rss_value, |r| &r.power);
            let raw_te = fill_missing(&test, n_tx, cfg.missing_rss_value, |r| &r.power);
            let scaler = Arc::new(cfg.preprocessor.fit_flat(raw_tr.view())?);
            (
                Some(scale_power(&raw_tr, &scaler)?),
                Some(scale_power(&raw_te, &scaler)?),
            )
        };

        let coords_train  = stack_coordinates(&train);
        let coords_test   = stack_coordinates(&test);
        let coords_scaler = Arc::new(cfg.preprocessor.fit(coords_train.view())?);

        let training = FeatureSplit {
            rss:        rss_train,
            rss_scaled: rss_train_scaled,
            rss_scaler: Arc::clone(&rss_scaler),
            power:      power_train,
            labels:     scale_labels(coords_train, &coords_scaler)?,
        };
        let testing = FeatureSplit {
            rss:        rss_test,
            rss_scaled: rss_test_scaled,
            rss_scaler,
            power:      power_test,
            labels:     scale_labels(coords_test, &coords_scaler)?,
        };

        tracing::info!(
            "Processed {} training / {} test rows with {}",
            training.len(),
            testing.len(),
            cfg.preprocessor,
        );

        Ok(ProcessedDataset {
            training,
            testing,
            access_points:     schema.access_points,
            power_columns:     schema.power_columns,
            missing_rss_value: cfg.missing_rss_value,
            preprocessor:      cfg.preprocessor,
        })
    }
}

/// Build an `n × width` matrix from one optional-valued field of each
/// record, writing `sentinel` wherever a reading is missing.
pub fn fill_missing<F>(
    records:  &[FingerprintRecord],
    width:    usize,
    sentinel: f64,
    field:    F,
) -> Array2<f64>
where
    F: Fn(&FingerprintRecord) -> &Vec<Option<f64>>,
{
    let mut out = Array2::from_elem((records.len(), width), sentinel);
    for (i, record) in records.iter().enumerate() {
        for (j, value) in field(record).iter().enumerate().take(width) {
            if let Some(v) = value {
                out[[i, j]] = *v;
            }
        }
    }
    out
}

fn stack_coordinates(records: &[FingerprintRecord]) -> Array2<f64> {
    let mut out = Array2::zeros((records.len(), 2));
    for (i, r) in records.iter().enumerate() {
        out[[i, 0]] = r.location.x;
        out[[i, 1]] = r.location.y;
    }
    out
}

fn scale_labels(coords: Array2<f64>, scaler: &Arc<FittedScaler>) -> PipelineResult<CoordinateLabels> {
    let coords_scaled = scaler.transform(coords.view())?;
    Ok(CoordinateLabels {
        coords,
        coords_scaled,
        coords_scaler: Arc::clone(scaler),
    })
}

fn scale_power(power: &Array2<f64>, scaler: &Arc<FittedScaler>) -> PipelineResult<PowerFeatures> {
    let power_scaled = scaler.transform_flat(power.view())?;
    Ok(PowerFeatures {
        power_scaled,
        power_scaler: Arc::clone(scaler),
    })
}
