// ============================================================
// Layer 5 — Regression Metrics
// ============================================================
// MSE and R² computed independently for the x and y coordinate.
//
//   MSE = mean((actual - predicted)²)
//   R²  = 1 - SS_res / SS_tot
//
// When the ground truth is constant (SS_tot = 0), R² is 1 for a
// perfect prediction and 0 otherwise.

use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::fingerprint::Coordinate;

pub fn mean_squared_error(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sum / actual.len() as f64
}

pub fn r2_score(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    let mean = actual.sum() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Units the metrics are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricSpace {
    /// Inverse-transformed back to building coordinates
    Original,
    /// Left in scaled space (the preprocessor could not be inverted)
    Scaled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mse_x:   f64,
    pub mse_y:   f64,
    pub r2_x:    f64,
    pub r2_y:    f64,
    /// Mean Euclidean distance between predicted and actual positions
    pub mean_distance_error: f64,
    pub samples: usize,
    pub space:   MetricSpace,
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "-=-=-=-=-=-=-=-=- Metrics Evaluation -=-=-=-=-=-=-=-=-")?;
        writeln!(f, "Deep Neural Network (Regression), {} test samples", self.samples)?;
        if self.space == MetricSpace::Scaled {
            writeln!(f, "(metrics in scaled space)")?;
        }
        writeln!(f, "MSE for X Coordinates:      {:.6}", self.mse_x)?;
        writeln!(f, "MSE for Y Coordinates:      {:.6}", self.mse_y)?;
        writeln!(f)?;
        writeln!(f, "R2 Score for X Coordinates: {:.6}", self.r2_x)?;
        writeln!(f, "R2 Score for Y Coordinates: {:.6}", self.r2_y)?;
        writeln!(f)?;
        writeln!(f, "Mean distance error:        {:.6}", self.mean_distance_error)?;
        write!(f, "-=-=-=-=-=-=-=-=- Metrics Evaluation -=-=-=-=-=-=-=-=-")
    }
}

/// Score an `n × 2` matrix of predicted (x, y) pairs against the truth.
pub fn evaluate_predictions(
    actual:    ArrayView2<f64>,
    predicted: ArrayView2<f64>,
    space:     MetricSpace,
) -> EvaluationReport {
    let (ax, ay) = (actual.column(0), actual.column(1));
    let (px, py) = (predicted.column(0), predicted.column(1));

    let samples = actual.len_of(Axis(0));
    let mean_distance_error = if samples == 0 {
        f64::NAN
    } else {
        actual
            .outer_iter()
            .zip(predicted.outer_iter())
            .map(|(a, p)| Coordinate::new(a[0], a[1]).distance(&Coordinate::new(p[0], p[1])))
            .sum::<f64>()
            / samples as f64
    };

    EvaluationReport {
        mse_x: mean_squared_error(ax, px),
        mse_y: mean_squared_error(ay, py),
        r2_x:  r2_score(ax, px),
        r2_y:  r2_score(ay, py),
        mean_distance_error,
        samples,
        space,
    }
}
