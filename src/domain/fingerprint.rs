// ============================================================
// Layer 3 — Fingerprint Domain Types
// ============================================================
// A fingerprint is the vector of received signal strengths
// (RSS) measured at one physical location, one value per
// access point (AP). Some APs are out of range at a given spot,
// so each reading is optional until the loader fills the gaps
// with a sentinel value.
//
// Example row (2 APs, floor 1):
//   AP1 = -67, AP2 = (missing), floor = 1, xr = 3.5, yr = 12.0

use serde::{Deserialize, Serialize};

/// One row of the raw dataset, before filling and scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// RSS reading per access point column, in column order.
    /// `None` means the AP was not heard at this location.
    pub rss: Vec<Option<f64>>,

    /// Transmit power per TX column, in column order.
    /// Empty when the dataset carries no power columns.
    pub power: Vec<Option<f64>>,

    /// Building level the fingerprint was recorded on
    pub floor: i64,

    /// Ground-truth location
    pub location: Coordinate,
}

impl FingerprintRecord {
    /// Number of RSS readings that are missing in this row
    pub fn missing_rss(&self) -> usize {
        self.rss.iter().filter(|v| v.is_none()).count()
    }
}

/// A 2D position in the building's coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another coordinate
    pub fn distance(&self, other: &Coordinate) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}
