// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// the loader pipeline does not care where rows come from:
//   - CsvFingerprintSource implements FingerprintSource
//   - tests use an in-memory source
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::fingerprint::FingerprintRecord;
use crate::error::PipelineResult;

/// Column layout discovered in a fingerprint dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FingerprintSchema {
    /// Access point (RSS) column names, in file order
    pub access_points: Vec<String>,
    /// Transmit power column names, in file order
    pub power_columns: Vec<String>,
}

/// Any component that can produce raw fingerprint rows.
pub trait FingerprintSource {
    /// Load every row from this source along with the column layout.
    fn load_all(&self) -> PipelineResult<(FingerprintSchema, Vec<FingerprintRecord>)>;
}
