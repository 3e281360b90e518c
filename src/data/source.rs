// ============================================================
// Layer 4 — CSV Fingerprint Source
// ============================================================
// Reads a fingerprint dataset from a CSV file with a header row.
//
// Column conventions:
//   - any column whose name contains "AP" is an access point
//     RSS reading, unless it starts with "TX"
//   - columns starting with "TX" hold transmit power readings
//   - `floor` (integer), `xr` and `yr` (floats) are required
//
// Empty cells and the usual NA spellings ("NaN", "NA", "null")
// become `None` so the loader can fill them later.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::fingerprint::{Coordinate, FingerprintRecord};
use crate::domain::traits::{FingerprintSchema, FingerprintSource};
use crate::error::{PipelineError, PipelineResult};

/// File name looked up when the dataset path is a directory
pub const DEFAULT_DATA_FILE: &str = "data.csv";

const FLOOR_COLUMN: &str = "floor";
const X_COLUMN: &str = "xr";
const Y_COLUMN: &str = "yr";
const POWER_PREFIX: &str = "TX";
const AP_MARKER: &str = "AP";

/// Loads fingerprint rows from a single CSV file.
pub struct CsvFingerprintSource {
    path: PathBuf,
}

impl CsvFingerprintSource {
    /// Point the source at a CSV file, or at a directory that
    /// contains `data.csv`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let path = if path.is_dir() {
            path.join(DEFAULT_DATA_FILE)
        } else {
            path.to_path_buf()
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FingerprintSource for CsvFingerprintSource {
    fn load_all(&self) -> PipelineResult<(FingerprintSchema, Vec<FingerprintRecord>)> {
        let file = std::fs::File::open(&self.path).map_err(|source| PipelineError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let layout  = ColumnLayout::from_headers(&headers)?;

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row?;
            records.push(layout.parse_row(&row, i + 1)?);
        }

        tracing::info!(
            "Read {} rows from '{}' ({} APs, {} TX power columns)",
            records.len(),
            self.path.display(),
            layout.schema.access_points.len(),
            layout.schema.power_columns.len(),
        );

        Ok((layout.schema, records))
    }
}

/// Column indices resolved once from the header row.
struct ColumnLayout {
    schema:    FingerprintSchema,
    rss_idx:   Vec<usize>,
    power_idx: Vec<usize>,
    floor_idx: usize,
    x_idx:     usize,
    y_idx:     usize,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> PipelineResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
        };

        let floor_idx = find(FLOOR_COLUMN)?;
        let x_idx     = find(X_COLUMN)?;
        let y_idx     = find(Y_COLUMN)?;

        let mut schema    = FingerprintSchema::default();
        let mut rss_idx   = Vec::new();
        let mut power_idx = Vec::new();

        for (i, name) in headers.iter().enumerate() {
            if name.starts_with(POWER_PREFIX) {
                schema.power_columns.push(name.to_string());
                power_idx.push(i);
            } else if name.contains(AP_MARKER) {
                schema.access_points.push(name.to_string());
                rss_idx.push(i);
            }
        }

        if rss_idx.is_empty() {
            return Err(PipelineError::NoAccessPoints);
        }

        Ok(Self { schema, rss_idx, power_idx, floor_idx, x_idx, y_idx })
    }

    fn parse_row(&self, row: &StringRecord, row_no: usize) -> PipelineResult<FingerprintRecord> {
        let rss = self
            .rss_idx
            .iter()
            .zip(&self.schema.access_points)
            .map(|(&i, name)| parse_optional(row.get(i).unwrap_or(""), row_no, name))
            .collect::<PipelineResult<Vec<_>>>()?;

        let power = self
            .power_idx
            .iter()
            .zip(&self.schema.power_columns)
            .map(|(&i, name)| parse_optional(row.get(i).unwrap_or(""), row_no, name))
            .collect::<PipelineResult<Vec<_>>>()?;

        let floor = parse_floor(row.get(self.floor_idx).unwrap_or(""), row_no)?;
        let x     = parse_required(row.get(self.x_idx).unwrap_or(""), row_no, X_COLUMN)?;
        let y     = parse_required(row.get(self.y_idx).unwrap_or(""), row_no, Y_COLUMN)?;

        Ok(FingerprintRecord {
            rss,
            power,
            floor,
            location: Coordinate::new(x, y),
        })
    }
}

fn is_missing(value: &str) -> bool {
    matches!(
        value,
        "" | "NaN" | "nan" | "NA" | "N/A" | "null" | "NULL" | "None"
    )
}

fn malformed(value: &str, row: usize, column: &str) -> PipelineError {
    PipelineError::MalformedValue {
        row,
        column: column.to_string(),
        value:  value.to_string(),
    }
}

fn parse_optional(value: &str, row: usize, column: &str) -> PipelineResult<Option<f64>> {
    if is_missing(value) {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| malformed(value, row, column))
}

fn parse_required(value: &str, row: usize, column: &str) -> PipelineResult<f64> {
    parse_optional(value, row, column)?.ok_or_else(|| malformed(value, row, column))
}

/// Floors are integers, but exports often write them as "1.0".
fn parse_floor(value: &str, row: usize) -> PipelineResult<i64> {
    if let Ok(floor) = value.parse::<i64>() {
        return Ok(floor);
    }
    match value.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        _ => Err(malformed(value, row, FLOOR_COLUMN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_reads_columns_and_missing_values() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "data.csv",
            "AP1,AP2,TX_AP1,TX_AP2,floor,xr,yr\n\
             -60,,20,,1,1.5,2.5\n\
             -70,NaN,18,19,2.0,3.0,4.0\n",
        );

        let (schema, rows) = CsvFingerprintSource::new(&path).load_all().unwrap();
        assert_eq!(schema.access_points, vec!["AP1", "AP2"]);
        assert_eq!(schema.power_columns, vec!["TX_AP1", "TX_AP2"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rss, vec![Some(-60.0), None]);
        assert_eq!(rows[0].power, vec![Some(20.0), None]);
        assert_eq!(rows[1].rss[1], None);
        assert_eq!(rows[1].floor, 2);
        assert_eq!(rows[0].location, Coordinate::new(1.5, 2.5));
    }

    #[test]
    fn test_directory_resolves_to_data_csv() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(&dir, DEFAULT_DATA_FILE, "AP1,floor,xr,yr\n-50,1,0,0\n");
        let source = CsvFingerprintSource::new(dir.path());
        assert!(source.path().ends_with(DEFAULT_DATA_FILE));
        let (_, rows) = source.load_all().unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir    = tempfile::tempdir().unwrap();
        let source = CsvFingerprintSource::new(dir.path().join("nope.csv"));
        assert!(matches!(source.load_all(), Err(PipelineError::Io { .. })));
    }

    #[test]
    fn test_missing_coordinate_column() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "data.csv", "AP1,floor,xr\n-50,1,0\n");
        let err  = CsvFingerprintSource::new(&path).load_all().unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == "yr"));
    }

    #[test]
    fn test_no_access_points() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "data.csv", "floor,xr,yr\n1,0,0\n");
        let err  = CsvFingerprintSource::new(&path).load_all().unwrap_err();
        assert!(matches!(err, PipelineError::NoAccessPoints));
    }

    #[test]
    fn test_malformed_rss_value() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "data.csv", "AP1,floor,xr,yr\nloud,1,0,0\n");
        let err  = CsvFingerprintSource::new(&path).load_all().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedValue { row: 1, ref column, .. } if column == "AP1"
        ));
    }
}
