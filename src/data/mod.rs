// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV file to tensor batches.
//
//   data.csv
//       │
//       ▼
//   CsvFingerprintSource → parses rows, finds AP / TX columns
//       │
//       ▼
//   FingerprintLoader    → floor filter, split, fill, scale
//       │
//       ▼
//   ProcessedDataset     → raw + scaled matrices, fitted scalers
//       │
//       ▼
//   FingerprintDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   FingerprintBatcher   → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads fingerprint rows from CSV
pub mod source;

/// Floor filter, split, fill and scale
pub mod loader;

/// Standard / min-max / normalization scalers
pub mod preprocessor;

/// Processed splits and Burn's Dataset implementation
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits rows into train/test sets
pub mod splitter;
