// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting file persistence used by the training and
// prediction workflows:
//
//   checkpoint.rs — best-model weights (Burn CompactRecorder),
//                   model config, fitted scalers and the run
//                   config as JSON, so predict can rebuild
//                   everything training used.
//
//   metrics.rs    — per-epoch losses written to a CSV file
//                   for plotting learning curves.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
