// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per CLI command (load, train or predict).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - No direct CSV or checkpoint file access (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Errors from the data and ml layers arrive as PipelineError
// and leave this layer as anyhow::Error with context attached.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Load + preprocess only, with an optional export
pub mod load_use_case;

// The training workflow: load → build → train → evaluate
pub mod train_use_case;

// Prediction from a saved checkpoint
pub mod predict_use_case;
