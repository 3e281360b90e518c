// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or runs the network lives here.
// The data layer only knows Burn's Batcher and Dataset traits;
// models, optimisers and backends stay in this layer.
//
// What's in this layer:
//
//   model.rs      — The positioning network
//                   • RSS branch: Dense(64) → Dropout → Dense(32)
//                   • optional TX power branch of the same shape
//                   • merge block: concat → Dense(128) → Dropout
//                     → Dense(64)
//                   • two linear heads, one per coordinate
//
//   callbacks.rs  — Best-loss tracking for checkpointing and
//                   early stopping
//
//   trainer.rs    — The RegressionTrainer lifecycle
//                   (build → train → evaluate, predict)
//
//   evaluation.rs — MSE, R² and mean distance error
//
//   inferencer.rs — Raw fingerprint → coordinate, either from
//                   a live trainer or a saved checkpoint
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Dense regression network with optional power branch
pub mod model;

/// Checkpoint and early-stopping decisions
pub mod callbacks;

/// Training loop, evaluation and prediction
pub mod trainer;

/// Regression metrics
pub mod evaluation;

/// Inference engine — loads a checkpoint and predicts coordinates
pub mod inferencer;
