// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts
// of indoor positioning: a fingerprint (one RSS reading per
// access point, tagged with a floor and a ground-truth location)
// and the coordinate the model predicts.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A raw fingerprint row and the coordinate type
pub mod fingerprint;

// Core abstractions (traits) that other layers implement
pub mod traits;
