//! Null-safe conversion between wire values and typed fields
//!
//! Every getter here returns the caller's default for a missing, blank or
//! malformed value instead of failing. Service records are full of optional
//! and inconsistently typed fields; the tolerance lives in this module so the
//! entity types above it can stay plain structs.

pub mod code;
pub mod json;
pub mod xml;

pub use code::{Code, WireCode};

/// Round to two decimal places, the precision of every monetary amount
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
