//! Numeric conversion helpers.
//!
//! These wrap the lossy `as` casts in one place so that the rest of the crate stays free of
//! clippy cast allowances.

/// Convert a ray index / count into a float for geometric spacing.
#[must_use]
pub const fn usize_to_f64(value: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let newval = value as f64;
    newval
}
