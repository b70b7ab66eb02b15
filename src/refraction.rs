#![warn(missing_docs)]
//! Refraction of a ray direction at the boundary of two media (Snell's law in vector form).
use nalgebra::Vector3;
use num::Zero;

/// Refractive index of the ambient medium (air) surrounding all lenses.
pub const AIR_REFRACTIVE_INDEX: f64 = 1.0;

/// Fraction of the surface normal added to the direction in case of total internal reflection.
const TIR_NORMAL_BIAS: f64 = 0.1;

/// Refract a direction at a surface using Snell's law.
///
/// `direction` and `normal` are normalized internally, so the caller may pass vectors of any length. The `normal` must point
/// towards the incoming ray (i.e. against `direction`). `n1` is the refractive index of the medium the ray is leaving, `n2` the
/// one of the medium it is entering.
///
/// Vector form (with `eta = n1 / n2` and `cos_i = -normal · direction`):
///
/// `t = eta * d + (eta * cos_i - sqrt(1 - eta² (1 - cos_i²))) * n`
///
/// In case of total internal reflection (negative radicand) the ray is **not** reflected. Instead the incoming direction is
/// slightly tilted towards `normal` and returned. Hence, the result always has a positive dot product with `direction` and a
/// ray never reverses on a lens boundary.
///
/// The returned vector is always normalized. A zero-length or non-finite `direction` is returned as is. If the ratio of
/// the refractive indices is not positive and finite, the ray continues unrefracted.
#[must_use]
pub fn refract(direction: &Vector3<f64>, normal: &Vector3<f64>, n1: f64, n2: f64) -> Vector3<f64> {
    if direction.is_zero() || !is_finite(direction) {
        return *direction;
    }
    let d = direction.normalize();
    let n = unit_or(normal, -d);

    let eta = n1 / n2;
    if !eta.is_finite() || eta <= 0.0 {
        return d;
    }
    let cos_i = -n.dot(&d);
    let cos_t2 = (eta * eta).mul_add(-cos_i.mul_add(-cos_i, 1.0), 1.0);
    if cos_t2 < 0.0 {
        return unit_or(&(d + TIR_NORMAL_BIAS * n), d);
    }
    unit_or(&(eta * d + eta.mul_add(cos_i, -cos_t2.sqrt()) * n), d)
}

fn is_finite(v: &Vector3<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Normalized `v`, or `fallback` if `v` is (close to) zero or not finite.
fn unit_or(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(f64::EPSILON)
        .filter(is_finite)
        .unwrap_or(fallback)
}
