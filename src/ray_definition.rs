#![warn(missing_docs)]
//! Generation of the individual rays of an emitter from a ray pattern.
use std::{f64::consts::PI, fmt::Display};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::utils::usize_to_f64;

/// Display color of a ray (linear RGB, components in the range `0.0..=1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayColor {
    /// red component
    pub r: f32,
    /// green component
    pub g: f32,
    /// blue component
    pub b: f32,
}
impl RayColor {
    /// pure red
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);
    /// pure green
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0);
    /// pure blue
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0);
    /// cyan (default ray color)
    pub const CYAN: Self = Self::new(0.0, 1.0, 1.0);

    /// Creates a new [`RayColor`].
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}
impl Default for RayColor {
    fn default() -> Self {
        Self::CYAN
    }
}

/// Ray patterns an emitter can produce.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum RayPattern {
    /// a single ray along the emission axis
    #[default]
    Single,
    /// rays evenly distributed on a circle around the emission axis
    MultiRay,
    /// vertically distributed red / green / blue triplets (visualizes chromatic aberration)
    ChromaticFan,
    /// vertically distributed parallel rays of the same color (visualizes spherical aberration)
    ParallelFan,
}
impl Display for RayPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::Single => "single ray",
            Self::MultiRay => "multi ray",
            Self::ChromaticFan => "chromatic fan",
            Self::ParallelFan => "parallel fan",
        };
        write!(f, "{msg}")
    }
}

/// Definition of a single ray of an emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayDefinition {
    offset: Vector3<f64>,
    color: RayColor,
    refractive_index_offset: f64,
}
impl RayDefinition {
    /// Creates a new [`RayDefinition`].
    #[must_use]
    pub const fn new(offset: Vector3<f64>, color: RayColor, refractive_index_offset: f64) -> Self {
        Self {
            offset,
            color,
            refractive_index_offset,
        }
    }
    /// Returns the start position of the ray relative to the emitter (in emitter coordinates).
    #[must_use]
    pub const fn offset(&self) -> &Vector3<f64> {
        &self.offset
    }
    /// Returns the display color of the ray.
    #[must_use]
    pub const fn color(&self) -> RayColor {
        self.color
    }
    /// Returns the offset added to the base refractive index of every lens hit by this ray.
    #[must_use]
    pub const fn refractive_index_offset(&self) -> f64 {
        self.refractive_index_offset
    }
}

/// Parameters controlling the generation of [`RayDefinition`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternParameters {
    /// the ray pattern
    pub pattern: RayPattern,
    /// number of rays (ignored for [`RayPattern::Single`])
    pub number_of_rays: usize,
    /// radius (multi ray) or full height (fans) of the pattern in meter
    pub ray_spread: f64,
    /// color of all rays of non-chromatic patterns
    pub ray_color: RayColor,
    /// difference of the refractive index between red and blue rays
    pub chromatic_spread: f64,
}

/// Expand a ray pattern into the list of its ray definitions.
///
/// The offsets lie in the xy plane of the emitter (perpendicular to the emission axis along z):
///   - [`RayPattern::Single`]: one ray without offset.
///   - [`RayPattern::MultiRay`]: `number_of_rays` rays evenly spaced on a circle of radius `ray_spread`.
///   - [`RayPattern::ChromaticFan`]: `number_of_rays / 3` vertical tiers linearly spread over `ray_spread`. Each tier
///     contains a red, a green and a blue ray with refractive index offsets of `-Δ/2`, `0` and `+Δ/2` (`Δ` being the
///     chromatic spread).
///   - [`RayPattern::ParallelFan`]: `number_of_rays` rays linearly spread over `ray_spread` along y.
///
/// The result might be empty (e.g. a chromatic fan with less than 3 rays).
#[must_use]
pub fn generate_ray_definitions(params: &PatternParameters) -> Vec<RayDefinition> {
    match params.pattern {
        RayPattern::Single => vec![RayDefinition::new(Vector3::zeros(), params.ray_color, 0.0)],
        RayPattern::MultiRay => {
            let angle_step = 2.0 * PI / usize_to_f64(params.number_of_rays.max(1));
            (0..params.number_of_rays)
                .map(|i| {
                    let angle = usize_to_f64(i) * angle_step;
                    let offset = Vector3::new(
                        angle.cos() * params.ray_spread,
                        angle.sin() * params.ray_spread,
                        0.0,
                    );
                    RayDefinition::new(offset, params.ray_color, 0.0)
                })
                .collect()
        }
        RayPattern::ChromaticFan => {
            let tiers = params.number_of_rays / 3;
            let half_spread = params.chromatic_spread / 2.0;
            let triplet = [
                (RayColor::RED, -half_spread),
                (RayColor::GREEN, 0.0),
                (RayColor::BLUE, half_spread),
            ];
            (0..tiers)
                .flat_map(move |i| {
                    let offset = vertical_offset(i, tiers, params.ray_spread);
                    triplet
                        .into_iter()
                        .map(move |(color, n_offset)| RayDefinition::new(offset, color, n_offset))
                })
                .collect()
        }
        RayPattern::ParallelFan => (0..params.number_of_rays)
            .map(|i| {
                RayDefinition::new(
                    vertical_offset(i, params.number_of_rays, params.ray_spread),
                    params.ray_color,
                    0.0,
                )
            })
            .collect(),
    }
}

/// Vertical offset of position `index` out of `count` positions linearly spread over `spread` (centered around zero).
fn vertical_offset(index: usize, count: usize, spread: f64) -> Vector3<f64> {
    let t = if count > 1 {
        usize_to_f64(index) / usize_to_f64(count - 1)
    } else {
        0.5
    };
    Vector3::new(0.0, (t - 0.5) * spread, 0.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    fn params(pattern: RayPattern, number_of_rays: usize) -> PatternParameters {
        PatternParameters {
            pattern,
            number_of_rays,
            ray_spread: 0.02,
            ray_color: RayColor::CYAN,
            chromatic_spread: 0.02,
        }
    }
    #[test]
    fn single() {
        let defs = generate_ray_definitions(&params(RayPattern::Single, 7));
        assert_eq!(defs.len(), 1);
        assert_relative_eq!(*defs[0].offset(), Vector3::zeros());
        assert_eq!(defs[0].color(), RayColor::CYAN);
        assert_eq!(defs[0].refractive_index_offset(), 0.0);
    }
    #[test]
    fn multi_ray() {
        let defs = generate_ray_definitions(&params(RayPattern::MultiRay, 4));
        assert_eq!(defs.len(), 4);
        for def in &defs {
            assert_relative_eq!(def.offset().norm(), 0.02, epsilon = 1e-12);
            assert_relative_eq!(def.offset().z, 0.0);
            assert_eq!(def.refractive_index_offset(), 0.0);
        }
        assert_relative_eq!(*defs[0].offset(), Vector3::new(0.02, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(*defs[1].offset(), Vector3::new(0.0, 0.02, 0.0), epsilon = 1e-12);
        assert_relative_eq!(*defs[2].offset(), Vector3::new(-0.02, 0.0, 0.0), epsilon = 1e-12);
        assert!(generate_ray_definitions(&params(RayPattern::MultiRay, 0)).is_empty());
    }
    #[test]
    fn chromatic_fan() {
        let defs = generate_ray_definitions(&params(RayPattern::ChromaticFan, 9));
        assert_eq!(defs.len(), 9);
        for tier in defs.chunks(3) {
            assert_eq!(tier[0].color(), RayColor::RED);
            assert_eq!(tier[1].color(), RayColor::GREEN);
            assert_eq!(tier[2].color(), RayColor::BLUE);
            assert_relative_eq!(tier[0].refractive_index_offset(), -0.01);
            assert_relative_eq!(tier[1].refractive_index_offset(), 0.0);
            assert_relative_eq!(tier[2].refractive_index_offset(), 0.01);
            assert_eq!(tier[0].offset(), tier[1].offset());
            assert_eq!(tier[1].offset(), tier[2].offset());
        }
        assert_relative_eq!(defs[0].offset().y, -0.01);
        assert_relative_eq!(defs[3].offset().y, 0.0);
        assert_relative_eq!(defs[6].offset().y, 0.01);
    }
    #[test]
    fn chromatic_fan_partial_triplets() {
        // remainder rays are dropped
        assert_eq!(
            generate_ray_definitions(&params(RayPattern::ChromaticFan, 8)).len(),
            6
        );
        let defs = generate_ray_definitions(&params(RayPattern::ChromaticFan, 3));
        assert_eq!(defs.len(), 3);
        // a single tier is centered
        assert_relative_eq!(defs[0].offset().y, 0.0);
        assert!(generate_ray_definitions(&params(RayPattern::ChromaticFan, 2)).is_empty());
    }
    #[test]
    fn parallel_fan() {
        let defs = generate_ray_definitions(&params(RayPattern::ParallelFan, 5));
        assert_eq!(defs.len(), 5);
        let heights: Vec<f64> = defs.iter().map(|d| d.offset().y).collect();
        let expected = [-0.01, -0.005, 0.0, 0.005, 0.01];
        for (h, e) in heights.iter().zip(expected) {
            assert_relative_eq!(*h, e, epsilon = 1e-12);
        }
        assert!(defs
            .iter()
            .all(|d| d.refractive_index_offset() == 0.0 && d.color() == RayColor::CYAN));
        let defs = generate_ray_definitions(&params(RayPattern::ParallelFan, 1));
        assert_relative_eq!(defs[0].offset().y, 0.0);
    }
    #[test]
    fn display() {
        let names: Vec<String> = RayPattern::iter().map(|p| p.to_string()).collect();
        assert_eq!(
            names,
            vec!["single ray", "multi ray", "chromatic fan", "parallel fan"]
        );
    }
    #[test]
    fn deserialize_pattern() {
        let p: RayPattern = serde_yaml::from_str("ChromaticFan").unwrap();
        assert_eq!(p, RayPattern::ChromaticFan);
    }
}
