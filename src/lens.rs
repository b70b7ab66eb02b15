#![warn(missing_docs)]
//! Optical properties and geometry kinds of lens bodies.
use std::fmt::Display;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::error::{BenchError, BenchResult};

/// Classification of a lens.
///
/// **Note**: This is for display / classification only. The refraction itself is fully determined by the lens geometry and
/// its refractive index.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum LensType {
    /// converging lens (thicker in the middle)
    #[default]
    Convex,
    /// diverging lens (thinner in the middle)
    Concave,
}
impl Display for LensType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Convex => write!(f, "Convex"),
            Self::Concave => write!(f, "Concave"),
        }
    }
}

/// Optical properties attached to a lens object of the scene.
///
/// These values are only read by the tracer (once per lens hit) and never modified during tracing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensProperties {
    #[serde(default)]
    lens_type: LensType,
    #[serde(default = "default_refractive_index")]
    refractive_index: f64,
    #[serde(default = "default_focal_length")]
    focal_length: f64,
}
const fn default_refractive_index() -> f64 {
    1.5
}
const fn default_focal_length() -> f64 {
    0.5
}
impl Default for LensProperties {
    /// Create a convex lens with a refractive index of 1.5 and a (nominal) focal length of 0.5 m.
    fn default() -> Self {
        Self {
            lens_type: LensType::default(),
            refractive_index: default_refractive_index(),
            focal_length: default_focal_length(),
        }
    }
}
impl LensProperties {
    /// Creates new [`LensProperties`].
    ///
    /// The `focal_length` (in meter) is informational only and not used for tracing.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the refractive index is <= 0.0 or not finite.
    ///   - the focal length is not finite.
    pub fn new(lens_type: LensType, refractive_index: f64, focal_length: f64) -> BenchResult<Self> {
        let properties = Self {
            lens_type,
            refractive_index,
            focal_length,
        };
        properties.validate()?;
        Ok(properties)
    }
    /// Check the values of these [`LensProperties`].
    ///
    /// This is necessary for properties coming from deserialization which bypass [`LensProperties::new`].
    ///
    /// # Errors
    ///
    /// This function will return an error under the same conditions as [`LensProperties::new`].
    pub fn validate(&self) -> BenchResult<()> {
        if self.refractive_index <= 0.0 || !self.refractive_index.is_finite() {
            return Err(BenchError::Scene(
                "refractive index must be >0.0 and finite".into(),
            ));
        }
        if !self.focal_length.is_finite() {
            return Err(BenchError::Scene("focal length must be finite".into()));
        }
        Ok(())
    }
    /// Returns the lens type of these [`LensProperties`].
    #[must_use]
    pub const fn lens_type(&self) -> LensType {
        self.lens_type
    }
    /// Returns the (glass side) refractive index.
    #[must_use]
    pub const fn refractive_index(&self) -> f64 {
        self.refractive_index
    }
    /// Returns the nominal focal length in meter.
    #[must_use]
    pub const fn focal_length(&self) -> f64 {
        self.focal_length
    }
    /// Returns `true` for a converging lens.
    #[must_use]
    pub fn is_convex(&self) -> bool {
        self.lens_type == LensType::Convex
    }
    /// Returns `true` for a diverging lens.
    #[must_use]
    pub fn is_concave(&self) -> bool {
        self.lens_type == LensType::Concave
    }
}
impl Display for LensProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} lens (n = {}, f = {} m)",
            self.lens_type, self.refractive_index, self.focal_length
        )
    }
}

/// Geometry kind of a lens body as seen by the lens traversal.
///
/// For spheres, entry normal and exit point can be calculated analytically. All other solids are handled generically by
/// probing the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LensGeometry {
    /// spherical lens body in world coordinates
    Sphere {
        /// center of the sphere
        center: Point3<f64>,
        /// radius of the sphere
        radius: f64,
    },
    /// any other solid
    Generic,
}
