#![warn(missing_docs)]
//! The scene as seen by the tracer.
//!
//! The tracing engine does not own any geometry. It only queries the scene through the [`SceneQuery`] trait, which is
//! implemented by the in-memory [`Bench`] of this crate but could as well be backed by any physics / collision system.
mod bench;
mod shape;

pub use bench::{Bench, SceneObject};
pub use shape::Shape;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use crate::lens::{LensGeometry, LensProperties};

/// Identifier of a surface (scene object) returned by ray casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(Uuid);
impl SurfaceId {
    /// Create a new random [`SurfaceId`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}
impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}
impl Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optical information attached to a hit on a lens body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensHit {
    /// optical properties of the lens
    pub properties: LensProperties,
    /// geometry kind of the lens body (used to select the exit point strategy)
    pub geometry: LensGeometry,
}

/// Result of a successful ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// intersection point in world coordinates
    pub point: Point3<f64>,
    /// surface normal at the intersection point (normalized)
    pub normal: Vector3<f64>,
    /// distance from the ray origin to the intersection point
    pub distance: f64,
    /// the surface that was hit
    pub surface: SurfaceId,
    /// `Some` if the surface is the boundary of a lens body, `None` for opaque surfaces
    pub lens: Option<LensHit>,
    /// `true` for surfaces which rays traverse without any interaction
    pub pass_through: bool,
}

/// Read access to the scene geometry needed for tracing.
pub trait SceneQuery {
    /// Cast a ray into the scene and return the nearest hit within `max_distance`.
    ///
    /// `direction` must be normalized. Returns `None` if nothing was hit.
    fn raycast(
        &self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit>;
    /// Return the point on the given surface closest to `point`.
    ///
    /// For points inside a solid body, the point itself is returned. Returns `None` if the surface is unknown.
    fn closest_point(&self, surface: SurfaceId, point: &Point3<f64>) -> Option<Point3<f64>>;
}
