#![warn(missing_docs)]
//! Tracing of a single ray through the scene.
use log::debug;
use nalgebra::{Point3, Vector3};

use crate::{
    lens_traversal::traverse_lens,
    ray_definition::RayColor,
    scene::SceneQuery,
};

/// Distance a ray is moved past a pass-through surface before it is cast again.
const PASS_THROUGH_NUDGE: f64 = 0.001;
/// Maximum number of consecutive pass-through surfaces skipped by a ray.
const MAX_PASS_THROUGH_SKIPS: usize = 64;
/// Number of bounces consumed by traversing a lens (entry and exit refraction).
const BOUNCES_PER_LENS: usize = 2;

/// The path of a traced ray: an ordered list of points and its display color.
///
/// The point buffer is reused between trace passes. It is cleared but not reallocated.
#[derive(Debug, Clone, PartialEq)]
pub struct TracePath {
    points: Vec<Point3<f64>>,
    color: RayColor,
}
impl TracePath {
    /// Creates a new, empty [`TracePath`] with the given display color.
    #[must_use]
    pub fn new(color: RayColor) -> Self {
        Self {
            points: Vec::with_capacity(16),
            color,
        }
    }
    /// Returns the points of this [`TracePath`].
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }
    /// Returns the display color of this [`TracePath`].
    #[must_use]
    pub const fn color(&self) -> RayColor {
        self.color
    }
    /// Returns `true` if no point has been traced (yet).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    /// Mutable access to the point buffer for the tracer.
    pub(crate) fn buffer_mut(&mut self) -> &mut Vec<Point3<f64>> {
        &mut self.points
    }
}

/// Limits applied while tracing a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceLimits {
    /// maximum length of a single ray segment (ray cast range), in meter
    pub max_distance: f64,
    /// maximum number of bounces (a lens consumes two)
    pub max_bounces: usize,
}

/// The terminal state of a traced ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// the ray hit a surface without optical properties
    OpaqueHit,
    /// the ray did not hit anything and was extended to the maximum distance
    Miss,
    /// the ray hit a lens but traversing it would exceed the bounce limit
    BounceLimit,
    /// the ray passed too many pass-through surfaces in a row
    PassThroughLimit,
}

/// Trace one ray through the scene.
///
/// The ray starts at `origin` travelling along `direction` (normalized). All points of the path are written into `path`
/// (which is cleared first), starting with `origin`. `refractive_index_offset` is added to the base refractive index of
/// every lens hit (chromatic dispersion).
///
/// The ray is cast up to `limits.max_distance`:
///   - pass-through surfaces are skipped without consuming a bounce.
///   - lens surfaces hand over to [`traverse_lens`] and consume two bounces. If that would exceed `limits.max_bounces`,
///     the ray ends at the lens surface.
///   - any other surface terminates the ray at the hit point.
///   - if nothing is hit, the path is extended by `limits.max_distance` and the ray ends.
pub fn trace_ray<S: SceneQuery + ?Sized>(
    scene: &S,
    origin: Point3<f64>,
    direction: Vector3<f64>,
    refractive_index_offset: f64,
    limits: &TraceLimits,
    path: &mut Vec<Point3<f64>>,
    verbose: bool,
) -> TraceOutcome {
    path.clear();
    path.push(origin);
    let mut ray_origin = origin;
    let mut ray_dir = direction;
    let mut bounces = 0;
    let mut skips = 0;
    loop {
        let Some(hit) = scene.raycast(&ray_origin, &ray_dir, limits.max_distance) else {
            path.push(ray_origin + limits.max_distance * ray_dir);
            return TraceOutcome::Miss;
        };
        if hit.pass_through {
            skips += 1;
            if skips > MAX_PASS_THROUGH_SKIPS {
                debug!("ray passed too many pass-through surfaces, stopping");
                path.push(hit.point);
                return TraceOutcome::PassThroughLimit;
            }
            ray_origin = hit.point + PASS_THROUGH_NUDGE * ray_dir;
            continue;
        }
        skips = 0;
        let Some(lens) = hit.lens.as_ref() else {
            path.push(hit.point);
            return TraceOutcome::OpaqueHit;
        };
        if bounces + BOUNCES_PER_LENS > limits.max_bounces {
            path.push(hit.point);
            return TraceOutcome::BounceLimit;
        }
        let refractive_index = lens.properties.refractive_index() + refractive_index_offset;
        let (exit_origin, exit_dir) = traverse_lens(
            scene,
            &hit,
            lens,
            &ray_dir,
            refractive_index,
            path,
            verbose,
        );
        ray_origin = exit_origin;
        ray_dir = exit_dir;
        bounces += BOUNCES_PER_LENS;
    }
}
