#![warn(missing_docs)]
//! Propagation of a ray through a lens body.
//!
//! A ray hitting a lens is refracted at the entry surface, travels in a straight line through the lens body and is
//! refracted again at the exit surface. For spherical lens bodies, the exit point is calculated analytically. For all
//! other solids, it is searched for by marching along the ray inside the body.
//!
//! None of the functions in this module fail. Degenerate situations (missing back-cast hits, no exit found) are resolved by
//! approximations so that a ray always continues.
use log::debug;
use nalgebra::{Point3, Vector3};
use roots::{find_roots_quadratic, Roots};

use crate::{
    lens::LensGeometry,
    refraction::{refract, AIR_REFRACTIVE_INDEX},
    scene::{LensHit, RayHit, SceneQuery, SurfaceId},
};

/// Distance the ray origin is moved into the lens after the entry refraction.
const ENTRY_OFFSET: f64 = 0.001;
/// Distance the returned ray origin is moved out of the lens after the exit refraction.
const EXIT_OFFSET: f64 = 0.001;
/// Start distance (backwards) of the back-cast ray for determining the entry normal of generic solids.
const CAST_BACKOFF: f64 = 0.01;
/// Step size while marching through a generic solid.
const MARCH_STEP: f64 = 0.01;
/// Maximum distance travelled inside a solid while searching for the exit.
const MAX_TRAVEL_DISTANCE: f64 = 1.0;
/// A point closer than this to the closest surface point is considered inside the solid.
const INSIDE_TOLERANCE: f64 = 1e-4;
/// Travel distance of a forced exit if no exit point could be found.
const FORCED_EXIT_DISTANCE: f64 = 0.2;

/// Trace a ray through a lens body.
///
/// `hit` is the ray cast result on the lens surface, `lens` its optical information and `incoming` the (normalized)
/// direction of the ray before hitting the lens. `refractive_index` is the effective refractive index used for this ray
/// (lens base index plus a possible chromatic offset).
///
/// The entry point and the exit point are appended to `path`. The function returns the origin and the direction of the
/// ray after leaving the lens. The origin is slightly moved outwards in order to not hit the same surface again.
pub fn traverse_lens<S: SceneQuery + ?Sized>(
    scene: &S,
    hit: &RayHit,
    lens: &LensHit,
    incoming: &Vector3<f64>,
    refractive_index: f64,
    path: &mut Vec<Point3<f64>>,
    verbose: bool,
) -> (Point3<f64>, Vector3<f64>) {
    let entry_point = hit.point;
    let entry_normal = match lens.geometry {
        LensGeometry::Sphere { center, .. } => (entry_point - center)
            .try_normalize(f64::EPSILON)
            .unwrap_or(-incoming),
        LensGeometry::Generic => cast_entry_normal(scene, hit.surface, &entry_point, incoming),
    };
    let inside_dir = refract(incoming, &entry_normal, AIR_REFRACTIVE_INDEX, refractive_index);
    if verbose {
        debug!(
            "entry refraction: n1={AIR_REFRACTIVE_INDEX} -> n2={refractive_index}, direction={inside_dir:?}"
        );
    }
    path.push(entry_point);
    let inside_origin = entry_point + ENTRY_OFFSET * inside_dir;

    let exit = match lens.geometry {
        LensGeometry::Sphere { center, radius } => {
            sphere_exit(&inside_origin, &inside_dir, &center, radius).or_else(|| {
                debug!("analytic lens exit failed, falling back to marching");
                march_exit(scene, hit.surface, &inside_origin, &inside_dir, Some(&center))
            })
        }
        LensGeometry::Generic => march_exit(scene, hit.surface, &inside_origin, &inside_dir, None),
    };
    let (exit_point, exit_normal) = exit.unwrap_or_else(|| {
        debug!("could not find lens exit, forcing exit");
        (inside_origin + FORCED_EXIT_DISTANCE * inside_dir, inside_dir)
    });
    path.push(exit_point);

    let exit_dir = refract(
        &inside_dir,
        &(-exit_normal),
        refractive_index,
        AIR_REFRACTIVE_INDEX,
    );
    if verbose {
        debug!(
            "exit refraction: n1={refractive_index} -> n2={AIR_REFRACTIVE_INDEX}, direction={exit_dir:?}"
        );
    }
    (exit_point + EXIT_OFFSET * exit_dir, exit_dir)
}

/// Determine the entry normal of a generic solid by a short back cast through the entry point.
fn cast_entry_normal<S: SceneQuery + ?Sized>(
    scene: &S,
    surface: SurfaceId,
    entry_point: &Point3<f64>,
    incoming: &Vector3<f64>,
) -> Vector3<f64> {
    let cast_origin = entry_point - CAST_BACKOFF * incoming;
    match scene.raycast(&cast_origin, incoming, 2.0 * CAST_BACKOFF) {
        Some(back_hit) if back_hit.surface == surface => back_hit.normal,
        _ => {
            debug!("entry back cast missed lens surface, using reversed ray direction as normal");
            -incoming
        }
    }
}

/// Analytic exit point and (outward) exit normal of a ray starting inside a sphere.
///
/// Solves `|p + t*d|² = r²` with `p` being the ray origin relative to the sphere center and takes the larger positive
/// root (the far intersection along the travel direction).
fn sphere_exit(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    center: &Point3<f64>,
    radius: f64,
) -> Option<(Point3<f64>, Vector3<f64>)> {
    let p = origin - center;
    let a = dir.dot(dir);
    let b = 2.0 * p.dot(dir);
    let c = radius.mul_add(-radius, p.dot(&p));
    let t = match find_roots_quadratic(a, b, c) {
        Roots::One(t) => t[0],
        Roots::Two(t) => f64::max(t[0], t[1]),
        _ => return None,
    };
    if !t.is_finite() || t <= 0.0 {
        return None;
    }
    let exit_point = origin + t * dir;
    let normal = (exit_point - center).try_normalize(f64::EPSILON)?;
    Some((exit_point, normal))
}

/// Search the exit point of a solid by marching along the ray in fixed steps.
///
/// The first sample point found outside the solid determines the exit: the exit point is the closest surface point to
/// that sample. The outward normal is calculated geometrically if a sphere center is given, otherwise by a short
/// reverse cast onto the surface.
fn march_exit<S: SceneQuery + ?Sized>(
    scene: &S,
    surface: SurfaceId,
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    sphere_center: Option<&Point3<f64>>,
) -> Option<(Point3<f64>, Vector3<f64>)> {
    let mut travelled = MARCH_STEP;
    while travelled < MAX_TRAVEL_DISTANCE {
        let test_point = origin + travelled * dir;
        let closest = scene.closest_point(surface, &test_point)?;
        if (test_point - closest).norm() >= INSIDE_TOLERANCE {
            let normal = sphere_center.map_or_else(
                || cast_exit_normal(scene, surface, &test_point, &closest, dir),
                |center| (closest - center).try_normalize(f64::EPSILON).unwrap_or(*dir),
            );
            return Some((closest, normal));
        }
        travelled += MARCH_STEP;
    }
    None
}

fn cast_exit_normal<S: SceneQuery + ?Sized>(
    scene: &S,
    surface: SurfaceId,
    test_point: &Point3<f64>,
    closest: &Point3<f64>,
    dir: &Vector3<f64>,
) -> Vector3<f64> {
    match scene.raycast(test_point, &(-dir), 2.0 * MARCH_STEP) {
        Some(back_hit) if back_hit.surface == surface => back_hit.normal,
        _ => (test_point - closest)
            .try_normalize(f64::EPSILON)
            .unwrap_or(*dir),
    }
}
