#![warn(missing_docs)]
//! Primitive solids of the bench scene.
//!
//! All calculations in this module are done in the local coordinate system of a shape. The owning
//! [`SceneObject`](super::SceneObject) is responsible for transforming rays and results.
use nalgebra::{Point3, Vector3};
use roots::{find_roots_quadratic, Roots};
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// Minimum ray parameter accepted as a hit. Avoids self intersections at the ray origin.
const MIN_HIT_DISTANCE: f64 = 1e-9;

/// Primitive solid (or flat) shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Shape {
    /// sphere centered at the local origin
    Sphere {
        /// radius in meter
        radius: f64,
    },
    /// axis aligned box centered at the local origin
    Cuboid {
        /// half of the side lengths along x, y and z in meter
        half_extents: Vector3<f64>,
    },
    /// flat rectangle in the local xy plane, visible from both sides
    Quad {
        /// half width along x in meter
        half_width: f64,
        /// half height along y in meter
        half_height: f64,
    },
}
impl Shape {
    /// Create a new spherical [`Shape`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is <= 0.0 or not finite.
    pub fn sphere(radius: f64) -> BenchResult<Self> {
        let shape = Self::Sphere { radius };
        shape.validate()?;
        Ok(shape)
    }
    /// Create a new box [`Shape`] with the given side lengths.
    ///
    /// # Errors
    ///
    /// This function will return an error if any side length is <= 0.0 or not finite.
    pub fn cuboid(size: Vector3<f64>) -> BenchResult<Self> {
        let shape = Self::Cuboid {
            half_extents: size / 2.0,
        };
        shape.validate()?;
        Ok(shape)
    }
    /// Create a new flat rectangular [`Shape`] with the given width (along x) and height (along y).
    ///
    /// # Errors
    ///
    /// This function will return an error if width or height is <= 0.0 or not finite.
    pub fn quad(width: f64, height: f64) -> BenchResult<Self> {
        let shape = Self::Quad {
            half_width: width / 2.0,
            half_height: height / 2.0,
        };
        shape.validate()?;
        Ok(shape)
    }
    /// Check the dimensions of this [`Shape`].
    ///
    /// # Errors
    ///
    /// This function will return an error if any dimension is <= 0.0 or not finite.
    pub fn validate(&self) -> BenchResult<()> {
        let valid = match self {
            Self::Sphere { radius } => radius.is_finite() && *radius > 0.0,
            Self::Cuboid { half_extents } => {
                half_extents.iter().all(|x| x.is_finite() && *x > 0.0)
            }
            Self::Quad {
                half_width,
                half_height,
            } => {
                half_width.is_finite()
                    && half_height.is_finite()
                    && *half_width > 0.0
                    && *half_height > 0.0
            }
        };
        if valid {
            Ok(())
        } else {
            Err(BenchError::Scene(
                "shape dimensions must be >0.0 and finite".into(),
            ))
        }
    }
    /// Calculate the nearest intersection of a ray with this [`Shape`].
    ///
    /// The ray is given in local coordinates, `direction` has to be normalized. For solids, a ray starting inside reports the
    /// point where it leaves the solid. The returned normal always points outwards (for solids) or against the ray (for
    /// [`Shape::Quad`]).
    ///
    /// Returns `None` if there is no intersection within `(0.0, max_distance]`.
    #[must_use]
    pub fn intersect(
        &self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<(f64, Vector3<f64>)> {
        let (t, normal) = match self {
            Self::Sphere { radius } => intersect_sphere(*radius, origin, direction)?,
            Self::Cuboid { half_extents } => intersect_cuboid(half_extents, origin, direction)?,
            Self::Quad {
                half_width,
                half_height,
            } => intersect_quad(*half_width, *half_height, origin, direction)?,
        };
        (t <= max_distance).then_some((t, normal))
    }
    /// Return the point on the surface of this [`Shape`] closest to the given point.
    ///
    /// For points inside a solid, the point itself is returned (the distance to the solid is zero).
    #[must_use]
    pub fn closest_point(&self, p: &Point3<f64>) -> Point3<f64> {
        match self {
            Self::Sphere { radius } => {
                let dist = p.coords.norm();
                if dist <= *radius {
                    *p
                } else {
                    Point3::from(p.coords * (*radius / dist))
                }
            }
            Self::Cuboid { half_extents } => Point3::new(
                p.x.clamp(-half_extents.x, half_extents.x),
                p.y.clamp(-half_extents.y, half_extents.y),
                p.z.clamp(-half_extents.z, half_extents.z),
            ),
            Self::Quad {
                half_width,
                half_height,
            } => Point3::new(
                p.x.clamp(-half_width, *half_width),
                p.y.clamp(-half_height, *half_height),
                0.0,
            ),
        }
    }
    /// Return the radius if this [`Shape`] is a sphere.
    #[must_use]
    pub const fn sphere_radius(&self) -> Option<f64> {
        if let Self::Sphere { radius } = self {
            Some(*radius)
        } else {
            None
        }
    }
}

fn intersect_sphere(
    radius: f64,
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
) -> Option<(f64, Vector3<f64>)> {
    // |o + t*d|^2 = r^2  =>  (d·d) t^2 + 2 (o·d) t + (o·o - r^2) = 0
    let o = origin.coords;
    let a = direction.dot(direction);
    let b = 2.0 * o.dot(direction);
    let c = radius.mul_add(-radius, o.dot(&o));
    let t = match find_roots_quadratic(a, b, c) {
        Roots::One(t) => t[0],
        Roots::Two(t) => {
            let (near, far) = (f64::min(t[0], t[1]), f64::max(t[0], t[1]));
            if near > MIN_HIT_DISTANCE {
                near
            } else {
                far
            }
        }
        _ => return None,
    };
    if t <= MIN_HIT_DISTANCE {
        return None;
    }
    let normal = (o + t * direction) / radius;
    Some((t, normal))
}

fn intersect_cuboid(
    half_extents: &Vector3<f64>,
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
) -> Option<(f64, Vector3<f64>)> {
    // slab method
    let mut t_near = f64::NEG_INFINITY;
    let mut t_far = f64::INFINITY;
    let mut near_axis = 0;
    let mut far_axis = 0;
    for axis in 0..3 {
        if direction[axis].abs() < f64::EPSILON {
            if origin[axis].abs() > half_extents[axis] {
                return None;
            }
            continue;
        }
        let t1 = (-half_extents[axis] - origin[axis]) / direction[axis];
        let t2 = (half_extents[axis] - origin[axis]) / direction[axis];
        let (t_min, t_max) = (t1.min(t2), t1.max(t2));
        if t_min > t_near {
            t_near = t_min;
            near_axis = axis;
        }
        if t_max < t_far {
            t_far = t_max;
            far_axis = axis;
        }
        if t_near > t_far {
            return None;
        }
    }
    let (t, axis) = if t_near > MIN_HIT_DISTANCE {
        (t_near, near_axis)
    } else if t_far > MIN_HIT_DISTANCE {
        (t_far, far_axis)
    } else {
        return None;
    };
    let hit = origin.coords + t * direction;
    let mut normal = Vector3::zeros();
    normal[axis] = hit[axis].signum();
    Some((t, normal))
}

fn intersect_quad(
    half_width: f64,
    half_height: f64,
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
) -> Option<(f64, Vector3<f64>)> {
    if direction.z.abs() < f64::EPSILON {
        return None;
    }
    let t = -origin.z / direction.z;
    if t <= MIN_HIT_DISTANCE {
        return None;
    }
    let hit = origin.coords + t * direction;
    if hit.x.abs() > half_width || hit.y.abs() > half_height {
        return None;
    }
    Some((t, Vector3::new(0.0, 0.0, -direction.z.signum())))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{point, vector};

    #[test]
    fn new() {
        assert!(Shape::sphere(0.0).is_err());
        assert!(Shape::sphere(-1.0).is_err());
        assert!(Shape::sphere(f64::NAN).is_err());
        assert!(Shape::sphere(0.1).is_ok());
        assert!(Shape::cuboid(vector![1.0, 0.0, 1.0]).is_err());
        assert!(Shape::cuboid(vector![1.0, f64::INFINITY, 1.0]).is_err());
        assert!(Shape::cuboid(vector![1.0, 1.0, 1.0]).is_ok());
        assert!(Shape::quad(0.0, 1.0).is_err());
        assert!(Shape::quad(1.0, 1.0).is_ok());
    }
    #[test]
    fn sphere_from_outside() {
        let s = Shape::sphere(1.0).unwrap();
        let (t, n) = s
            .intersect(&point![0.0, 0.0, -5.0], &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        assert_relative_eq!(t, 4.0);
        assert_relative_eq!(n, vector![0.0, 0.0, -1.0]);
    }
    #[test]
    fn sphere_from_inside() {
        let s = Shape::sphere(1.0).unwrap();
        let (t, n) = s
            .intersect(&point![0.0, 0.0, 0.0], &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        assert_relative_eq!(t, 1.0);
        assert_relative_eq!(n, vector![0.0, 0.0, 1.0]);
    }
    #[test]
    fn sphere_miss() {
        let s = Shape::sphere(1.0).unwrap();
        assert!(s
            .intersect(&point![0.0, 2.0, -5.0], &vector![0.0, 0.0, 1.0], 10.0)
            .is_none());
        // behind the ray
        assert!(s
            .intersect(&point![0.0, 0.0, 5.0], &vector![0.0, 0.0, 1.0], 10.0)
            .is_none());
        // out of range
        assert!(s
            .intersect(&point![0.0, 0.0, -5.0], &vector![0.0, 0.0, 1.0], 3.0)
            .is_none());
    }
    #[test]
    fn cuboid() {
        let s = Shape::cuboid(vector![2.0, 2.0, 2.0]).unwrap();
        let (t, n) = s
            .intersect(&point![0.5, 0.0, -5.0], &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        assert_relative_eq!(t, 4.0);
        assert_relative_eq!(n, vector![0.0, 0.0, -1.0]);
        let (t, n) = s
            .intersect(&point![0.0, 0.0, 0.0], &vector![1.0, 0.0, 0.0], 10.0)
            .unwrap();
        assert_relative_eq!(t, 1.0);
        assert_relative_eq!(n, vector![1.0, 0.0, 0.0]);
        assert!(s
            .intersect(&point![3.0, 0.0, -5.0], &vector![0.0, 0.0, 1.0], 10.0)
            .is_none());
    }
    #[test]
    fn quad() {
        let s = Shape::quad(1.0, 1.0).unwrap();
        let (t, n) = s
            .intersect(&point![0.2, 0.2, -1.0], &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        assert_relative_eq!(t, 1.0);
        assert_relative_eq!(n, vector![0.0, 0.0, -1.0]);
        let (_, n) = s
            .intersect(&point![0.2, 0.2, 1.0], &vector![0.0, 0.0, -1.0], 10.0)
            .unwrap();
        assert_relative_eq!(n, vector![0.0, 0.0, 1.0]);
        assert!(s
            .intersect(&point![0.6, 0.0, -1.0], &vector![0.0, 0.0, 1.0], 10.0)
            .is_none());
        assert!(s
            .intersect(&point![0.0, 0.0, -1.0], &vector![1.0, 0.0, 0.0], 10.0)
            .is_none());
    }
    #[test]
    fn closest_point() {
        let s = Shape::sphere(1.0).unwrap();
        assert_relative_eq!(
            s.closest_point(&point![0.0, 0.0, 0.5]),
            point![0.0, 0.0, 0.5]
        );
        assert_relative_eq!(
            s.closest_point(&point![0.0, 3.0, 0.0]),
            point![0.0, 1.0, 0.0]
        );
        let s = Shape::cuboid(vector![2.0, 2.0, 2.0]).unwrap();
        assert_relative_eq!(
            s.closest_point(&point![0.5, 0.5, 0.5]),
            point![0.5, 0.5, 0.5]
        );
        assert_relative_eq!(
            s.closest_point(&point![3.0, 0.5, -4.0]),
            point![1.0, 0.5, -1.0]
        );
        let s = Shape::quad(1.0, 1.0).unwrap();
        assert_relative_eq!(
            s.closest_point(&point![0.2, 3.0, 4.0]),
            point![0.2, 0.5, 0.0]
        );
    }
    #[test]
    fn sphere_radius() {
        assert_eq!(Shape::sphere(0.3).unwrap().sphere_radius(), Some(0.3));
        assert_eq!(Shape::quad(1.0, 1.0).unwrap().sphere_radius(), None);
    }
}
