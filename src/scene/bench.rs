//! In-memory scene made of primitive solids.
use log::debug;
use nalgebra::{Isometry3, Point3, Translation3, Vector3};

use super::{LensHit, RayHit, SceneQuery, Shape, SurfaceId};
use crate::{
    error::{BenchError, BenchResult},
    lens::{LensGeometry, LensProperties},
};

/// A rigid body of the bench: a placed [`Shape`] which is either opaque, a lens body or a pass-through volume.
#[derive(Debug, Clone)]
pub struct SceneObject {
    id: SurfaceId,
    name: String,
    shape: Shape,
    isometry: Isometry3<f64>,
    lens: Option<LensProperties>,
    pass_through: bool,
    enabled: bool,
}
impl SceneObject {
    /// Creates a new opaque [`SceneObject`] placed by the given isometry.
    #[must_use]
    pub fn new(name: &str, shape: Shape, isometry: Isometry3<f64>) -> Self {
        Self {
            id: SurfaceId::new(),
            name: name.to_owned(),
            shape,
            isometry,
            lens: None,
            pass_through: false,
            enabled: true,
        }
    }
    /// Turn this object into a lens body with the given optical properties.
    #[must_use]
    pub fn with_lens(mut self, properties: LensProperties) -> Self {
        self.lens = Some(properties);
        self
    }
    /// Mark this object as pass-through (e.g. a trigger volume). Rays traverse it without interaction.
    #[must_use]
    pub fn with_pass_through(mut self) -> Self {
        self.pass_through = true;
        self
    }
    /// Returns the id of this [`SceneObject`].
    #[must_use]
    pub const fn id(&self) -> SurfaceId {
        self.id
    }
    /// Returns the name of this [`SceneObject`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the shape of this [`SceneObject`].
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }
    /// Returns the isometry (position and orientation) of this [`SceneObject`].
    #[must_use]
    pub const fn isometry(&self) -> &Isometry3<f64> {
        &self.isometry
    }
    /// Returns the lens properties if this object is a lens body.
    #[must_use]
    pub fn lens(&self) -> Option<&LensProperties> {
        self.lens.as_ref()
    }
    /// Returns `true` if rays traverse this object without interaction.
    #[must_use]
    pub const fn is_pass_through(&self) -> bool {
        self.pass_through
    }
    /// Returns `true` if this object takes part in ray casts.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn lens_hit(&self) -> Option<LensHit> {
        let properties = self.lens?;
        let geometry = self.shape.sphere_radius().map_or(LensGeometry::Generic, |radius| {
            LensGeometry::Sphere {
                center: Point3::from(self.isometry.translation.vector),
                radius,
            }
        });
        Some(LensHit {
            properties,
            geometry,
        })
    }
    fn raycast(
        &self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        let local_origin = self.isometry.inverse_transform_point(origin);
        let local_dir = self.isometry.inverse_transform_vector(direction);
        let (distance, local_normal) = self
            .shape
            .intersect(&local_origin, &local_dir, max_distance)?;
        Some(RayHit {
            point: origin + distance * direction,
            normal: self.isometry.transform_vector(&local_normal).normalize(),
            distance,
            surface: self.id,
            lens: self.lens_hit(),
            pass_through: self.pass_through,
        })
    }
}

/// The collection of all rigid bodies of an optical bench.
#[derive(Debug, Default, Clone)]
pub struct Bench {
    objects: Vec<SceneObject>,
}
impl Bench {
    /// Creates a new empty [`Bench`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Add an object to this [`Bench`] and return its id.
    pub fn add_object(&mut self, object: SceneObject) -> SurfaceId {
        let id = object.id();
        debug!("add object '{}' ({id}) to bench", object.name());
        self.objects.push(object);
        id
    }
    /// Remove the object with the given id from this [`Bench`].
    ///
    /// # Errors
    ///
    /// This function will return an error if no object with the given id exists.
    pub fn remove_object(&mut self, id: SurfaceId) -> BenchResult<SceneObject> {
        let idx = self.index_of(id)?;
        Ok(self.objects.remove(idx))
    }
    /// Returns the object with the given id.
    #[must_use]
    pub fn object(&self, id: SurfaceId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }
    /// Returns the first object with the given name.
    #[must_use]
    pub fn object_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }
    /// Returns all objects of this [`Bench`].
    #[must_use]
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }
    /// Place the given object at a new isometry.
    ///
    /// # Errors
    ///
    /// This function will return an error if no object with the given id exists.
    pub fn set_isometry(&mut self, id: SurfaceId, isometry: Isometry3<f64>) -> BenchResult<()> {
        let idx = self.index_of(id)?;
        self.objects[idx].isometry = isometry;
        Ok(())
    }
    /// Move the given object by a translation (in world coordinates).
    ///
    /// # Errors
    ///
    /// This function will return an error if no object with the given id exists.
    pub fn translate(&mut self, id: SurfaceId, translation: &Vector3<f64>) -> BenchResult<()> {
        let idx = self.index_of(id)?;
        let object = &mut self.objects[idx];
        object.isometry = Translation3::from(*translation) * object.isometry;
        Ok(())
    }
    /// Enable or disable the given object. Disabled objects are invisible for ray casts.
    ///
    /// # Errors
    ///
    /// This function will return an error if no object with the given id exists.
    pub fn set_enabled(&mut self, id: SurfaceId, enabled: bool) -> BenchResult<()> {
        let idx = self.index_of(id)?;
        self.objects[idx].enabled = enabled;
        Ok(())
    }
    fn index_of(&self, id: SurfaceId) -> BenchResult<usize> {
        self.objects
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| BenchError::Scene(format!("object {id} not found")))
    }
}

impl SceneQuery for Bench {
    fn raycast(
        &self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        self.objects
            .iter()
            .filter(|o| o.enabled)
            .filter_map(|o| o.raycast(origin, direction, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
    fn closest_point(&self, surface: SurfaceId, point: &Point3<f64>) -> Option<Point3<f64>> {
        let object = self.object(surface)?;
        let local = object.isometry.inverse_transform_point(point);
        Some(object.isometry.transform_point(&object.shape.closest_point(&local)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use nalgebra::{point, vector};

    fn sphere_at(z: f64) -> SceneObject {
        SceneObject::new(
            "sphere",
            Shape::sphere(0.5).unwrap(),
            Isometry3::translation(0.0, 0.0, z),
        )
    }
    #[test]
    fn add_and_find() {
        let mut bench = Bench::new();
        let id = bench.add_object(sphere_at(1.0));
        assert_eq!(bench.objects().len(), 1);
        assert_eq!(bench.object(id).unwrap().name(), "sphere");
        assert_eq!(bench.object_by_name("sphere").unwrap().id(), id);
        assert!(bench.object(SurfaceId::new()).is_none());
        assert!(bench.object_by_name("other").is_none());
    }
    #[test]
    fn remove() {
        let mut bench = Bench::new();
        let id = bench.add_object(sphere_at(1.0));
        assert_matches!(
            bench.remove_object(SurfaceId::new()),
            Err(BenchError::Scene(_))
        );
        assert!(bench.remove_object(id).is_ok());
        assert!(bench.objects().is_empty());
    }
    #[test]
    fn raycast_nearest() {
        let mut bench = Bench::new();
        let far = bench.add_object(sphere_at(5.0));
        let near = bench.add_object(sphere_at(2.0));
        let hit = bench
            .raycast(&Point3::origin(), &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        assert_eq!(hit.surface, near);
        assert_relative_eq!(hit.point, point![0.0, 0.0, 1.5]);
        assert_relative_eq!(hit.normal, vector![0.0, 0.0, -1.0]);
        assert_relative_eq!(hit.distance, 1.5);
        assert!(hit.lens.is_none());
        assert!(!hit.pass_through);
        bench.set_enabled(near, false).unwrap();
        let hit = bench
            .raycast(&Point3::origin(), &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        assert_eq!(hit.surface, far);
    }
    #[test]
    fn raycast_miss() {
        let mut bench = Bench::new();
        bench.add_object(sphere_at(5.0));
        assert!(bench
            .raycast(&Point3::origin(), &vector![0.0, 1.0, 0.0], 10.0)
            .is_none());
        assert!(bench
            .raycast(&Point3::origin(), &vector![0.0, 0.0, 1.0], 2.0)
            .is_none());
    }
    #[test]
    fn raycast_lens() {
        let mut bench = Bench::new();
        bench.add_object(sphere_at(2.0).with_lens(LensProperties::default()));
        let hit = bench
            .raycast(&Point3::origin(), &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        let lens = hit.lens.unwrap();
        assert_eq!(lens.properties, LensProperties::default());
        assert_eq!(
            lens.geometry,
            LensGeometry::Sphere {
                center: point![0.0, 0.0, 2.0],
                radius: 0.5
            }
        );
    }
    #[test]
    fn raycast_generic_lens_and_pass_through() {
        let mut bench = Bench::new();
        bench.add_object(
            SceneObject::new(
                "slab",
                Shape::cuboid(vector![1.0, 1.0, 0.2]).unwrap(),
                Isometry3::translation(0.0, 0.0, 2.0),
            )
            .with_lens(LensProperties::default()),
        );
        bench.add_object(
            SceneObject::new(
                "trigger",
                Shape::quad(1.0, 1.0).unwrap(),
                Isometry3::translation(0.0, 0.0, 1.0),
            )
            .with_pass_through(),
        );
        let hit = bench
            .raycast(&Point3::origin(), &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        assert!(hit.pass_through);
        let hit = bench
            .raycast(&point![0.0, 0.0, 1.1], &vector![0.0, 0.0, 1.0], 10.0)
            .unwrap();
        assert_eq!(hit.lens.unwrap().geometry, LensGeometry::Generic);
        assert_relative_eq!(hit.point, point![0.0, 0.0, 1.9]);
    }
    #[test]
    fn move_object() {
        let mut bench = Bench::new();
        let id = bench.add_object(sphere_at(2.0));
        bench.translate(id, &vector![0.0, 0.0, 1.0]).unwrap();
        assert_relative_eq!(
            bench.object(id).unwrap().isometry().translation.vector,
            vector![0.0, 0.0, 3.0]
        );
        bench
            .set_isometry(id, Isometry3::translation(1.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(
            bench.object(id).unwrap().isometry().translation.vector,
            vector![1.0, 0.0, 0.0]
        );
        assert!(bench
            .translate(SurfaceId::new(), &vector![0.0, 0.0, 1.0])
            .is_err());
    }
    #[test]
    fn closest_point() {
        let mut bench = Bench::new();
        let id = bench.add_object(sphere_at(2.0));
        assert_relative_eq!(
            bench.closest_point(id, &point![0.0, 0.0, 5.0]).unwrap(),
            point![0.0, 0.0, 2.5]
        );
        assert_relative_eq!(
            bench.closest_point(id, &point![0.0, 0.1, 2.0]).unwrap(),
            point![0.0, 0.1, 2.0]
        );
        assert!(bench
            .closest_point(SurfaceId::new(), &Point3::origin())
            .is_none());
    }
}
