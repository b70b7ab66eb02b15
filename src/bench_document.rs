#![warn(missing_docs)]
//! Description of a complete optical bench in a YAML document.
//!
//! A bench document lists the scene objects (shape, pose, optional lens properties) and the ray emitters. It is turned
//! into an [`OpticBench`], which bundles the scene, the emitters and their registry.
//!
//! ```yaml
//! objects:
//!   - name: lens
//!     shape: { type: Sphere, radius: 0.5 }
//!     position: [0.0, 0.0, 2.0]
//!     lens: { lens_type: Convex, refractive_index: 1.5, focal_length: 0.75 }
//! emitters:
//!   - name: laser
//!     position: [0.0, 0.0, 0.0]
//!     rotation: [0.0, 0.0, 0.0]
//!     config: { pattern: ChromaticFan, number_of_rays: 9 }
//! ```
use std::{fs, path::Path};

use log::{info, warn};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use uom::si::{angle::radian, f64::Time};

use crate::{
    degree,
    emitter::{EmitterConfig, EmitterId, RayEmitter},
    error::{BenchError, BenchResult},
    lens::LensProperties,
    registry::EmitterRegistry,
    scene::{Bench, SceneObject, Shape, SurfaceId},
    sink::PathSink,
};

fn default_true() -> bool {
    true
}

/// Declaration of a scene object in a [`BenchDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDeclaration {
    /// name of the object
    pub name: String,
    /// geometric shape
    pub shape: Shape,
    /// position in meter
    #[serde(default)]
    pub position: [f64; 3],
    /// rotation (roll, pitch, yaw) in degrees
    #[serde(default)]
    pub rotation: [f64; 3],
    /// optical properties if the object is a lens
    #[serde(default)]
    pub lens: Option<LensProperties>,
    /// rays pass through the object without interaction
    #[serde(default)]
    pub pass_through: bool,
    /// object takes part in ray casts
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Declaration of a ray emitter in a [`BenchDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterDeclaration {
    /// name of the emitter
    pub name: String,
    /// position in meter
    #[serde(default)]
    pub position: [f64; 3],
    /// rotation (roll, pitch, yaw) in degrees. Rays are emitted along the rotated z axis.
    #[serde(default)]
    pub rotation: [f64; 3],
    /// emitter configuration
    #[serde(default)]
    pub config: EmitterConfig,
    /// emitter is active
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A complete bench description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchDocument {
    /// scene objects
    #[serde(default)]
    pub objects: Vec<ObjectDeclaration>,
    /// ray emitters
    #[serde(default)]
    pub emitters: Vec<EmitterDeclaration>,
}
impl BenchDocument {
    /// Parse a [`BenchDocument`] from a YAML string.
    ///
    /// # Errors
    ///
    /// This function will return an error if the string is not a valid bench document.
    pub fn from_yaml(yaml: &str) -> BenchResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| BenchError::Document(format!("parsing of bench document failed: {e}")))
    }
    /// Read a [`BenchDocument`] from a YAML file.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file cannot be read or is not a valid bench document.
    pub fn from_file(path: &Path) -> BenchResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            BenchError::Document(format!("cannot read file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&contents)
    }
    /// Serialize this [`BenchDocument`] into YAML.
    ///
    /// # Errors
    ///
    /// This function will return an error if the serialization fails.
    pub fn to_yaml(&self) -> BenchResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| BenchError::Document(format!("serialization of bench document failed: {e}")))
    }
}

fn isometry(position: &[f64; 3], rotation_deg: &[f64; 3]) -> Isometry3<f64> {
    let [roll, pitch, yaw] = rotation_deg.map(|angle| degree!(angle).get::<radian>());
    Isometry3::from_parts(
        Translation3::new(position[0], position[1], position[2]),
        UnitQuaternion::from_euler_angles(roll, pitch, yaw),
    )
}

/// An optical bench: the scene, the emitters placed in it and the registry used to notify them about changes.
#[derive(Debug, Clone, Default)]
pub struct OpticBench {
    scene: Bench,
    emitters: Vec<RayEmitter>,
    registry: EmitterRegistry,
}
impl OpticBench {
    /// Creates a new, empty [`OpticBench`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Build an [`OpticBench`] from a [`BenchDocument`].
    ///
    /// A lens declaration with invalid properties is reported as a warning. The object is then added as an opaque
    /// surface.
    ///
    /// # Errors
    ///
    /// This function will return an error if an object has an invalid shape or if an object name is used twice.
    pub fn from_document(document: &BenchDocument) -> BenchResult<Self> {
        let mut bench = Self::new();
        for declaration in &document.objects {
            declaration.shape.validate().map_err(|e| {
                BenchError::Document(format!("object '{}': {e}", declaration.name))
            })?;
            if bench.scene.object_by_name(&declaration.name).is_some() {
                return Err(BenchError::Document(format!(
                    "object name '{}' used more than once",
                    declaration.name
                )));
            }
            let mut object = SceneObject::new(
                &declaration.name,
                declaration.shape,
                isometry(&declaration.position, &declaration.rotation),
            );
            if let Some(lens) = declaration.lens {
                match lens.validate() {
                    Ok(()) => object = object.with_lens(lens),
                    Err(e) => warn!(
                        "object '{}': invalid lens properties ({e}). Treated as opaque surface.",
                        declaration.name
                    ),
                }
            }
            if declaration.pass_through {
                object = object.with_pass_through();
            }
            let id = bench.scene.add_object(object);
            if !declaration.enabled {
                bench.scene.set_enabled(id, false)?;
            }
        }
        for declaration in &document.emitters {
            let mut emitter = RayEmitter::new(
                &declaration.name,
                declaration.config.clone(),
                isometry(&declaration.position, &declaration.rotation),
            );
            emitter.set_enabled(declaration.enabled);
            bench.emitters.push(emitter);
        }
        info!(
            "bench built with {} object(s) and {} emitter(s)",
            bench.scene.objects().len(),
            bench.emitters.len()
        );
        Ok(bench)
    }
    /// Read a bench document from a YAML file and build the [`OpticBench`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the document cannot be read or the bench cannot be built.
    pub fn from_file(path: &Path) -> BenchResult<Self> {
        Self::from_document(&BenchDocument::from_file(path)?)
    }
    /// Returns a reference to the scene of this [`OpticBench`].
    #[must_use]
    pub const fn scene(&self) -> &Bench {
        &self.scene
    }
    /// Returns the emitters of this [`OpticBench`].
    #[must_use]
    pub fn emitters(&self) -> &[RayEmitter] {
        &self.emitters
    }
    /// Returns the emitter with the given name.
    #[must_use]
    pub fn emitter_by_name(&self, name: &str) -> Option<&RayEmitter> {
        self.emitters.iter().find(|e| e.name() == name)
    }
    /// Returns the emitter registry of this [`OpticBench`].
    #[must_use]
    pub const fn registry(&self) -> &EmitterRegistry {
        &self.registry
    }
    /// Add a scene object.
    ///
    /// Emitters are not notified. Use [`OpticBench::request_retrace`] afterwards if necessary.
    pub fn add_object(&mut self, object: SceneObject) -> SurfaceId {
        self.scene.add_object(object)
    }
    /// Add an emitter. The registry is invalidated so that the new emitter is reached by the next fan-out.
    pub fn add_emitter(&mut self, emitter: RayEmitter) -> EmitterId {
        let id = emitter.id();
        self.emitters.push(emitter);
        self.registry.invalidate();
        id
    }
    /// Remove an emitter.
    ///
    /// # Errors
    ///
    /// This function will return an error if no emitter with the given id exists.
    pub fn remove_emitter(&mut self, id: EmitterId) -> BenchResult<RayEmitter> {
        let index = self
            .emitters
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| BenchError::Emitter(format!("emitter {id} not found")))?;
        self.registry.invalidate();
        Ok(self.emitters.remove(index))
    }
    /// Enable or disable an emitter. The registry is invalidated.
    ///
    /// # Errors
    ///
    /// This function will return an error if no emitter with the given id exists.
    pub fn set_emitter_enabled(&mut self, id: EmitterId, enabled: bool) -> BenchResult<()> {
        let emitter = self
            .emitters
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| BenchError::Emitter(format!("emitter {id} not found")))?;
        emitter.set_enabled(enabled);
        self.registry.invalidate();
        Ok(())
    }
    /// Move a scene object by the given translation (in meter) and request a re-trace on all emitters.
    ///
    /// # Errors
    ///
    /// This function will return an error if the object does not exist.
    pub fn move_object(
        &mut self,
        id: SurfaceId,
        translation: &Vector3<f64>,
        sink: &mut dyn PathSink,
    ) -> BenchResult<()> {
        self.scene.translate(id, translation)?;
        self.request_retrace(sink);
        Ok(())
    }
    /// Enable or disable a scene object and request a re-trace on all emitters.
    ///
    /// # Errors
    ///
    /// This function will return an error if the object does not exist.
    pub fn set_object_enabled(
        &mut self,
        id: SurfaceId,
        enabled: bool,
        sink: &mut dyn PathSink,
    ) -> BenchResult<()> {
        self.scene.set_enabled(id, enabled)?;
        self.request_retrace(sink);
        Ok(())
    }
    /// Request a trace pass on all emitters known to the registry. Returns the number of emitters reached.
    pub fn request_retrace(&mut self, sink: &mut dyn PathSink) -> usize {
        self.registry
            .request_pass_all(&mut self.emitters, &self.scene, sink)
    }
    /// Advance all emitters by one frame.
    pub fn run_frame(&mut self, delta_time: Time, sink: &mut dyn PathSink) {
        for emitter in &mut self.emitters {
            emitter.tick(&self.scene, delta_time, sink);
        }
    }
    /// Advance all emitters by the given number of frames.
    pub fn run_frames(&mut self, frames: usize, delta_time: Time, sink: &mut dyn PathSink) {
        for _ in 0..frames {
            self.run_frame(delta_time, sink);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        lens::LensType,
        millisecond,
        ray_definition::RayPattern,
        sink::RecordingSink,
        utils::test_helper::test_helper::check_warnings,
    };
    use approx::assert_relative_eq;
    use nalgebra::{point, vector};

    const DOCUMENT: &str = "
objects:
  - name: lens
    shape: { type: Sphere, radius: 0.5 }
    position: [0.0, 0.0, 2.0]
    lens: { lens_type: Convex, refractive_index: 1.5, focal_length: 0.75 }
  - name: screen
    shape: { type: Quad, half_width: 1.0, half_height: 1.0 }
    position: [0.0, 0.0, 5.0]
emitters:
  - name: laser
    config: { pattern: ChromaticFan, number_of_rays: 9, static_scene: false, async_tracing: false }
";
    #[test]
    fn from_yaml() {
        let doc = BenchDocument::from_yaml(DOCUMENT).unwrap();
        assert_eq!(doc.objects.len(), 2);
        assert_eq!(doc.objects[0].lens.unwrap().lens_type(), LensType::Convex);
        assert!(doc.objects[1].lens.is_none());
        assert!(doc.objects[1].enabled);
        assert_eq!(doc.emitters[0].config.pattern(), RayPattern::ChromaticFan);
        assert_eq!(doc.emitters[0].position, [0.0; 3]);
    }
    #[test]
    fn from_yaml_invalid() {
        assert!(BenchDocument::from_yaml("objects: 3").is_err());
        assert!(BenchDocument::from_yaml("objects:\n  - name: x\n    shape: { type: Cone }").is_err());
    }
    #[test]
    fn from_file_not_found() {
        assert!(BenchDocument::from_file(Path::new("./invalid_file_path/bench.yaml")).is_err());
    }
    #[test]
    fn yaml_round_trip() {
        let doc = BenchDocument::from_yaml(DOCUMENT).unwrap();
        let yaml = doc.to_yaml().unwrap();
        assert_eq!(BenchDocument::from_yaml(&yaml).unwrap(), doc);
    }
    #[test]
    fn isometry_from_degrees() {
        let iso = isometry(&[1.0, 2.0, 3.0], &[0.0, 90.0, 0.0]);
        assert_relative_eq!(iso * point![0.0, 0.0, 0.0], point![1.0, 2.0, 3.0]);
        assert_relative_eq!(iso * vector![0.0, 0.0, 1.0], vector![1.0, 0.0, 0.0], epsilon = 1e-12);
    }
    #[test]
    fn build_bench() {
        let bench = OpticBench::from_document(&BenchDocument::from_yaml(DOCUMENT).unwrap()).unwrap();
        assert_eq!(bench.scene().objects().len(), 2);
        assert!(bench.scene().object_by_name("lens").unwrap().lens().is_some());
        assert_eq!(bench.emitters().len(), 1);
        assert_eq!(bench.emitter_by_name("laser").unwrap().definitions().len(), 9);
        assert!(!bench.registry().is_built());
    }
    #[test]
    fn build_bench_invalid_lens() {
        testing_logger::setup();
        let doc = BenchDocument::from_yaml(
            "objects:\n  - name: lens\n    shape: { type: Sphere, radius: 0.5 }\n    lens: { refractive_index: -1.0 }",
        )
        .unwrap();
        let bench = OpticBench::from_document(&doc).unwrap();
        check_warnings(vec![
            "object 'lens': invalid lens properties (Scene:refractive index must be >0.0 and finite). Treated as opaque surface.",
        ]);
        assert!(bench.scene().object_by_name("lens").unwrap().lens().is_none());
    }
    #[test]
    fn build_bench_infinite_ray_distance() {
        testing_logger::setup();
        let doc = BenchDocument::from_yaml(
            "emitters:\n  - name: laser\n    config: { max_ray_distance: .inf }",
        )
        .unwrap();
        let mut bench = OpticBench::from_document(&doc).unwrap();
        check_warnings(vec![
            "emitter 'laser': maximum ray distance must be positive and finite. Emitter is inactive.",
        ]);
        assert!(bench.emitter_by_name("laser").unwrap().is_inert());
        let mut sink = RecordingSink::new();
        bench.run_frames(2, millisecond!(16.0), &mut sink);
        assert!(sink.is_empty());
    }
    #[test]
    fn build_bench_invalid_shape() {
        let doc = BenchDocument::from_yaml(
            "objects:\n  - name: ball\n    shape: { type: Sphere, radius: -0.5 }",
        )
        .unwrap();
        assert!(OpticBench::from_document(&doc).is_err());
    }
    #[test]
    fn build_bench_duplicate_name() {
        let doc = BenchDocument::from_yaml(
            "objects:\n  - name: ball\n    shape: { type: Sphere, radius: 0.5 }\n  - name: ball\n    shape: { type: Sphere, radius: 0.5 }",
        )
        .unwrap();
        assert_eq!(
            OpticBench::from_document(&doc).unwrap_err(),
            BenchError::Document("object name 'ball' used more than once".into())
        );
    }
    #[test]
    fn run_frames() {
        let mut bench = OpticBench::from_document(&BenchDocument::from_yaml(DOCUMENT).unwrap()).unwrap();
        let mut sink = RecordingSink::new();
        bench.run_frames(3, millisecond!(16.0), &mut sink);
        assert_eq!(sink.len(), 9);
        // every ray traverses the lens and ends on the screen
        for path in sink.paths() {
            assert_eq!(path.points.len(), 4);
            assert_relative_eq!(path.points[3].z, 5.0, epsilon = 1e-9);
        }
    }
    #[test]
    fn move_object_triggers_retrace() {
        let mut bench = OpticBench::from_document(&BenchDocument::from_yaml(DOCUMENT).unwrap()).unwrap();
        let mut sink = RecordingSink::new();
        bench.run_frame(millisecond!(16.0), &mut sink);
        assert_eq!(sink.submissions(), 9);
        let lens = bench.scene().object_by_name("lens").unwrap().id();
        bench
            .move_object(lens, &vector![0.0, 0.0, 5.0], &mut sink)
            .unwrap();
        assert!(bench.registry().is_built());
        assert_eq!(sink.submissions(), 18);
        // the lens is now behind the screen
        for path in sink.paths() {
            assert_eq!(path.points.len(), 2);
        }
        assert!(bench
            .move_object(SurfaceId::new(), &vector![0.0, 0.0, 1.0], &mut sink)
            .is_err());
    }
    #[test]
    fn disabled_object_triggers_retrace() {
        let mut bench = OpticBench::from_document(&BenchDocument::from_yaml(DOCUMENT).unwrap()).unwrap();
        let mut sink = RecordingSink::new();
        let screen = bench.scene().object_by_name("screen").unwrap().id();
        bench.set_object_enabled(screen, false, &mut sink).unwrap();
        assert_eq!(sink.len(), 9);
        // rays are extended to the maximum ray distance behind the lens
        for path in sink.paths() {
            assert_eq!(path.points.len(), 4);
            assert!(path.points[3].z > 10.0);
        }
    }
    #[test]
    fn emitter_management() {
        let mut bench = OpticBench::new();
        let mut sink = RecordingSink::new();
        let mut config = EmitterConfig::default();
        config.set_static_scene(false);
        config.set_async_tracing(false);
        let first = bench.add_emitter(RayEmitter::new("a", config.clone(), Isometry3::identity()));
        assert_eq!(bench.request_retrace(&mut sink), 1);
        let second = bench.add_emitter(RayEmitter::new("b", config, Isometry3::identity()));
        assert!(!bench.registry().is_built());
        assert_eq!(bench.request_retrace(&mut sink), 2);
        bench.set_emitter_enabled(first, false).unwrap();
        assert_eq!(bench.request_retrace(&mut sink), 1);
        assert!(bench.remove_emitter(second).is_ok());
        assert!(bench.remove_emitter(second).is_err());
        assert_eq!(bench.request_retrace(&mut sink), 0);
        assert!(bench.set_emitter_enabled(second, true).is_err());
    }
}
