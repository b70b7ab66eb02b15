#![warn(missing_docs)]
//! Ray emitters.
//!
//! A [`RayEmitter`] is a light source placed on the bench. It owns its configuration, its rigid transform, the ray
//! definitions generated from its pattern, the reusable path buffers of all rays and the scheduling state of its trace
//! passes.
use std::fmt::Display;

use log::{debug, info, warn};
use nalgebra::{Isometry3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use uom::si::{
    f64::{Length, Time},
    length::meter,
};
use uuid::Uuid;

use crate::{
    error::{BenchError, BenchResult},
    meter, millimeter,
    ray_definition::{generate_ray_definitions, PatternParameters, RayColor, RayDefinition, RayPattern},
    scene::SceneQuery,
    scheduler::{FrameWork, ScheduleOptions, TraceScheduler},
    second,
    sink::PathSink,
    tracer::{trace_ray, TraceLimits, TracePath},
};

/// Identifier of a [`RayEmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmitterId(Uuid);
impl EmitterId {
    /// Create a new random [`EmitterId`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}
impl Default for EmitterId {
    fn default() -> Self {
        Self::new()
    }
}
impl Display for EmitterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration of a [`RayEmitter`].
///
/// Lengths are serialized in meter, times in seconds. Missing fields are filled with their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pattern: RayPattern,
    number_of_rays: usize,
    ray_spread: Length,
    max_ray_distance: Length,
    max_ray_bounces: usize,
    chromatic_spread: f64,
    ray_color: RayColor,
    ray_width: Length,
    static_scene: bool,
    update_interval: Time,
    async_tracing: bool,
    rays_per_frame: usize,
    update_every_frame: bool,
    debug_first_ray: bool,
}
impl Default for EmitterConfig {
    /// Create a default emitter configuration:
    ///   - pattern: [`RayPattern::Single`]
    ///   - number of rays: `7`
    ///   - ray spread: `2 cm`
    ///   - maximum ray distance: `10 m`
    ///   - maximum number of bounces: `4`
    ///   - chromatic spread: `0.016`
    ///   - ray color: cyan, ray width: `2 mm`
    ///   - static scene, update interval `0.1 s`
    ///   - amortized tracing with `3` rays per frame
    fn default() -> Self {
        Self {
            pattern: RayPattern::default(),
            number_of_rays: 7,
            ray_spread: meter!(0.02),
            max_ray_distance: meter!(10.0),
            max_ray_bounces: 4,
            chromatic_spread: 0.016,
            ray_color: RayColor::default(),
            ray_width: millimeter!(2.0),
            static_scene: true,
            update_interval: second!(0.1),
            async_tracing: true,
            rays_per_frame: 3,
            update_every_frame: false,
            debug_first_ray: false,
        }
    }
}
impl EmitterConfig {
    /// Returns the ray pattern of this [`EmitterConfig`].
    #[must_use]
    pub const fn pattern(&self) -> RayPattern {
        self.pattern
    }
    /// Sets the ray pattern of this [`EmitterConfig`].
    pub fn set_pattern(&mut self, pattern: RayPattern) {
        self.pattern = pattern;
    }
    /// Returns the number of rays of this [`EmitterConfig`].
    #[must_use]
    pub const fn number_of_rays(&self) -> usize {
        self.number_of_rays
    }
    /// Sets the number of rays of this [`EmitterConfig`].
    pub fn set_number_of_rays(&mut self, number_of_rays: usize) {
        self.number_of_rays = number_of_rays;
    }
    /// Returns the ray spread of this [`EmitterConfig`].
    #[must_use]
    pub fn ray_spread(&self) -> Length {
        self.ray_spread
    }
    /// Sets the ray spread of this [`EmitterConfig`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the given spread is negative or not finite.
    pub fn set_ray_spread(&mut self, ray_spread: Length) -> BenchResult<()> {
        if !ray_spread.is_finite() || ray_spread.is_sign_negative() {
            return Err(BenchError::Emitter(
                "ray spread must be >= 0.0 and finite".into(),
            ));
        }
        self.ray_spread = ray_spread;
        Ok(())
    }
    /// Returns the maximum ray distance of this [`EmitterConfig`].
    #[must_use]
    pub fn max_ray_distance(&self) -> Length {
        self.max_ray_distance
    }
    /// Sets the maximum ray distance (ray cast range) of this [`EmitterConfig`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the given distance is not finite.
    pub fn set_max_ray_distance(&mut self, max_ray_distance: Length) -> BenchResult<()> {
        if !max_ray_distance.is_finite() {
            return Err(BenchError::Emitter(
                "maximum ray distance must be finite".into(),
            ));
        }
        self.max_ray_distance = max_ray_distance;
        Ok(())
    }
    /// Returns the maximum number of bounces of this [`EmitterConfig`].
    #[must_use]
    pub const fn max_ray_bounces(&self) -> usize {
        self.max_ray_bounces
    }
    /// Sets the maximum number of bounces of this [`EmitterConfig`]. Each lens traversal consumes two bounces.
    pub fn set_max_ray_bounces(&mut self, max_ray_bounces: usize) {
        self.max_ray_bounces = max_ray_bounces;
    }
    /// Returns the chromatic spread of this [`EmitterConfig`].
    #[must_use]
    pub const fn chromatic_spread(&self) -> f64 {
        self.chromatic_spread
    }
    /// Sets the chromatic spread (difference of the refractive index between red and blue rays).
    ///
    /// # Errors
    ///
    /// This function will return an error if the given spread is negative or not finite.
    pub fn set_chromatic_spread(&mut self, chromatic_spread: f64) -> BenchResult<()> {
        if !chromatic_spread.is_finite() || chromatic_spread.is_sign_negative() {
            return Err(BenchError::Emitter(
                "chromatic spread must be >= 0.0 and finite".into(),
            ));
        }
        self.chromatic_spread = chromatic_spread;
        Ok(())
    }
    /// Returns the ray color of this [`EmitterConfig`].
    #[must_use]
    pub const fn ray_color(&self) -> RayColor {
        self.ray_color
    }
    /// Sets the ray color of this [`EmitterConfig`]. It is ignored by chromatic patterns.
    pub fn set_ray_color(&mut self, ray_color: RayColor) {
        self.ray_color = ray_color;
    }
    /// Returns the line width of the rays of this [`EmitterConfig`].
    #[must_use]
    pub fn ray_width(&self) -> Length {
        self.ray_width
    }
    /// Sets the line width of the rays of this [`EmitterConfig`].
    pub fn set_ray_width(&mut self, ray_width: Length) {
        self.ray_width = ray_width;
    }
    /// Returns `true` if the rays are only traced once.
    #[must_use]
    pub const fn static_scene(&self) -> bool {
        self.static_scene
    }
    /// Sets the static scene flag of this [`EmitterConfig`].
    pub fn set_static_scene(&mut self, static_scene: bool) {
        self.static_scene = static_scene;
    }
    /// Returns the update interval of this [`EmitterConfig`].
    #[must_use]
    pub fn update_interval(&self) -> Time {
        self.update_interval
    }
    /// Sets the update interval for periodic re-tracing in dynamic mode.
    pub fn set_update_interval(&mut self, update_interval: Time) {
        self.update_interval = update_interval;
    }
    /// Returns `true` if trace passes are spread over several frames.
    #[must_use]
    pub const fn async_tracing(&self) -> bool {
        self.async_tracing
    }
    /// Sets the asynchronous (amortized) tracing flag of this [`EmitterConfig`].
    pub fn set_async_tracing(&mut self, async_tracing: bool) {
        self.async_tracing = async_tracing;
    }
    /// Returns the number of rays traced per frame during amortized tracing.
    #[must_use]
    pub const fn rays_per_frame(&self) -> usize {
        self.rays_per_frame
    }
    /// Sets the number of rays traced per frame during amortized tracing. A value of 0 is treated as 1.
    pub fn set_rays_per_frame(&mut self, rays_per_frame: usize) {
        self.rays_per_frame = rays_per_frame;
    }
    /// Returns `true` if the rays are re-traced on every frame (dynamic mode).
    #[must_use]
    pub const fn update_every_frame(&self) -> bool {
        self.update_every_frame
    }
    /// Sets the update every frame flag of this [`EmitterConfig`].
    pub fn set_update_every_frame(&mut self, update_every_frame: bool) {
        self.update_every_frame = update_every_frame;
    }
    /// Returns `true` if the lens traversal of the first ray is logged.
    #[must_use]
    pub const fn debug_first_ray(&self) -> bool {
        self.debug_first_ray
    }
    /// Enables or disables debug logging of the first ray.
    pub fn set_debug_first_ray(&mut self, debug_first_ray: bool) {
        self.debug_first_ray = debug_first_ray;
    }
    fn pattern_parameters(&self) -> PatternParameters {
        PatternParameters {
            pattern: self.pattern,
            number_of_rays: self.number_of_rays,
            ray_spread: self.ray_spread.get::<meter>(),
            ray_color: self.ray_color,
            chromatic_spread: self.chromatic_spread,
        }
    }
    fn schedule_options(&self) -> ScheduleOptions {
        ScheduleOptions {
            static_scene: self.static_scene,
            async_tracing: self.async_tracing,
            rays_per_frame: self.rays_per_frame,
            update_interval: self.update_interval,
            update_every_frame: self.update_every_frame,
        }
    }
    fn trace_limits(&self) -> TraceLimits {
        TraceLimits {
            max_distance: self.max_ray_distance.get::<meter>(),
            max_bounces: self.max_ray_bounces,
        }
    }
}

/// A light source emitting a pattern of rays along its local z axis.
#[derive(Debug, Clone)]
pub struct RayEmitter {
    id: EmitterId,
    name: String,
    config: EmitterConfig,
    isometry: Isometry3<f64>,
    enabled: bool,
    definitions: Vec<RayDefinition>,
    paths: Vec<TracePath>,
    scheduler: TraceScheduler,
    inert: bool,
}
impl RayEmitter {
    /// Creates a new [`RayEmitter`] with the given configuration and transform.
    ///
    /// Configuration problems (no valid rays, non-positive maximum ray distance) are logged as warnings. Such an
    /// emitter stays inert and never traces anything.
    #[must_use]
    pub fn new(name: &str, config: EmitterConfig, isometry: Isometry3<f64>) -> Self {
        let mut emitter = Self {
            id: EmitterId::new(),
            name: name.to_owned(),
            config,
            isometry,
            enabled: true,
            definitions: Vec::new(),
            paths: Vec::new(),
            scheduler: TraceScheduler::new(),
            inert: true,
        };
        emitter.regenerate();
        emitter
    }
    /// Returns the id of this [`RayEmitter`].
    #[must_use]
    pub const fn id(&self) -> EmitterId {
        self.id
    }
    /// Returns the name of this [`RayEmitter`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the configuration of this [`RayEmitter`].
    #[must_use]
    pub const fn config(&self) -> &EmitterConfig {
        &self.config
    }
    /// Replace the configuration of this [`RayEmitter`].
    ///
    /// All ray definitions and paths are regenerated and the scheduler is reset. Hence, also an emitter in static
    /// mode traces again on its next tick.
    pub fn reconfigure(&mut self, config: EmitterConfig) {
        self.config = config;
        self.regenerate();
    }
    /// Returns the transform of this [`RayEmitter`].
    #[must_use]
    pub const fn isometry(&self) -> &Isometry3<f64> {
        &self.isometry
    }
    /// Sets the transform of this [`RayEmitter`].
    ///
    /// In dynamic mode, the movement is picked up by the change detection on the next tick.
    pub fn set_isometry(&mut self, isometry: Isometry3<f64>) {
        self.isometry = isometry;
    }
    /// Returns `true` if this [`RayEmitter`] is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
    /// Enable or disable this [`RayEmitter`]. A disabled emitter ignores ticks and update requests.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
    /// Returns `true` if this [`RayEmitter`] has an invalid configuration and never traces.
    #[must_use]
    pub const fn is_inert(&self) -> bool {
        self.inert
    }
    /// Returns the ray definitions of this [`RayEmitter`].
    #[must_use]
    pub fn definitions(&self) -> &[RayDefinition] {
        &self.definitions
    }
    /// Returns the (latest) traced paths of this [`RayEmitter`], one per ray definition.
    #[must_use]
    pub fn paths(&self) -> &[TracePath] {
        &self.paths
    }
    /// Returns the scheduling state of this [`RayEmitter`].
    #[must_use]
    pub const fn scheduler(&self) -> &TraceScheduler {
        &self.scheduler
    }
    /// Returns the origin of the given ray in world coordinates.
    #[must_use]
    pub fn ray_origin(&self, definition: &RayDefinition) -> Point3<f64> {
        self.isometry * Point3::from(*definition.offset())
    }
    /// Returns the emission direction (local z axis) in world coordinates.
    #[must_use]
    pub fn forward(&self) -> Vector3<f64> {
        self.isometry * Vector3::z()
    }
    /// Advance this [`RayEmitter`] by one frame.
    ///
    /// In static mode all rays are traced on the first tick. In dynamic mode, the change detection may request a new
    /// pass and the pass in flight is advanced. Completed passes are published to the `sink`.
    pub fn tick<S: SceneQuery + ?Sized>(
        &mut self,
        scene: &S,
        delta_time: Time,
        sink: &mut dyn PathSink,
    ) {
        if !self.enabled || self.inert {
            return;
        }
        let options = self.config.schedule_options();
        if !options.static_scene && self.scheduler.detect_change(&self.isometry, delta_time, &options) {
            self.scheduler.request_pass(&options);
        }
        self.run_scheduled_work(scene, sink);
    }
    /// Request a re-trace of all rays.
    ///
    /// The request is coalesced with a pass in flight and ignored in static mode. Without asynchronous tracing the
    /// pass is completed immediately, otherwise it proceeds with the following ticks.
    pub fn schedule_update<S: SceneQuery + ?Sized>(&mut self, scene: &S, sink: &mut dyn PathSink) {
        if !self.enabled || self.inert {
            return;
        }
        let options = self.config.schedule_options();
        if self.scheduler.request_pass(&options) && !options.async_tracing {
            self.run_scheduled_work(scene, sink);
        }
    }
    /// Alias of [`RayEmitter::schedule_update`].
    pub fn force_update<S: SceneQuery + ?Sized>(&mut self, scene: &S, sink: &mut dyn PathSink) {
        self.schedule_update(scene, sink);
    }
    /// Synchronously trace all rays and publish their paths, regardless of the scheduling mode.
    pub fn trace_all_now<S: SceneQuery + ?Sized>(&mut self, scene: &S, sink: &mut dyn PathSink) {
        if self.inert {
            return;
        }
        self.trace_rays(scene, 0..self.definitions.len());
        self.publish(sink);
    }
    fn run_scheduled_work<S: SceneQuery + ?Sized>(&mut self, scene: &S, sink: &mut dyn PathSink) {
        let options = self.config.schedule_options();
        if let FrameWork::Trace {
            rays,
            completes_pass,
        } = self.scheduler.next_work(self.definitions.len(), &options)
        {
            self.trace_rays(scene, rays);
            if completes_pass {
                self.publish(sink);
            }
        }
    }
    fn trace_rays<S: SceneQuery + ?Sized>(&mut self, scene: &S, rays: std::ops::Range<usize>) {
        let limits = self.config.trace_limits();
        let direction = self.forward();
        for index in rays {
            let Some(definition) = self.definitions.get(index) else {
                break;
            };
            let origin = self.ray_origin(definition);
            let verbose = self.config.debug_first_ray && index == 0;
            let outcome = trace_ray(
                scene,
                origin,
                direction,
                definition.refractive_index_offset(),
                &limits,
                self.paths[index].buffer_mut(),
                verbose,
            );
            if verbose {
                debug!(
                    "emitter '{}': first ray ended with {outcome:?} after {} points",
                    self.name,
                    self.paths[index].points().len()
                );
            }
        }
    }
    fn publish(&self, sink: &mut dyn PathSink) {
        let width = self.config.ray_width.get::<meter>();
        for (index, path) in self.paths.iter().enumerate() {
            sink.submit_path(self.id, index, path.points(), path.color(), width);
        }
    }
    fn regenerate(&mut self) {
        self.definitions = generate_ray_definitions(&self.config.pattern_parameters());
        self.paths = self
            .definitions
            .iter()
            .map(|d| TracePath::new(d.color()))
            .collect();
        self.scheduler.reset();
        self.inert = false;
        if self.definitions.is_empty() {
            warn!(
                "emitter '{}': pattern {} with {} rays does not produce any ray. Emitter is inactive.",
                self.name, self.config.pattern, self.config.number_of_rays
            );
            self.inert = true;
        }
        // deserialized configs bypass the validating setters
        let max_distance = self.config.max_ray_distance.get::<meter>();
        if !max_distance.is_finite() || max_distance <= 0.0 {
            warn!(
                "emitter '{}': maximum ray distance must be positive and finite. Emitter is inactive.",
                self.name
            );
            self.inert = true;
        }
        let ray_spread = self.config.ray_spread.get::<meter>();
        if !ray_spread.is_finite() || ray_spread < 0.0 {
            warn!(
                "emitter '{}': ray spread must be >= 0.0 and finite. Emitter is inactive.",
                self.name
            );
            self.inert = true;
        }
        let chromatic_spread = self.config.chromatic_spread;
        if !chromatic_spread.is_finite() || chromatic_spread < 0.0 {
            warn!(
                "emitter '{}': chromatic spread must be >= 0.0 and finite. Emitter is inactive.",
                self.name
            );
            self.inert = true;
        }
        if !self.inert {
            info!(
                "emitter '{}': {} rays ({})",
                self.name,
                self.definitions.len(),
                self.config.pattern
            );
        }
    }
}
