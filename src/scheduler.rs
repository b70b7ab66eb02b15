#![warn(missing_docs)]
//! Scheduling of trace passes.
//!
//! A [`TraceScheduler`] decides *when* the rays of an emitter are (re-)traced and *which* rays are traced during a given
//! frame. It does not trace anything itself. The owning [`RayEmitter`](crate::emitter::RayEmitter) asks it for the work
//! of the current frame.
//!
//! Two modes exist:
//!   - static: all rays are traced exactly once (on the first tick). Later requests are ignored until the emitter is
//!     reconfigured.
//!   - dynamic: passes are requested explicitly or by change detection. With amortized (asynchronous) tracing a pass is
//!     a resumable task which traces a fixed number of rays per frame.
use std::ops::Range;

use log::debug;
use nalgebra::Isometry3;
use uom::si::f64::Time;

use crate::second;

/// Minimal translation of an emitter (in meter) which triggers a re-trace.
pub const POSITION_THRESHOLD: f64 = 0.001;
/// Minimal rotation of an emitter (in degree) which triggers a re-trace.
pub const ROTATION_THRESHOLD_DEG: f64 = 0.1;

/// A trace pass in flight. Rays are traced in definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracePass {
    next_ray: usize,
}
impl TracePass {
    /// Returns the index of the next ray to be traced.
    #[must_use]
    pub const fn next_ray(&self) -> usize {
        self.next_ray
    }
}

/// Options steering a [`TraceScheduler`], usually taken from the emitter configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleOptions {
    /// trace only once
    pub static_scene: bool,
    /// spread a pass over several frames
    pub async_tracing: bool,
    /// number of rays traced per frame during an amortized pass
    pub rays_per_frame: usize,
    /// re-trace periodically with this interval (dynamic mode)
    pub update_interval: Time,
    /// re-trace on every frame (dynamic mode)
    pub update_every_frame: bool,
}

/// The work to be done for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameWork {
    /// nothing to trace
    Idle,
    /// trace the given rays. `completes_pass` is `true` if this is the last batch of the pass.
    Trace {
        /// indices of the rays to be traced
        rays: Range<usize>,
        /// the pass is complete after tracing these rays
        completes_pass: bool,
    },
}

/// Scheduling state of a single emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceScheduler {
    updated_once: bool,
    pass: Option<TracePass>,
    reference: Option<Isometry3<f64>>,
    time_since_update: Time,
}
impl Default for TraceScheduler {
    fn default() -> Self {
        Self {
            updated_once: false,
            pass: None,
            reference: None,
            time_since_update: second!(0.0),
        }
    }
}
impl TraceScheduler {
    /// Creates a new [`TraceScheduler`] which has not traced anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Reset the scheduler to its initial state (e.g. after a reconfiguration of the emitter).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
    /// Returns `true` if a pass is in flight.
    #[must_use]
    pub const fn is_tracing(&self) -> bool {
        self.pass.is_some()
    }
    /// Returns the pass currently in flight (if any).
    #[must_use]
    pub const fn pass(&self) -> Option<TracePass> {
        self.pass
    }
    /// Returns `true` if at least one pass has been completed since the last reset.
    #[must_use]
    pub const fn updated_once(&self) -> bool {
        self.updated_once
    }
    /// Request a new pass.
    ///
    /// The request is coalesced: it is dropped while a pass is in flight. In static mode, requests are ignored
    /// entirely. Returns `true` if a new pass was started.
    pub fn request_pass(&mut self, options: &ScheduleOptions) -> bool {
        if options.static_scene || self.pass.is_some() {
            return false;
        }
        self.pass = Some(TracePass { next_ray: 0 });
        true
    }
    /// Check whether the emitter has moved or the update interval has elapsed.
    ///
    /// Only used in dynamic mode. If a change is detected, the given transform becomes the new reference and the
    /// update timer restarts.
    pub fn detect_change(
        &mut self,
        isometry: &Isometry3<f64>,
        delta_time: Time,
        options: &ScheduleOptions,
    ) -> bool {
        self.time_since_update += delta_time;
        let moved = self
            .reference
            .map_or(true, |reference| has_moved(&reference, isometry));
        let interval_elapsed = self.time_since_update >= options.update_interval;
        if moved || interval_elapsed || options.update_every_frame {
            self.reference = Some(*isometry);
            self.time_since_update = second!(0.0);
            true
        } else {
            false
        }
    }
    /// Determine the work of the current frame for an emitter with `number_of_rays` rays.
    ///
    /// In static mode, the first call returns a complete pass, all later calls return [`FrameWork::Idle`]. In dynamic
    /// mode the pass in flight (if any) is advanced by `max(1, rays_per_frame)` rays (or completed at once without
    /// amortized tracing).
    pub fn next_work(&mut self, number_of_rays: usize, options: &ScheduleOptions) -> FrameWork {
        if options.static_scene {
            if self.updated_once {
                return FrameWork::Idle;
            }
            self.updated_once = true;
            self.pass = None;
            return FrameWork::Trace {
                rays: 0..number_of_rays,
                completes_pass: true,
            };
        }
        let Some(pass) = self.pass.as_mut() else {
            return FrameWork::Idle;
        };
        let start = pass.next_ray.min(number_of_rays);
        let end = if options.async_tracing {
            (start + options.rays_per_frame.max(1)).min(number_of_rays)
        } else {
            number_of_rays
        };
        pass.next_ray = end;
        let completes_pass = end >= number_of_rays;
        if completes_pass {
            debug!("trace pass complete ({number_of_rays} rays)");
            self.pass = None;
            self.updated_once = true;
        }
        FrameWork::Trace {
            rays: start..end,
            completes_pass,
        }
    }
}

fn has_moved(reference: &Isometry3<f64>, current: &Isometry3<f64>) -> bool {
    let translation = (current.translation.vector - reference.translation.vector).norm();
    let rotation = reference.rotation.angle_to(&current.rotation).to_degrees();
    translation > POSITION_THRESHOLD || rotation > ROTATION_THRESHOLD_DEG
}
