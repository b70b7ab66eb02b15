#![warn(missing_docs)]
//! Outbound interface for traced ray paths.
//!
//! The tracing engine does not render anything. Whenever an emitter has completed a trace pass it hands every ray path
//! over to a [`PathSink`] (e.g. a line renderer).
use std::collections::BTreeMap;

use nalgebra::Point3;
use serde::Serialize;

use crate::{emitter::EmitterId, error::BenchResult, ray_definition::RayColor};

/// Receiver of completed ray paths.
pub trait PathSink {
    /// Submit the path of ray number `ray_index` of the given emitter.
    ///
    /// `points` is the ordered polyline of the ray, `width` the line width configured for the emitter (in meter).
    fn submit_path(
        &mut self,
        emitter: EmitterId,
        ray_index: usize,
        points: &[Point3<f64>],
        color: RayColor,
        width: f64,
    );
}

/// A single path stored by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedPath {
    /// emitter which traced this ray
    pub emitter: EmitterId,
    /// index of the ray within its emitter
    pub ray_index: usize,
    /// the points of the ray path
    pub points: Vec<Point3<f64>>,
    /// display color
    pub color: RayColor,
    /// line width in meter
    pub width: f64,
}

/// A [`PathSink`] which simply keeps the latest path of every ray.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    paths: BTreeMap<(EmitterId, usize), RecordedPath>,
    submissions: usize,
}
impl RecordingSink {
    /// Creates a new, empty [`RecordingSink`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns the latest path of the given ray (if any).
    #[must_use]
    pub fn path(&self, emitter: EmitterId, ray_index: usize) -> Option<&RecordedPath> {
        self.paths.get(&(emitter, ray_index))
    }
    /// Returns all latest paths, ordered by emitter and ray index.
    pub fn paths(&self) -> impl Iterator<Item = &RecordedPath> {
        self.paths.values()
    }
    /// Returns the number of distinct rays recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }
    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
    /// Returns the total number of [`PathSink::submit_path`] calls received.
    #[must_use]
    pub const fn submissions(&self) -> usize {
        self.submissions
    }
    /// Serialize all latest paths into a JSON array.
    ///
    /// # Errors
    ///
    /// This function will return an error if the serialization fails.
    pub fn to_json(&self) -> BenchResult<String> {
        let paths: Vec<&RecordedPath> = self.paths.values().collect();
        serde_json::to_string_pretty(&paths).map_err(|e| e.to_string().into())
    }
}
impl PathSink for RecordingSink {
    fn submit_path(
        &mut self,
        emitter: EmitterId,
        ray_index: usize,
        points: &[Point3<f64>],
        color: RayColor,
        width: f64,
    ) {
        self.submissions += 1;
        self.paths.insert(
            (emitter, ray_index),
            RecordedPath {
                emitter,
                ray_index,
                points: points.to_vec(),
                color,
                width,
            },
        );
    }
}
