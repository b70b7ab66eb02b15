#![warn(missing_docs)]
//! The registry of active emitters.
//!
//! External collaborators (object grabbing, menus, lesson flow) do not know which emitters exist. After changing the
//! scene they ask the [`EmitterRegistry`] to request a new trace pass on every known emitter. The set of known emitters
//! is built lazily from an [`EmitterSource`] and stays as it is until it is explicitly invalidated.
use log::info;

use crate::{
    emitter::{EmitterId, RayEmitter},
    scene::SceneQuery,
    sink::PathSink,
};

/// Provider of the emitters a registry is built from.
pub trait EmitterSource {
    /// Returns the ids of all currently enabled emitters.
    fn enabled_emitters(&self) -> Vec<EmitterId>;
    /// Returns the emitter with the given id, if it (still) exists.
    fn emitter_mut(&mut self, id: EmitterId) -> Option<&mut RayEmitter>;
}
impl EmitterSource for Vec<RayEmitter> {
    fn enabled_emitters(&self) -> Vec<EmitterId> {
        self.iter()
            .filter(|e| e.is_enabled())
            .map(RayEmitter::id)
            .collect()
    }
    fn emitter_mut(&mut self, id: EmitterId) -> Option<&mut RayEmitter> {
        self.iter_mut().find(|e| e.id() == id)
    }
}

/// Lazily built, explicitly invalidated set of active emitters.
#[derive(Debug, Default, Clone)]
pub struct EmitterRegistry {
    emitters: Option<Vec<EmitterId>>,
}
impl EmitterRegistry {
    /// Creates a new, not yet built [`EmitterRegistry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns `true` if the registry has been built and not been invalidated since.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.emitters.is_some()
    }
    /// Mark the registry as stale. It is rebuilt on its next use.
    pub fn invalidate(&mut self) {
        self.emitters = None;
    }
    /// Rebuild the registry from the currently enabled emitters of the given source.
    pub fn rebuild<E: EmitterSource + ?Sized>(&mut self, source: &E) {
        let emitters = source.enabled_emitters();
        info!("emitter registry rebuilt with {} emitter(s)", emitters.len());
        self.emitters = Some(emitters);
    }
    /// Invalidate and immediately rebuild the registry.
    pub fn refresh<E: EmitterSource + ?Sized>(&mut self, source: &E) {
        self.invalidate();
        self.rebuild(source);
    }
    /// Returns the ids of the known emitters, building the registry first if necessary.
    pub fn emitters<E: EmitterSource + ?Sized>(&mut self, source: &E) -> &[EmitterId] {
        if self.emitters.is_none() {
            self.rebuild(source);
        }
        self.emitters.as_deref().unwrap_or_default()
    }
    /// Request a trace pass on every known emitter.
    ///
    /// Emitters removed from the source since the last rebuild are skipped. Emitters added since then are not reached
    /// until the registry is rebuilt. Returns the number of emitters reached.
    pub fn request_pass_all<E, S>(&mut self, source: &mut E, scene: &S, sink: &mut dyn PathSink) -> usize
    where
        E: EmitterSource + ?Sized,
        S: SceneQuery + ?Sized,
    {
        let ids = self.emitters(source).to_vec();
        let mut reached = 0;
        for id in ids {
            if let Some(emitter) = source.emitter_mut(id) {
                emitter.schedule_update(scene, sink);
                reached += 1;
            }
        }
        reached
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{emitter::EmitterConfig, scene::Bench, sink::RecordingSink};
    use nalgebra::Isometry3;

    fn emitter(name: &str) -> RayEmitter {
        let mut config = EmitterConfig::default();
        config.set_static_scene(false);
        config.set_async_tracing(false);
        RayEmitter::new(name, config, Isometry3::identity())
    }
    #[test]
    fn lazy_build() {
        let emitters = vec![emitter("a"), emitter("b")];
        let mut registry = EmitterRegistry::new();
        assert!(!registry.is_built());
        assert_eq!(registry.emitters(&emitters).len(), 2);
        assert!(registry.is_built());
        registry.invalidate();
        assert!(!registry.is_built());
    }
    #[test]
    fn disabled_emitters_are_ignored() {
        let mut emitters = vec![emitter("a"), emitter("b")];
        emitters[1].set_enabled(false);
        let mut registry = EmitterRegistry::new();
        assert_eq!(registry.emitters(&emitters), &[emitters[0].id()]);
    }
    #[test]
    fn request_pass_all() {
        let mut emitters = vec![emitter("a"), emitter("b")];
        let mut registry = EmitterRegistry::new();
        let mut sink = RecordingSink::new();
        assert_eq!(
            registry.request_pass_all(&mut emitters, &Bench::new(), &mut sink),
            2
        );
        assert_eq!(sink.submissions(), 2);
    }
    #[test]
    fn stale_registry() {
        let mut emitters = vec![emitter("a"), emitter("b")];
        let mut registry = EmitterRegistry::new();
        registry.rebuild(&emitters);
        // removed emitters are skipped, added ones are not reached
        emitters.remove(0);
        emitters.push(emitter("c"));
        let mut sink = RecordingSink::new();
        let scene = Bench::new();
        assert_eq!(registry.request_pass_all(&mut emitters, &scene, &mut sink), 1);
        assert!(sink.path(emitters[0].id(), 0).is_some());
        assert!(sink.path(emitters[1].id(), 0).is_none());
        registry.refresh(&emitters);
        assert_eq!(registry.request_pass_all(&mut emitters, &scene, &mut sink), 2);
        assert!(sink.path(emitters[1].id(), 0).is_some());
    }
}
