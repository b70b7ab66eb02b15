//! This is the documentation for the **lensbench** package, an interactive ray tracer for refractive lenses on an
//! optical bench.
//!
//! Ray emitters placed on the bench emit patterns of rays. Each ray is traced through the scene, refracted at the
//! surfaces of lens bodies according to Snell's law, and handed back as a polyline to a [`sink::PathSink`]. Tracing
//! is scheduled per emitter and can be spread over several frames so that an interactive frame budget is never
//! exceeded.
//!
//! The main entry points are:
//!   - [`bench_document::OpticBench`]: a complete bench built from a YAML [`bench_document::BenchDocument`]
//!   - [`emitter::RayEmitter`]: a light source with its [`emitter::EmitterConfig`]
//!   - [`tracer::trace_ray`]: tracing of a single ray through any [`scene::SceneQuery`]
pub mod bench_document;
pub mod console;
pub mod emitter;
pub mod error;
pub mod lens;
pub mod lens_traversal;
pub mod ray_definition;
pub mod refraction;
pub mod registry;
pub mod scene;
pub mod scheduler;
pub mod sink;
pub mod tracer;
pub mod utils;
