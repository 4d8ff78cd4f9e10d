//! Wavefront (.obj/.mtl) model pipeline.
//!
//! A model is read in three steps:
//! 1. parse: the OBJ text (and its material library) fills a flat
//!    [`GeometryStore`] and a list of [`Group`]s of index-triple triangles;
//! 2. consolidate: each group's independently indexed corners are rewritten
//!    into one deduplicated vertex stream plus an index stream;
//! 3. upload: the render module turns the streams into GPU buffers
//!    (`render::mesh`).
//!
//! Steps 1–2 are pure CPU work and carry all the format semantics; nothing
//! in this module touches wgpu.

mod consolidate;
mod geometry;
mod material;
mod model;
mod mtl;
mod obj;
mod ppm;

pub use geometry::{Bounds, GeometryStore};
pub use material::{Material, TextureImage};
pub use model::{Group, Model, Triangle, VertexLayout};
pub use obj::ParserConfig;
pub use ppm::read_p6;
