//! Deferred toon renderer.
//!
//! Three passes over a float G-Buffer, recorded into one command encoder in
//! program order:
//! 1. geometry: rasterizes the model into colour/normal/depth targets;
//! 2. edge: full-screen Laplacian of the depth target into the edge target;
//! 3. composite: banded toon shade plus outlines onto the surface.
//!
//! A cyclic debug state short-circuits after pass 1 or 2 and shows the raw
//! targets, one per screen quadrant.

mod blit;
mod common;
mod composite_pass;
mod edge_pass;
mod gbuffer;
mod geometry_pass;
mod mesh;
mod renderer;

pub use gbuffer::GBuffer;
pub use mesh::ModelMesh;
pub use renderer::{DebugView, FrameParams, Renderer};
