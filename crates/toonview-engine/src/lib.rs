//! Toonview engine crate.
//!
//! Owns the platform + GPU runtime pieces (window, device, timing, logging)
//! and the two core subsystems of the viewer: the Wavefront model pipeline
//! (`wavefront`) and the deferred toon renderer (`render`).

pub mod device;
pub mod window;
pub mod time;

pub mod logging;

pub mod render;
pub mod wavefront;
