//! Camera module: low-level camera data container.
//!
//! The engine does NOT drive the camera: the render loop or an input
//! controller owns it and hands the matrices to the Graph Manager.

mod camera;

pub use camera::Camera;
