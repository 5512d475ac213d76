//! CBCT volume and mesh viewer
//!
//! Loads a DICOM series, an OBJ mesh and the 4x4 transform placing the mesh
//! in the volume, then renders both in one interactive view.

pub mod camera;
pub mod color;
pub mod common;
pub mod config;
mod error;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod test_helpers;
pub mod transfer_function;
pub mod transform;
pub mod viewer;
pub mod volumetric;

pub use camera::PerspectiveCamera;
pub use config::ViewerConfig;
pub use error::{Error, Result};
pub use scene::Scene;
pub use viewer::{run, RenderWindow};
