mod perspective_camera;
mod trackball;

pub use perspective_camera::PerspectiveCamera;
pub use trackball::{
    InteractionOutcome, InteractorEvent, Key, MouseButton, TrackballCameraStyle,
};
