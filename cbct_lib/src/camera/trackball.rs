//! Trackball camera interaction
//!
//! Window toolkits translate their input into [`InteractorEvent`]s,
//! the style turns them into camera motion.

use log::debug;

use super::PerspectiveCamera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

/// Input in window pixel coordinates, y axis pointing down
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractorEvent {
    ButtonPressed { button: MouseButton, x: f32, y: f32 },
    ButtonReleased { button: MouseButton },
    MouseMoved { x: f32, y: f32 },
    /// Positive is wheel forward
    Scroll { delta: f32 },
    KeyPressed(Key),
    Resized { width: usize, height: usize },
}

/// What the viewer should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    Ignored,
    /// A drag started, following frames may use interactive quality
    InteractionStarted,
    CameraMoved,
    /// Drag finished, render a full quality frame
    InteractionEnded,
    ResetCamera,
    Resized,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Rotate,
    Pan,
    Dolly,
}

impl From<MouseButton> for Motion {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Motion::Rotate,
            MouseButton::Middle => Motion::Pan,
            MouseButton::Right => Motion::Dolly,
        }
    }
}

/// Rotate with left drag, pan with middle drag, dolly with right drag or wheel
#[derive(Debug, Clone)]
pub struct TrackballCameraStyle {
    motion_factor: f32,
    size: (usize, usize),
    state: Option<(MouseButton, Motion)>,
    last_pos: (f32, f32),
}

impl TrackballCameraStyle {
    pub fn new(motion_factor: f32, width: usize, height: usize) -> Self {
        Self {
            motion_factor,
            size: (width.max(1), height.max(1)),
            state: None,
            last_pos: (0.0, 0.0),
        }
    }

    /// A button is held
    pub fn is_interacting(&self) -> bool {
        self.state.is_some()
    }

    pub fn handle(
        &mut self,
        event: InteractorEvent,
        camera: &mut PerspectiveCamera,
    ) -> InteractionOutcome {
        match event {
            InteractorEvent::ButtonPressed { button, x, y } => {
                if self.state.is_some() {
                    return InteractionOutcome::Ignored;
                }
                self.state = Some((button, button.into()));
                self.last_pos = (x, y);
                debug!("Interaction {button:?} started");
                InteractionOutcome::InteractionStarted
            }
            InteractorEvent::ButtonReleased { button } => match self.state {
                Some((held, _)) if held == button => {
                    self.state = None;
                    debug!("Interaction {button:?} ended");
                    InteractionOutcome::InteractionEnded
                }
                _ => InteractionOutcome::Ignored,
            },
            InteractorEvent::MouseMoved { x, y } => {
                let motion = match self.state {
                    Some((_, motion)) => motion,
                    None => return InteractionOutcome::Ignored,
                };
                let dx = x - self.last_pos.0;
                // window y grows downwards
                let dy = self.last_pos.1 - y;
                self.last_pos = (x, y);
                if dx == 0.0 && dy == 0.0 {
                    return InteractionOutcome::Ignored;
                }

                match motion {
                    Motion::Rotate => self.rotate(camera, dx, dy),
                    Motion::Pan => self.pan(camera, dx, dy),
                    Motion::Dolly => self.dolly_drag(camera, dy),
                }
                InteractionOutcome::CameraMoved
            }
            InteractorEvent::Scroll { delta } => {
                if delta == 0.0 {
                    return InteractionOutcome::Ignored;
                }
                let factor = 1.1_f32.powf(self.motion_factor * 0.2 * delta);
                camera.dolly(factor);
                InteractionOutcome::CameraMoved
            }
            InteractorEvent::KeyPressed(key) => match key {
                Key::Char('r') | Key::Char('R') => InteractionOutcome::ResetCamera,
                Key::Char('q') | Key::Char('Q') | Key::Char('e') | Key::Char('E') | Key::Escape => {
                    InteractionOutcome::Quit
                }
                _ => InteractionOutcome::Ignored,
            },
            InteractorEvent::Resized { width, height } => {
                self.size = (width.max(1), height.max(1));
                camera.change_aspect_from_resolution(width, height);
                InteractionOutcome::Resized
            }
        }
    }

    fn rotate(&self, camera: &mut PerspectiveCamera, dx: f32, dy: f32) {
        let delta_elevation = -20.0 / self.size.1 as f32;
        let delta_azimuth = -20.0 / self.size.0 as f32;

        let rxf = dx * delta_azimuth * self.motion_factor;
        let ryf = dy * delta_elevation * self.motion_factor;

        camera.azimuth(rxf);
        camera.elevation(ryf);
        camera.orthogonalize_view_up();
    }

    // the scene follows the cursor
    fn pan(&self, camera: &mut PerspectiveCamera, dx: f32, dy: f32) {
        let pixel = camera.pixel_size_at_focus(self.size.1);
        let offset = -(dx * pixel) * camera.get_right() - (dy * pixel) * camera.get_up();
        camera.pan(offset);
    }

    fn dolly_drag(&self, camera: &mut PerspectiveCamera, dy: f32) {
        let center_y = self.size.1 as f32 / 2.0;
        let dyf = self.motion_factor * dy / center_y;
        camera.dolly(1.1_f32.powf(dyf));
    }
}

impl Default for TrackballCameraStyle {
    fn default() -> Self {
        TrackballCameraStyle::new(10.0, 1000, 800)
    }
}

#[cfg(test)]
mod test {
    use nalgebra::{point, vector};

    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(
            point![0.0, 0.0, 10.0],
            point![0.0, 0.0, 0.0],
            vector![0.0, 1.0, 0.0],
        )
    }

    fn drag(
        style: &mut TrackballCameraStyle,
        cam: &mut PerspectiveCamera,
        button: MouseButton,
        from: (f32, f32),
        to: (f32, f32),
    ) {
        style.handle(
            InteractorEvent::ButtonPressed {
                button,
                x: from.0,
                y: from.1,
            },
            cam,
        );
        style.handle(InteractorEvent::MouseMoved { x: to.0, y: to.1 }, cam);
        style.handle(InteractorEvent::ButtonReleased { button }, cam);
    }

    #[test]
    fn rotation_keeps_focal_distance() {
        let mut style = TrackballCameraStyle::new(10.0, 1000, 800);
        let mut cam = camera();

        drag(&mut style, &mut cam, MouseButton::Left, (500.0, 400.0), (550.0, 360.0));

        assert!((cam.distance() - 10.0).abs() < 1e-3);
        assert_eq!(cam.get_focal_point(), point![0.0, 0.0, 0.0]);
        // dragging right turns the scene right, the camera goes left
        assert!(cam.get_pos().x < 0.0);
        // dragging up turns the scene up, the camera goes down
        assert!(cam.get_pos().y < 0.0);
        assert!(!style.is_interacting());
    }

    #[test]
    fn rotation_angle_per_pixel() {
        let mut style = TrackballCameraStyle::new(10.0, 1000, 800);
        let mut cam = camera();

        // 50 px * -20 / 1000 * 10 = -10 degrees of azimuth
        drag(&mut style, &mut cam, MouseButton::Left, (0.0, 0.0), (50.0, 0.0));
        let angle = f32::atan2(cam.get_pos().x, cam.get_pos().z).to_degrees();
        assert!((angle + 10.0).abs() < 1e-3, "{angle}");
    }

    #[test]
    fn dolly_drag_and_scroll() {
        let mut style = TrackballCameraStyle::new(10.0, 1000, 800);
        let mut cam = camera();

        // dragging up moves closer
        drag(&mut style, &mut cam, MouseButton::Right, (0.0, 400.0), (0.0, 360.0));
        let expected = 10.0 / 1.1_f32.powf(10.0 * 40.0 / 400.0);
        assert!((cam.distance() - expected).abs() < 1e-3);

        let before = cam.distance();
        let outcome = style.handle(InteractorEvent::Scroll { delta: 1.0 }, &mut cam);
        assert_eq!(outcome, InteractionOutcome::CameraMoved);
        assert!(cam.distance() < before);
    }

    #[test]
    fn pan_moves_focal_point() {
        let mut style = TrackballCameraStyle::new(10.0, 1000, 800);
        let mut cam = camera();

        drag(&mut style, &mut cam, MouseButton::Middle, (100.0, 100.0), (120.0, 100.0));
        assert!(cam.get_focal_point().x < 0.0);
        assert_eq!(cam.get_dir(), vector![0.0, 0.0, -1.0]);
        assert!((cam.distance() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn moves_without_button_are_ignored() {
        let mut style = TrackballCameraStyle::default();
        let mut cam = camera();
        let outcome = style.handle(InteractorEvent::MouseMoved { x: 5.0, y: 5.0 }, &mut cam);
        assert_eq!(outcome, InteractionOutcome::Ignored);
        assert_eq!(cam.get_pos(), point![0.0, 0.0, 10.0]);
    }

    #[test]
    fn keys() {
        let mut style = TrackballCameraStyle::default();
        let mut cam = camera();
        let mut key = |k| style.handle(InteractorEvent::KeyPressed(k), &mut cam);
        assert_eq!(key(Key::Char('r')), InteractionOutcome::ResetCamera);
        assert_eq!(key(Key::Char('q')), InteractionOutcome::Quit);
        assert_eq!(key(Key::Escape), InteractionOutcome::Quit);
        assert_eq!(key(Key::Char('x')), InteractionOutcome::Ignored);
    }

    #[test]
    fn resize_changes_aspect() {
        let mut style = TrackballCameraStyle::default();
        let mut cam = camera();
        style.handle(
            InteractorEvent::Resized {
                width: 400,
                height: 800,
            },
            &mut cam,
        );
        assert_eq!(cam.get_aspect(), 0.5);
    }
}
