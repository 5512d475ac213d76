//! Interactive viewer loop
//!
//! The window itself lives behind [`RenderWindow`], so the loop runs
//! the same with a real window or a scripted one.

use std::io::BufRead;

use log::{debug, info};
use nalgebra::vector;

use crate::{
    camera::{InteractionOutcome, InteractorEvent, TrackballCameraStyle},
    config::{ViewerConfig, WindowConfig},
    render::{QualityPreference, RenderOptions, Renderer},
    scene::Scene,
    Result,
};

/// Window the viewer draws into
pub trait RenderWindow {
    /// Window was not closed yet
    fn is_open(&self) -> bool;

    /// Drawable area in pixels
    fn size(&self) -> (usize, usize);

    /// Show an RGB frame, 3 bytes per pixel, rows from the top
    fn present(&mut self, rgb: &[u8], width: usize, height: usize) -> Result<()>;

    /// Input gathered since the last call
    fn poll_events(&mut self) -> Vec<InteractorEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Idle,
    Loading,
    Composed,
    Rendering,
    Terminated,
}

struct StateMachine {
    state: ViewerState,
}

impl StateMachine {
    fn new() -> Self {
        Self {
            state: ViewerState::Idle,
        }
    }

    fn enter(&mut self, next: ViewerState) {
        debug!("Viewer state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Compose the scene, open a window and interact until it is closed
///
/// `open_window` is called only after the scene was composed successfully.
pub fn run<R, W, F>(config: &ViewerConfig, prompt: R, open_window: F) -> Result<()>
where
    R: BufRead,
    W: RenderWindow,
    F: FnOnce(&WindowConfig) -> Result<W>,
{
    let mut states = StateMachine::new();

    states.enter(ViewerState::Loading);
    let scene = Scene::compose(config, prompt);
    let mut scene = match scene {
        Ok(scene) => scene,
        Err(e) => {
            states.enter(ViewerState::Terminated);
            return Err(e);
        }
    };
    states.enter(ViewerState::Composed);

    let mut window = match open_window(&config.window) {
        Ok(window) => window,
        Err(e) => {
            states.enter(ViewerState::Terminated);
            return Err(e);
        }
    };

    states.enter(ViewerState::Rendering);
    let res = interact(&mut scene, &mut window, config);
    states.enter(ViewerState::Terminated);
    res
}

fn interact<W: RenderWindow>(scene: &mut Scene, window: &mut W, config: &ViewerConfig) -> Result<()> {
    let (width, height) = window.size();
    scene.camera_mut().change_aspect_from_resolution(width, height);
    scene.reset_camera();

    let mut renderer = Renderer::new(RenderOptions::from_config(&config.render, width, height));
    let mut style = TrackballCameraStyle::new(config.camera.motion_factor, width, height);
    let preference: QualityPreference = config.render.quality;

    let mut buffer = vec![0; renderer.buffer_len()];
    let mut resolution = (width, height);
    let mut dirty = true;

    while window.is_open() {
        if scene.update() {
            // mesh file changed on disk
            dirty = true;
        }

        if dirty {
            let quality = preference.quality(style.is_interacting());
            renderer.render(scene, scene.camera(), quality, &mut buffer);
            window.present(&buffer, resolution.0, resolution.1)?;
            dirty = false;
        }

        for event in window.poll_events() {
            match style.handle(event, scene.camera_mut()) {
                InteractionOutcome::Ignored | InteractionOutcome::InteractionStarted => (),
                InteractionOutcome::CameraMoved => {
                    scene.reset_clipping_range();
                    dirty = true;
                }
                InteractionOutcome::InteractionEnded => dirty = true,
                InteractionOutcome::ResetCamera => {
                    scene.reset_camera();
                    dirty = true;
                }
                InteractionOutcome::Resized => {
                    if let InteractorEvent::Resized { width, height } = event {
                        resolution = (width, height);
                        renderer.set_resolution(vector![width, height]);
                        buffer.resize(renderer.buffer_len(), 0);
                        dirty = true;
                    }
                }
                InteractionOutcome::Quit => {
                    info!("Quit requested");
                    return Ok(());
                }
            }
        }
    }

    Ok(())
}
