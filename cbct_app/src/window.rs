//! minifb backend of the viewer window

use std::time::Duration;

use cbct_lib::{
    camera::{InteractorEvent, Key, MouseButton},
    config::WindowConfig,
    Error, RenderWindow, Result,
};
use log::debug;
use minifb::{KeyRepeat, MouseMode, Window, WindowOptions};

const BUTTONS: [(minifb::MouseButton, MouseButton); 3] = [
    (minifb::MouseButton::Left, MouseButton::Left),
    (minifb::MouseButton::Middle, MouseButton::Middle),
    (minifb::MouseButton::Right, MouseButton::Right),
];

pub struct MinifbWindow {
    window: Window,
    // 0RGB pixels
    converted: Vec<u32>,
    size: (usize, usize),
    buttons_down: [bool; 3],
    mouse_pos: Option<(f32, f32)>,
    // events were pumped by the last present
    presented: bool,
}

impl MinifbWindow {
    pub fn open(config: &WindowConfig) -> Result<MinifbWindow> {
        let options = WindowOptions {
            resize: true,
            ..WindowOptions::default()
        };
        let mut window = Window::new(&config.title, config.width, config.height, options)
            .map_err(|e| Error::Window(e.to_string()))?;

        // Limit to max ~60 fps update rate
        window.limit_update_rate(Some(Duration::from_micros(16600)));

        let size = window.get_size();
        debug!("Window opened, size {}x{}", size.0, size.1);

        Ok(MinifbWindow {
            window,
            converted: Vec::new(),
            size,
            buttons_down: [false; 3],
            mouse_pos: None,
            presented: false,
        })
    }
}

impl RenderWindow for MinifbWindow {
    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn present(&mut self, rgb: &[u8], width: usize, height: usize) -> Result<()> {
        self.converted.clear();
        self.converted.extend(
            rgb.chunks_exact(3)
                .map(|ch| from_u8_rgb(ch[0], ch[1], ch[2])),
        );
        self.window
            .update_with_buffer(&self.converted, width, height)
            .map_err(|e| Error::Window(e.to_string()))?;
        self.presented = true;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<InteractorEvent> {
        if !self.presented {
            self.window.update();
        }
        self.presented = false;

        let mut events = Vec::new();

        let size = self.window.get_size();
        if size != self.size && size.0 > 0 && size.1 > 0 {
            self.size = size;
            events.push(InteractorEvent::Resized {
                width: size.0,
                height: size.1,
            });
        }

        if let Some((x, y)) = self.window.get_mouse_pos(MouseMode::Discard) {
            if self.mouse_pos != Some((x, y)) {
                self.mouse_pos = Some((x, y));
                events.push(InteractorEvent::MouseMoved { x, y });
            }
        }

        for (i, (mf_button, button)) in BUTTONS.iter().enumerate() {
            let down = self.window.get_mouse_down(*mf_button);
            if down == self.buttons_down[i] {
                continue;
            }
            self.buttons_down[i] = down;
            if down {
                if let Some((x, y)) = self.mouse_pos {
                    events.push(InteractorEvent::ButtonPressed {
                        button: *button,
                        x,
                        y,
                    });
                }
            } else {
                events.push(InteractorEvent::ButtonReleased { button: *button });
            }
        }

        if let Some((_, delta)) = self.window.get_scroll_wheel() {
            if delta != 0.0 {
                events.push(InteractorEvent::Scroll { delta });
            }
        }

        for key in self.window.get_keys_pressed(KeyRepeat::No) {
            let key = match key {
                minifb::Key::Escape => Key::Escape,
                minifb::Key::R => Key::Char('r'),
                minifb::Key::Q => Key::Char('q'),
                minifb::Key::E => Key::Char('e'),
                _ => continue,
            };
            events.push(InteractorEvent::KeyPressed(key));
        }

        events
    }
}

fn from_u8_rgb(r: u8, g: u8, b: u8) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}
