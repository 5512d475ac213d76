use log::{error, warn};
use nalgebra::{vector, Vector2};

use crate::{
    camera::PerspectiveCamera,
    color::{self, RGB},
    common::{Ray, ViewportBox},
    config::BlendMode,
    scene::{Scene, VolumeActor},
    volumetric::Volume,
};

use super::{mesh_raster::MeshLayer, RenderOptions, RenderQuality};

/// CPU renderer of a [`Scene`]
///
/// The mesh is rasterized first, volume rays then stop at the mesh surface
/// and the volume colour is blended over the mesh or the background.
pub struct Renderer {
    render_options: RenderOptions,
}

impl Renderer {
    pub fn new(render_options: RenderOptions) -> Renderer {
        Renderer { render_options }
    }

    pub fn set_render_options(&mut self, opts: RenderOptions) {
        self.render_options = opts;
    }

    pub fn get_render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    pub fn set_resolution(&mut self, resolution: Vector2<usize>) {
        self.render_options.resolution = resolution;
    }

    /// Size of the RGB buffer for the current resolution
    pub fn buffer_len(&self) -> usize {
        let res = self.render_options.resolution;
        res.x * res.y * 3
    }

    /// Render `scene` into an RGB buffer, row 0 is the top of the image
    pub fn render(
        &self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        quality: RenderQuality,
        buffer: &mut [u8],
    ) {
        let resolution = self.render_options.resolution;
        let (width, height) = (resolution.x, resolution.y);
        let needed = self.buffer_len();
        if buffer.len() < needed {
            warn!("Buffer of {} bytes is too small for {width}x{height}", buffer.len());
            return;
        }
        if needed == 0 {
            return;
        }

        let mut mesh_layer = MeshLayer::new(width, height);
        mesh_layer.draw_mesh(
            scene.mesh(),
            camera,
            quality,
            self.render_options.point_size,
        );

        let frame = Frame {
            volume: scene.volume(),
            camera,
            mesh_layer: &mesh_layer,
            background: scene.background(),
            tile: self.volume_tile(scene.volume(), camera),
            ray_step: self.render_options.ray_step(quality),
            early_ray_termination: self.render_options.early_ray_termination,
            width,
            height,
        };

        let buffer = &mut buffer[..needed];
        let threads = if self.render_options.multi_thread {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(height)
        } else {
            1
        };

        if threads <= 1 {
            frame.render_rows(0, buffer);
            return;
        }

        // bands of whole rows, every thread owns its slice of the buffer
        let rows_per_band = (height + threads - 1) / threads;
        let frame = &frame;
        let res = crossbeam::scope(|s| {
            for (band, chunk) in buffer.chunks_mut(rows_per_band * width * 3).enumerate() {
                s.spawn(move |_| frame.render_rows(band * rows_per_band, chunk));
            }
        });
        if res.is_err() {
            error!("Render thread panicked, frame is incomplete");
        }
    }

    // pixels the volume can cover, whole viewport if the box is partly behind the camera
    fn volume_tile(&self, volume: &VolumeActor, camera: &PerspectiveCamera) -> ViewportBox {
        if !volume.is_renderable() {
            return ViewportBox::new();
        }
        let bounds = volume.bounds();
        let all_in_front = bounds.into_iter().all(|p| camera.project(&p).is_some());
        if all_in_front {
            camera.project_box(bounds)
        } else {
            ViewportBox::full()
        }
    }
}

/// Read-only state shared by the render threads
struct Frame<'a> {
    volume: &'a VolumeActor,
    camera: &'a PerspectiveCamera,
    mesh_layer: &'a MeshLayer,
    background: RGB,
    tile: ViewportBox,
    ray_step: f32,
    early_ray_termination: bool,
    width: usize,
    height: usize,
}

impl<'a> Frame<'a> {
    fn render_rows(&self, first_row: usize, rows: &mut [u8]) {
        let (image_width, image_height) = (self.width as f32, self.height as f32);
        let step_x = 1.0 / image_width;
        let step_y = 1.0 / image_height;
        let (tile_x, tile_y) = self.tile.get_pixel_range((self.width, self.height));
        let view_dir = self.camera.get_dir();

        for (i, row) in rows.chunks_exact_mut(self.width * 3).enumerate() {
            let y = first_row + i;
            for x in 0..self.width {
                let (base, depth) = match self.mesh_layer.get(x, y) {
                    Some((color, depth)) => (color, depth),
                    None => (self.background, f32::INFINITY),
                };

                let color = if tile_x.contains(&x) && tile_y.contains(&y) {
                    let pixel_coord = ((x as f32 + 0.5) * step_x, (y as f32 + 0.5) * step_y);
                    let ray = self.camera.get_ray(pixel_coord);
                    // view depth to ray parameter
                    let max_t = depth / ray.direction.dot(&view_dir);
                    self.shade_ray(&ray, max_t, base)
                } else {
                    base
                };

                let index = x * 3;
                row[index..index + 3].copy_from_slice(&color::to_bytes(color));
            }
        }
    }

    fn shade_ray(&self, ray: &Ray, max_t: f32, base: RGB) -> RGB {
        let grid = self.volume.grid();

        let (t0, t1) = match grid.intersect(ray) {
            Some(e) => e,
            None => return base,
        };
        let t1 = t1.min(max_t);
        if t0 >= t1 {
            return base;
        }

        let spacing = grid.get_spacing();
        let step_size = self.ray_step * spacing.min();
        let n_of_steps = ((t1 - t0) / step_size) as usize + 1;

        let bound_box = grid.get_bound_box();
        let mut pos = ray.to_volume_space(t0, &bound_box, spacing);
        let step = ray.direction_in_volume_space(spacing) * step_size;

        let property = &self.volume.property;
        let interpolation = property.interpolation;

        match self.volume.blend_mode {
            BlendMode::MaximumIntensity => {
                let mut max = f32::NEG_INFINITY;
                for _ in 0..n_of_steps {
                    max = max.max(grid.sample_at(pos, interpolation));
                    pos += step;
                }
                let rgba = property.classify(max);
                let opacity = rgba.w;
                rgba.xyz() * opacity + base * (1.0 - opacity)
            }
            BlendMode::Composite => {
                let mut accum = color::zero();
                for _ in 0..n_of_steps {
                    let sample = grid.sample_at(pos, interpolation);
                    pos += step;

                    let rgba = property.classify(sample);
                    if rgba.w == 0.0 {
                        continue;
                    }
                    // opacity is given per voxel, correct it for the step length
                    let opacity = 1.0 - (1.0 - rgba.w).powf(self.ray_step);
                    let rgb = rgba.xyz() * opacity;
                    accum += (1.0 - accum.w) * vector![rgb.x, rgb.y, rgb.z, opacity];

                    if self.early_ray_termination && accum.w > 0.99 {
                        break;
                    }
                }
                accum.xyz() + base * (1.0 - accum.w)
            }
        }
    }
}
