use nalgebra::{vector, Vector2};
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;

/// Quality of rendered image
/// At the moment, the difference is sampling step and mesh detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderQuality {
    /// Short ray step, full mesh
    Full,
    /// Long ray step, mesh drawn as a point cloud
    Interactive,
}

/// Render quality preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreference {
    /// Always render at the `RenderQuality::Full` setting
    AlwaysFull,
    /// Always render at the `RenderQuality::Interactive` setting
    AlwaysInteractive,
    /// Use `Interactive` when moving camera, `Full` otherwise
    InteractiveOnMovement,
}

impl QualityPreference {
    pub fn quality(&self, camera_moving: bool) -> RenderQuality {
        match self {
            QualityPreference::AlwaysFull => RenderQuality::Full,
            QualityPreference::AlwaysInteractive => RenderQuality::Interactive,
            QualityPreference::InteractiveOnMovement if camera_moving => {
                RenderQuality::Interactive
            }
            QualityPreference::InteractiveOnMovement => RenderQuality::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub resolution: Vector2<usize>,
    /// Stop compositing once the ray is opaque
    pub early_ray_termination: bool,
    /// Render bands of rows in parallel
    pub multi_thread: bool,
    /// Ray step in voxels for `RenderQuality::Full`
    pub ray_step_quality: f32,
    /// Ray step in voxels for `RenderQuality::Interactive`
    pub ray_step_fast: f32,
    /// Side of a cloud point square in pixels
    pub point_size: usize,
}

impl RenderOptions {
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder::new()
    }

    /// Options for a `width` x `height` window
    pub fn from_config(config: &RenderConfig, width: usize, height: usize) -> RenderOptions {
        RenderOptions::builder()
            .resolution(vector![width, height])
            .early_ray_termination(true)
            .multi_thread(config.multi_thread)
            .ray_step_quality(config.ray_step_quality)
            .ray_step_fast(config.ray_step_fast)
            .build_unchecked()
    }

    pub fn ray_step(&self, quality: RenderQuality) -> f32 {
        match quality {
            RenderQuality::Full => self.ray_step_quality,
            RenderQuality::Interactive => self.ray_step_fast,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptionsBuilder::new().build_unchecked()
    }
}

pub struct RenderOptionsBuilder {
    resolution: Option<Vector2<usize>>,
    early_ray_termination: bool,
    multi_thread: bool,
    ray_step_quality: f32,
    ray_step_fast: f32,
    point_size: usize,
}

impl RenderOptionsBuilder {
    pub fn new() -> Self {
        Self {
            resolution: None,
            early_ray_termination: true,
            multi_thread: true,
            ray_step_quality: 0.5,
            ray_step_fast: 2.0,
            point_size: 3,
        }
    }

    pub fn resolution(mut self, resolution: Vector2<usize>) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn early_ray_termination(mut self, enabled: bool) -> Self {
        self.early_ray_termination = enabled;
        self
    }

    pub fn multi_thread(mut self, enabled: bool) -> Self {
        self.multi_thread = enabled;
        self
    }

    pub fn ray_step_quality(mut self, step: f32) -> Self {
        self.ray_step_quality = step;
        self
    }

    pub fn ray_step_fast(mut self, step: f32) -> Self {
        self.ray_step_fast = step;
        self
    }

    pub fn point_size(mut self, size: usize) -> Self {
        self.point_size = size;
        self
    }

    /// `None` if resolution is missing or zero, or a step is not positive
    pub fn build(self) -> Option<RenderOptions> {
        let resolution = self.resolution?;
        if resolution.x == 0 || resolution.y == 0 {
            return None;
        }
        if !(self.ray_step_quality > 0.0) || !(self.ray_step_fast > 0.0) {
            return None;
        }
        Some(self.build_unchecked())
    }

    /// Missing resolution defaults to 1000x800, bad steps to 1 voxel
    pub fn build_unchecked(self) -> RenderOptions {
        let positive = |v: f32| if v > 0.0 { v } else { 1.0 };
        RenderOptions {
            resolution: self.resolution.unwrap_or_else(|| vector![1000, 800]),
            early_ray_termination: self.early_ray_termination,
            multi_thread: self.multi_thread,
            ray_step_quality: positive(self.ray_step_quality),
            ray_step_fast: positive(self.ray_step_fast),
            point_size: self.point_size.max(1),
        }
    }
}

impl Default for RenderOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
