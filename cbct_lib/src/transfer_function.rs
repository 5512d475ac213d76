//! Piecewise-linear transfer functions
//!
//! Volume samples are classified by two independent ramps, one for colour and
//! one for opacity. Between nodes the value is interpolated linearly, outside
//! of the node range the value of the nearest node is used.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::{
    color::{self, RGB, RGBA},
    config::TransferConfig,
};

/// Sampling of the volume between voxel centers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    Linear,
}

/// Sorted `(scalar, value)` nodes with linear interpolation
#[derive(Debug, Clone)]
struct Nodes<T> {
    nodes: Vec<(f32, T)>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> Nodes<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    fn add(&mut self, x: f32, value: T) {
        // replaces a node on the same scalar
        self.nodes.retain(|(nx, _)| *nx != x);
        let index = self.nodes.partition_point(|(nx, _)| *nx < x);
        self.nodes.insert(index, (x, value));
    }

    fn remove_between(&mut self, low: f32, high: f32) {
        self.nodes.retain(|(nx, _)| *nx < low || *nx > high);
    }

    fn eval(&self, x: f32) -> Option<T> {
        let first = self.nodes.first()?;
        let last = self.nodes.last()?;

        if x <= first.0 {
            return Some(first.1);
        }
        if x >= last.0 {
            return Some(last.1);
        }

        let upper = self.nodes.partition_point(|(nx, _)| *nx <= x);
        let (x0, v0) = self.nodes[upper - 1];
        let (x1, v1) = self.nodes[upper];
        let t = (x - x0) / (x1 - x0);
        Some(v0 + (v1 - v0) * t)
    }

    fn range(&self) -> Option<(f32, f32)> {
        Some((self.nodes.first()?.0, self.nodes.last()?.0))
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Scalar → RGB ramp
#[derive(Debug, Clone, Default)]
pub struct ColorTransferFunction {
    nodes: Nodes<RGB>,
}

impl ColorTransferFunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rgb_point(&mut self, x: f32, r: f32, g: f32, b: f32) {
        self.nodes.add(x, color::rgb(r, g, b));
    }

    /// Replace everything in `<x1;x2>` with a linear segment
    #[allow(clippy::too_many_arguments)]
    pub fn add_rgb_segment(&mut self, x1: f32, r1: f32, g1: f32, b1: f32, x2: f32, r2: f32, g2: f32, b2: f32) {
        let (low, high) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
        self.nodes.remove_between(low, high);
        self.add_rgb_point(x1, r1, g1, b1);
        self.add_rgb_point(x2, r2, g2, b2);
    }

    /// Colour of a sample, black if the function has no nodes
    pub fn map_value(&self, x: f32) -> RGB {
        self.nodes.eval(x).unwrap_or_else(|| color::rgb(0.0, 0.0, 0.0))
    }

    pub fn range(&self) -> Option<(f32, f32)> {
        self.nodes.range()
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }
}

/// Scalar → opacity ramp
#[derive(Debug, Clone, Default)]
pub struct PiecewiseFunction {
    nodes: Nodes<f32>,
}

impl PiecewiseFunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, x: f32, y: f32) {
        self.nodes.add(x, y);
    }

    /// Replace everything in `<x1;x2>` with a linear segment
    pub fn add_segment(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let (low, high) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
        self.nodes.remove_between(low, high);
        self.add_point(x1, y1);
        self.add_point(x2, y2);
    }

    /// Opacity of a sample, zero if the function has no nodes
    pub fn value(&self, x: f32) -> f32 {
        self.nodes.eval(x).unwrap_or(0.0)
    }

    pub fn range(&self) -> Option<(f32, f32)> {
        self.nodes.range()
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }
}

/// Shading parameters of a volume
#[derive(Debug, Clone)]
pub struct VolumeProperty {
    pub color: ColorTransferFunction,
    pub scalar_opacity: PiecewiseFunction,
    pub interpolation: Interpolation,
}

impl VolumeProperty {
    /// Builds the CBCT ramps: opacity rises over the intensity window,
    /// colour is a single segment over the colour range.
    pub fn from_config(cfg: &TransferConfig) -> VolumeProperty {
        let (low, high) = cfg.opacity_window();
        let mut scalar_opacity = PiecewiseFunction::new();
        scalar_opacity.add_segment(low, cfg.opacity_low, high, cfg.opacity_high);

        let [c0, c1] = cfg.color_range;
        let [r0, g0, b0] = cfg.color_low;
        let [r1, g1, b1] = cfg.color_high;
        let mut color = ColorTransferFunction::new();
        color.add_rgb_segment(c0, r0, g0, b0, c1, r1, g1, b1);

        VolumeProperty {
            color,
            scalar_opacity,
            interpolation: cfg.interpolation,
        }
    }

    /// Colour and opacity of a sample
    pub fn classify(&self, sample: f32) -> RGBA {
        let rgb = self.color.map_value(sample);
        let opacity = self.scalar_opacity.value(sample);
        color::new(rgb.x, rgb.y, rgb.z, opacity)
    }
}
