use std::{cmp::min, ops::Range};

use nalgebra::{point, Point2, Vector2};

/// A 2D range, rectangle described by two points.
/// Coordinates are in the `<0;1>x<0;1>` viewport space.
#[derive(Debug, Clone, Copy)]
pub struct ViewportBox {
    pub lower: Point2<f32>,
    pub upper: Point2<f32>,
}

impl ViewportBox {
    // Maximum viewport, flipped
    pub fn new() -> Self {
        Self {
            lower: point![f32::INFINITY, f32::INFINITY],
            upper: point![f32::NEG_INFINITY, f32::NEG_INFINITY],
        }
    }

    /// Whole viewport
    pub fn full() -> Self {
        Self {
            lower: point![0.0, 0.0],
            upper: point![1.0, 1.0],
        }
    }

    pub fn add_point(&mut self, x: f32, y: f32) {
        self.upper.x = f32::max(self.upper.x, x);
        self.upper.y = f32::max(self.upper.y, y);
        self.lower.x = f32::min(self.lower.x, x);
        self.lower.y = f32::min(self.lower.y, y);
    }

    pub fn size(&self) -> Vector2<f32> {
        self.upper - self.lower
    }

    /// No point was added
    pub fn is_empty(&self) -> bool {
        self.lower.x > self.upper.x || self.lower.y > self.upper.y
    }

    pub fn get_pixel_range(&self, resolution: (usize, usize)) -> (Range<usize>, Range<usize>) {
        let (width, height) = resolution;
        if self.is_empty() {
            return (0..0, 0..0);
        }

        let width_f = width as f32;
        let height_f = height as f32;

        let start_x = f32::floor(self.lower.x.clamp(0.0, 1.0) * width_f) as usize;
        let start_y = f32::floor(self.lower.y.clamp(0.0, 1.0) * height_f) as usize;

        let end_x = f32::ceil(self.upper.x.clamp(0.0, 1.0) * width_f) as usize;
        let end_y = f32::ceil(self.upper.y.clamp(0.0, 1.0) * height_f) as usize;

        let end_x = min(end_x, width);
        let end_y = min(end_y, height);

        (start_x..end_x, start_y..end_y)
    }
}

impl Default for ViewportBox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn viewport() {
        let mut vp = ViewportBox::new();
        assert!(vp.is_empty());

        vp.add_point(0.5, 0.5);

        assert_eq!(vp.lower, point![0.5, 0.5]);
        assert_eq!(vp.upper, point![0.5, 0.5]);

        vp.add_point(0.6, 0.6);

        assert_eq!(vp.lower, point![0.5, 0.5]);
        assert_eq!(vp.upper, point![0.6, 0.6]);

        vp.add_point(0.5, 0.4);

        assert_eq!(vp.lower, point![0.5, 0.4]);
        assert_eq!(vp.upper, point![0.6, 0.6]);

        vp.add_point(0.2, 0.8);

        assert_eq!(vp.lower, point![0.2, 0.4]);
        assert_eq!(vp.upper, point![0.6, 0.8]);
    }

    #[test]
    fn pixel_range_is_clamped() {
        let mut vp = ViewportBox::new();
        vp.add_point(-0.5, 0.25);
        vp.add_point(0.5, 1.5);

        let (xs, ys) = vp.get_pixel_range((100, 40));
        assert_eq!(xs, 0..50);
        assert_eq!(ys, 10..40);

        assert_eq!(ViewportBox::new().get_pixel_range((10, 10)), (0..0, 0..0));
    }
}
