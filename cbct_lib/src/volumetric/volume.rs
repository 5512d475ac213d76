use crate::{
    common::{BoundBox, Ray},
    transfer_function::Interpolation,
};

use nalgebra::{Point3, Vector3};

// Volume assumes f32 data
// Volume is axis aligned
pub trait Volume {
    // get data dimensions
    fn get_size(&self) -> Vector3<usize>;

    // get volume position
    // axis aligned, lowest corner
    fn get_pos(&self) -> Point3<f32> {
        self.get_bound_box().lower
    }

    // get scaled size
    fn get_dims(&self) -> Vector3<f32> {
        self.get_bound_box().dims()
    }

    // shape of a voxel
    fn get_spacing(&self) -> Vector3<f32>;

    // interpolated sample, zero if outside
    // pos in volume coordinates
    fn sample_at(&self, pos: Point3<f32>, interpolation: Interpolation) -> f32;

    fn get_bound_box(&self) -> BoundBox;

    // position is inside volume
    fn is_in(&self, pos: &Point3<f32>) -> bool {
        self.get_bound_box().is_in(pos)
    }

    // For building and tests, mostly
    fn get_data(&self, x: usize, y: usize, z: usize) -> Option<f32>;

    fn intersect(&self, ray: &Ray) -> Option<(f32, f32)> {
        self.get_bound_box().intersect(ray)
    }

    // Every axis has at least two samples
    fn is_renderable(&self) -> bool {
        let size = self.get_size();
        size.x >= 2 && size.y >= 2 && size.z >= 2
    }

    fn get_name(&self) -> &str;
}
