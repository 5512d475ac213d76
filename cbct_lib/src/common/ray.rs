use nalgebra::{point, vector, Matrix4, Point3, Vector3};

use super::BoundBox;

/// Ray cast by camera.
/// Main usecase is getting intersections with volumes ([`BoundBox::intersect`]),
/// then iterating over the intersected line segment in steps.
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Construct new ray using `origin` and `direction`.
    /// `direction` must be unit vector.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Ray {
        Ray { origin, direction }
    }

    /// Returns point `t` units far from ray origin in ray direction
    pub fn point_from_t(&self, t: f32) -> Point3<f32> {
        self.origin + t * self.direction
    }

    /// Transform a point of the ray from world coordinates into volume (voxel index) coordinates.
    ///
    /// # Params
    /// * `t` - ray parameter of the point
    /// * `bound_box` - Bounding box of volume
    /// * `spacing` - Shape of cells in volume
    pub fn to_volume_space(&self, t: f32, bound_box: &BoundBox, spacing: Vector3<f32>) -> Point3<f32> {
        let transform = volume_space_matrix(bound_box, spacing);
        transform.transform_point(&self.point_from_t(t))
    }

    /// Direction of the ray in volume (voxel index) coordinates.
    pub fn direction_in_volume_space(&self, spacing: Vector3<f32>) -> Vector3<f32> {
        let scale_inv = vector![1.0, 1.0, 1.0].component_div(&spacing);
        self.direction.component_mul(&scale_inv)
    }
}

fn volume_space_matrix(bound_box: &BoundBox, spacing: Vector3<f32>) -> Matrix4<f32> {
    let scale_inv = vector![1.0, 1.0, 1.0].component_div(&spacing);
    let lower_vec = bound_box.lower - point![0.0, 0.0, 0.0];

    Matrix4::identity()
        .append_translation(&-lower_vec)
        .append_nonuniform_scaling(&scale_inv)
}
