use log::warn;
use nalgebra::{point, vector, Point3, Rotation3, Unit, Vector2, Vector3};

use crate::{
    common::{BoundBox, Ray, ViewportBox},
    config::CameraConfig,
};

/// Ray-casting camera orbiting a focal point
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Position of the camera in world coordinates
    position: Point3<f32>,
    /// Point the camera looks at, center of rotations
    focal_point: Point3<f32>,
    /// Requested up direction, not necessarily orthogonal to `direction`
    view_up: Vector3<f32>,
    /// Unit direction from position to focal point
    direction: Vector3<f32>,
    /// Unit right direction from the camera's perspective
    right: Vector3<f32>,
    /// Unit up direction from the camera's perspective
    up: Vector3<f32>,
    /// Aspect ratio of image plane
    aspect: f32,
    /// Vertical Field of View in degrees
    fov_y: f32,
    /// Near and far distance along `direction`
    clipping_range: (f32, f32),
    /// Size of image plane
    img_plane_size: Vector2<f32>, // Calculated from fov_y
    /// Direction of ray passing through pixel \[0,0\]
    dir_00: Vector3<f32>, // upper left corner, in line with buffer convention
    /// Vector offset between two horizontally neighbouring pixels (such as: \[0,0\] -> \[1,0\])
    du: Vector3<f32>,
    /// Vector offset between two vertically neighbouring pixels (such as: \[0,0\] -> \[0,1\])
    dv: Vector3<f32>,
}

impl PerspectiveCamera {
    /// Construct new camera
    ///
    /// # Arguments
    ///
    /// * `position` - Position of the camera in world coordinates
    /// * `focal_point` - Point the camera looks at
    /// * `view_up` - Up direction
    ///
    /// # Notes
    ///
    /// Default view angle is 30 degrees, default aspect ratio is 1.
    pub fn new(
        position: Point3<f32>,
        focal_point: Point3<f32>,
        view_up: Vector3<f32>,
    ) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera {
            position,
            focal_point,
            view_up,
            direction: vector![0.0, 0.0, -1.0],
            right: vector![1.0, 0.0, 0.0],
            up: vector![0.0, 1.0, 0.0],
            aspect: 1.0,
            fov_y: 30.0,
            clipping_range: (0.01, 1000.01),
            img_plane_size: vector![0.0, 0.0],
            dir_00: vector![0.0, 0.0, 0.0],
            du: vector![0.0, 0.0, 0.0],
            dv: vector![0.0, 0.0, 0.0],
        };
        camera.recalc_plane_size();
        camera.recalc_plane();
        camera
    }

    pub fn from_config(config: &CameraConfig) -> PerspectiveCamera {
        let p = config.position;
        let f = config.focal_point;
        let u = config.view_up;
        let mut camera =
            PerspectiveCamera::new(point![p[0], p[1], p[2]], point![f[0], f[1], f[2]], vector![u[0], u[1], u[2]]);
        if config.view_angle > 0.0 && config.view_angle < 180.0 {
            camera.change_fov(config.view_angle);
        } else {
            warn!("Ignoring view angle {}", config.view_angle);
        }
        camera
    }

    /// Changes aspect ratio to match `(width, height)` resolution
    pub fn change_aspect_from_resolution(&mut self, width: usize, height: usize) {
        if width == 0 || height == 0 {
            return;
        }
        self.change_aspect(width as f32 / height as f32);
    }

    /// Change vertical FoV of camera
    ///
    /// # Arguments
    ///
    /// * `vertical_fov_deg` - vertical FoV in degrees
    pub fn change_fov(&mut self, vertical_fov_deg: f32) {
        assert!(vertical_fov_deg > 0.0 && vertical_fov_deg < 180.0);
        self.fov_y = vertical_fov_deg;
        self.recalc_plane_size();
        self.recalc_dudv();
    }

    /// Change aspect ratio of camera
    ///
    /// For example 1.25 for a 1000x800 window
    pub fn change_aspect(&mut self, aspect_ratio: f32) {
        self.aspect = aspect_ratio;
        self.recalc_plane_size();
        self.recalc_dudv();
    }

    /// Move the camera, the focal point stays
    pub fn set_pos(&mut self, pos: Point3<f32>) {
        self.position = pos;
        self.recalc_plane();
    }

    /// Look at another point, the position stays
    pub fn set_focal_point(&mut self, focal_point: Point3<f32>) {
        self.focal_point = focal_point;
        self.recalc_plane();
    }

    pub fn set_view_up(&mut self, view_up: Vector3<f32>) {
        self.view_up = view_up;
        self.recalc_plane();
    }

    /// Near and far plane distance
    pub fn set_clipping_range(&mut self, near: f32, far: f32) {
        self.clipping_range = (near, far);
    }

    /// Rotate the camera about the view up vector centered at the focal point
    ///
    /// Positive angle (degrees) moves the camera to the right.
    pub fn azimuth(&mut self, angle_deg: f32) {
        let axis = Unit::new_normalize(self.view_up);
        self.orbit(axis, angle_deg);
    }

    /// Rotate the camera about the right vector centered at the focal point
    ///
    /// Positive angle (degrees) moves the camera up.
    pub fn elevation(&mut self, angle_deg: f32) {
        let axis = -self.direction.cross(&self.view_up);
        if axis.norm() < f32::EPSILON {
            return;
        }
        self.orbit(Unit::new_normalize(axis), angle_deg);
    }

    fn orbit(&mut self, axis: Unit<Vector3<f32>>, angle_deg: f32) {
        let rotation = Rotation3::from_axis_angle(&axis, angle_deg.to_radians());
        let offset = self.position - self.focal_point;
        self.position = self.focal_point + rotation * offset;
        self.recalc_plane();
    }

    /// Make the view up vector orthogonal to the viewing direction
    pub fn orthogonalize_view_up(&mut self) {
        self.view_up = self.up;
    }

    /// Move the camera towards the focal point
    ///
    /// A `factor` above 1 moves closer, the focal point stays.
    pub fn dolly(&mut self, factor: f32) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        let distance = self.distance() / factor;
        self.position = self.focal_point - distance * self.direction;
    }

    /// Move both the camera and the focal point by `offset`
    pub fn pan(&mut self, offset: Vector3<f32>) {
        self.position += offset;
        self.focal_point += offset;
    }

    /// Look at the center of `bounds` from a distance where the whole box is visible
    ///
    /// The viewing direction is kept. Clipping range is set to enclose the box.
    pub fn reset_to_bounds(&mut self, bounds: &BoundBox) {
        let center = bounds.center();
        let mut radius = bounds.diagonal() * 0.5;
        if radius == 0.0 {
            radius = 0.5;
        }

        let mut angle = self.fov_y.to_radians();
        if self.aspect < 1.0 {
            // horizontal angle is the narrower one
            angle = 2.0 * f32::atan(f32::tan(angle * 0.5) * self.aspect);
        }
        let distance = radius / f32::sin(angle * 0.5);

        if self.direction.cross(&self.view_up).norm() < 0.001 * self.view_up.norm() {
            warn!("Resetting view-up since view plane normal is parallel");
            let u = self.view_up;
            self.view_up = vector![-u.z, u.x, u.y];
        }

        self.focal_point = center;
        self.position = center - distance * self.direction;
        self.recalc_plane();
        self.reset_clipping_range(bounds);
    }

    /// Fit near and far plane around the bounding sphere of `bounds`
    pub fn reset_clipping_range(&mut self, bounds: &BoundBox) {
        let radius = f32::max(bounds.diagonal() * 0.5, 0.5);
        let center_depth = (bounds.center() - self.position).dot(&self.direction);

        let far = center_depth + 1.01 * radius;
        let near = center_depth - 1.01 * radius;
        // keep some depth resolution
        let near = f32::max(near, 0.001 * far);
        self.clipping_range = (near, f32::max(far, near * 1.001));
    }

    // Call when position, focal point or view up changed
    fn recalc_plane(&mut self) {
        let dir = self.focal_point - self.position;
        if dir.norm() > f32::EPSILON {
            self.direction = dir.normalize();
        }
        self.recalc_up_right();
        self.recalc_dudv();
    }

    // Call when camera direction changed
    fn recalc_up_right(&mut self) {
        let right = self.direction.cross(&self.view_up);
        if right.norm() > f32::EPSILON {
            self.right = right.normalize();
        } else {
            // view up parallel to direction, keep the old right vector in the new view plane
            let r = self.right - self.right.dot(&self.direction) * self.direction;
            if r.norm() > f32::EPSILON {
                self.right = r.normalize();
            }
        }
        self.up = self.right.cross(&self.direction);
    }

    // Call when fov or aspect ratio changed
    fn recalc_plane_size(&mut self) {
        self.img_plane_size = vector![0.0, 2.0 * f32::tan(f32::to_radians(0.5 * self.fov_y))];
        self.img_plane_size.x = self.img_plane_size.y * self.aspect;
    }

    // Call when direction changed
    fn recalc_dudv(&mut self) {
        self.du = self.img_plane_size.x * self.right;
        self.dv = -self.img_plane_size.y * self.up; // Notice '-' sign
        self.dir_00 = self.direction - 0.5 * self.du - 0.5 * self.dv;
    }

    /// Get ray originating in the camera position crossing view plane in coordinates `pixel_coord`
    ///
    /// # Arguments
    ///
    /// * pixel_coord - Coordinates in the range of `<0;1>x<0;1>`, point \[0,0\] being upper left corner
    pub fn get_ray(&self, pixel_coord: (f32, f32)) -> Ray {
        let dir = self.dir_00 + self.du * pixel_coord.0 + self.dv * pixel_coord.1;
        let dir = dir.normalize();
        Ray::new(self.position, dir)
    }

    /// Project a world point to the viewport
    ///
    /// Returns viewport coordinates (`<0;1>` when visible, \[0,0\] upper left)
    /// and the depth along the viewing direction. `None` for points
    /// at or behind the camera plane.
    pub fn project(&self, point: &Point3<f32>) -> Option<Point3<f32>> {
        let v = point - self.position;
        let depth = v.dot(&self.direction);
        if depth <= f32::EPSILON {
            return None;
        }

        // point on the image plane at distance 1
        let screen_dir = v / depth - self.dir_00;
        let x = screen_dir.dot(&self.du) / self.du.norm_squared();
        let y = screen_dir.dot(&self.dv) / self.dv.norm_squared();
        Some(point![x, y, depth])
    }

    /// Project bounding box to viewport
    ///
    /// Resulting viewport box is the minimal orthogonal rectangular projection.
    /// Corners behind the camera are ignored.
    pub fn project_box(&self, bound_box: BoundBox) -> ViewportBox {
        let mut viewbox = ViewportBox::new();
        for point in bound_box {
            if let Some(p) = self.project(&point) {
                viewbox.add_point(p.x, p.y);
            }
        }
        viewbox
    }

    /// Whole box is in front of the camera, inside the view and the clipping range
    pub fn frustum_contains(&self, bound_box: &BoundBox) -> bool {
        const EPS: f32 = 1e-4;
        let (near, far) = self.clipping_range;
        bound_box.into_iter().all(|corner| match self.project(&corner) {
            Some(p) => {
                (-EPS..=1.0 + EPS).contains(&p.x)
                    && (-EPS..=1.0 + EPS).contains(&p.y)
                    && p.z >= near * (1.0 - EPS)
                    && p.z <= far * (1.0 + EPS)
            }
            None => false,
        })
    }

    /// Distance between position and focal point
    pub fn distance(&self) -> f32 {
        (self.focal_point - self.position).magnitude()
    }

    /// World size of one pixel at the focal point, for a view `height` pixels high
    pub fn pixel_size_at_focus(&self, height: usize) -> f32 {
        self.distance() * self.img_plane_size.y / height.max(1) as f32
    }

    /// Direction getter
    pub fn get_dir(&self) -> Vector3<f32> {
        self.direction
    }

    /// Position getter
    pub fn get_pos(&self) -> Point3<f32> {
        self.position
    }

    pub fn get_focal_point(&self) -> Point3<f32> {
        self.focal_point
    }

    pub fn get_view_up(&self) -> Vector3<f32> {
        self.view_up
    }

    /// Orthogonal up vector of the view
    pub fn get_up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn get_right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn get_fov(&self) -> f32 {
        self.fov_y
    }

    pub fn get_aspect(&self) -> f32 {
        self.aspect
    }

    pub fn get_clipping_range(&self) -> (f32, f32) {
        self.clipping_range
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        PerspectiveCamera::from_config(&CameraConfig::default())
    }
}
