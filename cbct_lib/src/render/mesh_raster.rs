use nalgebra::{Point2, Point3};

use crate::{
    camera::PerspectiveCamera,
    color::{self, RGB},
    scene::MeshActor,
};

use super::RenderQuality;

/// Colour and view depth of the opaque mesh, one value per pixel
///
/// Depth is the distance along the viewing direction,
/// infinite where no surface was drawn.
pub struct MeshLayer {
    width: usize,
    height: usize,
    color: Vec<RGB>,
    depth: Vec<f32>,
}

impl MeshLayer {
    pub fn new(width: usize, height: usize) -> MeshLayer {
        let elements = width * height;
        MeshLayer {
            width,
            height,
            color: vec![color::rgb(0.0, 0.0, 0.0); elements],
            depth: vec![f32::INFINITY; elements],
        }
    }

    /// Surface colour and depth at pixel, `None` for background
    pub fn get(&self, x: usize, y: usize) -> Option<(RGB, f32)> {
        let index = x + y * self.width;
        let depth = *self.depth.get(index)?;
        if depth.is_finite() {
            Some((self.color[index], depth))
        } else {
            None
        }
    }

    /// Number of pixels covered by the mesh
    pub fn covered(&self) -> usize {
        self.depth.iter().filter(|d| d.is_finite()).count()
    }

    pub fn draw_mesh(
        &mut self,
        mesh: &MeshActor,
        camera: &PerspectiveCamera,
        quality: RenderQuality,
        point_size: usize,
    ) {
        if mesh.geometry().is_empty() {
            return;
        }
        match quality {
            RenderQuality::Full => self.draw_triangles(mesh, camera),
            RenderQuality::Interactive => self.draw_cloud(mesh, camera, point_size),
        }
    }

    fn draw_triangles(&mut self, mesh: &MeshActor, camera: &PerspectiveCamera) {
        let geometry = mesh.geometry();
        let matrix = mesh.world_matrix();
        let cam_pos = camera.get_pos();
        let (near, _) = camera.get_clipping_range();

        let world: Vec<Point3<f32>> = geometry
            .vertices
            .iter()
            .map(|v| matrix.transform_point(v))
            .collect();
        let projected: Vec<Option<Point3<f32>>> =
            world.iter().map(|p| camera.project(p)).collect();

        for [i, j, k] in geometry.triangles() {
            let (a, b, c) = (world[i], world[j], world[k]);
            let normal = (b - a).cross(&(c - a));
            if normal.norm_squared() == 0.0 {
                continue;
            }
            // front faces are wound counter-clockwise, their normal points to the camera
            if mesh.backface_culling && normal.dot(&(a - cam_pos)) >= 0.0 {
                continue;
            }

            let (pa, pb, pc) = match (projected[i], projected[j], projected[k]) {
                (Some(pa), Some(pb), Some(pc)) => (pa, pb, pc),
                _ => continue,
            };
            if pa.z < near || pb.z < near || pc.z < near {
                continue;
            }

            // headlight
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            let view = (centroid - cam_pos).normalize();
            let shade = normal.normalize().dot(&view).abs();

            self.fill_triangle([pa, pb, pc], mesh.color * shade, camera);
        }
    }

    fn fill_triangle(&mut self, vertices: [Point3<f32>; 3], color: RGB, camera: &PerspectiveCamera) {
        let (near, far) = camera.get_clipping_range();
        let (w, h) = (self.width as f32, self.height as f32);
        let screen = vertices.map(|p| Point2::new(p.x * w, p.y * h));
        let [a, b, c] = screen;

        let area = edge(&a, &b, &c);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min_x = a.x.min(b.x).min(c.x);
        let max_x = a.x.max(b.x).max(c.x);
        let min_y = a.y.min(b.y).min(c.y);
        let max_y = a.y.max(b.y).max(c.y);
        let (xs, ys) = match (
            pixel_span(min_x, max_x, self.width),
            pixel_span(min_y, max_y, self.height),
        ) {
            (Some(xs), Some(ys)) => (xs, ys),
            _ => return,
        };

        let inv_depth = vertices.map(|p| 1.0 / p.z);

        for y in ys.0..=ys.1 {
            for x in xs.0..=xs.1 {
                let p = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(&b, &c, &p) / area;
                let w1 = edge(&c, &a, &p) / area;
                let w2 = edge(&a, &b, &p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // 1/depth is linear in screen space
                let depth = 1.0 / (w0 * inv_depth[0] + w1 * inv_depth[1] + w2 * inv_depth[2]);
                if depth < near || depth > far {
                    continue;
                }
                self.write(x, y, depth, color);
            }
        }
    }

    fn draw_cloud(&mut self, mesh: &MeshActor, camera: &PerspectiveCamera, point_size: usize) {
        let (near, far) = camera.get_clipping_range();
        let matrix = mesh.world_matrix();
        let half = (point_size / 2) as isize;

        for point in mesh.geometry().cloud_points(mesh.cloud_points) {
            let p = match camera.project(&matrix.transform_point(&point)) {
                Some(p) if p.z >= near && p.z <= far => p,
                _ => continue,
            };
            let cx = (p.x * self.width as f32).floor() as isize;
            let cy = (p.y * self.height as f32).floor() as isize;

            for y in cy - half..cy - half + point_size as isize {
                for x in cx - half..cx - half + point_size as isize {
                    if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
                        continue;
                    }
                    self.write(x as usize, y as usize, p.z, mesh.color);
                }
            }
        }
    }

    // depth test
    fn write(&mut self, x: usize, y: usize, depth: f32, color: RGB) {
        let index = x + y * self.width;
        if depth < self.depth[index] {
            self.depth[index] = depth;
            self.color[index] = color;
        }
    }
}

fn edge(a: &Point2<f32>, b: &Point2<f32>, p: &Point2<f32>) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

// inclusive pixel range covering <min;max>, None if outside of the image
fn pixel_span(min: f32, max: f32, len: usize) -> Option<(usize, usize)> {
    if len == 0 || max < 0.0 || min >= len as f32 {
        return None;
    }
    let start = min.floor().max(0.0) as usize;
    let end = (max.ceil() as usize).min(len - 1);
    if start > end {
        None
    } else {
        Some((start, end))
    }
}

#[cfg(test)]
mod test {
    use nalgebra::{point, vector};

    use super::*;
    use crate::{
        mesh::MeshGeometry,
        test_helpers::{cube_mesh, mesh_actor},
    };

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(
            point![0.0, 0.0, 10.0],
            point![0.0, 0.0, 0.0],
            vector![0.0, 1.0, 0.0],
        )
    }

    #[test]
    fn cube_covers_center() {
        let mesh = mesh_actor(&cube_mesh(2.0), "raster_cube.obj");
        let mut layer = MeshLayer::new(32, 32);
        layer.draw_mesh(&mesh, &camera(), RenderQuality::Full, 3);

        // front face is at z = 1
        let (color, depth) = layer.get(16, 16).unwrap();
        assert!((depth - 9.0).abs() < 1e-3, "{depth}");
        assert!(color.x > 0.99);
        assert!(layer.get(0, 0).is_none());
    }

    #[test]
    fn backface_culling() {
        // clockwise when seen from the camera
        let triangle = MeshGeometry::new(
            vec![
                point![-1.0, -1.0, 0.0],
                point![0.0, 1.0, 0.0],
                point![1.0, -1.0, 0.0],
            ],
            vec![vec![0, 1, 2]],
        );
        let mut mesh = mesh_actor(&triangle, "raster_back.obj");

        let mut layer = MeshLayer::new(16, 16);
        layer.draw_mesh(&mesh, &camera(), RenderQuality::Full, 3);
        assert_eq!(layer.covered(), 0);

        mesh.backface_culling = false;
        layer.draw_mesh(&mesh, &camera(), RenderQuality::Full, 3);
        assert!(layer.covered() > 0);
    }

    #[test]
    fn cloud_points_while_interacting() {
        let mut mesh = mesh_actor(&cube_mesh(2.0), "raster_cloud.obj");
        mesh.cloud_points = 4;

        let mut full = MeshLayer::new(64, 64);
        full.draw_mesh(&mesh, &camera(), RenderQuality::Full, 3);

        let mut cloud = MeshLayer::new(64, 64);
        cloud.draw_mesh(&mesh, &camera(), RenderQuality::Interactive, 3);

        assert!(cloud.covered() > 0);
        assert!(cloud.covered() <= 4 * 9);
        assert!(cloud.covered() < full.covered());
    }

    #[test]
    fn nearer_surface_wins() {
        let mut mesh = mesh_actor(&cube_mesh(2.0), "raster_depth.obj");
        mesh.backface_culling = false;
        let mut layer = MeshLayer::new(32, 32);
        layer.draw_mesh(&mesh, &camera(), RenderQuality::Full, 3);

        let (_, depth) = layer.get(16, 16).unwrap();
        assert!((depth - 9.0).abs() < 1e-3);
    }
}
