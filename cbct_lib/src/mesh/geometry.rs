use nalgebra::{Matrix4, Point3};

use crate::common::BoundBox;

/// Polygonal surface: vertices and faces indexing into them (0-based)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<Point3<f32>>,
    pub faces: Vec<Vec<usize>>,
}

impl MeshGeometry {
    pub fn new(vertices: Vec<Point3<f32>>, faces: Vec<Vec<usize>>) -> Self {
        Self { vertices, faces }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Bounds in model coordinates, `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<BoundBox> {
        BoundBox::from_points(&self.vertices)
    }

    /// Bounds of the vertices after applying `matrix`
    pub fn transformed_bounds(&self, matrix: &Matrix4<f32>) -> Option<BoundBox> {
        let points: Vec<_> = self
            .vertices
            .iter()
            .map(|v| matrix.transform_point(v))
            .collect();
        BoundBox::from_points(&points)
    }

    /// Fan triangulation of all faces
    ///
    /// Faces with less than 3 vertices or with indices outside
    /// the vertex list produce no triangles.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let n = self.vertices.len();
        self.faces
            .iter()
            .filter(move |f| f.len() >= 3 && f.iter().all(|&i| i < n))
            .flat_map(|f| (1..f.len() - 1).map(move |k| [f[0], f[k], f[k + 1]]))
    }

    /// At most `count` vertices, evenly spread over the vertex list
    pub fn cloud_points(&self, count: usize) -> Vec<Point3<f32>> {
        let n = self.vertices.len();
        if count == 0 || n == 0 {
            return Vec::new();
        }
        if count >= n {
            return self.vertices.clone();
        }
        (0..count).map(|i| self.vertices[i * n / count]).collect()
    }
}
