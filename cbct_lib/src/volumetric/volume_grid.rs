use log::info;
use nalgebra::{point, vector, Point3, Vector3};

use crate::{
    common::{BoundBox, ValueRange},
    transfer_function::Interpolation,
    Error, Result,
};

use super::{
    vol_builder::{BuildVolume, VolumeMetadata},
    Volume,
};

/// Scalar grid decoded from a slice series
pub struct VolumeGrid {
    bound_box: BoundBox, // lower and upper point in world coordinates; lower == position; upper - lower = (size - 1) * spacing
    size: Vector3<usize>,
    spacing: Vector3<f32>,
    data: Vec<f32>,
    range: ValueRange,
}

impl std::fmt::Debug for VolumeGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeGrid")
            .field("box", &self.bound_box)
            .field("size", &self.size)
            .field("spacing", &self.spacing)
            .field("data len ", &self.data.len())
            .finish()
    }
}

impl VolumeGrid {
    /// Grid without samples, what a failed load produces
    pub fn empty() -> VolumeGrid {
        VolumeGrid {
            bound_box: BoundBox::empty(),
            size: vector![0, 0, 0],
            spacing: vector![1.0, 1.0, 1.0],
            data: Vec::new(),
            range: ValueRange::empty(),
        }
    }

    fn get_3d_index(&self, x: usize, y: usize, z: usize) -> usize {
        z + y * self.size.z + x * self.size.y * self.size.z
    }

    fn get_3d_data(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        if x >= self.size.x || y >= self.size.y || z >= self.size.z {
            return None;
        }
        self.data.get(self.get_3d_index(x, y, z)).copied()
    }

    // caller guarantees the index is inside
    fn at(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.get_3d_index(x, y, z)]
    }

    /// Fails if any axis has less than 2 samples
    pub fn check_dimensions(&self) -> Result<()> {
        if self.is_renderable() {
            Ok(())
        } else {
            Err(Error::DegenerateVolume { dims: self.size })
        }
    }

    /// Lowest and highest sample, empty for an empty grid
    pub fn scalar_range(&self) -> ValueRange {
        self.range
    }

    /// Moves the grid so that its lowest corner is at `position`
    pub fn set_position(&mut self, position: Point3<f32>) {
        self.bound_box = BoundBox::from_position_dims(position, self.bound_box.dims());
    }

    /// Moves the grid by `offset`
    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.set_position(self.bound_box.lower + offset);
    }

    fn sample_linear(&self, pos: Point3<f32>) -> f32 {
        // cell containing pos, the last sample plane belongs to the cell before it
        let cell = |v: f32, len: usize| -> (usize, f32) {
            let i = (v.floor() as usize).min(len - 2);
            (i, v - i as f32)
        };
        let (x, x_t) = cell(pos.x, self.size.x);
        let (y, y_t) = cell(pos.y, self.size.y);
        let (z, z_t) = cell(pos.z, self.size.z);

        // c000, c001, c010, c011
        let low = vector![
            self.at(x, y, z),
            self.at(x, y, z + 1),
            self.at(x, y + 1, z),
            self.at(x, y + 1, z + 1)
        ];
        // c100, c101, c110, c111
        let high = vector![
            self.at(x + 1, y, z),
            self.at(x + 1, y, z + 1),
            self.at(x + 1, y + 1, z),
            self.at(x + 1, y + 1, z + 1)
        ];

        // x plane
        let mut plane = low * (1.0 - x_t) + high * x_t;
        let inv_y_t = 1.0 - y_t;
        plane.component_mul_assign(&vector![inv_y_t, inv_y_t, y_t, y_t]);

        // y line
        let c0: f32 = plane.x + plane.z;
        let c1: f32 = plane.y + plane.w;

        c0 * (1.0 - z_t) + c1 * z_t
    }

    fn sample_nearest(&self, pos: Point3<f32>) -> f32 {
        let x = (pos.x.round() as usize).min(self.size.x - 1);
        let y = (pos.y.round() as usize).min(self.size.y - 1);
        let z = (pos.z.round() as usize).min(self.size.z - 1);
        self.at(x, y, z)
    }
}

impl Volume for VolumeGrid {
    fn sample_at(&self, pos: Point3<f32>, interpolation: Interpolation) -> f32 {
        if !self.is_renderable() {
            return 0.0;
        }

        let max = self.size.map(|v| (v - 1) as f32);
        let outside = pos.x < 0.0
            || pos.y < 0.0
            || pos.z < 0.0
            || pos.x > max.x
            || pos.y > max.y
            || pos.z > max.z;
        if outside {
            return 0.0;
        }

        match interpolation {
            Interpolation::Linear => self.sample_linear(pos),
            Interpolation::Nearest => self.sample_nearest(pos),
        }
    }

    fn get_data(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        self.get_3d_data(x, y, z)
    }

    fn get_size(&self) -> Vector3<usize> {
        self.size
    }

    fn get_spacing(&self) -> Vector3<f32> {
        self.spacing
    }

    fn get_bound_box(&self) -> BoundBox {
        self.bound_box
    }

    fn get_name(&self) -> &str {
        "VolumeGrid"
    }
}

impl BuildVolume<VolumeMetadata> for VolumeGrid {
    fn build(metadata: VolumeMetadata) -> Result<VolumeGrid> {
        let VolumeMetadata {
            size,
            spacing,
            position,
            data,
        } = metadata;

        let expected = size.x * size.y * size.z;
        if data.len() != expected {
            return Err(Error::InvalidVolume(format!(
                "{} samples do not fill a {}x{}x{} grid",
                data.len(),
                size.x,
                size.y,
                size.z
            )));
        }

        if spacing.iter().any(|s| !(*s > 0.0)) {
            return Err(Error::InvalidVolume(format!(
                "voxel spacing must be positive, got {spacing:?}"
            )));
        }

        let vol_dims = size
            .map(|v| v.saturating_sub(1) as f32)
            .component_mul(&spacing);
        let position = position.unwrap_or_else(|| point![0.0, 0.0, 0.0]);
        let bound_box = BoundBox::from_position_dims(position, vol_dims);

        let range = ValueRange::from_samples(data.iter().copied());

        info!("New volume grid, size {size:?} spacing {spacing:?} bound_box {bound_box:?}");

        Ok(VolumeGrid {
            bound_box,
            size,
            spacing,
            data,
            range,
        })
    }
}
