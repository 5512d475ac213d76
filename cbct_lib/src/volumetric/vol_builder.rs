use nalgebra::{Point3, Vector3};

use crate::Result;

pub trait BuildVolume<M>
where
    Self: Sized,
{
    fn build(metadata: M) -> Result<Self>;
}

/// Everything needed to build a volume, gathered by a reader
#[derive(Debug, Clone)]
pub struct VolumeMetadata {
    pub size: Vector3<usize>,
    pub spacing: Vector3<f32>, // shape of voxels
    pub position: Option<Point3<f32>>,
    /// Samples, `z` is the fastest axis
    pub data: Vec<f32>,
}
