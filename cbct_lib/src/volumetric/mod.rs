pub mod dicom_reader;
mod vol_builder;
mod volume;
mod volume_grid;

pub use dicom_reader::DicomSeriesReader;
pub use vol_builder::{BuildVolume, VolumeMetadata};
pub use volume::Volume;
pub use volume_grid::VolumeGrid;
