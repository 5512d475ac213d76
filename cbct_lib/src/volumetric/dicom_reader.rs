//! Reading a directory of DICOM slices into one [`VolumeGrid`]
//!
//! Every file of the directory is tried, files that are not decodable
//! DICOM images are skipped. Slices are ordered along the slice normal
//! by their Image Position (Patient).
//! Samples are the stored pixel values, the modality LUT is not applied.

use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};

use dicom::{
    core::Tag,
    dictionary_std::tags,
    object::{open_file, DefaultDicomObject},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
};
use log::{debug, info, warn};
use nalgebra::{vector, Point3, Vector3};

use crate::{Error, Result};

use super::{BuildVolume, VolumeGrid, VolumeMetadata};

/// One decoded slice with the spatial tags the series assembly needs
#[derive(Debug, Clone)]
pub struct DicomSlice {
    pub source: PathBuf,
    /// Image Position (Patient), upper left pixel in mm
    pub position: Option<Vector3<f64>>,
    /// Image Orientation (Patient), row and column direction cosines
    pub orientation: Option<[f64; 6]>,
    pub instance_number: Option<i32>,
    /// Pixel Spacing, (row spacing, column spacing)
    pub pixel_spacing: Option<[f64; 2]>,
    pub slice_thickness: Option<f64>,
    pub rows: usize,
    pub columns: usize,
    /// Row-major stored values, `rows * columns` long
    pub pixels: Vec<f32>,
}

impl DicomSlice {
    fn normal(&self) -> Option<Vector3<f64>> {
        let o = self.orientation?;
        let row = vector![o[0], o[1], o[2]];
        let col = vector![o[3], o[4], o[5]];
        let n = row.cross(&col);
        if n.norm() > 0.0 {
            Some(n.normalize())
        } else {
            None
        }
    }
}

pub struct DicomSeriesReader {
    directory: PathBuf,
}

impl DicomSeriesReader {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Decode all slices in the directory and assemble the grid
    ///
    /// A directory without any readable slice produces an empty grid.
    pub fn read(&self) -> Result<VolumeGrid> {
        let dir = &self.directory;
        let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut slices = Vec::with_capacity(paths.len());
        for path in paths {
            match read_slice(&path) {
                Ok(slice) => slices.push(slice),
                Err(e) => warn!("Skipping {path:?}: {e}"),
            }
        }

        info!("Read {} DICOM slices from {:?}", slices.len(), dir);

        assemble(slices)
    }
}

/// Decode a single DICOM file
pub fn read_slice(path: &Path) -> Result<DicomSlice> {
    let dicom_err = |message: String| Error::Dicom {
        path: path.to_path_buf(),
        message,
    };

    let obj = open_file(path).map_err(|e| dicom_err(e.to_string()))?;

    let decoded = obj
        .decode_pixel_data()
        .map_err(|e| dicom_err(e.to_string()))?;
    let rows = decoded.rows() as usize;
    let columns = decoded.columns() as usize;

    // stored values, Rescale Slope/Intercept is not applied
    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let mut pixels: Vec<f32> = decoded
        .to_vec_with_options(&options)
        .map_err(|e| dicom_err(e.to_string()))?;
    if pixels.len() < rows * columns {
        return Err(dicom_err(format!(
            "{} pixel values for a {rows}x{columns} image",
            pixels.len()
        )));
    }
    // first frame only
    pixels.truncate(rows * columns);

    let position = floats(&obj, tags::IMAGE_POSITION_PATIENT)
        .filter(|v| v.len() == 3)
        .map(|v| vector![v[0], v[1], v[2]]);
    let orientation = floats(&obj, tags::IMAGE_ORIENTATION_PATIENT)
        .filter(|v| v.len() == 6)
        .map(|v| [v[0], v[1], v[2], v[3], v[4], v[5]]);
    let pixel_spacing = floats(&obj, tags::PIXEL_SPACING)
        .filter(|v| v.len() == 2)
        .map(|v| [v[0], v[1]]);
    let slice_thickness = floats(&obj, tags::SLICE_THICKNESS).and_then(|v| v.first().copied());
    let instance_number = obj
        .element_opt(tags::INSTANCE_NUMBER)
        .ok()
        .flatten()
        .and_then(|e| e.to_int::<i32>().ok());

    debug!("Slice {path:?}: {rows}x{columns} at {position:?}");

    Ok(DicomSlice {
        source: path.to_path_buf(),
        position,
        orientation,
        instance_number,
        pixel_spacing,
        slice_thickness,
        rows,
        columns,
        pixels,
    })
}

fn floats(obj: &DefaultDicomObject, tag: Tag) -> Option<Vec<f64>> {
    obj.element_opt(tag).ok().flatten()?.to_multi_float64().ok()
}

/// Order slices and stack them into a grid
///
/// x runs along columns, y along rows, z along the slice normal.
pub fn assemble(mut slices: Vec<DicomSlice>) -> Result<VolumeGrid> {
    let first = match slices.first() {
        Some(s) => s,
        None => {
            warn!("No DICOM slices found");
            return Ok(VolumeGrid::empty());
        }
    };

    let normal = first.normal().unwrap_or_else(|| vector![0.0, 0.0, 1.0]);
    let sort_key = |s: &DicomSlice| -> Option<f64> {
        match (s.position, s.instance_number) {
            (Some(p), _) => Some(p.dot(&normal)),
            (None, Some(n)) => Some(n as f64),
            (None, None) => None,
        }
    };

    // stable, so slices without any key keep file name order at the end
    slices.sort_by(|a, b| match (sort_key(a), sort_key(b)) {
        (Some(ka), Some(kb)) => ka.total_cmp(&kb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let (rows, columns) = (slices[0].rows, slices[0].columns);
    let (consistent, skipped): (Vec<_>, Vec<_>) = slices
        .into_iter()
        .partition(|s| s.rows == rows && s.columns == columns);
    for s in &skipped {
        warn!(
            "Skipping {:?}: {}x{} slice in a {rows}x{columns} series",
            s.source, s.rows, s.columns
        );
    }
    let slices = consistent;

    let z_spacing = slice_distance(&slices, &normal)
        .or_else(|| slices[0].slice_thickness.filter(|t| *t > 0.0))
        .unwrap_or(1.0);
    let [row_spacing, col_spacing] = slices[0].pixel_spacing.unwrap_or([1.0, 1.0]);
    let spacing = vector![col_spacing as f32, row_spacing as f32, z_spacing as f32];

    let position = slices[0]
        .position
        .map(|p| Point3::from(p.map(|v| v as f32)));

    let size = vector![columns, rows, slices.len()];
    let mut data = vec![0.0; size.x * size.y * size.z];
    for (z, slice) in slices.iter().enumerate() {
        for y in 0..rows {
            for x in 0..columns {
                data[z + y * size.z + x * size.y * size.z] = slice.pixels[y * columns + x];
            }
        }
    }

    VolumeGrid::build(VolumeMetadata {
        size,
        spacing,
        position,
        data,
    })
}

// mean distance between neighbouring slices along the normal
fn slice_distance(slices: &[DicomSlice], normal: &Vector3<f64>) -> Option<f64> {
    let keys: Option<Vec<f64>> = slices
        .iter()
        .map(|s| s.position.map(|p| p.dot(normal)))
        .collect();
    let keys = keys?;
    if keys.len() < 2 {
        return None;
    }

    let total: f64 = keys.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    let mean = total / (keys.len() - 1) as f64;
    if mean > 0.0 {
        Some(mean)
    } else {
        None
    }
}
