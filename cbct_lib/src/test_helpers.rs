//! Module with helper functions
//! Saves repetition in unit and integration tests

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use dicom::{
    core::{DataElement, PrimitiveValue, VR},
    dictionary_std::{tags, uids},
    object::{FileMetaTableBuilder, InMemDicomObject},
};
use nalgebra::{point, vector, Vector3};

use crate::{
    config::ViewerConfig,
    mesh::{MeshGeometry, ObjSource},
    scene::MeshActor,
    transform::Transform,
    volumetric::{BuildVolume, VolumeGrid, VolumeMetadata},
};

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique path in the system temp directory, nothing is created
pub fn temp_path(name: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("cbct_{}_{}_{}", std::process::id(), n, name))
}

/// Fresh empty directory in the system temp directory
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = temp_path(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// 2x2x2 grid, voxels 100 units apart
pub fn white_volume() -> VolumeGrid {
    let data = vec![0, 32, 64, 64 + 32, 128, 128 + 32, 128 + 64, 255];
    VolumeGrid::build(VolumeMetadata {
        size: vector![2, 2, 2],
        spacing: vector![100.0, 100.0, 100.0], // shape of voxels
        position: Some(point![0.0, 0.0, 0.0]),
        data: data.into_iter().map(|v| v as f32).collect(),
    })
    .unwrap()
}

/// Zero filled grid of `size`, voxels 100 units apart
pub fn empty_volume(size: Vector3<usize>) -> VolumeGrid {
    VolumeGrid::build(VolumeMetadata {
        size,
        spacing: vector![100.0, 100.0, 100.0],
        position: Some(point![0.0, 0.0, 0.0]),
        data: vec![0.0; size.x * size.y * size.z],
    })
    .unwrap()
}

/// Cube of side `n - 1` with unit spacing, `inner` inside and 0 on the border
pub fn block_volume(n: usize, inner: f32) -> VolumeGrid {
    let mut data = vec![0.0; n * n * n];
    for x in 1..n - 1 {
        for y in 1..n - 1 {
            for z in 1..n - 1 {
                data[z + y * n + x * n * n] = inner;
            }
        }
    }
    VolumeGrid::build(VolumeMetadata {
        size: vector![n, n, n],
        spacing: vector![1.0, 1.0, 1.0],
        position: None,
        data,
    })
    .unwrap()
}

/// Axis aligned cube with side `side` centered at the origin, faces wound outwards
pub fn cube_mesh(side: f32) -> MeshGeometry {
    let h = side / 2.0;
    let vertices = vec![
        point![-h, -h, -h],
        point![h, -h, -h],
        point![h, h, -h],
        point![-h, h, -h],
        point![-h, -h, h],
        point![h, -h, h],
        point![h, h, h],
        point![-h, h, h],
    ];
    let faces = vec![
        vec![0, 3, 2, 1],
        vec![4, 5, 6, 7],
        vec![0, 1, 5, 4],
        vec![3, 7, 6, 2],
        vec![0, 4, 7, 3],
        vec![1, 2, 6, 5],
    ];
    MeshGeometry::new(vertices, faces)
}

/// OBJ text of `mesh`
pub fn obj_text(mesh: &MeshGeometry) -> String {
    let mut obj = String::from("# test mesh\no mesh\n");
    for v in &mesh.vertices {
        obj.push_str(&format!("v {} {} {}\n", v.x, v.y, v.z));
    }
    for f in &mesh.faces {
        let indices: Vec<String> = f.iter().map(|i| format!("{}//1", i + 1)).collect();
        obj.push_str(&format!("f {}\n", indices.join(" ")));
    }
    obj
}

/// OBJ text of [`cube_mesh`]
pub fn cube_obj(side: f32) -> String {
    obj_text(&cube_mesh(side))
}

/// Mesh actor reading `mesh` from a temporary OBJ file, already decoded
pub fn mesh_actor(mesh: &MeshGeometry, name: &str) -> MeshActor {
    let path = temp_path(name);
    std::fs::write(&path, obj_text(mesh)).unwrap();
    let mut actor = MeshActor::new(ObjSource::new(&path));
    actor.update();
    actor
}

/// Configuration pointing at inputs written into `dir`
///
/// The volume directory exists but holds no slices, the mesh is a cube
/// of side 10, the transform file moves it by `(1, 2, 3)`.
pub fn scene_inputs(dir: &Path) -> ViewerConfig {
    let volume_dir = dir.join("dicoms");
    std::fs::create_dir_all(&volume_dir).unwrap();

    let mesh_file = dir.join("cube.obj");
    std::fs::write(&mesh_file, cube_obj(10.0)).unwrap();

    let transform_file = dir.join("reg.txt");
    std::fs::write(
        &transform_file,
        "1 0 0 1\n0 1 0 2\n0 0 1 3\n0 0 0 1\n",
    )
    .unwrap();

    let identity_transform_file = dir.join("identity_matrix.txt");
    Transform::identity()
        .write_to(&identity_transform_file)
        .unwrap();

    let mut config = ViewerConfig::default();
    config.inputs.volume_dir = volume_dir;
    config.inputs.mesh_file = mesh_file;
    config.inputs.transform_file = transform_file;
    config.inputs.identity_transform_file = identity_transform_file;
    config
}

fn strs(values: &[&str]) -> PrimitiveValue {
    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    PrimitiveValue::Strs(values.into())
}

/// CT slice of 2 rows and 3 columns, unsigned 16 bit, intercept -1000
pub fn write_ct_slice(path: &Path, z: &str, instance: &str, frames: u16, pixels: Vec<u16>) {
    let sop_instance = format!("1.2.826.0.1.3680043.2.1125.{instance}");

    let mut obj = InMemDicomObject::new_empty();
    let mut put = |tag, vr, value: PrimitiveValue| {
        obj.put(DataElement::new(tag, vr, value));
    };
    put(tags::SOP_CLASS_UID, VR::UI, PrimitiveValue::from(uids::CT_IMAGE_STORAGE));
    put(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from(sop_instance.as_str()));
    put(tags::MODALITY, VR::CS, PrimitiveValue::from("CT"));
    put(tags::INSTANCE_NUMBER, VR::IS, PrimitiveValue::from(instance));
    put(tags::IMAGE_POSITION_PATIENT, VR::DS, strs(&["-10", "-20", z]));
    put(tags::IMAGE_ORIENTATION_PATIENT, VR::DS, strs(&["1", "0", "0", "0", "1", "0"]));
    put(tags::PIXEL_SPACING, VR::DS, strs(&["0.5", "0.25"]));
    put(tags::SLICE_THICKNESS, VR::DS, PrimitiveValue::from("2"));
    put(tags::RESCALE_INTERCEPT, VR::DS, PrimitiveValue::from("-1000"));
    put(tags::RESCALE_SLOPE, VR::DS, PrimitiveValue::from("1"));
    put(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16));
    put(tags::PHOTOMETRIC_INTERPRETATION, VR::CS, PrimitiveValue::from("MONOCHROME2"));
    put(tags::NUMBER_OF_FRAMES, VR::IS, PrimitiveValue::from(frames.to_string().as_str()));
    put(tags::ROWS, VR::US, PrimitiveValue::from(2_u16));
    put(tags::COLUMNS, VR::US, PrimitiveValue::from(3_u16));
    put(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16));
    put(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16));
    put(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16));
    put(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16));
    put(tags::PIXEL_DATA, VR::OW, PrimitiveValue::U16(pixels.into()));

    let file = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::CT_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(sop_instance.as_str()),
        )
        .unwrap();
    file.write_to_file(path).unwrap();
}

/// Pixels of slice `k` for [`write_ct_slice`], `100 * k + pixel index`
pub fn ct_pixels(k: u16) -> Vec<u16> {
    (0..6).map(|i| 100 * k + i).collect()
}
