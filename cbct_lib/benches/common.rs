pub use criterion::{criterion_group, criterion_main, Criterion};

use cbct_lib::{
    config::{BlendMode, TransferConfig},
    mesh::MeshGeometry,
    render::{RenderOptions, RenderQuality, Renderer},
    scene::VolumeActor,
    test_helpers::{block_volume, cube_mesh, mesh_actor},
    transfer_function::VolumeProperty,
    PerspectiveCamera, Scene,
};
use nalgebra::{point, vector, Point3, Vector2};

pub const RESOLUTION: Vector2<usize> = vector![512, 512];

pub const DEFAULT_CAMERA_POSITIONS: [Point3<f32>; 3] = [
    point![300.0, 300.0, 300.0],
    point![-200.0, 50.0, 120.0],
    point![64.0, 64.0, -250.0],
];

/// 128^3 block with a cube mesh inside it
pub fn bench_scene(blend_mode: BlendMode) -> Scene {
    let volume = VolumeActor::new(
        block_volume(128, 3000.0),
        VolumeProperty::from_config(&TransferConfig::default()),
        blend_mode,
        vector![0.0, 0.0, 0.0],
    );

    let mut mesh = mesh_actor(&subdivided(cube_mesh(40.0), 4), "bench_cube.obj");
    mesh.set_position(vector![64.0, 64.0, 64.0]);

    let camera = PerspectiveCamera::new(
        DEFAULT_CAMERA_POSITIONS[0],
        point![64.0, 64.0, 64.0],
        vector![0.0, 1.0, 0.0],
    );
    Scene::from_parts(volume, mesh, camera)
}

// more triangles for the rasterizer, every quad is split into 4 fans
fn subdivided(mut mesh: MeshGeometry, rounds: usize) -> MeshGeometry {
    for _ in 0..rounds {
        let mut faces = Vec::new();
        for face in &mesh.faces {
            let center = face
                .iter()
                .map(|&i| mesh.vertices[i].coords)
                .sum::<nalgebra::Vector3<f32>>()
                / face.len() as f32;
            let c = mesh.vertices.len();
            mesh.vertices.push(Point3::from(center));
            for k in 0..face.len() {
                faces.push(vec![face[k], face[(k + 1) % face.len()], c]);
            }
        }
        mesh.faces = faces;
    }
    mesh
}

pub fn bench_render(
    c: &mut Criterion,
    name: &str,
    blend_mode: BlendMode,
    render_options: RenderOptions,
    quality: RenderQuality,
) {
    let mut scene = bench_scene(blend_mode);
    scene.update();
    let renderer = Renderer::new(render_options);
    let mut buffer = vec![0; renderer.buffer_len()];

    c.bench_function(name, |b| {
        let mut i = 0;
        b.iter(|| {
            let camera = scene.camera_mut();
            camera.set_pos(DEFAULT_CAMERA_POSITIONS[i % DEFAULT_CAMERA_POSITIONS.len()]);
            i += 1;
            renderer.render(&scene, scene.camera(), quality, buffer.as_mut_slice());
        })
    });
}
