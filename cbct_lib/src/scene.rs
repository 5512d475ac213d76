//! Scene composition
//!
//! Loads the volume, the mesh and its transform and places them
//! in one world together with the camera.

use std::io::BufRead;

use log::{debug, error, info};
use nalgebra::{vector, Matrix4, Point3, Vector3};

use crate::{
    camera::PerspectiveCamera,
    color::{self, RGB},
    common::BoundBox,
    config::{BlendMode, ViewerConfig},
    mesh::{MeshGeometry, ObjSource},
    transfer_function::VolumeProperty,
    transform::{read_transform, resolve_source, Transform},
    volumetric::{DicomSeriesReader, Volume, VolumeGrid},
    Error, Result,
};

/// Volume with its shading
#[derive(Debug)]
pub struct VolumeActor {
    grid: VolumeGrid,
    pub property: VolumeProperty,
    pub blend_mode: BlendMode,
}

impl VolumeActor {
    /// Places `grid` so that its first sample is at `position`
    pub fn new(
        mut grid: VolumeGrid,
        property: VolumeProperty,
        blend_mode: BlendMode,
        position: Vector3<f32>,
    ) -> VolumeActor {
        grid.translate(position);
        VolumeActor {
            grid,
            property,
            blend_mode,
        }
    }

    pub fn grid(&self) -> &VolumeGrid {
        &self.grid
    }

    /// World bounds, also for a grid that cannot be rendered
    pub fn bounds(&self) -> BoundBox {
        self.grid.get_bound_box()
    }

    pub fn is_renderable(&self) -> bool {
        self.grid.is_renderable()
    }
}

/// Surface mesh placed by `T(position) * user_matrix`
#[derive(Debug)]
pub struct MeshActor {
    source: ObjSource,
    user_matrix: Matrix4<f32>,
    position: Vector3<f32>,
    pub color: RGB,
    pub backface_culling: bool,
    /// Points drawn instead of triangles in interactive frames
    pub cloud_points: usize,
}

impl MeshActor {
    pub fn new(source: ObjSource) -> MeshActor {
        MeshActor {
            source,
            user_matrix: Matrix4::identity(),
            position: vector![0.0, 0.0, 0.0],
            color: color::rgb(1.0, 1.0, 1.0),
            backface_culling: true,
            cloud_points: 100,
        }
    }

    pub fn set_user_matrix(&mut self, matrix: Matrix4<f32>) {
        self.user_matrix = matrix;
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    /// Model to world matrix
    pub fn world_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position) * self.user_matrix
    }

    /// Re-read the mesh file if it changed
    pub fn update(&mut self) -> bool {
        self.source.update()
    }

    pub fn geometry(&self) -> &MeshGeometry {
        self.source.geometry()
    }

    pub fn source(&self) -> &ObjSource {
        &self.source
    }

    /// World bounds of the decoded geometry, `None` without vertices
    pub fn bounds(&self) -> Option<BoundBox> {
        self.geometry().transformed_bounds(&self.world_matrix())
    }
}

/// Everything the renderer draws
#[derive(Debug)]
pub struct Scene {
    volume: VolumeActor,
    mesh: MeshActor,
    transform: Transform,
    camera: PerspectiveCamera,
    background: RGB,
    diagnostics: Vec<Error>,
}

impl Scene {
    /// Load all inputs named in `config`
    ///
    /// `prompt_input` is read only for [`crate::config::TransformSource::Prompt`].
    /// Volume problems are recorded in [`Scene::diagnostics`], a transform that
    /// cannot be loaded fails the composition.
    pub fn compose<R: BufRead>(config: &ViewerConfig, prompt_input: R) -> Result<Scene> {
        let choice = resolve_source(config.transform_source, prompt_input);
        let mut diagnostics = Vec::new();

        // 1. volume
        let grid = match DicomSeriesReader::new(&config.inputs.volume_dir).read() {
            Ok(grid) => grid,
            Err(e) => {
                error!("Volume not loaded: {e}");
                diagnostics.push(e);
                VolumeGrid::empty()
            }
        };
        if let Err(e) = grid.check_dimensions() {
            error!("Error loading data! {e}");
            if config.volume.abort_on_degenerate {
                return Err(e);
            }
            diagnostics.push(e);
        }

        // 2. mesh, decoded on first use
        let source = ObjSource::new(&config.inputs.mesh_file);

        // 3. transform
        let transform_path = config.transform_path(choice);
        let transform = read_transform(transform_path).map_err(|e| {
            error!("Error loading transform matrix file");
            e
        })?;

        // 4. volume actor
        let vol_cfg = &config.volume;
        let volume = VolumeActor::new(
            grid,
            VolumeProperty::from_config(&vol_cfg.transfer),
            vol_cfg.blend_mode,
            Vector3::from(vol_cfg.position),
        );

        let b = volume.bounds();
        info!(
            "Bounds of Volume is: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
            b.lower.x, b.lower.y, b.lower.z, b.upper.x, b.upper.y, b.upper.z
        );
        let range = volume.grid().scalar_range();
        if !range.is_empty() {
            info!("Scalar range of Volume is: {:.2} to {:.2}", range.low, range.high);
        }

        // 5. mesh actor
        let mesh_cfg = &config.mesh;
        let mut mesh = MeshActor::new(source);
        mesh.set_position(Vector3::from(mesh_cfg.position));
        mesh.set_user_matrix(transform.to_f32());
        mesh.color = Vector3::from(mesh_cfg.color);
        mesh.backface_culling = mesh_cfg.backface_culling;
        mesh.cloud_points = mesh_cfg.cloud_points;

        let mut camera = PerspectiveCamera::from_config(&config.camera);
        camera.change_aspect_from_resolution(config.window.width, config.window.height);

        debug!("Scene composed, {} diagnostics", diagnostics.len());

        Ok(Scene {
            volume,
            mesh,
            transform,
            camera,
            background: Vector3::from(config.window.background),
            diagnostics,
        })
    }

    /// Build a scene from already loaded parts
    pub fn from_parts(volume: VolumeActor, mesh: MeshActor, camera: PerspectiveCamera) -> Scene {
        Scene {
            volume,
            mesh,
            transform: Transform::identity(),
            camera,
            background: color::rgb(1.0, 1.0, 1.0),
            diagnostics: Vec::new(),
        }
    }

    /// Bring lazily loaded inputs up to date
    ///
    /// Returns `true` if something changed.
    pub fn update(&mut self) -> bool {
        let changed = self.mesh.update();
        if changed {
            if let Some(b) = self.mesh.bounds() {
                debug!("Mesh bounds {:?} to {:?}", b.lower, b.upper);
            }
        }
        changed
    }

    /// Union of the volume and mesh world bounds
    ///
    /// A volume that cannot be rendered only counts when there is no mesh.
    pub fn bounds(&self) -> Option<BoundBox> {
        let volume = if self.volume.is_renderable() {
            Some(self.volume.bounds())
        } else {
            None
        };
        match (volume, self.mesh.bounds()) {
            (Some(v), Some(m)) => Some(v.union(&m)),
            (Some(v), None) => Some(v),
            (None, Some(m)) => Some(m),
            (None, None) => None,
        }
    }

    /// Frame the whole scene
    ///
    /// Keeps the viewing direction, moves the camera so that
    /// both the volume and the mesh are visible.
    pub fn reset_camera(&mut self) {
        self.update();
        let bounds = self
            .bounds()
            .unwrap_or_else(|| BoundBox::new(Point3::origin(), Point3::origin()));
        self.camera.reset_to_bounds(&bounds);
        debug!(
            "Camera reset, position {:?} focal point {:?}",
            self.camera.get_pos(),
            self.camera.get_focal_point()
        );
    }

    /// Fit the clipping planes after a camera move
    pub fn reset_clipping_range(&mut self) {
        if let Some(bounds) = self.bounds() {
            self.camera.reset_clipping_range(&bounds);
        }
    }

    pub fn volume(&self) -> &VolumeActor {
        &self.volume
    }

    pub fn mesh(&self) -> &MeshActor {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut MeshActor {
        &mut self.mesh
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn background(&self) -> RGB {
        self.background
    }

    pub fn set_background(&mut self, background: RGB) {
        self.background = background;
    }

    /// Non-fatal problems found while composing
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod test {
    use std::io::{empty, Cursor};

    use nalgebra::point;

    use super::*;
    use crate::{
        config::TransformSource,
        test_helpers::{ct_pixels, scene_inputs, temp_dir, white_volume, write_ct_slice},
    };

    #[test]
    fn compose_with_empty_volume_dir() {
        let dir = temp_dir("scene_compose");
        let config = scene_inputs(&dir);

        let scene = Scene::compose(&config, empty()).unwrap();

        assert!(scene
            .diagnostics()
            .iter()
            .any(|e| matches!(e, Error::DegenerateVolume { .. })));
        assert!(!scene.volume().is_renderable());
        assert_eq!(scene.transform().0[(0, 3)], 1.0);
        // mesh is not decoded yet
        assert!(!scene.mesh().source().is_loaded());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn compose_reads_dicom_series() {
        let dir = temp_dir("scene_dicom");
        let config = scene_inputs(&dir);
        for k in 0..3u16 {
            let z = (2 * k).to_string();
            let path = config.inputs.volume_dir.join(format!("slice{k}.dcm"));
            write_ct_slice(&path, &z, &(k + 1).to_string(), 1, ct_pixels(k));
        }

        let scene = Scene::compose(&config, empty()).unwrap();
        assert!(scene.diagnostics().is_empty());
        assert!(scene.volume().is_renderable());

        let range = scene.volume().grid().scalar_range();
        assert_eq!((range.low, range.high), (0.0, 205.0));
        let b = scene.volume().bounds();
        assert_eq!(b.lower, point![-10.0, -20.0, 0.0]);
        assert_eq!(b.upper, point![-9.5, -19.5, 4.0]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_transform_fails() {
        let dir = temp_dir("scene_no_transform");
        let mut config = scene_inputs(&dir);
        config.inputs.transform_file = dir.join("missing.txt");

        let res = Scene::compose(&config, empty());
        assert!(matches!(res, Err(Error::Io { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn abort_on_degenerate() {
        let dir = temp_dir("scene_abort");
        let mut config = scene_inputs(&dir);
        config.volume.abort_on_degenerate = true;

        let res = Scene::compose(&config, empty());
        assert!(matches!(res, Err(Error::DegenerateVolume { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn prompt_picks_identity() {
        let dir = temp_dir("scene_prompt");
        let mut config = scene_inputs(&dir);
        config.transform_source = TransformSource::Prompt;

        let scene = Scene::compose(&config, Cursor::new("0\n")).unwrap();
        assert_eq!(*scene.transform(), Transform::identity());

        let scene = Scene::compose(&config, Cursor::new("1\n")).unwrap();
        assert_ne!(*scene.transform(), Transform::identity());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn mesh_is_placed_by_transform() {
        let dir = temp_dir("scene_mesh");
        let mut config = scene_inputs(&dir);
        config.mesh.position = [10.0, 0.0, 0.0];

        let mut scene = Scene::compose(&config, empty()).unwrap();
        assert!(scene.update());

        // cube of side 10, moved by (1, 2, 3) then by the actor position
        let b = scene.mesh().bounds().unwrap();
        assert_eq!(b.lower, point![6.0, -3.0, -2.0]);
        assert_eq!(b.upper, point![16.0, 7.0, 8.0]);

        // degenerate volume does not count
        assert_eq!(scene.bounds(), Some(b));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reset_shows_everything() {
        let dir = temp_dir("scene_reset");
        let config = scene_inputs(&dir);

        let volume = VolumeActor::new(
            white_volume(),
            VolumeProperty::from_config(&config.volume.transfer),
            BlendMode::MaximumIntensity,
            vector![-50.0, 0.0, 0.0],
        );
        let mesh = MeshActor::new(ObjSource::new(&config.inputs.mesh_file));
        let mut camera = PerspectiveCamera::default();
        camera.change_aspect_from_resolution(1000, 800);
        let mut scene = Scene::from_parts(volume, mesh, camera);

        scene.reset_camera();

        let volume_bounds = scene.volume().bounds();
        let mesh_bounds = scene.mesh().bounds().unwrap();
        assert_eq!(volume_bounds.lower, point![-50.0, 0.0, 0.0]);
        assert!(scene.camera().frustum_contains(&volume_bounds));
        assert!(scene.camera().frustum_contains(&mesh_bounds));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
