//! Viewer configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. built-in defaults
//! 2. `config/default.toml`
//! 3. `config/user.toml` (user overrides, not version controlled)
//! 4. Environment variables (`CBCT_SECTION__KEY`)

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{render::QualityPreference, transfer_function::Interpolation, Result};

/// Prefix of environment variables overriding the configuration
pub const ENV_PREFIX: &str = "CBCT_";

/// Main viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Input files
    #[serde(default)]
    pub inputs: InputPaths,
    /// Which file the mesh transform comes from
    #[serde(default)]
    pub transform_source: TransformSource,
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Volume loading and shading
    #[serde(default)]
    pub volume: VolumeConfig,
    /// Mesh actor
    #[serde(default)]
    pub mesh: MeshConfig,
    /// Renderer settings
    #[serde(default)]
    pub render: RenderConfig,
}

impl ViewerConfig {
    /// Load configuration from the `config` directory
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::from(Serialized::defaults(ViewerConfig::default()));

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // CBCT_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Ok(figment.extract()?)
    }

    /// Path of the transform file selected by `choice`
    pub fn transform_path(&self, choice: TransformChoice) -> &Path {
        match choice {
            TransformChoice::File => &self.inputs.transform_file,
            TransformChoice::Identity => &self.inputs.identity_transform_file,
        }
    }
}

/// Paths of the loaded data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPaths {
    /// Directory with the DICOM slices of the volume
    pub volume_dir: PathBuf,
    /// OBJ file with the mesh
    pub mesh_file: PathBuf,
    /// Text file with the 4x4 mesh transform
    pub transform_file: PathBuf,
    /// Text file with an identity matrix
    pub identity_transform_file: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            volume_dir: "Test_data/CBCT_dicoms".into(),
            mesh_file: "Test_data/all_teeth.obj".into(),
            transform_file: "Test_data/reg.txt".into(),
            identity_transform_file: "Test_data/identity_matrix.txt".into(),
        }
    }
}

/// Source of the mesh transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformSource {
    /// `inputs.transform_file`
    #[default]
    File,
    /// `inputs.identity_transform_file`
    Identity,
    /// Ask on standard input, `0` picks the identity file
    Prompt,
}

/// Resolved transform source, see [`crate::transform::resolve_source`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformChoice {
    File,
    Identity,
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: usize,
    /// Window height in pixels
    pub height: usize,
    /// Background colour, RGB <0;1>
    pub background: [f32; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "CBCT + Mesh Rendering".to_string(),
            width: 1000,
            height: 800,
            background: [1.0, 1.0, 1.0],
        }
    }
}

/// Camera configuration
///
/// The initial camera looks from `position` to `focal_point`,
/// [`crate::scene::Scene::reset_camera`] keeps only the direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub focal_point: [f32; 3],
    pub view_up: [f32; 3],
    /// Vertical view angle in degrees
    pub view_angle: f32,
    /// Degrees of rotation per pixel of mouse drag is `motion_factor * 20 / window size`
    pub motion_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 1.0],
            focal_point: [0.0, 0.0, 0.0],
            view_up: [0.0, 1.0, 0.0],
            view_angle: 30.0,
            motion_factor: 10.0,
        }
    }
}

/// Volume loading and shading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Stop composing the scene if a volume dimension is smaller than 2
    pub abort_on_degenerate: bool,
    /// World position of the volume actor
    pub position: [f32; 3],
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            abort_on_degenerate: false,
            position: [0.0, 0.0, 0.0],
            blend_mode: BlendMode::MaximumIntensity,
            transfer: TransferConfig::default(),
        }
    }
}

/// How samples along a ray are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Brightest sample along the ray
    MaximumIntensity,
    /// Front-to-back alpha compositing
    Composite,
}

/// Transfer function breakpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Baseline intensity of the opacity window
    pub window_level: f32,
    /// Width of the opacity window
    pub window_width: f32,
    /// Opacity ramp starts at `level - low_fraction * width`
    pub low_fraction: f32,
    /// Opacity ramp ends at `level + high_fraction * width`
    pub high_fraction: f32,
    pub opacity_low: f32,
    pub opacity_high: f32,
    /// Scalar range of the colour segment
    pub color_range: [f32; 2],
    pub color_low: [f32; 3],
    pub color_high: [f32; 3],
    pub interpolation: Interpolation,
}

impl TransferConfig {
    /// Scalars where the opacity ramp starts and ends
    pub fn opacity_window(&self) -> (f32, f32) {
        (
            self.window_level - self.low_fraction * self.window_width,
            self.window_level + self.high_fraction * self.window_width,
        )
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            window_level: 2048.0,
            window_width: 4096.0,
            low_fraction: 0.9,
            high_fraction: 0.1,
            opacity_low: 0.0,
            opacity_high: 0.8,
            color_range: [0.0, 255.0],
            color_low: [0.0, 0.0, 0.0],
            color_high: [0.0, 0.0, 0.0],
            interpolation: Interpolation::Linear,
        }
    }
}

/// Mesh actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// World position of the mesh actor, the transform is applied on top of it
    pub position: [f32; 3],
    /// Surface colour, RGB <0;1>
    pub color: [f32; 3],
    pub backface_culling: bool,
    /// Number of points drawn while the camera moves
    pub cloud_points: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            color: [1.0, 1.0, 1.0],
            backface_culling: true,
            cloud_points: 100,
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Render bands of rows on several threads
    pub multi_thread: bool,
    /// Ray step in voxels, full quality
    pub ray_step_quality: f32,
    /// Ray step in voxels, while the camera moves
    pub ray_step_fast: f32,
    pub quality: QualityPreference,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            multi_thread: true,
            ray_step_quality: 0.5,
            ray_step_fast: 2.0,
            quality: QualityPreference::InteractiveOnMovement,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_demo() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.window.width, 1000);
        assert_eq!(cfg.window.height, 800);
        assert_eq!(cfg.window.title, "CBCT + Mesh Rendering");
        assert_eq!(cfg.window.background, [1.0, 1.0, 1.0]);
        assert_eq!(cfg.mesh.cloud_points, 100);
        assert!(cfg.mesh.backface_culling);
        assert_eq!(cfg.volume.blend_mode, BlendMode::MaximumIntensity);
        assert_eq!(cfg.transform_source, TransformSource::File);
        assert!(!cfg.volume.abort_on_degenerate);
    }

    #[test]
    fn opacity_window() {
        let (low, high) = TransferConfig::default().opacity_window();
        assert!((low - (2048.0 - 0.9 * 4096.0)).abs() < 1e-3);
        assert!((high - (2048.0 + 0.1 * 4096.0)).abs() < 1e-3);
    }

    #[test]
    fn transform_path_choice() {
        let cfg = ViewerConfig::default();
        assert_eq!(
            cfg.transform_path(TransformChoice::Identity),
            Path::new("Test_data/identity_matrix.txt")
        );
        assert_eq!(
            cfg.transform_path(TransformChoice::File),
            Path::new("Test_data/reg.txt")
        );
    }
}
