mod mesh_raster;
mod render_options;
mod renderer;

pub use mesh_raster::MeshLayer;
pub use render_options::{QualityPreference, RenderOptions, RenderOptionsBuilder, RenderQuality};
pub use renderer::Renderer;
