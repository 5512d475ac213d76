mod geometry;
pub mod obj_reader;

pub use geometry::MeshGeometry;
pub use obj_reader::{parse_obj, read_obj, ObjSource};
