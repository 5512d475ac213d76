//! Wavefront OBJ reading
//!
//! Only vertex positions and faces are used, other statements are ignored.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::{debug, info, warn};
use nalgebra::{point, Point3};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{i64 as int, space0, space1},
    combinator::{all_consuming, opt},
    multi::{many0, many1},
    number::complete::float,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::{common::DataSource, Result};

use super::MeshGeometry;

enum Statement {
    Vertex(Point3<f32>),
    Face(Vec<i64>),
}

// v x y z [w | r g b], only the position is kept
fn vertex(s: &str) -> IResult<&str, Statement> {
    let (s, _) = tag("v")(s)?;
    let (s, (x, y, z)) = tuple((
        preceded(space1, float),
        preceded(space1, float),
        preceded(space1, float),
    ))(s)?;
    let (s, _rest) = many0(preceded(space1, float))(s)?;
    Ok((s, Statement::Vertex(point![x, y, z])))
}

// i, i/t, i//n, i/t/n
fn face_index(s: &str) -> IResult<&str, i64> {
    terminated(
        int,
        opt(pair(tag("/"), take_till(|c: char| c.is_whitespace()))),
    )(s)
}

// f i j k ...
fn face(s: &str) -> IResult<&str, Statement> {
    let (s, _) = tag("f")(s)?;
    let (s, indices) = many1(preceded(space1, face_index))(s)?;
    Ok((s, Statement::Face(indices)))
}

fn statement(s: &str) -> IResult<&str, Statement> {
    let (s, st) = alt((vertex, face))(s)?;
    let (s, _) = space0(s)?;
    Ok((s, st))
}

fn is_ignored(line: &str) -> bool {
    const IGNORED: [&str; 33] = [
        "vn", "vt", "vp", "o", "g", "s", "usemtl", "mtllib", "l", "p", // polygons
        "cstype", "deg", "bmat", "step", "curv", "curv2", "surf", "parm", "trim", "hole",
        "scrv", "sp", "end", "con", "mg", "lod", "usemap", "maplib", "bevel", "c_interp",
        "d_interp", "shadow_obj", "trace_obj", // free-form and render attributes
    ];
    let keyword = line.split_whitespace().next().unwrap_or("");
    IGNORED.contains(&keyword)
}

// OBJ indices are 1-based, negative ones count back from the last vertex read
fn resolve_index(index: i64, vertex_count: usize) -> Option<usize> {
    match index {
        0 => None,
        i if i > 0 => {
            let i = i as usize - 1;
            if i < vertex_count {
                Some(i)
            } else {
                None
            }
        }
        i => {
            let back = i.unsigned_abs() as usize;
            vertex_count.checked_sub(back)
        }
    }
}

// Joins lines ending with `\` to the next one, yields (first line number, statement)
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end();
        let (start, mut joined) = pending.take().unwrap_or((line_no, String::new()));
        match line.strip_suffix('\\') {
            Some(head) => {
                joined.push_str(head);
                joined.push(' ');
                pending = Some((start, joined));
            }
            None => {
                joined.push_str(line);
                lines.push((start, joined));
            }
        }
    }
    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

/// Parse OBJ text
///
/// Malformed lines are skipped.
pub fn parse_obj(bytes: &[u8]) -> MeshGeometry {
    parse_counting(bytes).0
}

// mesh and the number of skipped lines
fn parse_counting(bytes: &[u8]) -> (MeshGeometry, usize) {
    let text = String::from_utf8_lossy(bytes);
    let mut mesh = MeshGeometry::default();
    let mut skipped = 0;

    for (line_no, line) in logical_lines(&text) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || is_ignored(line) {
            continue;
        }

        match all_consuming(statement)(line) {
            Ok((_, Statement::Vertex(v))) => mesh.vertices.push(v),
            Ok((_, Statement::Face(indices))) => {
                let n = mesh.vertices.len();
                let face: Option<Vec<usize>> =
                    indices.iter().map(|&i| resolve_index(i, n)).collect();
                match face {
                    Some(face) => mesh.faces.push(face),
                    None => {
                        debug!("OBJ line {}: bad face index in '{line}'", line_no + 1);
                        skipped += 1;
                    }
                }
            }
            Err(_) => {
                debug!("OBJ line {}: skipping '{line}'", line_no + 1);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {skipped} malformed OBJ lines");
    }

    (mesh, skipped)
}

/// Read and parse OBJ file
pub fn read_obj<P: AsRef<Path>>(path: P) -> Result<MeshGeometry> {
    let path = path.as_ref();
    let ds = DataSource::from_file(path)?;
    let mesh = parse_obj(ds.get_slice());
    info!(
        "Mesh {:?}: {} vertices, {} faces",
        path,
        mesh.vertices.len(),
        mesh.faces.len()
    );
    Ok(mesh)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileStamp {
    Missing,
    Modified(Option<SystemTime>),
}

fn stamp_of(path: &Path) -> FileStamp {
    match fs::metadata(path) {
        Ok(meta) => FileStamp::Modified(meta.modified().ok()),
        Err(_) => FileStamp::Missing,
    }
}

/// Mesh input decoded on demand
///
/// The file is read on first use and again whenever
/// its modification time changes.
#[derive(Debug)]
pub struct ObjSource {
    path: PathBuf,
    geometry: MeshGeometry,
    stamp: Option<FileStamp>,
}

impl ObjSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            geometry: MeshGeometry::default(),
            stamp: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded at least once
    pub fn is_loaded(&self) -> bool {
        self.stamp.is_some()
    }

    /// Re-decode if the file changed since the last decode
    ///
    /// Returns `true` if the geometry was replaced.
    pub fn update(&mut self) -> bool {
        let current = stamp_of(&self.path);
        if self.stamp == Some(current) {
            return false;
        }

        self.geometry = match read_obj(&self.path) {
            Ok(mesh) => mesh,
            Err(e) => {
                warn!("Mesh not loaded: {e}");
                MeshGeometry::default()
            }
        };
        self.stamp = Some(current);
        true
    }

    /// Up to date geometry
    pub fn output(&mut self) -> &MeshGeometry {
        self.update();
        &self.geometry
    }

    /// Geometry of the last decode, empty before the first one
    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::temp_path;

    #[test]
    fn vertices_and_faces() {
        let obj = b"# teeth\nv 0 0 0\nv 1.5 0 0\nv 0 -2 0 1.0\nf 1 2 3\n";
        let mesh = parse_obj(obj);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[1], point![1.5, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2], point![0.0, -2.0, 0.0]);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn face_index_forms() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
                   vt 0 0\nvn 0 0 1\n\
                   f 1/1 2/1 3/1\n\
                   f 1//1 3//1 4//1\n\
                   f 1/1/1 2/1/1 3/1/1 4/1/1\n\
                   f -4 -3 -2\n";
        let mesh = parse_obj(obj.as_bytes());
        assert_eq!(
            mesh.faces,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 3],
                vec![0, 1, 2, 3],
                vec![0, 1, 2],
            ]
        );
    }

    #[test]
    fn ignored_and_malformed_lines() {
        let obj = "mtllib teeth.mtl\no tooth\ng upper\ns off\nusemtl enamel\n\
                   v 0 0 0\nv 1 0\nv one 2 3\nv 1 0 0\r\nv 0 1 0\n\
                   f 1 2 3\nf 0 1 2\nf -9 1 2\nf\n";
        let mesh = parse_obj(obj.as_bytes());
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn colored_vertices_keep_position() {
        let obj = b"v 0 0 0 1 0 0\nv 1 0 0 1 0 0\nv 0 1 0 1 0 0\nv 5 5 5\nf 1 2 3\n";
        let mesh = parse_obj(obj);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.vertices[1], point![1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[3], point![5.0, 5.0, 5.0]);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn face_past_last_vertex_is_skipped() {
        let (mesh, skipped) = parse_counting(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\nf 1 2 3\n");
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn free_form_and_continued_lines() {
        let obj = "cstype bspline\ndeg 3\ncurv 0.0 1.0 1 2\nparm u 0 0 1 1\nend\n\
                   v 1 2 \\\n 3\nv 0 0 0\nv 0 1 0\nf 1 \\\n2 3\n";
        let (mesh, skipped) = parse_counting(obj.as_bytes());
        assert_eq!(skipped, 0);
        assert_eq!(mesh.vertices[0], point![1.0, 2.0, 3.0]);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn empty_input() {
        let mesh = parse_obj(b"");
        assert!(mesh.is_empty());
        assert!(mesh.faces.is_empty());
    }

    #[test]
    fn source_is_lazy_and_follows_file() {
        let path = temp_path("lazy.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut source = ObjSource::new(&path);
        assert!(!source.is_loaded());
        assert!(source.geometry().is_empty());

        assert_eq!(source.output().vertices.len(), 3);
        assert!(source.is_loaded());
        // unchanged file is not decoded again
        assert!(!source.update());

        let _ = std::fs::remove_file(&path);
        assert!(source.update());
        assert!(source.geometry().is_empty());
    }

    #[test]
    fn missing_file_gives_empty_geometry() {
        let mut source = ObjSource::new("surely/not/here.obj");
        assert!(source.output().is_empty());
        assert!(read_obj("surely/not/here.obj").is_err());
    }
}
