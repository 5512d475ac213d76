//! 4x4 mesh transform stored as 16 whitespace separated numbers, row-major

use std::{
    fmt,
    fs,
    io::BufRead,
    path::Path,
};

use log::{info, warn};
use nalgebra::Matrix4;
use nom::{
    character::complete::{multispace0, multispace1},
    multi::count,
    number::complete::double,
    sequence::preceded,
    IResult,
};

use crate::{
    config::{TransformChoice, TransformSource},
    Error, Result,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(pub Matrix4<f64>);

impl Transform {
    pub fn identity() -> Transform {
        Transform(Matrix4::identity())
    }

    /// Build from 16 values in row-major order
    pub fn from_row_slice(values: &[f64]) -> Transform {
        Transform(Matrix4::from_row_slice(values))
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// Single precision copy for rendering
    pub fn to_f32(&self) -> Matrix4<f32> {
        self.0.map(|v| v as f32)
    }

    /// Write in the format [`read_transform`] accepts
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_string()).map_err(|e| Error::io(path, e))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

/// One row per line, values separated by spaces
impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            let r = self.0.row(row);
            writeln!(f, "{} {} {} {}", r[0], r[1], r[2], r[3])?;
        }
        Ok(())
    }
}

fn number(s: &str) -> IResult<&str, f64> {
    preceded(multispace0, double)(s)
}

// 16 numbers, anything after them is ignored
fn matrix_values(s: &str) -> IResult<&str, Vec<f64>> {
    count(number, 16)(s)
}

/// Parse transform text
pub fn parse_transform(text: &str) -> std::result::Result<Transform, String> {
    match matrix_values(text) {
        Ok((rest, values)) => {
            // "1 2 ... 16x" would otherwise accept the truncated token
            if !rest.is_empty() && multispace1::<_, ()>(rest).is_err() {
                return Err(format!("unexpected '{}' after 16th value", first_token(rest)));
            }
            Ok(Transform::from_row_slice(&values))
        }
        Err(_) => {
            let found = text.split_whitespace().take_while(|t| t.parse::<f64>().is_ok()).count();
            match text.split_whitespace().nth(found) {
                Some(token) => Err(format!("expected a number, found '{token}' at value {}", found + 1)),
                None => Err(format!("expected 16 values, found {found}")),
            }
        }
    }
}

fn first_token(s: &str) -> &str {
    s.split_whitespace().next().unwrap_or(s)
}

/// Read transform from a text file
pub fn read_transform<P: AsRef<Path>>(path: P) -> Result<Transform> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);

    let transform = parse_transform(&text).map_err(|reason| Error::TransformParse {
        path: path.to_path_buf(),
        reason,
    })?;

    info!("Transform from {path:?}:\n{transform}");
    Ok(transform)
}

/// Decide which transform file to load
///
/// `Prompt` reads one integer from `input`, `0` selects the identity file.
/// Input that is not an integer selects the transform file.
pub fn resolve_source<R: BufRead>(source: TransformSource, input: R) -> TransformChoice {
    match source {
        TransformSource::File => TransformChoice::File,
        TransformSource::Identity => TransformChoice::Identity,
        TransformSource::Prompt => prompt_choice(input),
    }
}

fn prompt_choice<R: BufRead>(mut input: R) -> TransformChoice {
    println!("Enter 0 to use the identity matrix, any other number to use the transform file:");

    let mut line = String::new();
    if let Err(e) = input.read_line(&mut line) {
        warn!("Cannot read transform choice: {e}, using the transform file");
        return TransformChoice::File;
    }

    match line.trim().parse::<i64>() {
        Ok(0) => TransformChoice::Identity,
        Ok(_) => TransformChoice::File,
        Err(_) => {
            warn!("'{}' is not a number, using the transform file", line.trim());
            TransformChoice::File
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use nalgebra::{point, vector};

    use super::*;
    use crate::test_helpers::temp_path;

    const REG: &str = "0.98 -0.17 0.0 12.5\n0.17 0.98 0.0 -3.25\n0.0 0.0 1.0 40.0\n0 0 0 1\n";

    #[test]
    fn row_major() {
        let t = parse_transform(REG).unwrap();
        assert_eq!(t.0[(0, 3)], 12.5);
        assert_eq!(t.0[(1, 3)], -3.25);
        assert_eq!(t.0[(1, 0)], 0.17);
        assert_eq!(t.0[(3, 3)], 1.0);

        let p = t.to_f32().transform_point(&point![0.0, 0.0, 0.0]);
        assert_eq!(p, point![12.5, -3.25, 40.0]);
        let v = t.to_f32().transform_vector(&vector![0.0, 0.0, 1.0]);
        assert_eq!(v, vector![0.0, 0.0, 1.0]);
    }

    #[test]
    fn any_whitespace_and_trailing_content() {
        let text = "1 0 0 0 0 1 0 0\t0 0 1 0\n\n  0 0 0 1\ncomment after the matrix\n";
        assert_eq!(parse_transform(text).unwrap(), Transform::identity());
    }

    #[test]
    fn too_few_values() {
        let err = parse_transform("1 0 0 0\n0 1 0 0\n").unwrap_err();
        assert!(err.contains("found 8"), "{err}");
        assert!(parse_transform("").is_err());
    }

    #[test]
    fn non_numeric_value() {
        let err = parse_transform("1 0 0 0 0 one 0 0 0 0 1 0 0 0 0 1").unwrap_err();
        assert!(err.contains("'one'"), "{err}");
        assert!(parse_transform("1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1x").is_err());
    }

    #[test]
    fn identity_round_trip() {
        let path = temp_path("identity_matrix.txt");
        Transform::identity().write_to(&path).unwrap();

        let read = read_transform(&path).unwrap();
        assert_eq!(read, Transform::identity());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n"
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file() {
        let res = read_transform("surely/not/reg.txt");
        assert!(matches!(res, Err(Error::Io { .. })));
    }

    #[test]
    fn bad_file_is_parse_error() {
        let path = temp_path("bad_reg.txt");
        std::fs::write(&path, "1 2 3").unwrap();
        let res = read_transform(&path);
        assert!(matches!(res, Err(Error::TransformParse { .. })));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn prompt_selection() {
        let prompt = TransformSource::Prompt;
        assert_eq!(
            resolve_source(prompt, Cursor::new("0\n")),
            TransformChoice::Identity
        );
        assert_eq!(
            resolve_source(prompt, Cursor::new(" 3 \n")),
            TransformChoice::File
        );
        assert_eq!(
            resolve_source(prompt, Cursor::new("yes\n")),
            TransformChoice::File
        );
        assert_eq!(resolve_source(prompt, Cursor::new("")), TransformChoice::File);
    }

    #[test]
    fn fixed_sources_ignore_input() {
        assert_eq!(
            resolve_source(TransformSource::Identity, Cursor::new("5\n")),
            TransformChoice::Identity
        );
        assert_eq!(
            resolve_source(TransformSource::File, Cursor::new("0\n")),
            TransformChoice::File
        );
    }
}
