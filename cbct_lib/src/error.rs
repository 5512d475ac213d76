//! Error types shared by loaders, the scene composer and the viewer

use std::path::PathBuf;

use nalgebra::Vector3;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid transform matrix file {path:?}: {reason}")]
    TransformParse { path: PathBuf, reason: String },

    #[error("DICOM error in {path:?}: {message}")]
    Dicom { path: PathBuf, message: String },

    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    #[error("volume has degenerate dimensions {}x{}x{}, every axis needs at least 2 samples", .dims.x, .dims.y, .dims.z)]
    DegenerateVolume { dims: Vector3<usize> },

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("window error: {0}")]
    Window(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::Config(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
