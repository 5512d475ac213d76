use std::{fs::File, path::Path};

use memmap::{Mmap, MmapOptions};

use crate::{Error, Result};

/// Bytes of an input file, either memory mapped or owned
pub enum DataSource {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl DataSource {
    pub fn get_slice(&self) -> &[u8] {
        match self {
            DataSource::Vec(v) => v.as_slice(),
            DataSource::Mmap(m) => &m[..],
        }
    }

    pub fn from_vec(vec: Vec<u8>) -> DataSource {
        DataSource::Vec(vec)
    }

    /// Memory map file at `path`
    pub fn from_file<P>(path: P) -> Result<DataSource>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let len = file.metadata().map_err(|e| Error::io(path, e))?.len();

        // empty files cannot be mapped
        if len == 0 {
            return Ok(DataSource::Vec(Vec::new()));
        }

        // Safety: the map is read-only and lives only for the duration of one parse
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(|e| Error::io(path, e))?;
        Ok(DataSource::Mmap(mmap))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let res = DataSource::from_file("surely/not/here.obj");
        assert!(matches!(res, Err(Error::Io { .. })));
    }

    #[test]
    fn reads_file_contents() {
        let path = crate::test_helpers::temp_path("data_source.txt");
        std::fs::write(&path, b"v 1 2 3\n").unwrap();

        let ds = DataSource::from_file(&path).unwrap();
        assert_eq!(ds.get_slice(), b"v 1 2 3\n");

        std::fs::write(&path, b"").unwrap();
        let ds = DataSource::from_file(&path).unwrap();
        assert!(ds.get_slice().is_empty());

        let _ = std::fs::remove_file(&path);
    }
}
