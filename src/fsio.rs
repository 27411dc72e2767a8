//! Filesystem glue: loading the source image and persisting the icon.

use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

//===========================================================================//

/// Reads the whole source file.  A missing file (including an empty path)
/// is reported as [`Error::NotFound`]; any other failure to read it as
/// [`Error::Unreadable`].
pub fn load_source(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound { path, source }
        } else {
            Error::Unreadable { path, source }
        }
    })
}

/// Writes `data` to `path` atomically and returns the size of the file on
/// disk.
///
/// The bytes go to a temporary file in the destination directory, which is
/// synced and then renamed over `path`.  Concurrent writers to the same path
/// therefore never interleave: readers see either the old file or one
/// complete new file.  On failure nothing is left at `path`.
pub fn persist(path: &Path, data: &[u8]) -> Result<u64> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|source| {
        Error::CreateDestination { path: path.to_path_buf(), source }
    })?;
    file.write_all(data).map_err(Error::Encoding)?;
    file.as_file().sync_all().map_err(Error::Encoding)?;
    file.persist(path).map_err(|error| Error::Encoding(error.error))?;
    let metadata = fs::metadata(path).map_err(Error::Encoding)?;
    Ok(metadata.len())
}

/// Returns `input` with its extension replaced by `.ico`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("ico")
}

//===========================================================================//


//===========================================================================//
