use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Suffix of accepted file names, compared ASCII case-insensitively
pub const RECOGNIZED_SUFFIX: &str = ".dcm";

/// True if the final component of `name` ends in `.dcm` in any letter case
pub fn is_recognized(name: impl AsRef<Path>) -> bool {
    let Some(file_name) = name.as_ref().file_name() else {
        return false;
    };
    let file_name = file_name.to_string_lossy();
    file_name.len() >= RECOGNIZED_SUFFIX.len()
        && file_name.as_bytes()[file_name.len() - RECOGNIZED_SUFFIX.len()..]
            .eq_ignore_ascii_case(RECOGNIZED_SUFFIX.as_bytes())
}

pub struct SeriesScanner;

impl SeriesScanner {
    /// Recursively collect every recognized file under `root`, sorted by
    /// full path. The order is lexicographic and does not consult any
    /// instance number stored in the files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `root` does not exist and [`Error::Io`]
    /// if a directory below it cannot be read
    pub fn scan(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(Error::NotFound(root.display().to_string()));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|err| {
                let message = err.to_string();
                err.into_io_error()
                    .map(Error::Io)
                    .unwrap_or(Error::Io(std::io::Error::other(message)))
            })?;
            if entry.file_type().is_file() && is_recognized(entry.file_name()) {
                paths.push(entry.into_path());
            }
        }
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

        debug!("Found {} DICOM files under {}", paths.len(), root.display());
        Ok(paths)
    }
}
