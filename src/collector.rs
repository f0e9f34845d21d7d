//! Artifact collector.
//!
//! Reads a stage's output file back into text. A missing file is not an
//! error, it just means there is nothing to show.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::error::{VizError, VizResult};

/// Read the artifact at `path`.
///
/// Returns `Ok(None)` if the file does not exist. Invalid UTF-8 is replaced
/// rather than rejected; assembly listings can carry raw bytes in string
/// directives.
pub fn read_artifact(path: &Path) -> VizResult<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => {
            debug!("collected {} bytes from {}", bytes.len(), path.display());
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("no artifact at {}", path.display());
            Ok(None)
        }
        Err(source) => Err(VizError::ReadArtifact {
            path: path.to_path_buf(),
            source,
        }),
    }
}
