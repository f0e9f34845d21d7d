//! Per-run temporary workspace.
//!
//! The directory and everything in it is removed when the [`Workspace`] is
//! dropped, whichever way the run ends.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::error::{VizError, VizResult};

pub const SOURCE_FILE: &str = "source.c";
pub const IR_FILE: &str = "source.ll";
pub const OPT_BITCODE_FILE: &str = "opt.bc";
pub const OPT_IR_FILE: &str = "opt.ll";
pub const ASM_FILE: &str = "source.s";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh directory under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> VizResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ccviz-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(VizError::Workspace)?;

        debug!("created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Write the source text and return its path.
    pub fn write_source(&self, source: &str) -> VizResult<PathBuf> {
        let path = self.source_path();
        fs::write(&path, source).map_err(|source| VizError::WriteSource {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Remove the directory now, reporting failures that `Drop` would
    /// swallow.
    pub fn close(self) -> VizResult<()> {
        self.dir.close().map_err(VizError::Io)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.path().join(SOURCE_FILE)
    }

    pub fn ir_path(&self) -> PathBuf {
        self.dir.path().join(IR_FILE)
    }

    pub fn opt_bitcode_path(&self) -> PathBuf {
        self.dir.path().join(OPT_BITCODE_FILE)
    }

    pub fn opt_ir_path(&self) -> PathBuf {
        self.dir.path().join(OPT_IR_FILE)
    }

    pub fn asm_path(&self) -> PathBuf {
        self.dir.path().join(ASM_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = tempdir().unwrap();
        let path = {
            let ws = Workspace::create(Some(root.path())).unwrap();
            ws.write_source("int main(void) { return 0; }").unwrap();
            assert!(ws.source_path().exists());
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_file_layout() {
        let ws = Workspace::create(None).unwrap();
        assert_eq!(ws.ir_path().file_name().unwrap(), IR_FILE);
        assert_eq!(ws.opt_bitcode_path().parent().unwrap(), ws.path());
        assert!(ws
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("ccviz-"));
    }

    #[test]
    fn test_missing_root_is_workspace_error() {
        let root = tempdir().unwrap();
        let missing = root.path().join("does-not-exist");
        let result = Workspace::create(Some(&missing));
        assert!(matches!(result, Err(VizError::Workspace(_))));
    }
}
