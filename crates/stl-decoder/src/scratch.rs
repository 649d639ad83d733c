use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile, TempPath};
use tracing::{trace, warn};

/// A uniquely named scratch file that is removed when dropped.
///
/// Removal is best effort: a failure is logged and never surfaces to the
/// caller, so the outcome of the call that used the file is preserved.
pub struct ScratchFile {
    path: PathBuf,
    guard: Option<TempPath>,
}

impl ScratchFile {
    /// Create an empty scratch file in `dir`, or the system temp directory.
    pub fn create(dir: Option<&Path>, prefix: &str, suffix: &str) -> io::Result<Self> {
        Ok(Self::from_named(named(dir, prefix, suffix)?))
    }

    /// Create a scratch file holding `contents`.
    pub fn with_contents(
        dir: Option<&Path>,
        prefix: &str,
        suffix: &str,
        contents: &[u8],
    ) -> io::Result<Self> {
        let mut file = named(dir, prefix, suffix)?;
        file.write_all(contents)?;
        file.flush()?;
        Ok(Self::from_named(file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn from_named(file: NamedTempFile) -> Self {
        let guard = file.into_temp_path();
        Self {
            path: guard.to_path_buf(),
            guard: Some(guard),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        match guard.close() {
            Ok(()) => trace!(path = %self.path.display(), "removed scratch file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove scratch file"),
        }
    }
}

fn named(dir: Option<&Path>, prefix: &str, suffix: &str) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(prefix).suffix(suffix);
    match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
}
