use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DecodeError, DecodeResult};

/// File name of the compiled decoder module.
pub const MODULE_FILE: &str = "storage_timeline.wasm";

/// File name of the execution-environment script the module runs under.
pub const ENV_SCRIPT_FILE: &str = "wasm_exec.js";

/// Directory name, under the platform data directory, holding both files.
pub const INSTALL_SUBDIR: &str = "wasm_storage_timeline";

/// Public location both artifacts are fetched from.
pub const SOURCE_BASE_URL: &str =
    "https://raw.githubusercontent.com/vitche/wasm_storage_timeline/main";

/// Well-known installation directory for the decoder artifacts.
///
/// Uses the platform's local data directory, or the working directory when
/// the platform has none.
pub fn default_install_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(INSTALL_SUBDIR)
}

/// Source URL for one artifact file.
pub fn source_url(file_name: &str) -> String {
    format!("{SOURCE_BASE_URL}/{file_name}")
}

/// Locations of the decoder module and its execution-environment script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderArtifacts {
    pub module: PathBuf,
    pub env_script: PathBuf,
}

impl DecoderArtifacts {
    pub fn new(module: impl Into<PathBuf>, env_script: impl Into<PathBuf>) -> Self {
        Self {
            module: module.into(),
            env_script: env_script.into(),
        }
    }

    /// Both artifacts under their standard names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MODULE_FILE), dir.join(ENV_SCRIPT_FILE))
    }

    /// True when both files exist.
    pub fn exist(&self) -> bool {
        self.module.is_file() && self.env_script.is_file()
    }

    /// Resolve the artifacts, preferring `install_dir` over `fallback`.
    ///
    /// Fallback paths are made absolute so later runtime launches do not
    /// depend on the working directory.
    pub fn locate(install_dir: &Path, fallback: &DecoderArtifacts) -> DecodeResult<Self> {
        let installed = Self::in_dir(install_dir);
        if installed.exist() {
            debug!(dir = %install_dir.display(), "using installed decoder artifacts");
            return Ok(installed);
        }

        if fallback.exist() {
            let resolved = Self::new(
                fs::canonicalize(&fallback.module)?,
                fs::canonicalize(&fallback.env_script)?,
            );
            debug!(
                module = %resolved.module.display(),
                env_script = %resolved.env_script.display(),
                "using fallback decoder artifacts"
            );
            return Ok(resolved);
        }

        Err(DecodeError::ArtifactMissing {
            install_dir: install_dir.to_path_buf(),
            fallback_module: fallback.module.clone(),
            fallback_env_script: fallback.env_script.clone(),
        })
    }
}

impl Default for DecoderArtifacts {
    /// Standard file names relative to the working directory.
    fn default() -> Self {
        Self::new(MODULE_FILE, ENV_SCRIPT_FILE)
    }
}
