use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifacts::{default_install_dir, DecoderArtifacts, ENV_SCRIPT_FILE, MODULE_FILE};
use crate::error::DecodeResult;
use crate::native::NativeDecoder;
use crate::process::ProcessDecoder;
use crate::traits::Decoder;

/// Which decoder implementation binary mode uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderKind {
    /// Run the compiled module in an external runtime process.
    #[default]
    Process,
    /// Parse the record stream in-process.
    Native,
}

/// Configuration for the binary decoder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub kind: DecoderKind,
    /// Runtime executable the launcher script is handed to.
    pub runtime: PathBuf,
    /// Overrides the well-known installation directory.
    pub install_dir: Option<PathBuf>,
    /// Fallback decoder module path, used when the install directory lacks it.
    pub module_path: PathBuf,
    /// Fallback execution-environment script path.
    pub env_script_path: PathBuf,
    /// Directory for the launcher and per-call scratch files.
    pub scratch_dir: Option<PathBuf>,
    /// Limit on a single runtime execution. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            kind: DecoderKind::default(),
            runtime: PathBuf::from("node"),
            install_dir: None,
            module_path: PathBuf::from(MODULE_FILE),
            env_script_path: PathBuf::from(ENV_SCRIPT_FILE),
            scratch_dir: None,
            timeout_ms: None,
        }
    }
}

impl DecoderConfig {
    /// A configuration for the in-process decoder.
    pub fn native() -> Self {
        Self {
            kind: DecoderKind::Native,
            ..Default::default()
        }
    }

    pub fn install_dir(&self) -> PathBuf {
        self.install_dir.clone().unwrap_or_else(default_install_dir)
    }

    pub fn fallback_artifacts(&self) -> DecoderArtifacts {
        DecoderArtifacts::new(&self.module_path, &self.env_script_path)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Construct the configured decoder.
    pub fn build(&self) -> DecodeResult<Box<dyn Decoder>> {
        match self.kind {
            DecoderKind::Process => Ok(Box::new(ProcessDecoder::new(self)?)),
            DecoderKind::Native => Ok(Box::new(NativeDecoder::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn default_config() {
        let c = DecoderConfig::default();
        assert_eq!(c.kind, DecoderKind::Process);
        assert_eq!(c.runtime, PathBuf::from("node"));
        assert_eq!(c.module_path, PathBuf::from("storage_timeline.wasm"));
        assert_eq!(c.env_script_path, PathBuf::from("wasm_exec.js"));
        assert!(c.timeout().is_none());
    }

    #[test]
    fn timeout_in_millis() {
        let c = DecoderConfig { timeout_ms: Some(1500), ..Default::default() };
        assert_eq!(c.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn install_dir_override() {
        let c = DecoderConfig { install_dir: Some("/opt/stl".into()), ..Default::default() };
        assert_eq!(c.install_dir(), PathBuf::from("/opt/stl"));
    }

    #[test]
    fn native_build_needs_no_artifacts() {
        let decoder = DecoderConfig::native().build().unwrap();
        assert_eq!(decoder.name(), "native");
    }

    #[test]
    fn process_build_fails_without_artifacts() {
        let empty = tempfile::tempdir().unwrap();
        let c = DecoderConfig {
            install_dir: Some(empty.path().to_path_buf()),
            module_path: empty.path().join("missing.wasm"),
            env_script_path: empty.path().join("missing.js"),
            ..Default::default()
        };
        assert!(matches!(c.build(), Err(DecodeError::ArtifactMissing { .. })));
    }
}
