use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use stl_decoder::{DecoderArtifacts, ENV_SCRIPT_FILE, MODULE_FILE, SOURCE_BASE_URL};
use stl_protocol::{HttpRequest, Method};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{ensure_success, HttpTransport, Transport};

/// Downloads the decoder module and its environment script into an
/// installation directory.
pub struct ArtifactInstaller<T> {
    transport: T,
    dir: PathBuf,
    base_url: String,
}

impl ArtifactInstaller<HttpTransport> {
    pub fn new(config: &TransportConfig, dir: impl Into<PathBuf>) -> ClientResult<Self> {
        Ok(Self::with_transport(HttpTransport::new(config)?, dir))
    }
}

impl<T: Transport> ArtifactInstaller<T> {
    pub fn with_transport(transport: T, dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            dir: dir.into(),
            base_url: SOURCE_BASE_URL.to_string(),
        }
    }

    /// Fetch from a mirror instead of the published source.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn url_of(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.base_url)
    }

    /// Download both artifacts. Existing files are replaced only after a
    /// download completes.
    pub fn install(&self) -> ClientResult<DecoderArtifacts> {
        self.try_install().map_err(|reason| ClientError::Install {
            module_url: self.url_of(MODULE_FILE),
            env_script_url: self.url_of(ENV_SCRIPT_FILE),
            dir: self.dir.clone(),
            reason,
        })?;
        info!(dir = %self.dir.display(), "decoder artifacts installed");
        Ok(DecoderArtifacts::in_dir(&self.dir))
    }

    fn try_install(&self) -> Result<(), String> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| format!("cannot create {}: {e}", self.dir.display()))?;
        for file_name in [MODULE_FILE, ENV_SCRIPT_FILE] {
            self.fetch(file_name)?;
        }
        Ok(())
    }

    fn fetch(&self, file_name: &str) -> Result<(), String> {
        let url = self.url_of(file_name);
        debug!(%url, "downloading decoder artifact");
        let request = HttpRequest {
            method: Method::Get,
            url: url.clone(),
            headers: Vec::new(),
            body: None,
        };
        let response = self
            .transport
            .send(&request)
            .and_then(ensure_success)
            .map_err(|e| format!("{url}: {e}"))?;

        let dest = self.dir.join(file_name);
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(|e| e.to_string())?;
        staged.write_all(&response.body).map_err(|e| e.to_string())?;
        staged
            .persist(&dest)
            .map_err(|e| format!("cannot write {}: {}", dest.display(), e.error))?;
        debug!(path = %dest.display(), bytes = response.body.len(), "stored decoder artifact");
        Ok(())
    }
}
