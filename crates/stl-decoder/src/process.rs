use std::fs;
use std::io::{self, Read};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use stl_protocol::{excerpt, EXCERPT_CHARS};
use tracing::debug;

use crate::artifacts::DecoderArtifacts;
use crate::config::DecoderConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::launcher::{Launcher, ENCODING_BASE64};
use crate::scratch::ScratchFile;
use crate::traits::Decoder;

/// Text reported when the runtime failed without writing to stderr.
const NO_DIAGNOSTIC: &str = "<no diagnostic output>";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Decoder that runs the compiled decoder module in an external runtime.
///
/// The runtime never shares an address space with the caller. Each call
/// exchanges data through two private scratch files:
///
/// ```text
/// payload --base64--> input file --runtime--> output file --JSON--> Value
/// ```
///
/// Both scratch files are removed before `decode` returns, whatever the
/// outcome. The launcher script is created once and removed by
/// [`Decoder::release`].
#[derive(Debug)]
pub struct ProcessDecoder {
    runtime: PathBuf,
    artifacts: DecoderArtifacts,
    launcher: Launcher,
    scratch_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessDecoder {
    /// Locate the artifacts and persist the launcher.
    pub fn new(config: &DecoderConfig) -> DecodeResult<Self> {
        let artifacts = DecoderArtifacts::locate(&config.install_dir(), &config.fallback_artifacts())?;
        Self::with_artifacts(config, artifacts)
    }

    /// Use already located artifacts.
    pub fn with_artifacts(config: &DecoderConfig, artifacts: DecoderArtifacts) -> DecodeResult<Self> {
        let launcher = Launcher::persist(config.scratch_dir.as_deref())?;
        debug!(
            runtime = %config.runtime.display(),
            module = %artifacts.module.display(),
            "process decoder ready"
        );
        Ok(Self {
            runtime: config.runtime.clone(),
            artifacts,
            launcher,
            scratch_dir: config.scratch_dir.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn artifacts(&self) -> &DecoderArtifacts {
        &self.artifacts
    }

    pub fn launcher_path(&self) -> Option<&Path> {
        self.launcher.path()
    }

    fn execute(&self, launcher: &Path, input: &Path, output: &Path) -> DecodeResult<()> {
        let mut command = Command::new(&self.runtime);
        command
            .arg(launcher)
            .arg(&self.artifacts.env_script)
            .arg(&self.artifacts.module)
            .arg(input)
            .arg(output)
            .arg(ENCODING_BASE64)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // Own group, so a timeout also reaches processes a wrapper script started.
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command
            .spawn()
            .map_err(|source| DecodeError::Spawn {
                program: self.runtime.display().to_string(),
                source,
            })?;

        let stderr = child.stderr.take();
        let collector = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                if let Err(e) = stderr.read_to_end(&mut buf) {
                    debug!(error = %e, "stopped reading decoder stderr");
                }
            }
            buf
        });

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => match wait_until(&mut child, limit)? {
                Some(status) => status,
                None => {
                    terminate(&mut child);
                    if let Err(e) = child.wait() {
                        debug!(error = %e, "failed to reap timed-out decoder runtime");
                    }
                    // A survivor may still hold stderr open; the collector is left to finish alone.
                    drop(collector);
                    return Err(DecodeError::Timeout(limit));
                }
            },
        };
        let stderr = collector.join().unwrap_or_default();

        if !status.success() {
            return Err(DecodeError::ExecutionFailed {
                status: status.to_string(),
                stderr: diagnostic(&stderr),
            });
        }
        Ok(())
    }
}

impl Decoder for ProcessDecoder {
    fn decode(&self, payload: &[u8]) -> DecodeResult<Value> {
        let launcher = self.launcher.path().ok_or(DecodeError::Released)?;
        let dir = self.scratch_dir.as_deref();

        let encoded = STANDARD.encode(payload);
        let input = ScratchFile::with_contents(dir, "stl-input-", ".bin", encoded.as_bytes())?;
        let output = ScratchFile::create(dir, "stl-output-", ".json")?;

        debug!(
            bytes = payload.len(),
            input = %input.path().display(),
            output = %output.path().display(),
            "running decoder runtime"
        );
        self.execute(launcher, input.path(), output.path())?;

        let raw = fs::read(output.path())?;
        parse_output(&String::from_utf8_lossy(&raw))
    }

    fn name(&self) -> &'static str {
        "process"
    }

    fn release(&mut self) {
        self.launcher.remove();
    }
}

/// Parse runtime output, keeping a bounded excerpt on failure.
pub fn parse_output(text: &str) -> DecodeResult<Value> {
    serde_json::from_str(text).map_err(|e| DecodeError::ResultMalformed {
        reason: e.to_string(),
        excerpt: excerpt(text, EXCERPT_CHARS),
    })
}

fn diagnostic(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.is_empty() {
        NO_DIAGNOSTIC.to_string()
    } else {
        text.to_string()
    }
}

/// Kill the runtime together with its process group.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        match Command::new("kill")
            .args(["-KILL", "--", group.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => return,
            Ok(status) => debug!(%status, "failed to kill decoder process group"),
            Err(e) => debug!(error = %e, "failed to kill decoder process group"),
        }
    }
    if let Err(e) = child.kill() {
        debug!(error = %e, "failed to kill timed-out decoder runtime");
    }
}

/// Wait for `child` for at most `limit`. `None` means the limit elapsed.
fn wait_until(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}
