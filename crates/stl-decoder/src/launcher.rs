use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, warn};

/// Encoding marker telling the launcher its input file holds base64 text.
pub const ENCODING_BASE64: &str = "base64";

/// Script executed by the runtime for every decode call.
///
/// Arguments: environment script, decoder module, input path, output path,
/// optional encoding marker. Any failure ends the process with status 1 and
/// a diagnostic on stderr; stdout is never used for results.
pub const LAUNCHER_SCRIPT: &str = r#"const fs = require('fs');

const envScriptPath = process.argv[2];
const modulePath = process.argv[3];
const inputPath = process.argv[4];
const outputPath = process.argv[5];
const encoding = process.argv[6] || '';

function fail(stage, err) {
  const detail = err && err.stack ? err.stack : String(err);
  process.stderr.write('storage timeline decoder: ' + stage + ': ' + detail + '\n');
  process.exit(1);
}

async function decode() {
  eval(fs.readFileSync(envScriptPath, 'utf8'));

  const go = new Go();
  const loaded = await WebAssembly.instantiate(fs.readFileSync(modulePath), go.importObject);
  go.run(loaded.instance);

  let input = fs.readFileSync(inputPath);
  if (encoding === 'base64') {
    input = Buffer.from(input.toString('ascii'), 'base64');
  }

  const result = StorageTimeline.Timeline.parse(new Uint8Array(input));
  fs.writeFileSync(outputPath, JSON.stringify(result));
  process.exit(0);
}

decode().catch((err) => fail('decode', err));
"#;

/// The launcher persisted to disk, shared read-only by every decode call of
/// one bridge.
///
/// The file lives until [`Launcher::remove`] is called. Dropping a launcher
/// without removing it leaves the file in the temp directory.
#[derive(Debug)]
pub struct Launcher {
    path: Option<PathBuf>,
}

impl Launcher {
    /// Write [`LAUNCHER_SCRIPT`] to a fresh file in `dir`, or the system
    /// temp directory.
    pub fn persist(dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = Builder::new();
        builder.prefix("stl-launcher-").suffix(".js");
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(LAUNCHER_SCRIPT.as_bytes())?;
        file.flush()?;
        let path = file.into_temp_path().keep().map_err(|e| e.error)?;
        debug!(path = %path.display(), "persisted decoder launcher");
        Ok(Self { path: Some(path) })
    }

    /// Path of the launcher, or `None` once removed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Delete the launcher file. Idempotent; failures are logged only.
    pub fn remove(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed decoder launcher"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove decoder launcher"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_writes_script() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::persist(Some(dir.path())).unwrap();
        let path = launcher.path().unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(fs::read_to_string(path).unwrap(), LAUNCHER_SCRIPT);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = Launcher::persist(Some(dir.path())).unwrap();
        let path = launcher.path().unwrap().to_path_buf();
        launcher.remove();
        assert!(!path.exists());
        assert!(launcher.path().is_none());
        launcher.remove();
    }

    #[test]
    fn remove_tolerates_external_deletion() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = Launcher::persist(Some(dir.path())).unwrap();
        fs::remove_file(launcher.path().unwrap()).unwrap();
        launcher.remove();
        assert!(launcher.path().is_none());
    }

    #[test]
    fn dropping_without_remove_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::persist(Some(dir.path())).unwrap();
        let path = launcher.path().unwrap().to_path_buf();
        drop(launcher);
        assert!(path.exists());
    }

    #[test]
    fn script_calls_parse_entry_point() {
        assert!(LAUNCHER_SCRIPT.contains("StorageTimeline.Timeline.parse"));
        assert!(LAUNCHER_SCRIPT.contains("process.exit(1)"));
        assert!(LAUNCHER_SCRIPT.contains(&format!("'{ENCODING_BASE64}'")));
    }
}
