//! Legacy `.doc` conversion.
//!
//! The pipeline only sees the `Converter` trait. Without a configured office
//! host every legacy file fails with `ConversionUnavailable`.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

pub trait Converter: Send + Sync {
    /// Convert `legacy` into a package file inside `scratch` and return its path.
    fn convert(&self, legacy: &Path, scratch: &Path) -> Result<PathBuf>;
}

/// No office host available.
pub struct Unavailable;

impl Converter for Unavailable {
    fn convert(&self, _legacy: &Path, _scratch: &Path) -> Result<PathBuf> {
        Err(Error::ConversionUnavailable)
    }
}

/// Kills the host process if it is still running when dropped.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            log::warn!("Terminating office host (pid {})", self.0.id());
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }
}

/// Headless LibreOffice: `soffice --headless --convert-to docx --outdir <scratch> <file>`.
pub struct Soffice {
    program: PathBuf,
    timeout: Duration,
}

impl Soffice {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Converter for Soffice {
    fn convert(&self, legacy: &Path, scratch: &Path) -> Result<PathBuf> {
        let stem = legacy
            .file_stem()
            .ok_or_else(|| Error::Conversion(format!("no file name: {}", legacy.display())))?;
        let child = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("docx")
            .arg("--outdir")
            .arg(scratch)
            .arg(legacy)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Conversion(format!("{}: {e}", self.program.display())))?;
        let mut guard = ChildGuard(child);

        let start = Instant::now();
        let status = loop {
            if let Some(status) = guard.0.try_wait()? {
                break status;
            }
            if start.elapsed() > self.timeout {
                return Err(Error::Conversion(format!(
                    "office host timed out after {:?}",
                    self.timeout
                )));
            }
            thread::sleep(Duration::from_millis(100));
        };
        if !status.success() {
            return Err(Error::Conversion(format!("office host exited with {status}")));
        }

        let converted = scratch.join(format!("{}.docx", stem.to_string_lossy()));
        if !converted.is_file() {
            return Err(Error::Conversion(format!(
                "office host produced no output for {}",
                legacy.display()
            )));
        }
        log::debug!("Converted {} in {:.1?}", legacy.display(), start.elapsed());
        Ok(converted)
    }
}
