// Hand-off of crawled URLs to the nuclei vulnerability scanner

use crate::error::{CoreError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

pub const TARGETS_FILE: &str = "spyglass_nuclei_targets.txt";
pub const RESULTS_FILE: &str = "nuclei_results.txt";

pub struct NucleiRunner {
    binary: String,
    targets_path: PathBuf,
    results_path: PathBuf,
}

impl NucleiRunner {
    /// Writes its files to the current directory.
    pub fn new() -> Self {
        Self {
            binary: "nuclei".to_string(),
            targets_path: PathBuf::from(TARGETS_FILE),
            results_path: PathBuf::from(RESULTS_FILE),
        }
    }

    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }

    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.targets_path = dir.join(TARGETS_FILE);
        self.results_path = dir.join(RESULTS_FILE);
        self
    }

    pub fn targets_path(&self) -> &Path {
        &self.targets_path
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// Newline-delimited target list.
    pub fn write_targets(&self, urls: &[String]) -> Result<()> {
        fs::write(&self.targets_path, urls.join("\n"))?;
        debug!("Wrote {} nuclei targets to {}", urls.len(), self.targets_path.display());
        Ok(())
    }

    /// Write the targets file and run nuclei against it, waiting for it to
    /// exit. A missing binary is reported as [`CoreError::ToolMissing`].
    pub async fn run(&self, urls: &[String]) -> Result<&Path> {
        self.write_targets(urls)?;

        info!("Running {} on {} targets", self.binary, urls.len());
        let status = Command::new(&self.binary)
            .arg("-l")
            .arg(&self.targets_path)
            .arg("-o")
            .arg(&self.results_path)
            .status()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => CoreError::ToolMissing(self.binary.clone()),
                _ => CoreError::Io(e),
            })?;

        if !status.success() {
            return Err(CoreError::ToolFailed {
                tool: self.binary.clone(),
                status: status.to_string(),
            });
        }
        Ok(&self.results_path)
    }
}

impl Default for NucleiRunner {
    fn default() -> Self {
        Self::new()
    }
}
