//! CI runner integration: path export, step outputs and log groups.
//!
//! Uses the GitHub Actions workflow-command conventions, which several other
//! CI systems also understand.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Append `dir` to the runner's path file so later steps can run the tool.
pub fn export_path(path_file: &Path, dir: &Path) -> Result<()> {
    let dir = dir.to_str().context("install directory is not valid UTF-8")?;
    append_line(path_file, dir)
}

/// Append `name=value` to the runner's step outputs file.
pub fn set_output(output_file: &Path, name: &str, value: &str) -> Result<()> {
    if value.contains('\n') || value.contains('\r') {
        bail!("output {name} must be a single line");
    }
    append_line(output_file, &format!("{name}={value}"))
}

fn append_line(file: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    writeln!(f, "{line}").with_context(|| format!("Failed to write {}", file.display()))
}

/// Collapsible log group; closed when dropped.
pub struct LogGroup {
    enabled: bool,
}

impl LogGroup {
    pub fn start(title: &str, enabled: bool) -> Self {
        if enabled {
            println!("::group::{title}");
        }
        Self { enabled }
    }
}

impl Drop for LogGroup {
    fn drop(&mut self) {
        if self.enabled {
            println!("::endgroup::");
        }
    }
}
