//! Step outputs for GitHub Actions.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Appends `key=value` to the `GITHUB_OUTPUT` file. Without a file the
/// value is only logged.
pub fn set_output(file: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let Some(path) = file else {
        tracing::info!(key, value, "No GITHUB_OUTPUT file; output not recorded");
        return Ok(());
    };
    let mut out = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    writeln!(out, "{key}={value}").with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn appends_to_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "previous=1\n").unwrap();

        set_output(Some(&path), "status", "pass").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous=1\nstatus=pass\n");
    }

    #[test]
    fn missing_output_file_is_not_an_error() {
        assert!(set_output(None, "status", "fail").is_ok());
    }
}
