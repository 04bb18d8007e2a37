//! `health` subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use governance::report::{render, report_file_name};
use governance::{HealthConfig, HealthSummary, RepositoryHealth, RepositoryInspector, Timestamp};

/// Loads the health configuration. A missing file means defaults.
pub fn load_config(path: &Path) -> Result<HealthConfig> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Health configuration not found; using defaults");
        return Ok(HealthConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(HealthConfig::from_yaml(&path.display().to_string(), &text)?)
}

/// Writes one report per configured export format into `output_dir`.
pub fn write_reports(
    output_dir: &Path,
    org: &str,
    config: &HealthConfig,
    summary: &HealthSummary,
    results: &[RepositoryHealth],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut written = Vec::new();
    for format in &config.reporting.export_formats {
        let path = output_dir.join(report_file_name(org, *format, summary));
        let body = render(*format, org, config, summary, results)?;
        std::fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote report");
        written.push(path);
    }
    Ok(written)
}

pub async fn scan(
    inspector: Arc<dyn RepositoryInspector>,
    config: HealthConfig,
    org: &str,
    output_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let config = Arc::new(config);
    let results = workflows::scan_repositories(inspector, Arc::clone(&config)).await?;
    let summary = HealthSummary::from_results(&results, Timestamp::now());
    tracing::info!(
        repositories = summary.total_repos,
        average = summary.avg_health_score,
        "Scan finished"
    );

    let dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.reporting.output_directory));
    write_reports(&dir, org, &config, &summary, &results)
}

/// Writes the default configuration to `path`.
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    std::fs::write(path, HealthConfig::default().to_yaml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote default health configuration");
    Ok(())
}
