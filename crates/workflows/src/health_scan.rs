//! Bounded concurrent health scan of an organization's repositories.

use std::collections::BTreeSet;
use std::sync::Arc;

use governance::{
    GitHubError, HealthConfig, RepositoryFacts, RepositoryHealth, RepositoryInspector,
    RepositorySummary,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const GITHUB_DIRECTORY: &str = ".github";

async fn directory_entries(
    inspector: &dyn RepositoryInspector,
    repository: &RepositorySummary,
    path: &str,
) -> Result<Vec<String>, GitHubError> {
    match inspector.list_directory(&repository.name, path).await {
        Ok(entries) => Ok(entries),
        // Empty repositories and repositories without `.github/`.
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Gathers facts about one repository and scores them.
pub async fn check_repository(
    inspector: &dyn RepositoryInspector,
    config: &HealthConfig,
    repository: &RepositorySummary,
) -> Result<RepositoryHealth, GitHubError> {
    let root = directory_entries(inspector, repository, "").await?;
    let dot_github = directory_entries(inspector, repository, GITHUB_DIRECTORY).await?;
    let present_files: BTreeSet<String> =
        config.present_files(root.iter().chain(dot_github.iter()).map(String::as_str));

    let security_scanning = inspector.advanced_security_enabled(&repository.name).await?;
    let dependabot_enabled = inspector.vulnerability_alerts_enabled(&repository.name).await?;

    let severities = if dependabot_enabled {
        match inspector.list_dependabot_alert_severities(&repository.name).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(repository = %repository.full_name, error = %e, "Failed to list Dependabot alerts");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Ok(config.score(RepositoryFacts {
        repository: repository.full_name.clone(),
        last_updated: repository.updated_at,
        is_archived: repository.archived,
        is_private: repository.private,
        present_files,
        security_scanning,
        dependabot_enabled,
        alert_counts: config.count_alerts(&severities),
    }))
}

/// Scans every repository the configuration includes, with at most
/// `scanning.max_workers` checks in flight.
///
/// Repositories whose check fails are logged and left out. Results are
/// sorted by repository name.
#[tracing::instrument(skip_all, fields(max_workers = config.scanning.max_workers))]
pub async fn scan_repositories(
    inspector: Arc<dyn RepositoryInspector>,
    config: Arc<HealthConfig>,
) -> Result<Vec<RepositoryHealth>, GitHubError> {
    let repositories: Vec<RepositorySummary> = inspector
        .list_repositories()
        .await?
        .into_iter()
        .filter(|r| config.includes(r))
        .collect();
    tracing::info!(repositories = repositories.len(), "Scanning repositories");

    let permits = Arc::new(Semaphore::new(config.scanning.max_workers.max(1)));
    let mut tasks = JoinSet::new();

    for repository in repositories {
        let inspector = Arc::clone(&inspector);
        let config = Arc::clone(&config);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await.ok();
            let result = check_repository(inspector.as_ref(), &config, &repository).await;
            (repository, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((repository, Ok(health))) => {
                tracing::debug!(
                    repository = %repository.full_name,
                    score = health.overall_score,
                    light = %health.traffic_light,
                    "Checked repository"
                );
                results.push(health);
            }
            Ok((repository, Err(e))) => {
                tracing::warn!(repository = %repository.full_name, error = %e, "Failed to check repository; excluding it");
            }
            Err(e) => {
                tracing::error!(error = %e, "Repository check task failed");
            }
        }
    }

    results.sort_by(|a, b| a.facts.repository.cmp(&b.facts.repository));
    tracing::info!(checked = results.len(), "Scan complete");
    Ok(results)
}
