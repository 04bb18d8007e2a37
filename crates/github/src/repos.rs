//! `RepositoryInspector` over the organization repository endpoints.

use async_trait::async_trait;
use governance::{GitHubError, RepositoryInspector, RepositoryName, RepositorySummary};

use crate::client::GitHubClient;
use crate::models::{ContentEntry, DependabotAlert, RepositoryBody, RepositoryDetails};

#[async_trait]
impl RepositoryInspector for GitHubClient {
    async fn list_repositories(&self) -> Result<Vec<RepositorySummary>, GitHubError> {
        let repositories: Vec<RepositoryBody> = self
            .get_paged(&self.org_path("/repos"), &[("type", "all")])
            .await?;
        Ok(repositories
            .into_iter()
            .filter_map(RepositoryBody::into_summary)
            .collect())
    }

    async fn list_directory(
        &self,
        repository: &RepositoryName,
        path: &str,
    ) -> Result<Vec<String>, GitHubError> {
        let path = path.trim_matches('/');
        let endpoint = if path.is_empty() {
            self.org_repo_path(repository.as_str(), "/contents")
        } else {
            self.org_repo_path(repository.as_str(), &format!("/contents/{path}"))
        };
        let entries: Vec<ContentEntry> = self.get_json(&endpoint).await?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    async fn advanced_security_enabled(
        &self,
        repository: &RepositoryName,
    ) -> Result<bool, GitHubError> {
        let details: RepositoryDetails = self
            .get_json(&self.org_repo_path(repository.as_str(), ""))
            .await?;
        Ok(details
            .security_and_analysis
            .and_then(|s| s.advanced_security)
            .is_some_and(|a| a.status == "enabled"))
    }

    async fn vulnerability_alerts_enabled(
        &self,
        repository: &RepositoryName,
    ) -> Result<bool, GitHubError> {
        // 204 when enabled, 404 when disabled.
        self.exists(&self.org_repo_path(repository.as_str(), "/vulnerability-alerts"))
            .await
    }

    async fn list_dependabot_alert_severities(
        &self,
        repository: &RepositoryName,
    ) -> Result<Vec<String>, GitHubError> {
        let alerts: Vec<DependabotAlert> = self
            .get_paged(
                &self.org_repo_path(repository.as_str(), "/dependabot/alerts"),
                &[("state", "open")],
            )
            .await?;
        Ok(alerts
            .into_iter()
            .filter_map(DependabotAlert::severity)
            .collect())
    }
}
