//! Port traits: the GitHub capabilities the governance workflows consume.
//!
//! Infrastructure crates implement these over a real HTTP client; tests
//! implement them in memory. Each trait exposes only the operations a
//! workflow actually calls, nothing more.
//!
//! All repositories addressed through [`TeamAdmin`] and
//! [`RepositoryInspector`] belong to the organization the implementation was
//! constructed for. [`PullRequestManager`] and [`CodeRepository`] act on a
//! single repository.

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    CommitSha, CommitState, GitHubError, Permission, PullRequestNumber, RepositoryId,
    RepositoryName, ReviewState, TeamId, TeamPrivacy, TeamSlug, Timestamp, Username,
};

// ---------------------------------------------------------------------------
// Value objects returned by or passed to the ports
// ---------------------------------------------------------------------------

/// A team as reported by GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub slug: TeamSlug,
    pub name: String,
    pub description: Option<String>,
    pub parent: Option<TeamSlug>,
}

/// The desired attributes of a team being created or updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSpec {
    pub name: String,
    pub description: String,
    pub privacy: TeamPrivacy,
    pub parent_team_id: Option<TeamId>,
}

/// A repository a team has been granted access to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRepository {
    pub name: RepositoryName,
    pub permission: Permission,
}

/// The parts of a pull request the review workflows need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: PullRequestNumber,
    /// Target branch.
    pub base_ref: String,
    pub head_sha: CommitSha,
    pub author: Username,
}

/// A submitted review, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub reviewer: Username,
    pub state: ReviewState,
}

/// A commit status to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatus {
    pub state: CommitState,
    pub context: String,
    pub description: String,
}

/// An organization repository as listed by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositorySummary {
    pub name: RepositoryName,
    pub full_name: RepositoryId,
    pub archived: bool,
    pub private: bool,
    pub updated_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Team administration inside one organization.
#[async_trait]
pub trait TeamAdmin: Send + Sync {
    /// Looks a team up by slug. A missing team is [`GitHubError::NotFound`].
    async fn get_team(&self, team: &TeamSlug) -> Result<Team, GitHubError>;

    /// Direct and child-team members of `team`.
    async fn list_members(&self, team: &TeamSlug) -> Result<Vec<Username>, GitHubError>;

    /// Adds `user` with the `member` role. Idempotent on the GitHub side.
    async fn add_member(&self, team: &TeamSlug, user: &Username) -> Result<(), GitHubError>;

    async fn remove_member(&self, team: &TeamSlug, user: &Username) -> Result<(), GitHubError>;

    async fn list_repositories(&self, team: &TeamSlug)
        -> Result<Vec<TeamRepository>, GitHubError>;

    /// Grants `permission` on `repository`, adding it to the team when absent.
    async fn set_repository_permission(
        &self,
        team: &TeamSlug,
        repository: &RepositoryName,
        permission: &Permission,
    ) -> Result<(), GitHubError>;

    async fn remove_repository(
        &self,
        team: &TeamSlug,
        repository: &RepositoryName,
    ) -> Result<(), GitHubError>;

    /// Teams whose parent is `team` (one level only).
    async fn list_child_teams(&self, team: &TeamSlug) -> Result<Vec<Team>, GitHubError>;

    async fn create_team(&self, spec: &TeamSpec) -> Result<Team, GitHubError>;

    async fn update_team(&self, team: &TeamSlug, spec: &TeamSpec) -> Result<Team, GitHubError>;

    async fn delete_team(&self, team: &TeamSlug) -> Result<(), GitHubError>;
}

/// Pull request operations inside one repository.
#[async_trait]
pub trait PullRequestManager: Send + Sync {
    async fn get_pull_request(&self, number: PullRequestNumber)
        -> Result<PullRequest, GitHubError>;

    /// All submitted reviews, oldest first.
    async fn list_reviews(&self, number: PullRequestNumber) -> Result<Vec<Review>, GitHubError>;

    async fn request_team_reviewers(
        &self,
        number: PullRequestNumber,
        teams: &[TeamSlug],
    ) -> Result<(), GitHubError>;

    /// Adds up to ten assignees in one call.
    async fn add_assignees(
        &self,
        number: PullRequestNumber,
        users: &[Username],
    ) -> Result<(), GitHubError>;

    async fn close_pull_request(&self, number: PullRequestNumber) -> Result<(), GitHubError>;

    async fn create_commit_status(
        &self,
        sha: &CommitSha,
        status: &CommitStatus,
    ) -> Result<(), GitHubError>;
}

/// Commit-level queries inside one repository.
#[async_trait]
pub trait CodeRepository: Send + Sync {
    /// Paths of files changed between `base` and `head`.
    async fn changed_files(
        &self,
        base: &CommitSha,
        head: &CommitSha,
    ) -> Result<Vec<String>, GitHubError>;
}

/// Read-only repository inspection across one organization.
#[async_trait]
pub trait RepositoryInspector: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<RepositorySummary>, GitHubError>;

    /// Entry names in `path` (`""` for the root). A missing directory is
    /// [`GitHubError::NotFound`].
    async fn list_directory(
        &self,
        repository: &RepositoryName,
        path: &str,
    ) -> Result<Vec<String>, GitHubError>;

    async fn advanced_security_enabled(
        &self,
        repository: &RepositoryName,
    ) -> Result<bool, GitHubError>;

    async fn vulnerability_alerts_enabled(
        &self,
        repository: &RepositoryName,
    ) -> Result<bool, GitHubError>;

    /// Lowercase severity of every open Dependabot alert.
    async fn list_dependabot_alert_severities(
        &self,
        repository: &RepositoryName,
    ) -> Result<Vec<String>, GitHubError>;
}
