//! Organization governance domain.
//!
//! This crate holds every domain concept used by the governance commands:
//! identifiers, configuration documents, reconciliation planning, review
//! policy evaluation, and health scoring. Infrastructure crates implement the
//! port traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Username`, `TeamSlug`, `RepositoryId`, etc.) |
//! | [`types`] | Shared value types (`Permission`, `ReviewState`, `TrafficLight`, `Timestamp`) |
//! | [`errors`] | `GovernanceError` and `GitHubError` |
//! | [`ports`] | Capability traits over the GitHub API |
//! | [`teams`] | Team documents, the root team registry, issue parsing |
//! | [`reconcile`] | Set-difference plans and run reports |
//! | [`review`] | Branch policies and review evaluation |
//! | [`health`] | Health configuration and scoring |
//! | [`report`] | Markdown, CSV, and JSON health reports |

pub mod errors;
pub mod health;
pub mod identifiers;
pub mod ports;
pub mod reconcile;
pub mod report;
pub mod review;
pub mod teams;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{GitHubError, GovernanceError};
pub use health::{
    HealthConfig, HealthSummary, ReportFormat, RepositoryFacts, RepositoryHealth,
    HEALTH_CONFIG_FILE,
};
pub use identifiers::{
    CommitSha, OrganizationName, PullRequestNumber, RepositoryId, RepositoryName,
    RunId, TeamId, TeamSlug, Username,
};
pub use ports::{
    CodeRepository, CommitStatus, PullRequest, PullRequestManager, RepositoryInspector,
    RepositorySummary, Review, Team, TeamAdmin, TeamRepository, TeamSpec,
};
pub use reconcile::{plan_grants, plan_set, GrantPlan, SetPlan, SyncReport};
pub use review::{
    BranchPolicies, BranchPolicy, ReviewEvaluation, ASSIGNEE_BATCH_SIZE, REVIEW_STATUS_CONTEXT,
};
pub use teams::{
    RootTeamEntry, RootTeamsDocument, TeamConfig, TeamDocument, TEAMS_DIRECTORY, TEAM_FILE_NAME,
};
pub use types::{CommitState, Permission, ReviewState, TeamPrivacy, Timestamp, TrafficLight};
