//! Governance workflows.
//!
//! This crate sequences calls between the pure planning in [`governance`] and
//! the port traits that reach GitHub. It contains no domain rules of its own:
//! plans come from [`governance::reconcile`], policies from
//! [`governance::review`], scores from [`governance::health`].
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Every function takes its collaborators as trait
//! objects, so the same code runs against the HTTP adapter in production and
//! an in-memory fake in tests.
//!
//! ## Failure model
//!
//! A failure to read actual state (listing a team's members, say) aborts that
//! one reconciliation and is returned to the caller. A failure of a single
//! corrective call is logged at `warn`, counted in the returned
//! [`SyncReport`](governance::SyncReport), and the run carries on. Nothing
//! is retried.

pub mod health_scan;
pub mod membership;
pub mod repositories;
pub mod reviews;
pub mod subteams;
pub mod teams;

pub use health_scan::{check_repository, scan_repositories};
pub use membership::sync_members;
pub use repositories::sync_repositories;
pub use reviews::{
    assign_reviewers, block_pull_request, evaluate_pull_request, publish_review_status,
};
pub use subteams::sync_subteams;
pub use teams::{
    ensure_team, remove_team, setup_team, sync_team_members, sync_team_repositories,
    sync_team_subteams, TeamChange,
};
