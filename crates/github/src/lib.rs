//! GitHub infrastructure adapter.
//!
//! Implements the port traits defined in the [`governance`] crate
//! (`TeamAdmin`, `PullRequestManager`, `CodeRepository`,
//! `RepositoryInspector`) over the GitHub REST API using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (authentication headers, pagination, status code
//! classification) are handled here; the [`governance`] crate never sees them.
//!
//! ## Clients
//!
//! | Type | Scope | Traits |
//! |------|-------|--------|
//! | [`GitHubClient`] | one organization | `TeamAdmin`, `RepositoryInspector` |
//! | [`RepositoryClient`] | one repository | `PullRequestManager`, `CodeRepository` |

mod client;
mod models;
mod pulls;
mod repos;
mod teams;

pub use client::{GitHubClient, RepositoryClient, DEFAULT_API_URL};
