//! CI context: the workflow event and the environment variables GitHub
//! Actions sets around it.

use std::path::Path;

use anyhow::{Context, Result};
use governance::{CommitSha, GovernanceError, OrganizationName, PullRequestNumber, RepositoryId};
use serde_json::Value;

use crate::cli::GitHubArgs;

/// `GITHUB_API_EVENT` value marking a push made through the API by this
/// tool's own workflows; such pushes are not filtered by changed files.
const API_PUSH_EVENT: &str = "api-push";

fn missing(name: &str) -> GovernanceError {
    GovernanceError::MissingContext {
        name: name.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct CiContext {
    pub event_name: Option<String>,
    pub api_event: Option<String>,
    pub before: Option<String>,
    pub sha: Option<String>,
    pub base_ref: Option<String>,
    /// The parsed `GITHUB_EVENT_PATH` payload.
    pub event: Option<Value>,
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl CiContext {
    pub fn from_env() -> Result<Self> {
        let event = match env("GITHUB_EVENT_PATH") {
            Some(path) => Some(read_event(Path::new(&path))?),
            None => None,
        };
        Ok(Self {
            event_name: env("GITHUB_EVENT_NAME"),
            api_event: env("GITHUB_API_EVENT"),
            before: env("GITHUB_EVENT_BEFORE"),
            sha: env("GITHUB_SHA"),
            base_ref: env("GITHUB_BASE_REF"),
            event,
        })
    }

    fn event_str(&self, pointer: &str) -> Option<&str> {
        self.event.as_ref()?.pointer(pointer)?.as_str()
    }

    /// Whether team files should be narrowed to those the push changed.
    pub fn is_filtered_push(&self) -> bool {
        self.event_name.as_deref() == Some("push")
            && self.api_event.as_deref() != Some(API_PUSH_EVENT)
    }

    /// The commit range of a push: `GITHUB_EVENT_BEFORE`..`GITHUB_SHA`,
    /// falling back to the event's `before` and `after`.
    pub fn push_range(&self) -> Option<(CommitSha, CommitSha)> {
        let before = self
            .before
            .as_deref()
            .or_else(|| self.event_str("/before"))?;
        let after = self.sha.as_deref().or_else(|| self.event_str("/after"))?;
        Some((CommitSha::new(before)?, CommitSha::new(after)?))
    }

    pub fn pull_request_number(&self, explicit: Option<u64>) -> Result<PullRequestNumber, GovernanceError> {
        explicit
            .or_else(|| {
                let event = self.event.as_ref()?;
                event
                    .pointer("/pull_request/number")
                    .or_else(|| event.get("number"))?
                    .as_u64()
            })
            .map(PullRequestNumber::new)
            .ok_or_else(|| missing("PR_NUMBER"))
    }

    /// Target branch: explicit value, then `GITHUB_BASE_REF`, then the
    /// event's pull request.
    pub fn target_branch(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .or(self.base_ref.as_deref())
            .or_else(|| self.event_str("/pull_request/base/ref"))
            .map(str::to_string)
    }

    /// Body of the issue that triggered a registration.
    pub fn issue_body(&self, payload: Option<&str>) -> Result<String> {
        if let Some(payload) = payload {
            let value: Value =
                serde_json::from_str(payload).context("ISSUE_PAYLOAD is not valid JSON")?;
            return value
                .pointer("/issue/body")
                .or_else(|| value.get("body"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| missing("ISSUE_PAYLOAD.body").into());
        }
        self.event_str("/issue/body")
            .map(str::to_string)
            .ok_or_else(|| missing("issue body").into())
    }
}

fn read_event(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse event file {}", path.display()))
}

impl GitHubArgs {
    pub fn token(&self) -> Result<&str, GovernanceError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("GITHUB_TOKEN"))
    }

    pub fn repository(&self) -> Result<RepositoryId, GovernanceError> {
        self.repository
            .as_deref()
            .and_then(RepositoryId::parse)
            .ok_or_else(|| missing("GITHUB_REPOSITORY"))
    }

    /// The organization: `explicit` (a command's own `--org`), else
    /// `GITHUB_ORGANIZATION`, else the owner of the workflow repository.
    pub fn organization(&self, explicit: Option<&str>) -> Result<OrganizationName, GovernanceError> {
        explicit
            .or(self.organization.as_deref())
            .and_then(|o| OrganizationName::new(o.trim()))
            .or_else(|| {
                self.repository()
                    .ok()
                    .and_then(|r| OrganizationName::new(r.owner()))
            })
            .ok_or_else(|| missing("GITHUB_ORGANIZATION"))
    }
}
