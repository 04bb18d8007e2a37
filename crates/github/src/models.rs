//! Wire types for the GitHub REST endpoints this adapter calls. Only the
//! fields the adapter reads are declared.

use governance::{
    Permission, PullRequest, Review, ReviewState, Team, TeamId, TeamRepository, TeamSlug,
    Timestamp, Username,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct Account {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParentTeam {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamBody {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent: Option<ParentTeam>,
}

impl TeamBody {
    pub fn into_team(self) -> Option<Team> {
        Some(Team {
            id: TeamId::new(self.id),
            slug: TeamSlug::new(self.slug)?,
            name: self.name,
            description: self.description.filter(|d| !d.is_empty()),
            parent: self.parent.and_then(|p| TeamSlug::new(p.slug)),
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TeamRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub privacy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_team_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PermissionFlags {
    pub admin: bool,
    pub maintain: bool,
    pub push: bool,
    pub triage: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamRepositoryBody {
    pub name: String,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub permissions: PermissionFlags,
}

impl TeamRepositoryBody {
    /// The team's effective level: `role_name` when reported (custom roles
    /// appear only there), otherwise the highest permission flag.
    pub fn into_team_repository(self) -> Option<TeamRepository> {
        let permission = match self.role_name.as_deref() {
            Some(role) if !role.is_empty() => Permission::from_api(role),
            _ => {
                let p = &self.permissions;
                if p.admin {
                    Permission::Admin
                } else if p.maintain {
                    Permission::Maintain
                } else if p.push {
                    Permission::Push
                } else if p.triage {
                    Permission::Triage
                } else {
                    Permission::Pull
                }
            }
        };
        Some(TeamRepository {
            name: governance::RepositoryName::normalize(&self.name)?,
            permission,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestBody {
    pub number: u64,
    pub base: BranchRef,
    pub head: BranchRef,
    pub user: Account,
}

impl PullRequestBody {
    pub fn into_pull_request(self) -> Option<PullRequest> {
        Some(PullRequest {
            number: governance::PullRequestNumber::new(self.number),
            base_ref: self.base.name,
            head_sha: governance::CommitSha::new(self.head.sha)?,
            author: Username::normalize(&self.user.login)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewBody {
    /// `null` for deleted accounts.
    #[serde(default)]
    pub user: Option<Account>,
    pub state: String,
}

impl ReviewBody {
    pub fn into_review(self) -> Option<Review> {
        Some(Review {
            reviewer: Username::normalize(&self.user?.login)?,
            state: ReviewState::from_api(&self.state),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareFile {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareBody {
    #[serde(default)]
    pub files: Vec<CompareFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryBody {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl RepositoryBody {
    pub fn into_summary(self) -> Option<governance::RepositorySummary> {
        Some(governance::RepositorySummary {
            name: governance::RepositoryName::normalize(&self.name)?,
            full_name: governance::RepositoryId::parse(&self.full_name)?,
            archived: self.archived,
            private: self.private,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentEntry {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FeatureStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SecurityAndAnalysis {
    #[serde(default)]
    pub advanced_security: Option<FeatureStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryDetails {
    #[serde(default)]
    pub security_and_analysis: Option<SecurityAndAnalysis>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Severity {
    #[serde(default)]
    pub severity: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DependabotAlert {
    #[serde(default)]
    pub security_advisory: Option<Severity>,
    #[serde(default)]
    pub security_vulnerability: Option<Severity>,
}

impl DependabotAlert {
    pub fn severity(self) -> Option<String> {
        self.security_vulnerability
            .or(self.security_advisory)
            .map(|s| s.severity.to_ascii_lowercase())
            .filter(|s| !s.is_empty())
    }
}
