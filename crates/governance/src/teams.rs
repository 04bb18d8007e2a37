//! Team configuration documents.
//!
//! Two YAML documents describe the desired team layout:
//!
//! | Document | Location | Type |
//! |----------|----------|------|
//! | Root registry | `teams.yml` | [`RootTeamsDocument`] |
//! | Per-team config | `teams/<team>/teams.yml` | [`TeamDocument`] |
//!
//! The root registry lists every team and the sub-team templates each team
//! gets by default. [`RootTeamEntry::scaffold`] turns one registry entry into
//! the initial per-team document, which humans then edit through pull
//! requests. The reconcilers only ever read per-team documents.
//!
//! Lists that are `null` in YAML deserialize as empty. For `members` and
//! `repositories` an empty list is meaningful: it removes every member or
//! revokes every repository.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{GovernanceError, Permission, RepositoryName, TeamSlug, Username};

/// File name of both the root registry and every per-team document.
pub const TEAM_FILE_NAME: &str = "teams.yml";

/// Directory (relative to the repository root) holding one sub-directory per team.
pub const TEAMS_DIRECTORY: &str = "teams";

const DEFAULT_PERMISSION: &str = "read";

fn default_permission_name() -> String {
    DEFAULT_PERMISSION.to_string()
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Replaces the `[team_name]` and `[project]` placeholders used in sub-team
/// names and descriptions.
pub fn substitute_team_placeholders(template: &str, team_name: &str, project: &str) -> String {
    template
        .replace("[team_name]", team_name)
        .replace("[project]", project)
}

// ---------------------------------------------------------------------------
// Per-team document
// ---------------------------------------------------------------------------

/// A per-team configuration file. The payload lives under the `teams` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDocument {
    pub teams: TeamConfig,
}

impl TeamDocument {
    /// Parses and validates a per-team document.
    ///
    /// `document` labels the source in error messages (usually the file path).
    pub fn from_yaml(document: &str, text: &str) -> Result<Self, GovernanceError> {
        let parsed: Self = serde_yaml::from_str(text)
            .map_err(|e| GovernanceError::invalid_document(document, e))?;
        parsed.teams.validate(document)?;
        Ok(parsed)
    }

    pub fn to_yaml(&self) -> Result<String, GovernanceError> {
        serde_yaml::to_string(self)
            .map_err(|e| GovernanceError::invalid_document(&self.teams.team_name, e))
    }
}

/// Desired state of one parent team and its sub-teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub team_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub project: String,

    /// Permission applied to `repositories` entries that do not carry their own.
    #[serde(default = "default_permission_name", alias = "repository_permission")]
    pub repository_permissions: String,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub members: Vec<String>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub repositories: Vec<RepositoryEntry>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub default_sub_teams: Vec<SubTeamConfig>,
}

/// A repository grant: either a bare name (team default permission applies)
/// or a name with an explicit permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryEntry {
    Name(String),
    Grant {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        permission: Option<String>,
    },
}

impl RepositoryEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Grant { name, .. } => name,
        }
    }

    fn permission(&self) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::Grant { permission, .. } => permission.as_deref(),
        }
    }
}

/// One sub-team entry of a per-team document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTeamConfig {
    /// Display name; may contain `[team_name]` / `[project]` placeholders.
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub members: Vec<String>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub repositories: Vec<RepositoryEntry>,

    #[serde(default = "default_permission_name")]
    pub repository_permissions: String,
}

/// A sub-team with placeholders substituted and its desired state normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubTeam {
    pub name: String,
    pub slug: TeamSlug,
    pub description: String,
    pub members: BTreeSet<Username>,
    pub repositories: BTreeMap<RepositoryName, Permission>,
}

impl TeamConfig {
    fn validate(&self, document: &str) -> Result<(), GovernanceError> {
        if self.slug().is_none() {
            return Err(GovernanceError::configuration(
                document,
                "teams.team_name must contain at least one letter or digit",
            ));
        }
        for sub_team in &self.default_sub_teams {
            if sub_team.name.trim().is_empty() {
                return Err(GovernanceError::configuration(
                    document,
                    format!("a sub-team of '{}' has an empty name", self.team_name),
                ));
            }
        }
        Ok(())
    }

    /// Slug of the parent team.
    pub fn slug(&self) -> Option<TeamSlug> {
        TeamSlug::from_name(&self.team_name)
    }

    /// Normalised desired members of the parent team.
    pub fn desired_members(&self) -> BTreeSet<Username> {
        normalize_members(&self.members)
    }

    /// Desired repository grants of the parent team.
    pub fn desired_repositories(&self) -> BTreeMap<RepositoryName, Permission> {
        normalize_repositories(&self.repositories, &self.repository_permissions)
    }

    /// Sub-teams with placeholders substituted. Entries whose name yields no
    /// valid slug are dropped with a warning.
    pub fn resolved_sub_teams(&self) -> Vec<ResolvedSubTeam> {
        self.default_sub_teams
            .iter()
            .filter_map(|sub_team| {
                let name =
                    substitute_team_placeholders(&sub_team.name, &self.team_name, &self.project);
                let Some(slug) = TeamSlug::from_name(&name) else {
                    tracing::warn!(sub_team = %name, "Sub-team name has no valid slug; ignoring it");
                    return None;
                };
                Some(ResolvedSubTeam {
                    slug,
                    description: substitute_team_placeholders(
                        &sub_team.description,
                        &self.team_name,
                        &self.project,
                    ),
                    members: normalize_members(&sub_team.members),
                    repositories: normalize_repositories(
                        &sub_team.repositories,
                        &sub_team.repository_permissions,
                    ),
                    name,
                })
            })
            .collect()
    }
}

fn normalize_members(raw: &[String]) -> BTreeSet<Username> {
    raw.iter().filter_map(|m| Username::normalize(m)).collect()
}

fn normalize_repositories(
    entries: &[RepositoryEntry],
    default_permission: &str,
) -> BTreeMap<RepositoryName, Permission> {
    entries
        .iter()
        .filter_map(|entry| {
            let name = RepositoryName::normalize(entry.name())?;
            let permission = Permission::normalize(entry.permission().unwrap_or(default_permission));
            Some((name, permission))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Root registry
// ---------------------------------------------------------------------------

/// The root `teams.yml` listing every managed team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootTeamsDocument {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub default_sub_teams: Vec<SubTeamTemplate>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub teams: Vec<RootTeamEntry>,
}

/// A sub-team every registered team receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTeamTemplate {
    /// e.g. `"[team_name]-reviewers"`.
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_permission_name")]
    pub repository_permissions: String,
}

/// One registered team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootTeamEntry {
    pub team_name: String,

    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub members: Vec<String>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub default_repositories: Vec<String>,

    #[serde(default = "default_permission_name")]
    pub repository_permissions: String,
}

impl RootTeamsDocument {
    pub fn from_yaml(document: &str, text: &str) -> Result<Self, GovernanceError> {
        // An empty file is an empty registry, not an error.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed: Self = serde_yaml::from_str(text)
            .map_err(|e| GovernanceError::invalid_document(document, e))?;
        for entry in &parsed.teams {
            if TeamSlug::from_name(&entry.team_name).is_none() {
                return Err(GovernanceError::configuration(
                    document,
                    format!("team_name '{}' has no valid slug", entry.team_name),
                ));
            }
        }
        Ok(parsed)
    }

    pub fn to_yaml(&self) -> Result<String, GovernanceError> {
        serde_yaml::to_string(self).map_err(|e| GovernanceError::invalid_document(TEAM_FILE_NAME, e))
    }

    /// Names of every registered team.
    pub fn team_names(&self) -> BTreeSet<&str> {
        self.teams.iter().map(|t| t.team_name.as_str()).collect()
    }

    /// Appends `entry` unless a team with the same name is already
    /// registered. Registration never updates an existing entry.
    ///
    /// Returns `true` if the entry was added.
    pub fn register(&mut self, entry: RootTeamEntry) -> bool {
        if self.teams.iter().any(|t| t.team_name == entry.team_name) {
            return false;
        }
        self.teams.push(entry);
        true
    }
}

impl RootTeamEntry {
    /// Builds the initial per-team document for this entry.
    ///
    /// Every template becomes a sub-team with placeholders substituted, no
    /// members, and the team's default repositories at the template's
    /// permission.
    pub fn scaffold(&self, templates: &[SubTeamTemplate]) -> TeamDocument {
        let repositories: Vec<RepositoryEntry> = self
            .default_repositories
            .iter()
            .cloned()
            .map(RepositoryEntry::Name)
            .collect();

        let default_sub_teams = templates
            .iter()
            .map(|template| SubTeamConfig {
                name: substitute_team_placeholders(&template.name, &self.team_name, &self.project),
                description: substitute_team_placeholders(
                    &template.description,
                    &self.team_name,
                    &self.project,
                ),
                members: Vec::new(),
                repositories: repositories.clone(),
                repository_permissions: template.repository_permissions.clone(),
            })
            .collect();

        TeamDocument {
            teams: TeamConfig {
                team_name: self.team_name.clone(),
                description: self.description.clone(),
                project: self.project.clone(),
                repository_permissions: self.repository_permissions.clone(),
                members: self.members.clone(),
                repositories,
                default_sub_teams,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Issue-driven registration
// ---------------------------------------------------------------------------

/// Parses a team request issue body into a registry entry.
///
/// Expected lines (anywhere in the body, first occurrence wins):
///
/// ```text
/// Team Name: Team-X
/// Project: ProjectName
/// Description: Team description
/// Members: @user1, @user2
/// Repositories: repo-a, repo-b
/// Repository Permissions: read
/// ```
///
/// `Team Name`, `Project` and `Description` are required. Lists accept commas
/// and/or whitespace as separators. Permissions default to `read`.
pub fn parse_issue_body(body: &str) -> Result<RootTeamEntry, GovernanceError> {
    const DOCUMENT: &str = "issue body";

    let required = |label: &str| {
        field(body, label).ok_or_else(|| {
            GovernanceError::configuration(DOCUMENT, format!("missing '{label}:' line"))
        })
    };

    Ok(RootTeamEntry {
        team_name: required("Team Name")?,
        project: required("Project")?,
        description: required("Description")?,
        members: field(body, "Members").map(|v| split_list(&v)).unwrap_or_default(),
        default_repositories: field(body, "Repositories")
            .map(|v| split_list(&v))
            .unwrap_or_default(),
        repository_permissions: field(body, "Repository Permissions")
            .unwrap_or_else(default_permission_name),
    })
}

fn field(body: &str, label: &str) -> Option<String> {
    let marker = format!("{label}:");
    body.lines().find_map(|line| {
        let (_, rest) = line.split_once(marker.as_str())?;
        let value = rest.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
