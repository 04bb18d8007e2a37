//! Newtype domain identifiers.
//!
//! Every GitHub concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`TeamSlug`] with a [`RepositoryName`] even though both are strings under
//! the hood.
//!
//! Identifiers that GitHub compares case-insensitively ([`Username`],
//! [`RepositoryName`], [`TeamSlug`]) are normalised to lowercase on
//! construction so that set differences between configuration and API state
//! never disagree on case alone.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// String-backed identifiers: non-empty, compared and displayed verbatim.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// `None` for an empty value.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let value = value.into();
                (!value.is_empty()).then_some(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Numeric identifiers assigned by GitHub.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// The numeric id GitHub assigns to a team.
    ///
    /// Needed when creating a child team (`parent_team_id`).
    TeamId
}

u64_id! {
    /// The number of a pull request within its repository.
    PullRequestNumber
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single command invocation.
///
/// Generated fresh for every CLI run and attached to the root span so all log
/// events from one CI job can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// A GitHub organization login (e.g. `"acme"`).
    OrganizationName
}

string_id! {
    /// A Git commit SHA.
    CommitSha
}

string_id! {
    /// Identifies a GitHub repository in `"owner/repo"` format.
    RepositoryId
}

impl RepositoryId {
    /// Parses an `"owner/repo"` string, returning `None` unless both halves
    /// are non-empty.
    pub fn parse(value: &str) -> Option<Self> {
        let (owner, repo) = value.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self(value.to_string()))
    }

    /// The owner (organization or user) half.
    pub fn owner(&self) -> &str {
        self.0.split_once('/').map(|(o, _)| o).unwrap_or(&self.0)
    }

    /// The repository name half.
    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, r)| r).unwrap_or(&self.0)
    }
}

string_id! {
    /// A GitHub user login, normalised to lowercase.
    ///
    /// Construct through [`Username::normalize`] when the value comes from a
    /// human-edited document.
    Username
}

impl Username {
    /// Normalises a username as written in configuration: surrounding
    /// whitespace, a leading `@` and wrapping quotes are removed and the
    /// result is lowercased.
    ///
    /// Returns `None` when nothing is left.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .trim_start_matches('@')
            .trim_matches(|c| c == '\'' || c == '"')
            .trim();
        Self::new(trimmed.to_lowercase())
    }
}

string_id! {
    /// The name of a repository inside the organization, normalised to lowercase.
    RepositoryName
}

impl RepositoryName {
    /// Normalises a repository name as written in configuration.
    pub fn normalize(raw: &str) -> Option<Self> {
        Self::new(raw.trim().to_lowercase())
    }
}

string_id! {
    /// The URL slug of a team (e.g. `"platform-reviewers"`).
    TeamSlug
}

impl TeamSlug {
    /// Derives the slug GitHub assigns to a team with display name `name`.
    ///
    /// Letters and digits are lowercased, `_` is kept, and every other run of
    /// characters collapses into a single `-`. Leading and trailing dashes are
    /// dropped.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;
        for c in name.trim().chars() {
            if c.is_ascii_alphanumeric() || c == '_' {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        Self::new(slug)
    }
}
