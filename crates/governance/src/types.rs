//! Shared value types for the governance domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (permission levels normalise to API
//! names, scores stay within `[0, 100]`) and participate in domain decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Repository permissions
// ---------------------------------------------------------------------------

/// A team's access level on a repository, expressed with GitHub API names.
///
/// Configuration documents use the UI vocabulary (`read`, `write`), the API
/// uses `pull` and `push`. [`Permission::normalize`] bridges the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Permission {
    /// Read access (`read` in configuration).
    #[default]
    Pull,
    /// Triage access.
    Triage,
    /// Write access (`write` in configuration).
    Push,
    /// Maintain access.
    Maintain,
    /// Admin access.
    Admin,
    /// A value outside the mapping table, typically a custom organization
    /// role. Carried verbatim.
    Custom(String),
}

impl Permission {
    /// Maps a configured permission name to its API value.
    ///
    /// Matching is case-insensitive: `read → pull`, `write → push`, and
    /// `admin`, `maintain`, `triage` map to themselves. The API names `pull`
    /// and `push` are accepted as-is. Anything else passes through unchanged
    /// as [`Permission::Custom`] and logs a warning.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "read" | "pull" => Self::Pull,
            "write" | "push" => Self::Push,
            "admin" => Self::Admin,
            "maintain" => Self::Maintain,
            "triage" => Self::Triage,
            _ => {
                tracing::warn!(
                    permission = raw,
                    "Unrecognised repository permission; passing it through unchanged"
                );
                Self::Custom(raw.to_string())
            }
        }
    }

    /// Interprets a permission reported by the API (`role_name` or the name
    /// of the highest boolean flag). Never warns.
    pub fn from_api(value: &str) -> Self {
        match value {
            "pull" | "read" => Self::Pull,
            "push" | "write" => Self::Push,
            "admin" => Self::Admin,
            "maintain" => Self::Maintain,
            "triage" => Self::Triage,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The value sent to the GitHub API.
    pub fn as_api_str(&self) -> &str {
        match self {
            Self::Pull => "pull",
            Self::Triage => "triage",
            Self::Push => "push",
            Self::Maintain => "maintain",
            Self::Admin => "admin",
            Self::Custom(value) => value,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api_str())
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// Team visibility inside the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamPrivacy {
    /// Visible to every organization member. Required for nested teams.
    #[default]
    Closed,
    /// Visible only to team members and organization owners.
    Secret,
}

impl TeamPrivacy {
    /// The value sent to the GitHub API.
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Secret => "secret",
        }
    }
}

// ---------------------------------------------------------------------------
// Pull request reviews and statuses
// ---------------------------------------------------------------------------

/// The state of a single submitted review.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    /// A state string this crate does not know about.
    Other(String),
}

impl ReviewState {
    /// Parses the `state` field of a review returned by the API.
    pub fn from_api(value: &str) -> Self {
        match value {
            "APPROVED" => Self::Approved,
            "CHANGES_REQUESTED" => Self::ChangesRequested,
            "COMMENTED" => Self::Commented,
            "DISMISSED" => Self::Dismissed,
            "PENDING" => Self::Pending,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The state of a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
    Error,
}

impl CommitState {
    /// The value sent to the GitHub API.
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Health scores
// ---------------------------------------------------------------------------

/// Three-level classification of a health score against two thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficLight {
    Green,
    Amber,
    Red,
}

impl TrafficLight {
    /// Buckets `score`: at or above `green` is [`Green`](Self::Green), at or
    /// above `amber` is [`Amber`](Self::Amber), anything lower is
    /// [`Red`](Self::Red).
    pub fn classify(score: f64, green: f64, amber: f64) -> Self {
        if score >= green {
            Self::Green
        } else if score >= amber {
            Self::Amber
        } else {
            Self::Red
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Amber => "AMBER",
            Self::Red => "RED",
        }
    }
}

impl std::fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Compact calendar date used in report file names (`YYYYMMDD`).
    pub fn date_stamp(self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("read", Permission::Pull)]
    #[case("write", Permission::Push)]
    #[case("WRITE", Permission::Push)]
    #[case("admin", Permission::Admin)]
    #[case("maintain", Permission::Maintain)]
    #[case("triage", Permission::Triage)]
    #[case("pull", Permission::Pull)]
    fn permission_mapping(#[case] raw: &str, #[case] expected: Permission) {
        assert_eq!(Permission::normalize(raw), expected);
    }

    #[test]
    fn write_always_maps_to_push() {
        assert_eq!(Permission::normalize("write").as_api_str(), "push");
    }

    #[test]
    fn unrecognised_permission_passes_through_verbatim() {
        let permission = Permission::normalize("Security-Reviewer");
        assert_eq!(permission, Permission::Custom("Security-Reviewer".into()));
        assert_eq!(permission.as_api_str(), "Security-Reviewer");
    }

    #[rstest]
    #[case(80.0, TrafficLight::Green)]
    #[case(79.9, TrafficLight::Amber)]
    #[case(60.0, TrafficLight::Amber)]
    #[case(32.0, TrafficLight::Red)]
    fn traffic_light_thresholds(#[case] score: f64, #[case] expected: TrafficLight) {
        assert_eq!(TrafficLight::classify(score, 80.0, 60.0), expected);
    }
}
