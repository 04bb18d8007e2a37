//! Pull request review policy: `REVIEWERS.yml` and its evaluation.
//!
//! ## Branch resolution
//!
//! `pull_requests.branches` maps branch names or glob patterns to a
//! [`BranchPolicy`]. Resolution for a target branch:
//!
//! 1. An exact key match wins.
//! 2. Otherwise patterns containing `*` are tried in document order. A
//!    pattern is a whole-string glob in which `*` matches any sequence,
//!    including `/`. The first match whose `exclude` list does not name the
//!    branch is selected.
//! 3. Otherwise there is no policy.
//!
//! ## Evaluation
//!
//! Each reviewer's latest non-comment review counts. The requirement is met
//! when at least `required_approvals` distinct reviewers approve and every
//! `required_teams` entry has at least one approving member.

use std::collections::{BTreeMap, BTreeSet};

use globset::{Glob, GlobMatcher};
use serde::Deserialize;

use crate::{GovernanceError, Review, ReviewState, TeamSlug, Username};

/// Commit status context published by the review check.
pub const REVIEW_STATUS_CONTEXT: &str = "pr-review-requirements";

/// Longest commit status description GitHub accepts, in characters.
pub const STATUS_DESCRIPTION_LIMIT: usize = 140;

/// Maximum assignees GitHub accepts in one request.
pub const ASSIGNEE_BATCH_SIZE: usize = 10;

const TEAM_NAME_PLACEHOLDER: &str = "{{ team_name }}";

/// Replaces the `{{ team_name }}` placeholder in a team reference.
pub fn substitute_team_name(template: &str, team_name: &str) -> String {
    template.replace(TEAM_NAME_PLACEHOLDER, team_name)
}

/// Review requirements and routing for one branch or branch pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BranchPolicy {
    /// Teams asked to review.
    pub review_teams: Vec<String>,
    /// Teams whose members are assigned to the pull request.
    pub assignees: Vec<String>,
    pub required_approvals: usize,
    /// Teams that must each contribute at least one approval.
    pub required_teams: Vec<String>,
    /// Branches a glob pattern must not apply to.
    pub exclude: Vec<String>,
}

impl BranchPolicy {
    /// `review_teams` as slugs, with the team placeholder substituted.
    pub fn review_team_slugs(&self, team_name: &str) -> Vec<TeamSlug> {
        resolve_slugs(&self.review_teams, team_name)
    }

    pub fn assignee_team_slugs(&self, team_name: &str) -> Vec<TeamSlug> {
        resolve_slugs(&self.assignees, team_name)
    }

    pub fn required_team_slugs(&self, team_name: &str) -> Vec<TeamSlug> {
        resolve_slugs(&self.required_teams, team_name)
    }
}

fn resolve_slugs(teams: &[String], team_name: &str) -> Vec<TeamSlug> {
    let mut seen = BTreeSet::new();
    teams
        .iter()
        .filter_map(|t| TeamSlug::from_name(&substitute_team_name(t, team_name)))
        .filter(|slug| seen.insert(slug.clone()))
        .collect()
}

struct PatternEntry {
    pattern: String,
    matcher: Option<GlobMatcher>,
    policy: BranchPolicy,
}

/// The parsed `pull_requests.branches` mapping, in document order.
pub struct BranchPolicies {
    entries: Vec<PatternEntry>,
}

impl std::fmt::Debug for BranchPolicies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.pattern))
            .finish()
    }
}

#[derive(Deserialize)]
struct ReviewersDocument {
    pull_requests: PullRequestsSection,
}

#[derive(Deserialize)]
struct PullRequestsSection {
    branches: serde_yaml::Mapping,
}

impl BranchPolicies {
    /// Parses a `REVIEWERS.yml` document.
    pub fn from_yaml(document: &str, text: &str) -> Result<Self, GovernanceError> {
        let parsed: ReviewersDocument = serde_yaml::from_str(text)
            .map_err(|e| GovernanceError::invalid_document(document, e))?;

        let mut entries = Vec::with_capacity(parsed.pull_requests.branches.len());
        // serde_yaml::Mapping preserves document order.
        for (key, value) in parsed.pull_requests.branches {
            let pattern = key.as_str().map(str::to_string).ok_or_else(|| {
                GovernanceError::configuration(document, "branch keys must be strings")
            })?;
            let policy: BranchPolicy = if value.is_null() {
                BranchPolicy::default()
            } else {
                serde_yaml::from_value(value).map_err(|e| {
                    GovernanceError::configuration(document, format!("branch '{pattern}': {e}"))
                })?
            };
            let matcher = if pattern.contains('*') {
                let glob = Glob::new(&pattern).map_err(|e| {
                    GovernanceError::configuration(document, format!("pattern '{pattern}': {e}"))
                })?;
                Some(glob.compile_matcher())
            } else {
                None
            };
            entries.push(PatternEntry {
                pattern,
                matcher,
                policy,
            });
        }

        Ok(Self { entries })
    }

    /// Finds the policy for `branch`, returning the matched key with it.
    pub fn resolve(&self, branch: &str) -> Option<(&str, &BranchPolicy)> {
        if let Some(exact) = self.entries.iter().find(|e| e.pattern == branch) {
            return Some((&exact.pattern, &exact.policy));
        }

        self.entries.iter().find_map(|entry| {
            let matcher = entry.matcher.as_ref()?;
            if !matcher.is_match(branch) {
                return None;
            }
            if entry.policy.exclude.iter().any(|b| b == branch) {
                tracing::debug!(branch, pattern = %entry.pattern, "Branch excluded from pattern");
                return None;
            }
            Some((entry.pattern.as_str(), &entry.policy))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of checking a pull request against its [`BranchPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEvaluation {
    /// Reviewers whose latest review approves.
    pub approvers: BTreeSet<Username>,
    pub required_approvals: usize,
    /// Required teams with no approving member.
    pub missing_teams: Vec<TeamSlug>,
}

impl ReviewEvaluation {
    pub fn is_satisfied(&self) -> bool {
        self.approvers.len() >= self.required_approvals && self.missing_teams.is_empty()
    }

    /// One-line explanation suitable for a commit status description.
    pub fn describe(&self) -> String {
        if self.is_satisfied() {
            return "All review requirements met".to_string();
        }
        let mut parts = Vec::new();
        if self.approvers.len() < self.required_approvals {
            parts.push(format!(
                "{}/{} approvals",
                self.approvers.len(),
                self.required_approvals
            ));
        }
        if !self.missing_teams.is_empty() {
            let teams: Vec<&str> = self.missing_teams.iter().map(TeamSlug::as_str).collect();
            parts.push(format!("awaiting {}", teams.join(", ")));
        }
        format!("Required reviews not yet met: {}", parts.join("; "))
    }

    /// [`describe`](Self::describe) cut to [`STATUS_DESCRIPTION_LIMIT`]
    /// characters, ending in `…` when shortened.
    pub fn status_description(&self) -> String {
        let full = self.describe();
        if full.chars().count() <= STATUS_DESCRIPTION_LIMIT {
            return full;
        }
        let mut short: String = full.chars().take(STATUS_DESCRIPTION_LIMIT - 1).collect();
        short.push('…');
        short
    }
}

/// Reviewers whose most recent approving-or-blocking review is an approval.
///
/// Comments and pending reviews do not change a reviewer's standing; a
/// dismissal or a change request after an approval withdraws it.
pub fn current_approvers(reviews: &[Review]) -> BTreeSet<Username> {
    let mut latest: BTreeMap<&Username, &ReviewState> = BTreeMap::new();
    for review in reviews {
        match review.state {
            ReviewState::Commented | ReviewState::Pending => {}
            _ => {
                latest.insert(&review.reviewer, &review.state);
            }
        }
    }
    latest
        .into_iter()
        .filter(|(_, state)| **state == ReviewState::Approved)
        .map(|(user, _)| user.clone())
        .collect()
}

/// Evaluates reviews against a policy.
///
/// `required_team_members` maps each required team slug to its members. A
/// team absent from the map, or with no approving member, is reported in
/// [`ReviewEvaluation::missing_teams`].
pub fn evaluate_reviews(
    reviews: &[Review],
    required_approvals: usize,
    required_teams: &[TeamSlug],
    required_team_members: &BTreeMap<TeamSlug, BTreeSet<Username>>,
) -> ReviewEvaluation {
    let approvers = current_approvers(reviews);
    let missing_teams = required_teams
        .iter()
        .filter(|team| {
            required_team_members
                .get(*team)
                .map_or(true, |members| members.is_disjoint(&approvers))
        })
        .cloned()
        .collect();

    ReviewEvaluation {
        approvers,
        required_approvals,
        missing_teams,
    }
}

/// Assignees drawn from team members, without the pull request author,
/// split into API-sized batches.
pub fn assignee_batches(
    members: impl IntoIterator<Item = Username>,
    author: &Username,
) -> Vec<Vec<Username>> {
    let unique: BTreeSet<Username> = members.into_iter().filter(|m| m != author).collect();
    let unique: Vec<Username> = unique.into_iter().collect();
    unique
        .chunks(ASSIGNEE_BATCH_SIZE)
        .map(<[Username]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const REVIEWERS: &str = r#"
pull_requests:
  branches:
    main:
      review_teams: ["{{ team_name }}-reviewers"]
      required_approvals: 2
      required_teams: ["{{ team_name }}-leads"]
    "release/*":
      required_approvals: 1
      exclude: ["release/freeze"]
    "*":
      required_approvals: 0
"#;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn slug(name: &str) -> TeamSlug {
        TeamSlug::new(name).unwrap()
    }

    fn review(name: &str, state: &str) -> Review {
        Review {
            reviewer: user(name),
            state: ReviewState::from_api(state),
        }
    }

    #[test]
    fn resolves_exact_then_pattern_then_exclusion() {
        let doc = "pull_requests:\n  branches:\n    main:\n      required_approvals: 2\n    \
                   \"release/*\":\n      required_approvals: 1\n      exclude: [\"release/freeze\"]\n";
        let policies = BranchPolicies::from_yaml("REVIEWERS.yml", doc).unwrap();

        let (key, main) = policies.resolve("main").unwrap();
        assert_eq!(key, "main");
        assert_eq!(main.required_approvals, 2);

        let (key, release) = policies.resolve("release/1.0").unwrap();
        assert_eq!(key, "release/*");
        assert_eq!(release.required_approvals, 1);

        assert!(policies.resolve("release/freeze").is_none());
        assert!(policies.resolve("develop").is_none());
    }

    #[test]
    fn excluded_branch_falls_through_to_next_pattern() {
        let policies = BranchPolicies::from_yaml("r", REVIEWERS).unwrap();
        let (key, _) = policies.resolve("release/freeze").unwrap();
        assert_eq!(key, "*");
    }

    #[test]
    fn first_matching_pattern_in_document_order_wins() {
        let policies = BranchPolicies::from_yaml("r", REVIEWERS).unwrap();
        assert_eq!(policies.len(), 3);
        assert_eq!(policies.resolve("release/2.0").unwrap().0, "release/*");
        assert_eq!(policies.resolve("feature/x").unwrap().0, "*");
    }

    #[rstest]
    #[case("release/*", "release/1.0", true)]
    #[case("release/*", "release/1.0/hotfix", true)]
    #[case("release/*", "prerelease/1.0", false)]
    #[case("release/*", "release", false)]
    #[case("feature-*", "feature-login", true)]
    fn patterns_match_whole_branch(
        #[case] pattern: &str,
        #[case] branch: &str,
        #[case] matches: bool,
    ) {
        let doc = format!("pull_requests:\n  branches:\n    \"{pattern}\": {{}}\n");
        let policies = BranchPolicies::from_yaml("r", &doc).unwrap();
        assert_eq!(policies.resolve(branch).is_some(), matches);
    }

    #[test]
    fn missing_branches_key_is_invalid() {
        let err = BranchPolicies::from_yaml("REVIEWERS.yml", "pull_requests: {}\n").unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidDocument { .. }));
    }

    #[test]
    fn placeholders_resolve_to_slugs() {
        let policies = BranchPolicies::from_yaml("r", REVIEWERS).unwrap();
        let (_, main) = policies.resolve("main").unwrap();
        assert_eq!(main.review_team_slugs("team-a"), vec![slug("team-a-reviewers")]);
        assert_eq!(main.required_team_slugs("team-a"), vec![slug("team-a-leads")]);
    }

    #[test]
    fn latest_review_per_reviewer_counts() {
        let reviews = vec![
            review("alice", "APPROVED"),
            review("bob", "APPROVED"),
            review("bob", "CHANGES_REQUESTED"),
            review("carol", "CHANGES_REQUESTED"),
            review("carol", "APPROVED"),
            review("carol", "COMMENTED"),
        ];
        let approvers = current_approvers(&reviews);
        assert_eq!(approvers, BTreeSet::from([user("alice"), user("carol")]));
    }

    #[test]
    fn requires_count_and_every_team() {
        let reviews = vec![review("alice", "APPROVED"), review("bob", "APPROVED")];
        let members = BTreeMap::from([
            (slug("leads"), BTreeSet::from([user("alice")])),
            (slug("security"), BTreeSet::from([user("dave")])),
        ]);

        let only_leads = evaluate_reviews(&reviews, 2, &[slug("leads")], &members);
        assert!(only_leads.is_satisfied());

        let both = evaluate_reviews(&reviews, 2, &[slug("leads"), slug("security")], &members);
        assert!(!both.is_satisfied());
        assert_eq!(both.missing_teams, vec![slug("security")]);
        assert!(both.describe().contains("awaiting security"));

        let too_few = evaluate_reviews(&reviews, 3, &[], &members);
        assert!(!too_few.is_satisfied());
        assert!(too_few.describe().contains("2/3 approvals"));
    }

    #[test]
    fn status_description_fits_the_status_limit() {
        let teams: Vec<TeamSlug> = ["ä", "b", "c", "d"]
            .iter()
            .map(|c| slug(&format!("platform-{}-security-reviewers-{c}", "ü".repeat(8))))
            .collect();
        let eval = evaluate_reviews(&[], 1, &teams, &BTreeMap::new());
        assert!(eval.describe().chars().count() > STATUS_DESCRIPTION_LIMIT);

        let short = eval.status_description();

        assert_eq!(short.chars().count(), STATUS_DESCRIPTION_LIMIT);
        assert!(short.ends_with('…'));
        assert!(eval.describe().starts_with(short.trim_end_matches('…')));
    }

    #[test]
    fn short_status_description_is_unchanged() {
        let eval = evaluate_reviews(&[], 0, &[], &BTreeMap::new());
        assert_eq!(eval.status_description(), eval.describe());
    }

    #[test]
    fn unknown_team_members_leave_team_unsatisfied() {
        let reviews = vec![review("alice", "APPROVED")];
        let eval = evaluate_reviews(&reviews, 0, &[slug("ghosts")], &BTreeMap::new());
        assert_eq!(eval.missing_teams, vec![slug("ghosts")]);
    }

    #[test]
    fn assignees_exclude_author_and_batch_by_ten() {
        let members = (0..23).map(|i| user(&format!("user{i:02}")));
        let batches = assignee_batches(members, &user("user05"));
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![10, 10, 2]
        );
        assert!(batches.iter().flatten().all(|u| u.as_str() != "user05"));
    }
}
