//! Pull request review routing and requirement checks.

use std::collections::{BTreeMap, BTreeSet};

use governance::review::{assignee_batches, evaluate_reviews};
use governance::{
    BranchPolicy, CommitState, CommitStatus, GitHubError, PullRequest, PullRequestManager,
    PullRequestNumber, ReviewEvaluation, SyncReport, TeamAdmin, TeamSlug, Username,
    REVIEW_STATUS_CONTEXT,
};

async fn team_members(teams: &dyn TeamAdmin, team: &TeamSlug) -> Option<BTreeSet<Username>> {
    match teams.list_members(team).await {
        Ok(members) => Some(members.into_iter().collect()),
        Err(e) => {
            tracing::warn!(team = %team, error = %e, "Failed to list team members");
            None
        }
    }
}

/// Requests reviews from the policy's review teams and assigns the members
/// of its assignee teams, minus the author.
///
/// Missing teams or users are logged and skipped.
#[tracing::instrument(skip_all, fields(pr = %pr.number))]
pub async fn assign_reviewers(
    prs: &dyn PullRequestManager,
    teams: &dyn TeamAdmin,
    pr: &PullRequest,
    policy: &BranchPolicy,
    team_name: &str,
) -> Result<SyncReport, GitHubError> {
    let mut report = SyncReport::default();

    let reviewers = policy.review_team_slugs(team_name);
    if !reviewers.is_empty() {
        match prs.request_team_reviewers(pr.number, &reviewers).await {
            Ok(()) => {
                tracing::info!(teams = ?reviewers, "Requested team reviews");
                report.added += reviewers.len();
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(teams = ?reviewers, error = %e, "Review teams not found");
                report.failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let mut candidates = Vec::new();
    for team in policy.assignee_team_slugs(team_name) {
        if let Some(members) = team_members(teams, &team).await {
            candidates.extend(members);
        }
    }

    for batch in assignee_batches(candidates, &pr.author) {
        match prs.add_assignees(pr.number, &batch).await {
            Ok(()) => {
                tracing::info!(count = batch.len(), "Added assignees");
                report.added += batch.len();
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(error = %e, "Some assignees could not be added");
                report.failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

/// Checks the pull request's reviews against `policy`.
///
/// A required team whose members cannot be listed counts as unsatisfied.
#[tracing::instrument(skip_all, fields(pr = %pr.number))]
pub async fn evaluate_pull_request(
    prs: &dyn PullRequestManager,
    teams: &dyn TeamAdmin,
    pr: &PullRequest,
    policy: &BranchPolicy,
    team_name: &str,
) -> Result<ReviewEvaluation, GitHubError> {
    let reviews = prs.list_reviews(pr.number).await?;
    let required_teams = policy.required_team_slugs(team_name);

    let mut members = BTreeMap::new();
    for team in &required_teams {
        if let Some(m) = team_members(teams, team).await {
            members.insert(team.clone(), m);
        }
    }

    let evaluation = evaluate_reviews(&reviews, policy.required_approvals, &required_teams, &members);
    tracing::info!(
        approvals = evaluation.approvers.len(),
        required = evaluation.required_approvals,
        missing_teams = ?evaluation.missing_teams,
        satisfied = evaluation.is_satisfied(),
        "Evaluated review requirements"
    );
    Ok(evaluation)
}

/// Publishes the evaluation as the review-requirements commit status on the
/// pull request head: `success` when met, `pending` otherwise.
pub async fn publish_review_status(
    prs: &dyn PullRequestManager,
    pr: &PullRequest,
    evaluation: &ReviewEvaluation,
) -> Result<(), GitHubError> {
    let status = CommitStatus {
        state: if evaluation.is_satisfied() {
            CommitState::Success
        } else {
            CommitState::Pending
        },
        context: REVIEW_STATUS_CONTEXT.to_string(),
        description: evaluation.status_description(),
    };
    prs.create_commit_status(&pr.head_sha, &status).await?;
    tracing::info!(state = status.state.as_api_str(), sha = %pr.head_sha, "Published review status");
    Ok(())
}

/// Closes a pull request that must not be merged.
pub async fn block_pull_request(
    prs: &dyn PullRequestManager,
    number: PullRequestNumber,
) -> Result<(), GitHubError> {
    prs.close_pull_request(number).await?;
    tracing::warn!(pr = %number, "Closed pull request");
    Ok(())
}
