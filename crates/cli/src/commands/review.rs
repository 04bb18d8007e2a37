//! `review` subcommands.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use governance::{BranchPolicies, BranchPolicy, PullRequest, PullRequestManager, TeamAdmin};

use crate::cli::{PullRequestArgs, ReviewCommands};
use crate::context::CiContext;
use crate::output::set_output;

/// Which review action to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Assign,
    Status,
    Validate,
    Block,
}

impl ReviewCommands {
    pub fn split(&self) -> (ReviewAction, &PullRequestArgs) {
        match self {
            Self::Assign(args) => (ReviewAction::Assign, args),
            Self::Status(args) => (ReviewAction::Status, args),
            Self::Validate(args) => (ReviewAction::Validate, args),
            Self::Block(args) => (ReviewAction::Block, args),
        }
    }
}

pub fn load_policies(path: &Path) -> Result<BranchPolicies> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(BranchPolicies::from_yaml(&path.display().to_string(), &text)?)
}

fn matching_policy<'a>(policies: &'a BranchPolicies, branch: &str) -> Option<&'a BranchPolicy> {
    match policies.resolve(branch) {
        Some((pattern, policy)) => {
            tracing::info!(branch, pattern, "Matched review policy");
            Some(policy)
        }
        None => {
            tracing::info!(branch, "No review policy for branch");
            None
        }
    }
}

pub async fn run(
    action: ReviewAction,
    args: &PullRequestArgs,
    ctx: &CiContext,
    prs: &dyn PullRequestManager,
    teams: &dyn TeamAdmin,
) -> Result<ExitCode> {
    let number = ctx.pull_request_number(args.pr_number)?;

    if action == ReviewAction::Block {
        workflows::block_pull_request(prs, number).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let policies = load_policies(&args.config)?;
    let pr: PullRequest = prs.get_pull_request(number).await?;
    let branch = ctx
        .target_branch(args.target_branch.as_deref())
        .unwrap_or_else(|| pr.base_ref.clone());
    let policy = matching_policy(&policies, &branch);

    match action {
        ReviewAction::Assign => {
            if let Some(policy) = policy {
                let report =
                    workflows::assign_reviewers(prs, teams, &pr, policy, &args.team_name).await?;
                tracing::info!(%report, "Review routing finished");
            }
            Ok(ExitCode::SUCCESS)
        }
        ReviewAction::Status => {
            if let Some(policy) = policy {
                let evaluation =
                    workflows::evaluate_pull_request(prs, teams, &pr, policy, &args.team_name)
                        .await?;
                workflows::publish_review_status(prs, &pr, &evaluation).await?;
            }
            Ok(ExitCode::SUCCESS)
        }
        ReviewAction::Validate => {
            let passed = match policy {
                Some(policy) => {
                    let evaluation =
                        workflows::evaluate_pull_request(prs, teams, &pr, policy, &args.team_name)
                            .await?;
                    if !evaluation.is_satisfied() {
                        tracing::warn!(reason = %evaluation.describe(), "Review requirements not met");
                    }
                    evaluation.is_satisfied()
                }
                None => false,
            };
            set_output(
                args.github_output.as_deref(),
                "status",
                if passed { "pass" } else { "fail" },
            )?;
            Ok(if passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        ReviewAction::Block => Ok(ExitCode::SUCCESS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loads_policy_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("REVIEWERS.yml");
        std::fs::write(
            &path,
            "pull_requests:\n  branches:\n    main:\n      required_approvals: 2\n    \"release/*\":\n      required_approvals: 1\n",
        )
        .unwrap();

        let policies = load_policies(&path).unwrap();

        assert_eq!(policies.len(), 2);
        assert_eq!(matching_policy(&policies, "main").unwrap().required_approvals, 2);
        assert_eq!(matching_policy(&policies, "release/2.0").unwrap().required_approvals, 1);
        assert!(matching_policy(&policies, "feature/x").is_none());
    }

    #[test]
    fn missing_policy_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_policies(&dir.path().join("absent.yml")).is_err());
    }
}
