//! Sub-team existence reconciliation.

use std::collections::{BTreeMap, BTreeSet};

use governance::teams::ResolvedSubTeam;
use governance::{
    plan_set, GitHubError, SyncReport, Team, TeamAdmin, TeamPrivacy, TeamSlug, TeamSpec,
};

/// Makes the child teams of `parent` match `desired`, compared by slug.
///
/// Extra children are deleted first, then missing ones are created as
/// closed teams under `parent`.
#[tracing::instrument(skip(admin, parent, desired), fields(parent = %parent.slug, desired = desired.len()))]
pub async fn sync_subteams(
    admin: &dyn TeamAdmin,
    parent: &Team,
    desired: &[ResolvedSubTeam],
) -> Result<SyncReport, GitHubError> {
    let wanted: BTreeMap<&TeamSlug, &ResolvedSubTeam> =
        desired.iter().map(|s| (&s.slug, s)).collect();
    let actual: BTreeSet<TeamSlug> = admin
        .list_child_teams(&parent.slug)
        .await?
        .into_iter()
        .map(|t| t.slug)
        .collect();
    let plan = plan_set(&wanted.keys().map(|s| (*s).clone()).collect(), &actual);

    if plan.is_empty() {
        tracing::info!("Sub-teams already in sync");
        return Ok(SyncReport::default());
    }

    let mut report = SyncReport::default();

    for slug in &plan.to_remove {
        match admin.delete_team(slug).await {
            Ok(()) => {
                tracing::info!(sub_team = %slug, "Deleted sub-team");
                report.removed += 1;
            }
            Err(e) => {
                tracing::warn!(sub_team = %slug, error = %e, "Failed to delete sub-team");
                report.failed += 1;
            }
        }
    }

    for slug in &plan.to_add {
        let Some(sub_team) = wanted.get(slug) else {
            continue;
        };
        let spec = TeamSpec {
            name: sub_team.name.clone(),
            description: sub_team.description.clone(),
            privacy: TeamPrivacy::Closed,
            parent_team_id: Some(parent.id),
        };
        match admin.create_team(&spec).await {
            Ok(team) => {
                tracing::info!(sub_team = %team.slug, "Created sub-team");
                report.added += 1;
            }
            Err(e) => {
                tracing::warn!(sub_team = %slug, error = %e, "Failed to create sub-team");
                report.failed += 1;
            }
        }
    }

    tracing::info!(%report, "Sub-teams reconciled");
    Ok(report)
}
