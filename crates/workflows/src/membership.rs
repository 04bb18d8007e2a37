//! Team membership reconciliation.

use std::collections::BTreeSet;

use governance::{plan_set, GitHubError, SyncReport, TeamAdmin, TeamSlug, Username};

/// Users listed on `team` only through one of its child teams.
///
/// GitHub reports child-team members as members of the parent. Users the
/// parent also wants are kept, so they are never re-added.
async fn inherited_members(
    admin: &dyn TeamAdmin,
    team: &TeamSlug,
    desired: &BTreeSet<Username>,
) -> Result<BTreeSet<Username>, GitHubError> {
    let mut inherited = BTreeSet::new();
    for child in admin.list_child_teams(team).await? {
        inherited.extend(
            admin
                .list_members(&child.slug)
                .await?
                .into_iter()
                .filter(|user| !desired.contains(user)),
        );
    }
    Ok(inherited)
}

/// Brings the roster of `team` to exactly `desired`.
///
/// Removals run before additions. An empty `desired` set removes every
/// current member. Members inherited from child teams are left to those
/// teams' own reconciliation; if the child rosters cannot be read nothing
/// is changed.
#[tracing::instrument(skip(admin, desired), fields(team = %team, desired = desired.len()))]
pub async fn sync_members(
    admin: &dyn TeamAdmin,
    team: &TeamSlug,
    desired: &BTreeSet<Username>,
) -> Result<SyncReport, GitHubError> {
    let listed: BTreeSet<Username> = admin.list_members(team).await?.into_iter().collect();
    let inherited = inherited_members(admin, team, desired).await?;
    if !inherited.is_empty() {
        tracing::debug!(inherited = inherited.len(), "Ignoring members inherited from child teams");
    }
    let actual: BTreeSet<Username> = listed.difference(&inherited).cloned().collect();
    let plan = plan_set(desired, &actual);

    if plan.is_empty() {
        tracing::info!("Membership already in sync");
        return Ok(SyncReport::default());
    }
    if desired.is_empty() {
        tracing::warn!(
            removing = plan.to_remove.len(),
            "No members configured; removing every current member"
        );
    }

    let mut report = SyncReport::default();

    for user in &plan.to_remove {
        match admin.remove_member(team, user).await {
            Ok(()) => {
                tracing::info!(user = %user, "Removed member");
                report.removed += 1;
            }
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Failed to remove member");
                report.failed += 1;
            }
        }
    }

    for user in &plan.to_add {
        match admin.add_member(team, user).await {
            Ok(()) => {
                tracing::info!(user = %user, "Added member");
                report.added += 1;
            }
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Failed to add member");
                report.failed += 1;
            }
        }
    }

    tracing::info!(%report, "Membership reconciled");
    Ok(report)
}
