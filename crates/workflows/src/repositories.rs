//! Team repository-permission reconciliation.

use std::collections::BTreeMap;

use governance::{plan_grants, GitHubError, Permission, RepositoryName, SyncReport, TeamAdmin, TeamSlug};

/// Brings the repository grants of `team` to exactly `desired`.
///
/// Revocations run first, then new grants, then level changes. Revoking a
/// repository the API reports as missing counts as done.
///
/// `parent_desired` is the parent team's desired grants when `team` is a
/// sub-team. Revoking a repository the parent still wants is allowed but
/// logged, since members will usually keep access through the parent.
#[tracing::instrument(skip(admin, desired, parent_desired), fields(team = %team, desired = desired.len()))]
pub async fn sync_repositories(
    admin: &dyn TeamAdmin,
    team: &TeamSlug,
    desired: &BTreeMap<RepositoryName, Permission>,
    parent_desired: Option<&BTreeMap<RepositoryName, Permission>>,
) -> Result<SyncReport, GitHubError> {
    let actual: BTreeMap<RepositoryName, Permission> = admin
        .list_repositories(team)
        .await?
        .into_iter()
        .map(|r| (r.name, r.permission))
        .collect();
    let plan = plan_grants(desired, &actual);

    if plan.is_empty() {
        tracing::info!("Repository permissions already in sync");
        return Ok(SyncReport::default());
    }

    let mut report = SyncReport::default();

    for repository in &plan.revoke {
        if parent_desired.is_some_and(|p| p.contains_key(repository)) {
            tracing::warn!(
                repository = %repository,
                "Revoking a repository the parent team still grants"
            );
        }
        match admin.remove_repository(team, repository).await {
            Ok(()) => {
                tracing::info!(repository = %repository, "Revoked repository");
                report.removed += 1;
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(repository = %repository, "Repository already absent from team");
            }
            Err(e) => {
                tracing::warn!(repository = %repository, error = %e, "Failed to revoke repository");
                report.failed += 1;
            }
        }
    }

    for (repository, permission) in &plan.grant {
        match admin
            .set_repository_permission(team, repository, permission)
            .await
        {
            Ok(()) => {
                tracing::info!(repository = %repository, %permission, "Granted repository");
                report.added += 1;
            }
            Err(e) => {
                tracing::warn!(repository = %repository, error = %e, "Failed to grant repository");
                report.failed += 1;
            }
        }
    }

    for (repository, current, wanted) in &plan.update {
        match admin.set_repository_permission(team, repository, wanted).await {
            Ok(()) => {
                tracing::info!(
                    repository = %repository,
                    from = %current,
                    to = %wanted,
                    "Updated repository permission"
                );
                report.updated += 1;
            }
            Err(e) => {
                tracing::warn!(
                    repository = %repository,
                    error = %e,
                    "Failed to update repository permission"
                );
                report.failed += 1;
            }
        }
    }

    tracing::info!(%report, "Repository permissions reconciled");
    Ok(report)
}
