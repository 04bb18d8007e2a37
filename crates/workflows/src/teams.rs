//! Per-document team workflows: reconcile a parent team and its sub-teams,
//! create or update teams from the registry, and tear teams down.

use governance::{
    GitHubError, RootTeamEntry, SyncReport, Team, TeamAdmin, TeamConfig, TeamPrivacy, TeamSlug,
    TeamSpec,
};

fn parent_slug(config: &TeamConfig) -> Result<TeamSlug, GitHubError> {
    // TeamDocument::from_yaml already rejects names without a slug.
    config
        .slug()
        .ok_or_else(|| GitHubError::not_found(format!("team '{}'", config.team_name)))
}

/// Looks up a sub-team, logging and returning `None` when it does not exist
/// or cannot be read.
async fn existing_sub_team(admin: &dyn TeamAdmin, slug: &TeamSlug) -> Option<Team> {
    match admin.get_team(slug).await {
        Ok(team) => Some(team),
        Err(e) if e.is_not_found() => {
            tracing::warn!(sub_team = %slug, "Sub-team does not exist; skipping");
            None
        }
        Err(e) => {
            tracing::warn!(sub_team = %slug, error = %e, "Failed to read sub-team; skipping");
            None
        }
    }
}

/// Reconciles the members of the parent team and then of each sub-team.
///
/// A missing parent team is an error; a missing sub-team is skipped.
#[tracing::instrument(skip_all, fields(team = %config.team_name))]
pub async fn sync_team_members(
    admin: &dyn TeamAdmin,
    config: &TeamConfig,
) -> Result<SyncReport, GitHubError> {
    let parent = parent_slug(config)?;
    let mut report = crate::sync_members(admin, &parent, &config.desired_members()).await?;

    for sub_team in config.resolved_sub_teams() {
        if existing_sub_team(admin, &sub_team.slug).await.is_none() {
            continue;
        }
        match crate::sync_members(admin, &sub_team.slug, &sub_team.members).await {
            Ok(r) => report += r,
            Err(e) => {
                tracing::warn!(sub_team = %sub_team.slug, error = %e, "Failed to list sub-team members");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Reconciles repository grants of the parent team and then of each
/// sub-team.
#[tracing::instrument(skip_all, fields(team = %config.team_name))]
pub async fn sync_team_repositories(
    admin: &dyn TeamAdmin,
    config: &TeamConfig,
) -> Result<SyncReport, GitHubError> {
    let parent = parent_slug(config)?;
    let parent_desired = config.desired_repositories();
    let mut report = crate::sync_repositories(admin, &parent, &parent_desired, None).await?;

    for sub_team in config.resolved_sub_teams() {
        if existing_sub_team(admin, &sub_team.slug).await.is_none() {
            continue;
        }
        match crate::sync_repositories(
            admin,
            &sub_team.slug,
            &sub_team.repositories,
            Some(&parent_desired),
        )
        .await
        {
            Ok(r) => report += r,
            Err(e) => {
                tracing::warn!(sub_team = %sub_team.slug, error = %e, "Failed to list sub-team repositories");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Reconciles which sub-teams exist under the parent team.
#[tracing::instrument(skip_all, fields(team = %config.team_name))]
pub async fn sync_team_subteams(
    admin: &dyn TeamAdmin,
    config: &TeamConfig,
) -> Result<SyncReport, GitHubError> {
    let parent = admin.get_team(&parent_slug(config)?).await?;
    crate::sync_subteams(admin, &parent, &config.resolved_sub_teams()).await
}

/// What [`ensure_team`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamChange {
    Created,
    Updated,
    Unchanged,
}

impl TeamChange {
    fn record(self, report: &mut SyncReport) {
        match self {
            Self::Created => report.added += 1,
            Self::Updated => report.updated += 1,
            Self::Unchanged => {}
        }
    }
}

/// Whether `team` differs from `spec` in name, description or parent.
fn differs(team: &Team, spec: &TeamSpec, parent: Option<&TeamSlug>) -> bool {
    team.name != spec.name
        || team.description.as_deref().unwrap_or_default() != spec.description
        || team.parent.as_ref() != parent
}

/// Creates the team described by `spec`, or updates it when `slug` exists
/// with a different name, description or parent. `parent` is the slug of
/// the team `spec.parent_team_id` refers to.
pub async fn ensure_team(
    admin: &dyn TeamAdmin,
    slug: &TeamSlug,
    spec: &TeamSpec,
    parent: Option<&TeamSlug>,
) -> Result<(Team, TeamChange), GitHubError> {
    match admin.get_team(slug).await {
        Ok(existing) if !differs(&existing, spec, parent) => {
            tracing::debug!(team = %existing.slug, "Team already up to date");
            Ok((existing, TeamChange::Unchanged))
        }
        Ok(_) => {
            let team = admin.update_team(slug, spec).await?;
            tracing::info!(team = %team.slug, "Updated team");
            Ok((team, TeamChange::Updated))
        }
        Err(e) if e.is_not_found() => {
            let team = admin.create_team(spec).await?;
            tracing::info!(team = %team.slug, "Created team");
            Ok((team, TeamChange::Created))
        }
        Err(e) => Err(e),
    }
}

/// Creates or updates a registered team and the sub-teams of its document.
///
/// A failure on the parent team is returned; sub-team failures are counted.
#[tracing::instrument(skip_all, fields(team = %entry.team_name))]
pub async fn setup_team(
    admin: &dyn TeamAdmin,
    entry: &RootTeamEntry,
    config: &TeamConfig,
) -> Result<SyncReport, GitHubError> {
    let slug = parent_slug(config)?;
    let spec = TeamSpec {
        name: entry.team_name.clone(),
        description: entry.description.clone(),
        privacy: TeamPrivacy::Closed,
        parent_team_id: None,
    };

    let mut report = SyncReport::default();
    let (parent, change) = ensure_team(admin, &slug, &spec, None).await?;
    change.record(&mut report);

    for sub_team in config.resolved_sub_teams() {
        let spec = TeamSpec {
            name: sub_team.name.clone(),
            description: sub_team.description.clone(),
            privacy: TeamPrivacy::Closed,
            parent_team_id: Some(parent.id),
        };
        match ensure_team(admin, &sub_team.slug, &spec, Some(&parent.slug)).await {
            Ok((_, change)) => change.record(&mut report),
            Err(e) => {
                tracing::warn!(sub_team = %sub_team.slug, error = %e, "Failed to set up sub-team");
                report.failed += 1;
            }
        }
    }

    tracing::info!(%report, "Team set up");
    Ok(report)
}

/// Deletes a team's child teams and then the team itself.
///
/// A team that no longer exists is treated as removed. An error is returned
/// only when the team itself could not be deleted.
#[tracing::instrument(skip(admin), fields(team = %slug))]
pub async fn remove_team(admin: &dyn TeamAdmin, slug: &TeamSlug) -> Result<SyncReport, GitHubError> {
    let children = match admin.list_child_teams(slug).await {
        Ok(children) => children,
        Err(e) if e.is_not_found() => {
            tracing::info!("Team already absent");
            return Ok(SyncReport::default());
        }
        Err(e) => return Err(e),
    };

    let mut report = SyncReport::default();
    for child in &children {
        match admin.delete_team(&child.slug).await {
            Ok(()) => {
                tracing::info!(sub_team = %child.slug, "Deleted sub-team");
                report.removed += 1;
            }
            Err(e) => {
                tracing::warn!(sub_team = %child.slug, error = %e, "Failed to delete sub-team");
                report.failed += 1;
            }
        }
    }

    match admin.delete_team(slug).await {
        Ok(()) => report.removed += 1,
        Err(e) if e.is_not_found() => tracing::info!("Team already absent"),
        Err(e) => return Err(e),
    }
    tracing::info!(%report, "Team removed");
    Ok(report)
}
