//! `teams` subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use governance::teams::parse_issue_body;
use governance::{
    CodeRepository, RootTeamsDocument, SyncReport, TeamAdmin, TeamDocument, TeamSlug,
    TEAMS_DIRECTORY, TEAM_FILE_NAME,
};

use crate::context::CiContext;
use crate::discovery;

/// Which reconciler a `sync-*` command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Members,
    Repositories,
    SubTeams,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_registry(root: &Path) -> Result<RootTeamsDocument> {
    let path = root.join(TEAM_FILE_NAME);
    let text = read(&path)?;
    Ok(RootTeamsDocument::from_yaml(&path.display().to_string(), &text)?)
}

fn save_registry(root: &Path, registry: &RootTeamsDocument) -> Result<()> {
    let path = root.join(TEAM_FILE_NAME);
    std::fs::write(&path, registry.to_yaml()?)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Resolves the files a `sync-*` command processes.
pub async fn select_files(
    root: &Path,
    explicit: &[PathBuf],
    all: bool,
    ctx: &CiContext,
    repository: Option<&dyn CodeRepository>,
) -> Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    if all {
        return discovery::team_files(root);
    }
    discovery::select_team_files(root, ctx, repository).await
}

/// Runs one reconciler over every document. Documents that fail to load or
/// reconcile are logged and skipped.
pub async fn sync(kind: SyncKind, admin: &dyn TeamAdmin, files: &[PathBuf]) -> SyncReport {
    let mut total = SyncReport::default();

    for file in files {
        let label = file.display().to_string();
        let document = match read(file).and_then(|text| Ok(TeamDocument::from_yaml(&label, &text)?)) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(file = %label, error = %format!("{e:#}"), "Skipping team document");
                continue;
            }
        };

        let config = &document.teams;
        let result = match kind {
            SyncKind::Members => workflows::sync_team_members(admin, config).await,
            SyncKind::Repositories => workflows::sync_team_repositories(admin, config).await,
            SyncKind::SubTeams => workflows::sync_team_subteams(admin, config).await,
        };
        match result {
            Ok(report) => total += report,
            Err(e) => {
                tracing::error!(file = %label, team = %config.team_name, error = %e, "Failed to reconcile team");
            }
        }
    }

    tracing::info!(documents = files.len(), %total, "Sync finished");
    total
}

/// Writes `teams/<team>/teams.yml` for each registered team that has none.
/// Existing documents are left untouched. Returns the files created.
pub fn scaffold_missing(root: &Path, registry: &RootTeamsDocument) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for entry in &registry.teams {
        let dir = root.join(TEAMS_DIRECTORY).join(&entry.team_name);
        let file = dir.join(TEAM_FILE_NAME);
        if file.exists() {
            continue;
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let document = entry.scaffold(&registry.default_sub_teams);
        std::fs::write(&file, document.to_yaml()?)
            .with_context(|| format!("Failed to write {}", file.display()))?;
        tracing::info!(team = %entry.team_name, file = %file.display(), "Scaffolded team document");
        created.push(file);
    }
    Ok(created)
}

pub async fn setup(admin: &dyn TeamAdmin, root: &Path) -> Result<SyncReport> {
    let registry = load_registry(root)?;
    scaffold_missing(root, &registry)?;

    let mut total = SyncReport::default();
    for entry in &registry.teams {
        let file = root
            .join(TEAMS_DIRECTORY)
            .join(&entry.team_name)
            .join(TEAM_FILE_NAME);
        let label = file.display().to_string();
        let document = match read(&file).and_then(|text| Ok(TeamDocument::from_yaml(&label, &text)?)) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(team = %entry.team_name, error = %format!("{e:#}"), "Skipping team");
                continue;
            }
        };
        match workflows::setup_team(admin, entry, &document.teams).await {
            Ok(report) => total += report,
            Err(e) => {
                tracing::error!(team = %entry.team_name, error = %e, "Failed to set up team");
                total.failed += 1;
            }
        }
    }
    Ok(total)
}

/// Team directories whose name is not in the registry.
pub fn orphaned_directories(root: &Path, registry: &RootTeamsDocument) -> Result<Vec<(String, PathBuf)>> {
    let registered = registry.team_names();
    Ok(discovery::team_directories(root)?
        .into_iter()
        .filter(|(name, _)| !registered.contains(name.as_str()))
        .collect())
}

pub async fn remove(admin: &dyn TeamAdmin, root: &Path) -> Result<SyncReport> {
    let registry = load_registry(root)?;
    let mut total = SyncReport::default();

    for (name, dir) in orphaned_directories(root, &registry)? {
        let Some(slug) = TeamSlug::from_name(&name) else {
            tracing::warn!(directory = %dir.display(), "Directory name has no team slug; skipping");
            continue;
        };
        match workflows::remove_team(admin, &slug).await {
            Ok(report) => {
                total += report;
                std::fs::remove_dir_all(&dir)
                    .with_context(|| format!("Failed to delete {}", dir.display()))?;
                tracing::info!(team = %name, "Removed team directory");
            }
            Err(e) => {
                tracing::error!(team = %name, error = %e, "Failed to delete team; keeping its directory");
                total.failed += 1;
            }
        }
    }
    Ok(total)
}

/// Adds the team described by `issue_body` to the registry. Returns `false`
/// when the team was already registered.
pub fn register(root: &Path, issue_body: &str) -> Result<bool> {
    let entry = parse_issue_body(issue_body)?;
    let path = root.join(TEAM_FILE_NAME);
    let mut registry = if path.exists() {
        load_registry(root)?
    } else {
        RootTeamsDocument::default()
    };

    let name = entry.team_name.clone();
    if !registry.register(entry) {
        tracing::info!(team = %name, "Team already registered");
        return Ok(false);
    }
    save_registry(root, &registry)?;
    tracing::info!(team = %name, "Registered team");
    Ok(true)
}
