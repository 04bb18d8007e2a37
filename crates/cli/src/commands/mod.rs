//! Command handlers. Each builds its clients from the resolved CI context
//! and hands them to the workflows as trait objects.
//!
//! Per-item API failures are logged by the workflows and do not change the
//! exit status; only configuration and context errors exit non-zero, along
//! with a failed `review validate`.

pub mod health;
pub mod review;
pub mod teams;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use github::GitHubClient;
use governance::{CodeRepository, RepositoryInspector};

use crate::cli::{Cli, Commands, GitHubArgs, HealthCommands, TeamFilesArgs, TeamsCommands};
use crate::context::CiContext;
use teams::SyncKind;

fn client(args: &GitHubArgs, org: Option<&str>) -> Result<GitHubClient> {
    let token = args.token()?;
    let org = args.organization(org)?;
    Ok(GitHubClient::new(&args.api_url, token, org)?)
}

async fn sync(kind: SyncKind, args: &TeamFilesArgs, github: &GitHubArgs, ctx: &CiContext) -> Result<ExitCode> {
    let client = client(github, None)?;
    let repository = github
        .repository()
        .ok()
        .map(|id| client.for_repository(id));
    let files = teams::select_files(
        &args.root.root,
        &args.files,
        args.all,
        ctx,
        repository.as_ref().map(|r| r as &dyn CodeRepository),
    )
    .await?;
    if files.is_empty() {
        tracing::info!("No team documents to process");
        return Ok(ExitCode::SUCCESS);
    }
    teams::sync(kind, &client, &files).await;
    Ok(ExitCode::SUCCESS)
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let ctx = CiContext::from_env()?;
    let github = &cli.github;

    match &cli.command {
        Commands::Teams(args) => match &args.command {
            TeamsCommands::SyncMembers(files) => sync(SyncKind::Members, files, github, &ctx).await,
            TeamsCommands::SyncRepositories(files) => {
                sync(SyncKind::Repositories, files, github, &ctx).await
            }
            TeamsCommands::SyncSubteams(files) => sync(SyncKind::SubTeams, files, github, &ctx).await,
            TeamsCommands::Setup(root) => {
                let client = client(github, None)?;
                let report = teams::setup(&client, &root.root).await?;
                tracing::info!(%report, "Setup finished");
                Ok(ExitCode::SUCCESS)
            }
            TeamsCommands::Remove(root) => {
                let client = client(github, None)?;
                let report = teams::remove(&client, &root.root).await?;
                tracing::info!(%report, "Removal finished");
                Ok(ExitCode::SUCCESS)
            }
            TeamsCommands::Register(register) => {
                let body = ctx.issue_body(register.issue_payload.as_deref())?;
                teams::register(&register.root.root, &body)?;
                Ok(ExitCode::SUCCESS)
            }
        },
        Commands::Review(args) => {
            let (action, pr_args) = args.command.split();
            let client = client(github, None)?;
            let repository = client.for_repository(github.repository()?);
            review::run(action, pr_args, &ctx, &repository, &client).await
        }
        Commands::Health(args) => match &args.command {
            HealthCommands::Scan(scan) => {
                let config = health::load_config(&scan.config)?;
                let client = client(github, scan.org.as_deref())?;
                let org = client.organization().as_str().to_string();
                let inspector: Arc<dyn RepositoryInspector> = Arc::new(client);
                let written = health::scan(inspector, config, &org, scan.output_dir.as_deref()).await?;
                tracing::info!(reports = written.len(), "Health scan complete");
                Ok(ExitCode::SUCCESS)
            }
            HealthCommands::InitConfig(init) => {
                health::init_config(&init.path, init.force)?;
                Ok(ExitCode::SUCCESS)
            }
        },
    }
}
