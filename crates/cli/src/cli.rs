//! Command-line definition: the clap command tree and the global GitHub
//! arguments shared by every subcommand.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "org-governance")]
#[command(about = "Keep GitHub teams, review routing, and repository health in line with the governance repository")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub github: GitHubArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct GitHubArgs {
    /// API token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API root URL
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL)]
    pub api_url: String,

    /// Repository running the workflow (`owner/repo`)
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Organization to manage (defaults to the repository owner)
    #[arg(long, global = true, env = "GITHUB_ORGANIZATION")]
    pub organization: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage teams from the team documents
    Teams(TeamsArgs),
    /// Route and check pull request reviews
    Review(ReviewArgs),
    /// Score repository health across the organization
    Health(HealthArgs),
}

impl Commands {
    /// Short name used in the run span.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Teams(args) => match args.command {
                TeamsCommands::SyncMembers(_) => "teams sync-members",
                TeamsCommands::SyncRepositories(_) => "teams sync-repositories",
                TeamsCommands::SyncSubteams(_) => "teams sync-subteams",
                TeamsCommands::Setup(_) => "teams setup",
                TeamsCommands::Remove(_) => "teams remove",
                TeamsCommands::Register(_) => "teams register",
            },
            Self::Review(args) => match args.command {
                ReviewCommands::Assign(_) => "review assign",
                ReviewCommands::Status(_) => "review status",
                ReviewCommands::Validate(_) => "review validate",
                ReviewCommands::Block(_) => "review block",
            },
            Self::Health(args) => match args.command {
                HealthCommands::Scan(_) => "health scan",
                HealthCommands::InitConfig(_) => "health init-config",
            },
        }
    }
}

#[derive(Args)]
pub struct TeamsArgs {
    #[command(subcommand)]
    pub command: TeamsCommands,
}

#[derive(Subcommand)]
pub enum TeamsCommands {
    /// Reconcile team and sub-team members
    SyncMembers(TeamFilesArgs),
    /// Reconcile team and sub-team repository permissions
    SyncRepositories(TeamFilesArgs),
    /// Create and delete sub-teams to match the documents
    SyncSubteams(TeamFilesArgs),
    /// Scaffold documents and create or update every registered team
    Setup(RootArgs),
    /// Delete teams whose directory is no longer registered
    Remove(RootArgs),
    /// Register a team from a request issue
    Register(RegisterArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RootArgs {
    /// Governance repository checkout
    #[arg(long, env = "GOVERNANCE_ROOT", default_value = ".")]
    pub root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct TeamFilesArgs {
    #[command(flatten)]
    pub root: RootArgs,

    /// Process every team document, even on a push event
    #[arg(long)]
    pub all: bool,

    /// Process only these team documents
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub root: RootArgs,

    /// Issue JSON (the event file's issue is used when absent)
    #[arg(long, env = "ISSUE_PAYLOAD")]
    pub issue_payload: Option<String>,
}

#[derive(Args)]
pub struct ReviewArgs {
    #[command(subcommand)]
    pub command: ReviewCommands,
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// Request team reviews and add assignees
    Assign(PullRequestArgs),
    /// Publish the review-requirements commit status
    Status(PullRequestArgs),
    /// Check review requirements and set `status` in GITHUB_OUTPUT
    Validate(PullRequestArgs),
    /// Close the pull request
    Block(PullRequestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PullRequestArgs {
    /// Pull request number (read from the event file when absent)
    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: Option<u64>,

    /// Target branch (GITHUB_BASE_REF, then the pull request itself, when absent)
    #[arg(long, env = "TARGET_BRANCH")]
    pub target_branch: Option<String>,

    /// Value substituted for `{{ team_name }}`
    #[arg(long, env = "TEAM_NAME", default_value = "")]
    pub team_name: String,

    /// Review policy document
    #[arg(long, env = "REVIEWERS_CONFIG_PATH", default_value = "REVIEWERS.yml")]
    pub config: PathBuf,

    /// File receiving `status=pass|fail`
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,
}

#[derive(Args)]
pub struct HealthArgs {
    #[command(subcommand)]
    pub command: HealthCommands,
}

#[derive(Subcommand)]
pub enum HealthCommands {
    /// Scan every repository and write reports
    Scan(ScanArgs),
    /// Write the default health configuration
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Health configuration (defaults apply when the file is missing)
    #[arg(long, env = "HEALTH_CONFIG", default_value = governance::HEALTH_CONFIG_FILE)]
    pub config: PathBuf,

    /// Organization to scan; takes precedence over `--organization`
    #[arg(long, env = "ORG_NAME")]
    pub org: Option<String>,

    /// Overrides `reporting.output_directory`
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InitConfigArgs {
    #[arg(long, default_value = governance::HEALTH_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
