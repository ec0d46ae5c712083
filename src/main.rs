//! bench-display CLI - Browse micro-benchmark results per commit
//!
//! Lists repositories, branches and commits through the GitHub API and
//! charts the benchmark artifacts CI uploaded for a range of commits.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info};

use bench_display::{
    aggregator::Aggregator,
    config::{
        Endpoints, QueryOptions, DEFAULT_API_BASE, DEFAULT_OWNER, DEFAULT_REPO,
        DEFAULT_STORAGE_BASE, DEFAULT_WINDOW,
    },
    github::{parse_repo_slug, GitHubClient, HostingDirectory},
    html::{self, DashboardConfig, DashboardView},
    session::{Picks, Session},
    store::ObjectStore,
};
use bench_display_core::{
    format_value, Chronology, Dashboard, NameSelection, ReferenceCommit, ViewOptions,
};

/// bench-display: Browse per-commit micro-benchmark results
#[derive(Parser, Debug)]
#[command(name = "bench-display")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the GitHub REST API
    #[arg(long, global = true, env = "BENCH_DISPLAY_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Base URL of the benchmark artifact bucket
    #[arg(long, global = true, env = "BENCH_DISPLAY_STORAGE_BASE", default_value = DEFAULT_STORAGE_BASE)]
    storage_base: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the repositories of an owner
    Repos(ReposArgs),

    /// List the branches of a repository
    Branches(BranchesArgs),

    /// List the commits of a branch
    Commits(CommitsArgs),

    /// Fetch and print the benchmarks for a range of commits
    Fetch(FetchArgs),

    /// Generate HTML dashboard
    Dashboard(DashboardArgs),
}

#[derive(Parser, Debug)]
struct ReposArgs {
    /// User or organization
    owner: String,
}

#[derive(Parser, Debug)]
struct BranchesArgs {
    owner: String,
    repo: String,
}

#[derive(Parser, Debug)]
struct CommitsArgs {
    owner: String,
    repo: String,

    /// Branch or other git ref
    #[arg(short, long, default_value = "main")]
    branch: String,

    /// Only show the most recent commit
    #[arg(long)]
    latest: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChronologyArg {
    OldestFirst,
    NewestFirst,
}

impl From<ChronologyArg> for Chronology {
    fn from(arg: ChronologyArg) -> Self {
        match arg {
            ChronologyArg::OldestFirst => Chronology::OldestFirst,
            ChronologyArg::NewestFirst => Chronology::NewestFirst,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReferenceArg {
    Newest,
    Oldest,
}

impl From<ReferenceArg> for ReferenceCommit {
    fn from(arg: ReferenceArg) -> Self {
        match arg {
            ReferenceArg::Newest => ReferenceCommit::Newest,
            ReferenceArg::Oldest => ReferenceCommit::Oldest,
        }
    }
}

/// Options shared by every command that charts a query
#[derive(clap::Args, Debug)]
struct ViewArgs {
    /// Number of commits, counting back from the selected one
    #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
    window: usize,

    /// Left-to-right order of commits
    #[arg(long, value_enum, default_value = "oldest-first")]
    chronology: ChronologyArg,

    /// Commit whose artifact decides which benchmarks are charted
    #[arg(long, value_enum, default_value = "newest")]
    reference: ReferenceArg,

    /// Chart every benchmark seen in the range, not just the reference commit's
    #[arg(long)]
    union: bool,
}

impl ViewArgs {
    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            window: self.window,
            view: ViewOptions {
                chronology: self.chronology.into(),
                reference: self.reference.into(),
                names: if self.union {
                    NameSelection::Union
                } else {
                    NameSelection::Reference
                },
            },
        }
    }
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// Repository as `owner/repo` or a GitHub URL
    repository: String,

    /// Commit SHA (or ref) the range ends at
    commit: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Parser, Debug)]
struct DashboardArgs {
    #[arg(long, default_value = DEFAULT_OWNER)]
    owner: String,

    /// Repository (defaults to the owner's default repository)
    #[arg(long)]
    repo: Option<String>,

    /// Branch (defaults to main, then master)
    #[arg(long)]
    branch: Option<String>,

    /// Commit (defaults to the newest on the branch)
    #[arg(long)]
    commit: Option<String>,

    /// Output directory for dashboard
    #[arg(short, long, default_value = "bench-display")]
    output_dir: PathBuf,

    /// Dashboard title
    #[arg(long, default_value = "Micro-Benchmark")]
    title: String,

    #[command(flatten)]
    view: ViewArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let endpoints = Endpoints::new(&cli.api_base, &cli.storage_base)
        .with_context(|| "Invalid endpoint configuration")?;
    debug!("Using {:?}", endpoints);

    match cli.command {
        Commands::Repos(args) => repos_command(endpoints, args).await,
        Commands::Branches(args) => branches_command(endpoints, args).await,
        Commands::Commits(args) => commits_command(endpoints, args).await,
        Commands::Fetch(args) => fetch_command(endpoints, args).await,
        Commands::Dashboard(args) => dashboard_command(endpoints, args).await,
    }
}

/// List repositories
async fn repos_command(endpoints: Endpoints, args: ReposArgs) -> Result<()> {
    let github = GitHubClient::new(endpoints)?;
    let repos = github
        .list_repositories(&args.owner)
        .await
        .with_context(|| format!("Failed to list repositories of {}", args.owner))?;

    for repo in repos {
        println!("{}", repo.name);
    }

    Ok(())
}

/// List branches
async fn branches_command(endpoints: Endpoints, args: BranchesArgs) -> Result<()> {
    let github = GitHubClient::new(endpoints)?;
    let branches = github
        .list_branches(&args.owner, &args.repo)
        .await
        .with_context(|| format!("Failed to list branches of {}/{}", args.owner, args.repo))?;

    for branch in branches {
        println!("{}", branch.name);
    }

    Ok(())
}

/// List commits
async fn commits_command(endpoints: Endpoints, args: CommitsArgs) -> Result<()> {
    let github = GitHubClient::new(endpoints)?;

    let commits: Vec<_> = if args.latest {
        github
            .latest_commit(&args.owner, &args.repo, &args.branch)
            .await
            .with_context(|| format!("Failed to fetch the latest commit of {}", args.branch))?
            .into_iter()
            .collect()
    } else {
        github
            .list_commits(&args.owner, &args.repo, &args.branch)
            .await
            .with_context(|| format!("Failed to list commits of {}", args.branch))?
    };

    for commit in commits {
        match commit.timestamp {
            Some(date) => println!("{}  {}", commit.label(), date.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("{}", commit.label()),
        }
    }

    Ok(())
}

/// Fetch the benchmarks of a commit range and print every series
async fn fetch_command(endpoints: Endpoints, args: FetchArgs) -> Result<()> {
    let (owner, repo) = parse_repo_slug(&args.repository)?;
    let options = args.view.query_options();

    let github = GitHubClient::new(endpoints.clone())?;
    let aggregator = Aggregator::new(ObjectStore::new(endpoints)?);

    info!(
        "Fetching {} commits of {}/{} ending at {}",
        options.window, owner, repo, args.commit
    );
    let aggregate = aggregator
        .query(&github, &owner, &repo, &args.commit, options.window)
        .await
        .with_context(|| "Failed to fetch benchmarks")?;

    let charts = aggregate.charts(&options.view);

    match args.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "repository": aggregate.repository,
                "commits": aggregate.commits,
                "charts": charts,
                "notice": aggregate.empty_state(&options.view).map(|s| s.message()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if let Some(state) = aggregate.empty_state(&options.view) {
                println!("{}", state.message());
                return Ok(());
            }

            println!(
                "{}/{}: {} of {} commits with data\n",
                owner,
                repo,
                aggregate.table.len(),
                aggregate.commits.len()
            );
            for series in &charts {
                println!("## {}", series.name);
                for point in &series.points {
                    println!("  {}  {}", point.label, format_value(point.value));
                }
                println!();
            }
        }
    }

    Ok(())
}

/// Walk the selection flow like the browser shell and write the dashboard
async fn dashboard_command(endpoints: Endpoints, args: DashboardArgs) -> Result<()> {
    let options = args.view.query_options();
    let default_repo = args.repo.clone().unwrap_or_else(|| DEFAULT_REPO.to_string());

    let dashboard = Dashboard::new()
        .with_default_repo(default_repo)
        .with_options(options.view);
    let mut session = Session::new(
        GitHubClient::new(endpoints.clone())?,
        ObjectStore::new(endpoints)?,
        dashboard,
        options.window,
    );

    let picks = Picks {
        repo: args.repo,
        branch: args.branch,
        commit: args.commit,
    };
    session
        .load(&args.owner, picks)
        .await
        .with_context(|| format!("Failed to load benchmarks for {}", args.owner))?;

    let dashboard = session.dashboard();
    let view = DashboardView::from_dashboard(dashboard)
        .with_context(|| "Benchmark query did not complete")?;
    let config = DashboardConfig {
        title: args.title,
        output_dir: args.output_dir,
    };

    let index = html::write_dashboard(&view, &config)
        .with_context(|| "Failed to generate dashboard")?;

    if let Some(notice) = dashboard.notice() {
        info!("{}", notice);
    }
    info!("Dashboard generated at {:?}", index);

    Ok(())
}
