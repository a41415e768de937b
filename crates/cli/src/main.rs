use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use labbook_assets::tree::{collect_dependencies, filter_included, sort_by_key, to_relative_keys};
use labbook_assets::{
    merge_annotations, serve_lines, AssetNode, AssetScanner, ScanRequest, ScanWorker,
};
use labbook_project::{
    create_project, display_log, load_project_file, payload_from_str, project_updates,
    save_scanned_assets, update_project, AuditEntry, DisplayEntry, GitCli, MergeError,
    MergeRequest, ProjectUpdates, SourceControl, StoreError,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

mod activity_log;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "labbook")]
#[command(about = "Research project asset tracking and annotations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (default: <config dir>/labbook/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project document
    Init(InitArgs),

    /// Scan the project directory and print the asset tree
    Scan(ScanArgs),

    /// Apply one action to the project document
    Update(UpdateArgs),

    /// List libraries used by the project's code files
    Deps(RootArgs),

    /// Show project activity merged with source control history
    History(HistoryArgs),

    /// Serve JSON-line scan requests on stdin/stdout
    Worker,
}

#[derive(Args)]
struct RootArgs {
    /// Project root directory
    #[arg(default_value = ".")]
    root: PathBuf,
}

#[derive(Args)]
struct InitArgs {
    /// Project root directory
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Project name
    #[arg(long, default_value = "")]
    name: String,
}

#[derive(Args)]
struct ScanArgs {
    /// Project root directory
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Store the reconciled tree in the project document
    #[arg(long)]
    save: bool,

    /// Print assets excluded by the hidden patterns too
    #[arg(long)]
    include_hidden: bool,
}

#[derive(Args)]
struct UpdateArgs {
    /// Project root directory
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Action kind (note_add, attribute_set, person_add, ...)
    #[arg(long)]
    action: String,

    /// Entity kind (project, asset, external_asset, person, checklist)
    #[arg(long)]
    entity: String,

    /// Key of the targeted entity
    #[arg(long)]
    key: String,

    /// Action payload as JSON
    #[arg(long)]
    payload: String,
}

#[derive(Args)]
struct HistoryArgs {
    /// Project root directory
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Summarize changes by other users after this RFC 3339 timestamp
    #[arg(long)]
    since: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum UpdateResponse {
    Ok {
        changed: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        audit: Option<AuditEntry>,
    },
    Error {
        message: String,
        /// True when the document could not be read or written
        hard_failure: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // The worker speaks JSON on stdout; keep logs down to problems
    if matches!(cli.command, Commands::Worker) && !cli.verbose {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init(args) => run_init(args)?,
        Commands::Scan(args) => run_scan(args, &config).await?,
        Commands::Update(args) => run_update(args, &config)?,
        Commands::Deps(args) => run_deps(args)?,
        Commands::History(args) => run_history(args, &config)?,
        Commands::Worker => run_worker(&config).await?,
    }

    Ok(())
}

fn run_init(args: InitArgs) -> Result<()> {
    let document = create_project(&args.root, &args.name)
        .with_context(|| format!("Failed to create project in {}", args.root.display()))?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn project_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize()
        .with_context(|| format!("Project root {} is not accessible", root.display()))
}

/// Persisted asset tree, if a project with scanned assets exists
fn persisted_assets(root: &Path) -> Result<Option<AssetNode>> {
    match load_project_file(root) {
        Ok(document) => Ok(document.assets),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(err) => Err(err).context("Failed to load project document"),
    }
}

async fn run_scan(args: ScanArgs, config: &Config) -> Result<()> {
    let root = project_root(&args.root)?;
    let worker = ScanWorker::spawn(AssetScanner::new(config.pipeline()?));

    let response = worker
        .scan(ScanRequest {
            root_path: root.clone(),
            user_data_path: config::user_data_path(),
        })
        .await?;
    let fresh = response
        .into_tree()
        .map_err(|message| anyhow!("Scan of {} failed: {message}", root.display()))?;
    let fresh = to_relative_keys(&fresh, &root)?;

    let tree = if args.save {
        let document = save_scanned_assets(&root, fresh).with_context(|| {
            format!("Failed to save assets (run `labbook init {}` first?)", args.root.display())
        })?;
        log::info!("Saved scanned assets for {}", root.display());
        document
            .assets
            .ok_or_else(|| anyhow!("Saved project {} has no assets", document.id))?
    } else {
        let mut tree = match persisted_assets(&root)? {
            Some(persisted) => merge_annotations(fresh, &persisted),
            None => fresh,
        };
        sort_by_key(&mut tree);
        tree
    };

    let output = if args.include_hidden {
        Some(tree)
    } else {
        filter_included(&tree)
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_update(args: UpdateArgs, config: &Config) -> Result<()> {
    let user = config.user_name();
    let result = payload_from_str(&args.payload)
        .and_then(|payload| {
            MergeRequest::parse(
                Some(args.action.as_str()),
                Some(args.entity.as_str()),
                Some(args.key.as_str()),
                Some(payload),
            )
        })
        .and_then(|request| update_project(&args.root, &request, &user));

    let response = match result {
        Ok(outcome) => {
            // The update is saved at this point, so logging failures only warn
            if let Some(audit) = &outcome.audit {
                if let Err(err) = activity_log::append(&args.root, audit) {
                    log::warn!("Failed to record activity for {}: {err:#}", args.root.display());
                }
            }
            UpdateResponse::Ok {
                changed: outcome.changed,
                audit: outcome.audit,
            }
        }
        Err(err) => err.into(),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    if matches!(response, UpdateResponse::Error { .. }) {
        std::process::exit(1);
    }
    Ok(())
}

fn run_deps(args: RootArgs) -> Result<()> {
    let dependencies = match persisted_assets(&args.root)? {
        Some(assets) => collect_dependencies(&assets),
        None => Vec::new(),
    };
    println!("{}", serde_json::to_string_pretty(&dependencies)?);
    Ok(())
}

#[derive(Serialize)]
struct HistoryOutput {
    updates: ProjectUpdates,
    entries: Vec<DisplayEntry>,
}

fn run_history(args: HistoryArgs, config: &Config) -> Result<()> {
    let audit = activity_log::read(&args.root)?;
    let commits = GitCli.history(&args.root).unwrap_or_else(|err| {
        log::warn!("Source control history unavailable: {err}");
        Vec::new()
    });
    let entries = display_log(&audit, &commits);
    let output = HistoryOutput {
        updates: project_updates(args.since, &config.user_name(), &entries),
        entries,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_worker(config: &Config) -> Result<()> {
    let worker = ScanWorker::spawn(AssetScanner::new(config.pipeline()?));
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let served = serve_lines(&worker, stdin, tokio::io::stdout()).await?;
    log::info!("Answered {served} scan requests");
    Ok(())
}

impl From<MergeError> for UpdateResponse {
    fn from(err: MergeError) -> Self {
        UpdateResponse::Error {
            hard_failure: err.is_store_failure(),
            message: err.to_string(),
        }
    }
}
