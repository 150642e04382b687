//! Drive Menu CLI: inspect the menu tree built from a folder
//!
//! Usage:
//!   drive-menu-cli tree <dir>                   Print the menu tree with ids
//!   drive-menu-cli show <dir> <token> [--json]  Print one node and its buttons
//!   drive-menu-cli search <dir> <query>         Run a file search
//!   drive-menu-cli watch <dir>                  Keep syncing until Ctrl+C
//!
//! Pass `drive:` as `<dir>` to read from Google Drive with the configured
//! refresh token or access token.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use drive_menu::providers::{GoogleDriveConfig, GoogleDriveStore, LocalFolderStore};
use drive_menu::sync_scheduler::spawn_periodic_sync;
use drive_menu::{AppConfig, ContentProvider, NodeTree, NodeView, RemoteStore, RequesterId};

#[derive(Parser)]
#[command(
    name = "drive-menu-cli",
    about = "Drive Menu CLI: paginated button menus over a folder tree",
    version,
    long_about = "Builds the same menu tree a chat bot would serve and prints it.\nIds are assigned in walk order, so tokens printed by `tree` work with `show` as long as the folder is unchanged."
)]
struct Cli {
    /// Config file (default: ~/.config/drive-menu/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the maximum body length in characters
    #[arg(long, global = true)]
    max_body_len: Option<usize>,

    /// Override the number of files listed per page
    #[arg(long, global = true)]
    max_files_per_page: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

/// Source argument value that selects Google Drive
const DRIVE_SOURCE: &str = "drive:";

#[derive(Args)]
struct Source {
    /// Local folder to mirror, or `drive:` for the configured Google Drive folder
    dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the menu tree with ids, labels and body lengths
    Tree {
        #[command(flatten)]
        source: Source,
    },
    /// Print the body and buttons of the node a token points at
    Show {
        #[command(flatten)]
        source: Source,
        /// Button token (e.g., 1_3)
        token: String,
        /// Print the node as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search file names in the root folder
    Search {
        #[command(flatten)]
        source: Source,
        /// Text the file name must contain
        query: String,
        /// Requester the result is cached for
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        requester: RequesterId,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep syncing on an interval until Ctrl+C
    Watch {
        #[command(flatten)]
        source: Source,
        /// Seconds between syncs (default: sync_interval_secs from config)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env();
            config
        }
        None => AppConfig::load().context("Failed to load config")?,
    };
    if let Some(max_body_len) = cli.max_body_len {
        config.limits.max_body_len = max_body_len;
    }
    if let Some(max_files_per_page) = cli.max_files_per_page {
        config.limits.max_files_per_page = max_files_per_page;
    }
    config.validate()?;
    Ok(config)
}

fn open_store(source: &Source, config: &AppConfig) -> Result<Arc<dyn RemoteStore>> {
    let dir = &source.dir;
    if dir.as_os_str() == DRIVE_SOURCE {
        let drive = GoogleDriveConfig::from_drive_settings(&config.drive)?;
        return Ok(Arc::new(GoogleDriveStore::new(drive)?));
    }
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    Ok(Arc::new(LocalFolderStore::new(dir.clone())))
}

fn print_tree(tree: &NodeTree) {
    let mut stack = vec![(tree.root_id(), 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        let label = if node.is_root() && node.label.is_empty() { "(root)" } else { node.label.as_str() };
        println!("{}{} {} [{} chars]", "  ".repeat(depth), id, label, node.body_len());
        let children = node.entries.iter().rev().filter_map(|link| link.content_id());
        stack.extend(children.map(|child| (child, depth + 1)));
    }
}

fn print_view(view: &NodeView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&view.snapshot())?);
        return Ok(());
    }
    println!("{}", view.body());
    println!();
    for button in view.buttons() {
        println!("  [{}]  {}", button.label, button.token());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Tree { source } => {
            let provider = ContentProvider::start(open_store(source, &config)?, &config).await?;
            print_tree(&*provider.tree().await);
        }
        Commands::Show { source, token, json } => {
            let provider = ContentProvider::start(open_store(source, &config)?, &config).await?;
            match provider.resolve(token).await {
                Some(view) => print_view(&view, *json)?,
                None => bail!("No node for token {:?}", token),
            }
        }
        Commands::Search {
            source,
            query,
            requester,
            json,
        } => {
            let provider = ContentProvider::new(open_store(source, &config)?, &config);
            let view = provider.search(*requester, query).await?;
            print_view(&view, *json)?;
        }
        Commands::Watch {
            source,
            interval_secs,
        } => {
            let provider = Arc::new(ContentProvider::start(open_store(source, &config)?, &config).await?);
            let secs = interval_secs.unwrap_or(config.sync_interval_secs);
            if secs == 0 {
                bail!("Sync interval must be greater than zero");
            }
            println!("Generation {}: {} nodes", provider.generation(), provider.tree().await.len());

            let cancel = CancellationToken::new();
            let handle = spawn_periodic_sync(provider.clone(), Duration::from_secs(secs), cancel.clone());
            tokio::signal::ctrl_c().await?;
            cancel.cancel();
            handle.await?;

            if let Some(at) = provider.last_sync().await {
                println!("Generation {}, last sync at {}", provider.generation(), at.to_rfc3339());
            }
        }
    }
    Ok(())
}
