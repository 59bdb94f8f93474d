mod commands;
mod progress;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skytally")]
#[command(about = "Multi-account AWS inventory, published to Google Sheets", long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: discovered, see `validate`)
    #[arg(short, long, global = true, env = "SKYTALLY_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the inventory and publish one tab per service
    Collect(CollectArgs),
    /// Compare two published snapshots of a service
    Diff(DiffArgs),
    /// List the region catalogue
    Regions {
        /// Ask the EC2 API which regions are enabled
        #[arg(long)]
        discover: bool,
    },
    /// Validate the configuration
    Validate,
    /// Show version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct CollectArgs {
    /// Services to collect (compute, object-storage, database, virtual-desktop
    /// or the aliases ec2, s3, rds, workspaces)
    #[arg(short, long, value_delimiter = ',')]
    pub services: Option<Vec<String>>,

    /// Restrict to these configured account IDs
    #[arg(short, long, value_delimiter = ',')]
    pub accounts: Option<Vec<String>>,

    /// Number of units collected at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Publish into memory and print what would be written
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Service name or alias
    #[arg(long)]
    pub service: String,

    /// Older snapshot date (YYYYMMDD)
    #[arg(long)]
    pub source: String,

    /// Newer snapshot date (YYYYMMDD); its tab is highlighted
    #[arg(long)]
    pub target: String,

    /// Compare on this single column instead of the composite key
    #[arg(long)]
    pub key: Option<String>,

    /// Also report common rows whose fields differ
    #[arg(long)]
    pub compare_fields: bool,

    /// Do not annotate the target tab
    #[arg(long)]
    pub no_highlight: bool,

    /// Print the diff result as JSON
    #[arg(long)]
    pub json: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr、レポートは stdout
    init_tracing(cli.verbose);

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("skytally {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if let Commands::Regions { discover } = cli.command {
        return commands::regions::handle(discover).await;
    }

    let config = match skytally_config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "✗ Configuration error:".red().bold(), e);
            std::process::exit(2);
        }
    };

    match cli.command {
        Commands::Collect(args) => commands::collect::handle(config, args).await?,
        Commands::Diff(args) => commands::diff::handle(&config, args).await?,
        Commands::Validate => commands::validate::handle(&config, cli.config.as_deref())?,
        Commands::Regions { .. } | Commands::Version => {
            unreachable!("handled before config loading")
        }
    }

    Ok(())
}
