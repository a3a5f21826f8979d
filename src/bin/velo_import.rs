use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::error;
use velo_catalog::cli::import::{self, ImportConfig};
use velo_catalog::orchestrator::ImportMode;
use velo_catalog::telemetry;
use velo_catalog::util::env as env_util;

#[derive(Parser, Debug)]
#[command(
    name = "velo-import",
    version,
    about = "Import bicycle and part batches into the catalog"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Load the `bikes` array of a batch file
    Bikes(ImportArgs),
    /// Load the `parts` array of a batch file
    Parts(ImportArgs),
    /// Load bikes, then link each bike to its listed components
    Full(ImportArgs),
    /// Check a batch file without touching the database
    Validate {
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Batch file (JSON)
    file: PathBuf,
    /// Preview the run; nothing is written
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Print every entry outcome
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
    /// Skip existing records instead of updating them
    #[arg(long, default_value_t = false)]
    no_upsert: bool,
    /// Exit with status 2 when any entry failed
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Use an in-memory store instead of Postgres
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Optional override for the database URL
    #[arg(long)]
    db_url: Option<String>,
    /// Optional override for max pool connections
    #[arg(long)]
    max_connections: Option<u32>,
}

impl ImportArgs {
    fn into_config(self) -> ImportConfig {
        ImportConfig {
            file: self.file,
            dry_run: self.dry_run,
            verbose: self.verbose,
            no_upsert: self.no_upsert,
            strict: self.strict,
            offline: self.offline,
            database_url: self.db_url,
            max_connections: self.max_connections,
        }
    }
}

async fn dispatch(command: Commands) -> Result<i32> {
    let (mode, args) = match command {
        Commands::Validate { file } => {
            import::validate(&ImportConfig {
                file,
                ..Default::default()
            })?;
            return Ok(0);
        }
        Commands::Bikes(args) => (ImportMode::Bikes, args),
        Commands::Parts(args) => (ImportMode::Parts, args),
        Commands::Full(args) => (ImportMode::Full, args),
    };
    let cfg = args.into_config();
    let result = import::run(mode, &cfg).await?;
    Ok(import::exit_code(&result, cfg.strict))
}

fn verbose_requested(command: &Commands) -> bool {
    match command {
        Commands::Bikes(a) | Commands::Parts(a) | Commands::Full(a) => a.verbose,
        Commands::Validate { .. } => false,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    env_util::init_env();
    if let Err(e) = telemetry::init_tracing(telemetry::default_filter(verbose_requested(&cli.command)))
    {
        eprintln!("{e:#}");
    }

    match dispatch(cli.command).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
