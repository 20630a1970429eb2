use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use cicsprobe_lib::candidates::load_candidates;
use cicsprobe_lib::config::{ConfigStorage, ScanConfig};
use cicsprobe_lib::engine::run_enumeration;
use cicsprobe_lib::enumerate::probe_target;
use cicsprobe_lib::tn3270::Tn3270Session;

/// Find the transactions a CICS region accepts
#[derive(Parser, Debug)]
#[command(name = "cicsprobe", version, about)]
struct Cli {
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the init commands reach CICS
    Probe(TargetArgs),

    /// Probe, then try every transaction ID
    Enumerate {
        #[command(flatten)]
        target: TargetArgs,

        /// Extra transaction IDs, one per line (# starts a comment)
        #[arg(long)]
        idlist: Option<PathBuf>,

        /// Concurrent sessions
        #[arg(long)]
        threads: Option<usize>,

        /// Save screens of valid transactions to this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Stop at the first valid transaction
        #[arg(long)]
        stop_on_first: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file with default settings
    InitConfig {
        /// Target host to put in the file
        host: String,

        /// Where to write (default: ~/.cicsprobe/config.json)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Target host
    host: Option<String>,

    /// TN3270 port
    #[arg(short, long)]
    port: Option<u16>,

    /// Commands that reach CICS, separated by ';'
    #[arg(short, long)]
    commands: Option<String>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl TargetArgs {
    /// Config file values, overridden by flags
    async fn resolve(&self) -> Result<ScanConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => ConfigStorage::with_path(path).load().await?,
            None => ScanConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(commands) = &self.commands {
            config.commands = commands.clone();
        }
        Ok(config)
    }
}

fn new_session(config: &ScanConfig) -> Tn3270Session {
    Tn3270Session::new(config.connect_timeout(), config.tuning.drain_timeout())
}

async fn probe(config: &ScanConfig) -> bool {
    let mut session = new_session(config);
    let outcome = probe_target(
        &mut session,
        &config.host,
        config.port,
        &config.init_commands(),
        &config.tuning,
    )
    .await;

    if outcome.is_reachable() {
        info!("{}:{} is a CICS region", config.host, config.port);
    } else {
        error!("{}:{}: {}", config.host, config.port, outcome);
    }
    outcome.is_reachable()
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    match cli.command {
        Commands::Probe(target) => {
            let config = target.resolve().await?;
            config.validate()?;
            let reachable = probe(&config).await;
            Ok(if reachable {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Enumerate {
            target,
            idlist,
            threads,
            output_dir,
            stop_on_first,
            json,
        } => {
            let mut config = target.resolve().await?;
            if idlist.is_some() {
                config.idlist = idlist;
            }
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if output_dir.is_some() {
                config.output_dir = output_dir;
            }
            config.stop_on_first |= stop_on_first;
            config.validate()?;

            if !probe(&config).await {
                return Ok(ExitCode::FAILURE);
            }

            let candidates = load_candidates(config.idlist.as_deref()).await?;
            let session_config = config.clone();
            let report =
                run_enumeration(&config, candidates, move || new_session(&session_config)).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render_text());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::InitConfig { host, path } => {
            let storage = match path {
                Some(path) => ConfigStorage::with_path(path),
                None => ConfigStorage::new()?,
            };
            let config = ScanConfig {
                host,
                ..ScanConfig::default()
            };
            storage.save(&config).await?;
            println!("Wrote {}", storage.path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cicsprobe_lib::init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
