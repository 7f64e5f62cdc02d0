use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use starterator_verify::config::{ConfigLoader, VerifyConfig};
use starterator_verify::conservation;
use starterator_verify::domain::Dataset;
use starterator_verify::error::VerifyError;
use starterator_verify::ids::{extract_listing_ids, load_ids, write_ids};
use starterator_verify::output::{JsonOutput, LogSink, OutputMode, TextOutput};
use starterator_verify::provider::CachedProvider;
use starterator_verify::starterator::{StarteratorClient, StarteratorHttpClient};
use starterator_verify::store::Store;
use starterator_verify::verify::Verifier;

const EXIT_MISMATCHES: u8 = 4;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "stv")]
#[command(about = "Fetch Starterator pham datasets and cross-check their start conservation")]
#[command(version)]
struct Cli {
    /// Print structured JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to a starterator-verify.json settings file.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Manage the list of known pham ids")]
    Ids(IdsArgs),
    #[command(about = "Re-download every listed pham into the local cache")]
    Update,
    #[command(about = "Verify conservation for a sample of phams")]
    Verify(VerifyArgs),
    #[command(about = "Verify conservation in a single local JSON file")]
    Check(CheckArgs),
}

#[derive(Args)]
struct IdsArgs {
    #[command(subcommand)]
    command: IdsCommand,
}

#[derive(Subcommand)]
enum IdsCommand {
    #[command(about = "Scrape the server listing and rewrite the id list")]
    Fetch,
    #[command(about = "Print the id list")]
    List,
}

#[derive(Args, Clone)]
struct VerifyArgs {
    /// Number of phams to sample (0 checks all).
    #[arg(long, conflicts_with = "all")]
    sample: Option<usize>,

    #[arg(long)]
    all: bool,

    /// Emit a progress update every N phams.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Use cached JSON files only.
    #[arg(long)]
    offline: bool,

    /// Re-download the selected phams before checking them.
    #[arg(long, conflicts_with = "offline")]
    refresh: bool,

    /// Check every pham in the local cache instead of the id list.
    #[arg(long)]
    cached: bool,

    #[arg(long)]
    tolerance: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct CheckArgs {
    file: Utf8PathBuf,

    #[arg(long)]
    tolerance: Option<f64>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(err) = report.downcast_ref::<VerifyError>() {
                return ExitCode::from(map_exit_code(err));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &VerifyError) -> u8 {
    match error {
        VerifyError::MissingIdList(_) | VerifyError::DatasetNotFound(_) => 2,
        VerifyError::ServerHttp(_) | VerifyError::ServerStatus { .. } => 3,
        _ => 1,
    }
}

/// `RUST_LOG` when set, otherwise `info` so progress and skip warnings show.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Ids(args) => run_ids(args, &config, output_mode),
        Commands::Update => run_update(&config, output_mode),
        Commands::Verify(args) => run_verify(args, config, output_mode),
        Commands::Check(args) => run_check(args, &config, output_mode),
    }
}

fn run_ids(
    args: IdsArgs,
    config: &VerifyConfig,
    output_mode: OutputMode,
) -> miette::Result<ExitCode> {
    let store = Store::new()?;
    let path = store.id_list_path();
    match args.command {
        IdsCommand::Fetch => {
            let client = StarteratorHttpClient::new(&config.base_url)?;
            let ids = extract_listing_ids(&client.fetch_listing()?);
            store.ensure_project_root()?;
            let written = write_ids(&path, &ids)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_json(&ids).into_diagnostic()?,
                OutputMode::Text if written => {
                    println!("Wrote {} pham ids to {path}", ids.len())
                }
                OutputMode::Text => println!("No pham ids found on server; {path} not updated."),
            }
        }
        IdsCommand::List => {
            let ids = load_ids(&path)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_json(&ids).into_diagnostic()?,
                OutputMode::Text => {
                    for id in &ids {
                        println!("{id}");
                    }
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_update(config: &VerifyConfig, output_mode: OutputMode) -> miette::Result<ExitCode> {
    let store = Store::new()?;
    let ids = load_ids(&store.id_list_path())?;
    let client = StarteratorHttpClient::new(&config.base_url)?;
    let provider = CachedProvider::new(store, client, config.provider_options());
    let summary = provider.refresh_all(&ids);
    match output_mode {
        OutputMode::Json => JsonOutput::print_json(&summary).into_diagnostic()?,
        OutputMode::Text => println!(
            "Finished refresh: {}/{} phams downloaded successfully.",
            summary.succeeded, summary.requested
        ),
    }
    Ok(ExitCode::SUCCESS)
}

fn run_verify(
    args: VerifyArgs,
    mut config: VerifyConfig,
    output_mode: OutputMode,
) -> miette::Result<ExitCode> {
    if args.all {
        config.sample_size = None;
    } else if let Some(sample) = args.sample {
        config.sample_size = (sample > 0).then_some(sample);
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if args.offline {
        config.use_network = false;
    }
    if args.refresh {
        config.refresh = true;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let store = Store::new()?;
    let ids = if args.cached {
        store.list_cached_ids()?
    } else {
        load_ids(&store.id_list_path())?
    };
    let client = StarteratorHttpClient::new(&config.base_url)?;
    let verifier = Verifier::new(CachedProvider::new(store, client, config.provider_options()));

    let report = match output_mode {
        OutputMode::Json => {
            let report = verifier.run(&ids, &config, &JsonOutput);
            JsonOutput::print_report(&report).into_diagnostic()?;
            report
        }
        OutputMode::Text => {
            let report = verifier.run(&ids, &config, &LogSink);
            print!("{}", TextOutput::render_report(&report));
            report
        }
    };

    if report.has_mismatches() {
        return Ok(ExitCode::from(EXIT_MISMATCHES));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_check(
    args: CheckArgs,
    config: &VerifyConfig,
    output_mode: OutputMode,
) -> miette::Result<ExitCode> {
    let bytes = std::fs::read(args.file.as_std_path())
        .map_err(|err| VerifyError::Filesystem(format!("read {}: {err}", args.file)))?;
    let dataset = Dataset::from_slice(&bytes)?;
    let fallback = args.file.file_stem().unwrap_or(args.file.as_str());
    let config = VerifyConfig {
        tolerance: args.tolerance.unwrap_or(config.tolerance),
        ..config.clone()
    };
    config.validate()?;
    let report = conservation::compare(&dataset, fallback, config.tolerance)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_comparison(&report).into_diagnostic()?,
        OutputMode::Text => print!("{}", TextOutput::render_comparison(&report)),
    }

    if report.is_agreement() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_MISMATCHES))
    }
}
