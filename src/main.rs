use anyhow::Context;
use cacao_match::{
    Catalog, CatalogPaths, CrossSellRecommender, CrossSellResult, EngineConfig, EngineError,
    SearchEngine, SearchOptions, SearchReport, SearchStatus,
};
use cacao_engine::TracingProgress;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Explainable product matching and cross-sell recommendations
#[derive(Parser, Debug)]
#[command(name = "cacao-match")]
#[command(about = "Match requirements against the product catalog", long_about = None)]
struct Args {
    /// Directory holding the reference CSV tables
    #[arg(short, long, default_value = "./reference_data")]
    data_dir: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find products matching a JSON requirement profile
    Match {
        /// Requirement file, or `-` for stdin
        #[arg(short, long)]
        requirement: PathBuf,

        /// Re-rank results with neutral credit for unrequested attributes
        #[arg(long)]
        similarity: bool,

        #[arg(long)]
        top_n: Option<usize>,

        /// Also recommend cross-sell products for the top match
        #[arg(long)]
        with_cross_sell: bool,
    },
    /// Recommend products that pair well with a material code
    CrossSell {
        material_code: String,

        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Print a summary of the loaded catalog
    Catalog,
}

#[derive(Serialize)]
struct MatchOutput {
    #[serde(flatten)]
    report: SearchReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    cross_sell: Option<Vec<CrossSellResult>>,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting cacao-match v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("invalid configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let catalog = Catalog::load(&CatalogPaths::from_dir(&args.data_dir))
        .with_context(|| format!("failed to load catalog from {}", args.data_dir.display()))?;
    let catalog = Arc::new(catalog);
    info!("Catalog loaded: {} products", catalog.len());

    let progress = Arc::new(TracingProgress);
    let recommender = CrossSellRecommender::with_config(catalog.clone(), config.cross_sell.clone())
        .with_progress(progress.clone());

    match args.command {
        Command::Match { requirement, similarity, top_n, with_cross_sell } => {
            let engine = SearchEngine::with_config(catalog, &config)?.with_progress(progress);
            let json = read_requirement(&requirement)?;

            let mut options = if similarity { SearchOptions::similarity() } else { SearchOptions::default() };
            options.top_n = top_n;
            let report = engine.search_json(&json, &options);

            let cross_sell = match report.matches.first() {
                Some(top) if with_cross_sell => Some(recommender.recommend(&top.material_code)?),
                _ => None,
            };
            let failed = matches!(report.status, SearchStatus::Failed(_));

            print_json(&MatchOutput { report, cross_sell })?;
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
        Command::CrossSell { material_code, top_n } => {
            let results = match top_n {
                Some(n) => recommender.recommend_top(&material_code, n),
                None => recommender.recommend(&material_code),
            };
            match results {
                Ok(results) => {
                    print_json(&results)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(EngineError::NotFound(code)) => {
                    eprintln!("material code not found: {}", code);
                    Ok(ExitCode::from(2))
                }
                Err(e) => Err(e.into()),
            }
        }
        Command::Catalog => {
            print_json(&catalog.summary())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_requirement(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut json = String::new();
        std::io::stdin().read_to_string(&mut json).context("failed to read requirement from stdin")?;
        Ok(json)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read requirement {}", path.display()))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
