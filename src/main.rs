use aidx_api::RestApi;
use aidx_core::CaseProfile;
use aidx_engine::{load_cases, DecisionEngine, EngineConfig};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Similarity-based decision support for welfare-aid cases
#[derive(Parser, Debug)]
#[command(name = "aidx")]
#[command(about = "Recommend welfare-aid decisions from similar past cases", long_about = None)]
struct Args {
    /// Directory holding the persisted corpus
    #[arg(long, env = "AIDX_MODEL_DIR", default_value = "./model_cache", global = true)]
    model_dir: PathBuf,

    /// Log level (ignored when RUST_LOG is set)
    #[arg(long, env = "AIDX_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Number of similar cases that vote on a recommendation
    #[arg(long, env = "AIDX_TOP_K", default_value_t = aidx_engine::DEFAULT_TOP_K, global = true)]
    top_k: usize,

    /// Width of the hashing embedder's vectors
    #[arg(long, env = "AIDX_EMBEDDING_DIM", default_value_t = aidx_engine::DEFAULT_EMBEDDING_DIM, global = true)]
    embedding_dim: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed historical cases and persist them to the model directory
    Train {
        /// Historical cases: a JSON array, or a CSV file with a header row
        #[arg(long, env = "AIDX_DATA")]
        data: PathBuf,
    },
    /// Print the recommendation for one case
    Predict {
        /// JSON object describing the case
        #[arg(long, env = "AIDX_CASE")]
        case: PathBuf,
    },
    /// Print statistics of the persisted corpus
    Stats,
    /// Serve the REST API
    Serve {
        #[arg(long, env = "AIDX_HTTP_PORT", default_value_t = 8080)]
        http_port: u16,
    },
}

fn init_logging(log_level: &str) -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        return Ok(());
    }

    let log_level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting aidx v{}", env!("CARGO_PKG_VERSION"));
    info!("Model directory: {:?}", args.model_dir);

    let config = EngineConfig {
        top_k: args.top_k,
        model_dir: args.model_dir,
        embedding_dim: args.embedding_dim,
        ..EngineConfig::default()
    };
    let engine = Arc::new(DecisionEngine::with_hashing_embedder(config)?);

    match args.command {
        Command::Train { data } => {
            let cases = load_cases(&data)
                .with_context(|| format!("failed to read cases from {}", data.display()))?;
            let stats = engine.train(cases)?;
            let metadata = engine.save_to_model_dir()?;
            info!(snapshot_id = %metadata.snapshot_id, "corpus saved");
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Predict { case } => {
            let raw = std::fs::read_to_string(&case)
                .with_context(|| format!("failed to read {}", case.display()))?;
            let query: CaseProfile = serde_json::from_str(&raw)?;
            engine.load_from_model_dir()?;
            let prediction = engine.predict(&query);
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        Command::Stats => {
            engine.load_from_model_dir()?;
            println!("{}", serde_json::to_string_pretty(&engine.stats()?)?);
        }
        Command::Serve { http_port } => {
            let report = engine
                .load_from_model_dir()
                .context("cannot serve without a trained corpus")?;
            info!("Loaded {} cases (model {})", report.cases, report.stored_model_id);

            let engine_http = engine.clone();
            let http_handle = std::thread::spawn(move || {
                info!("Starting HTTP server on port {}", http_port);
                let sys = actix_web::rt::System::new();
                sys.block_on(async {
                    if let Err(e) = RestApi::start(engine_http, http_port).await {
                        eprintln!("HTTP server error: {}", e);
                    }
                })
            });

            info!("HTTP API: http://localhost:{}/", http_port);

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                }
                _ = tokio::task::spawn_blocking(move || {
                    http_handle.join().ok();
                }) => {
                    info!("HTTP server stopped");
                }
            }

            info!("Shutting down...");
        }
    }

    Ok(())
}
