//! medspec CLI - medical specialty classification server
//!
//! # Commands
//!
//! - `serve` - Load the model and start the HTTP server
//! - `predict` - Classify one text from the command line
//! - `info` - Show version info
//!
//! Logging goes to stderr; set `RUST_LOG` (e.g. `RUST_LOG=medspec=debug`)
//! to change verbosity.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use medspec::{
    api::{create_router, AppState},
    classifier::{predict_specialty, Classifier},
    config::{
        DevicePreference, ModelConfig, ServerConfig, DEFAULT_HOST, DEFAULT_MAX_LENGTH,
        DEFAULT_MODEL_DIR, DEFAULT_PORT,
    },
    demo::KeywordClassifier,
    error::{MedspecError, Result},
    model_loader,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// medspec - medical specialty classifier for Arabic clinical text
#[derive(Parser)]
#[command(name = "medspec")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Model selection shared by `serve` and `predict`
#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Directory with config.json, tokenizer.json, weights and labels
    #[arg(short, long, env = "MEDSPEC_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,

    /// Inference device
    #[arg(
        long,
        env = "MEDSPEC_DEVICE",
        value_enum,
        ignore_case = true,
        default_value_t = DevicePreference::Auto
    )]
    device: DevicePreference,

    /// Maximum tokens per input; longer texts are truncated
    #[arg(long, env = "MEDSPEC_MAX_LENGTH", default_value_t = DEFAULT_MAX_LENGTH)]
    max_length: usize,

    /// Use the built-in keyword classifier instead of a checkpoint
    #[arg(long)]
    demo: bool,
}

impl ModelArgs {
    fn model_config(&self) -> ModelConfig {
        ModelConfig::new(self.model_dir.clone())
            .with_device(self.device)
            .with_max_length(self.max_length)
    }
}

/// Output format for `predict`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable table
    Text,
    /// Same body as POST /api/predict
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the classification server
    ///
    /// Examples:
    ///   medspec serve --demo
    ///   medspec serve --model-dir ./fine_tuned_marbert_medical_specialty --port 8080
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, env = "MEDSPEC_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind to
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Directory whose index.html / result.html replace the built-in pages
        #[arg(long, env = "MEDSPEC_TEMPLATES_DIR")]
        templates_dir: Option<PathBuf>,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Classify a single text
    ///
    /// Examples:
    ///   medspec predict --demo "أعاني من صداع مستمر"
    ///   medspec predict --format json "ألم في الصدر"
    Predict {
        /// Text to classify
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Show version info
    Info,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Serve {
            host,
            port,
            templates_dir,
            model,
        } => {
            let config = ServerConfig {
                host,
                port,
                model: model.model_config(),
                templates_dir,
            };
            serve(config, model.demo).await?;
        },
        Commands::Predict {
            text,
            format,
            model,
        } => {
            run_predict(&model, &text, format)?;
        },
        Commands::Info => {
            println!("medspec v{}", medspec::VERSION);
            println!("Medical specialty classification for Arabic clinical text");
            println!();
            println!("Backends:");
            if cfg!(feature = "bert") {
                println!("  - BERT sequence classifier (candle)");
            } else {
                println!("  - BERT sequence classifier (disabled; rebuild with --features bert)");
            }
            println!("  - Keyword demo classifier (--demo)");
            println!("CUDA: {}", if cfg!(feature = "cuda") { "enabled" } else { "disabled" });
        },
    }

    Ok(())
}

async fn serve(config: ServerConfig, demo: bool) -> Result<()> {
    config.validate()?;
    info!(version = medspec::VERSION, "starting medical specialty classifier");

    let model: Option<Arc<dyn Classifier>> = if demo {
        info!("serving the keyword demo classifier");
        let classifier: Arc<dyn Classifier> = Arc::new(KeywordClassifier::new());
        model_loader::load_report(&*classifier);
        Some(classifier)
    } else {
        model_loader::load_or_degrade(&config.model)
    };
    if model.is_none() {
        warn!("no model loaded; /health will report unhealthy until restarted with a model");
    }

    let addr = config.resolve_addr().await?;
    let state = AppState::new(model, config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MedspecError::IoError {
            message: format!("Failed to bind {addr}: {e}"),
        })?;

    info!(%addr, "listening");
    info!("endpoints: GET /, POST /predict, POST /api/predict, GET /health, GET /debug-info");

    axum::serve(listener, app)
        .await
        .map_err(|e| MedspecError::IoError {
            message: format!("Server error: {e}"),
        })?;

    Ok(())
}

fn run_predict(args: &ModelArgs, text: &str, format: OutputFormat) -> Result<()> {
    let classifier: Arc<dyn Classifier> = if args.demo {
        Arc::new(KeywordClassifier::new())
    } else {
        model_loader::load_model(&args.model_config())?
    };

    let prediction = predict_specialty(&*classifier, text)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&prediction).map_err(|e| {
                MedspecError::InferenceError(format!("Failed to serialize prediction: {e}"))
            })?;
            println!("{json}");
        },
        OutputFormat::Text => {
            println!(
                "Specialty: {} ({:.2}%)",
                prediction.specialty, prediction.confidence
            );
            println!();
            for (name, percent) in prediction.ranked() {
                println!("  {name:<24} {percent:>6.2}%");
            }
        },
    }

    Ok(())
}
