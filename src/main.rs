//! Flow Router Simulator - Main Entry Point

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;

use flow_router_sim::constants::*;
use flow_router_sim::logic::config::SimConfig;
use flow_router_sim::logic::error::RouterError;
use flow_router_sim::logic::replay_loop::ReplayDriver;

#[derive(Parser)]
#[command(name = "flow-router-sim")]
#[command(version)]
#[command(about = "Replays recorded flows through a pre-trained scoring model", long_about = None)]
struct Cli {
    /// Fitted transformer parameters (JSON)
    #[arg(long, env = "ROUTER_TRANSFORMER_PATH", default_value = DEFAULT_TRANSFORMER_PATH)]
    transformer: PathBuf,

    /// Classifier artifact (.onnx or .json)
    #[arg(long, env = "ROUTER_CLASSIFIER_PATH", default_value = DEFAULT_CLASSIFIER_PATH)]
    classifier: PathBuf,

    /// ONNX output holding the class probabilities
    #[arg(long, env = "ROUTER_CLASSIFIER_OUTPUT")]
    classifier_output: Option<String>,

    /// Replay dataset (CSV with header)
    #[arg(long, env = "ROUTER_DATASET_PATH", default_value = DEFAULT_DATASET_PATH)]
    dataset: PathBuf,

    /// Ground-truth label column
    #[arg(long, env = "ROUTER_LABEL_COLUMN", default_value = DEFAULT_LABEL_COLUMN)]
    label_column: String,

    /// Rows loaded into the replay buffer
    #[arg(long, env = "ROUTER_MAX_ROWS", default_value_t = DEFAULT_MAX_ROWS)]
    max_rows: usize,

    /// Probability at or above which a flow is blocked
    #[arg(long, env = "ROUTER_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    threshold: f32,

    /// Label value that marks a flow as benign (case-sensitive)
    #[arg(long, env = "ROUTER_BENIGN_LABEL", default_value = DEFAULT_BENIGN_LABEL)]
    benign_label: String,

    /// Minimum inter-arrival delay (seconds)
    #[arg(long, env = "ROUTER_MIN_DELAY_SECS", default_value_t = DEFAULT_MIN_DELAY_SECS)]
    min_delay: f64,

    /// Maximum inter-arrival delay (seconds)
    #[arg(long, env = "ROUTER_MAX_DELAY_SECS", default_value_t = DEFAULT_MAX_DELAY_SECS)]
    max_delay: f64,

    /// Treat a malformed flow as fatal instead of skipping it
    #[arg(long, env = "ROUTER_STRICT")]
    strict: bool,

    /// RNG seed for a reproducible replay
    #[arg(long, env = "ROUTER_SEED")]
    seed: Option<u64>,

    /// Write every decision to a JSONL log
    #[arg(long = "record", env = "ROUTER_RECORD_DECISIONS")]
    record_decisions: bool,

    /// Directory of the JSONL decision log
    #[arg(long, env = "ROUTER_DECISION_LOG_DIR")]
    decision_log_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> SimConfig {
        SimConfig {
            transformer_path: self.transformer,
            classifier_path: self.classifier,
            classifier_output: self.classifier_output,
            dataset_path: self.dataset,
            label_column: self.label_column,
            max_rows: self.max_rows,
            threshold: self.threshold,
            benign_label: self.benign_label,
            min_delay_secs: self.min_delay,
            max_delay_secs: self.max_delay,
            strict: self.strict,
            seed: self.seed,
            record_decisions: self.record_decisions,
            decision_log_dir: self.decision_log_dir.unwrap_or_else(default_decision_log_dir),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = Cli::parse().into_config();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    let code = runtime.block_on(run(config));
    std::process::exit(code);
}

async fn run(config: SimConfig) -> i32 {
    let mut driver = match ReplayDriver::new(config) {
        Ok(driver) => driver,
        Err(e) => {
            log::error!("{}", e);
            return match e {
                RouterError::Config(_) => EXIT_CONFIG,
                _ => EXIT_FATAL,
            };
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                log::warn!("Ctrl-C handler unavailable: {}", e);
                // Keep the sender alive so the replay is not cancelled
                let _keep = shutdown_tx;
                std::future::pending::<()>().await;
            }
        }
    });

    match driver.run(shutdown_rx).await {
        Ok(_) => 0,
        Err(_) => EXIT_FATAL,
    }
}
