pub mod api;
pub mod config;
pub mod pipeline;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::{start_server_on, ApiLimits, ServerError};
use crate::config::{AppConfig, ConfigError};
use crate::pipeline::evaluation::{load_embedder, EvaluationError, Evaluator};

/// Anything that stops the service from coming up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Install the global `tracing` subscriber. Call once, from the binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load the configured embedder and lexicons into an `Evaluator`.
///
/// Must run outside any tokio runtime: the remote embedder owns a
/// blocking HTTP client.
pub fn build_evaluator(config: &AppConfig) -> Result<Evaluator, StartupError> {
    let embedder = load_embedder(&config.embedding)?;
    let evaluator = Evaluator::with_embedder(embedder);

    let evaluator = match &config.lexicon_path {
        Some(path) => {
            let (ontology, negations) = config::load_lexicon(path)?;
            evaluator.with_lexicons(ontology, negations)
        }
        None => evaluator,
    };

    tracing::info!(
        embedding_model = evaluator.embedding_model(),
        terms = evaluator.ontology().len(),
        negations = evaluator.negations().len(),
        "Evaluator ready"
    );
    Ok(evaluator)
}

/// Serve the API until Ctrl-C.
pub fn run(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    // A remote embedder's blocking client must not be dropped on an async
    // worker: build it before the runtime and drop it after.
    let evaluator = Arc::new(build_evaluator(&config)?);
    let limits = ApiLimits::from_config(&config);
    let bind_addr = config.bind_addr;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on({
        let evaluator = Arc::clone(&evaluator);
        async move {
            let mut server = start_server_on(evaluator, bind_addr, limits).await?;
            tracing::info!(addr = %server.addr(), "Listening");

            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Cannot listen for Ctrl-C: {e}");
            }

            server.shutdown();
            server.stopped().await;
            Ok::<(), StartupError>(())
        }
    })?;

    drop(runtime);
    drop(evaluator);
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
