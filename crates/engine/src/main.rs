//! Try-on engine - runs one look from a JSON file.
//!
//! Usage: `tryon-engine <look.json>`; the finished job is printed as JSON.

use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tryon_domain::{BatchProgress, BatchStatus, GarmentSelection};
use tryon_engine::infrastructure::{
    clock::SystemClock, compose_http::HttpComposeClient, config::EngineConfig,
    generation_http::HttpGenerationClient, memory_results::InMemoryResultRepo,
};
use tryon_engine::App;

/// A look to try on, as stored on disk
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookFile {
    avatar_ref: Option<String>,
    #[serde(default = "default_compose_mode")]
    compose_mode: bool,
    label: Option<String>,
    pieces: Vec<GarmentSelection>,
}

fn default_compose_mode() -> bool {
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tryon_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EngineConfig::from_env().context("invalid try-on configuration")?;
    tracing::info!(
        generation_url = %config.generation_url,
        compose_url = %config.compose_url,
        cooldown_secs = config.tryon.cooldown_seconds(),
        demo_mode = config.tryon.demo_mode(),
        "Starting try-on engine"
    );

    let look_path = std::env::args()
        .nth(1)
        .context("usage: tryon-engine <look.json>")?;
    let raw = tokio::fs::read_to_string(&look_path)
        .await
        .with_context(|| format!("failed to read {}", look_path))?;
    let look: LookFile =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", look_path))?;

    let app = App::new(
        Arc::new(HttpGenerationClient::new(&config.generation_url)),
        Arc::new(HttpComposeClient::new(&config.compose_url)),
        Arc::new(InMemoryResultRepo::new()),
        Arc::new(SystemClock::new()),
        config.tryon.clone(),
    );

    match app.generation.check_health().await {
        Ok(true) => tracing::info!("Generation service is healthy"),
        Ok(false) => tracing::warn!("Generation service reported unhealthy"),
        Err(e) => tracing::warn!(error = %e, "Generation service health check failed"),
    }

    let mut job = app.new_batch_job(look.pieces, look.avatar_ref, look.compose_mode);
    if let Some(label) = look.label {
        job = job.with_label(label);
    }

    let cancel = CancellationToken::new();
    setup_shutdown_signal(cancel.clone());

    let (tx, mut rx) = mpsc::unbounded_channel::<BatchProgress>();
    let reporter = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            tracing::info!(
                completed = progress.completed,
                total = progress.total,
                status = %progress.status,
                "Batch progress"
            );
        }
    });

    let status = app.use_cases.batch.run(&mut job, &cancel, Some(&tx)).await?;
    drop(tx);
    if let Err(e) = reporter.await {
        tracing::debug!(error = %e, "Progress reporter ended abnormally");
    }

    println!("{}", serde_json::to_string_pretty(&job)?);

    if status == BatchStatus::Failed {
        anyhow::bail!(
            "batch job failed: {}",
            job.failure_reason().unwrap_or("unknown reason")
        );
    }
    Ok(())
}

/// Cancel the running batch on Ctrl+C; the in-flight piece still settles.
fn setup_shutdown_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, cancelling after the current piece...");
                cancel.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to install Ctrl+C handler"),
        }
    });
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides, then fall back to the working directory.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
    let _ = dotenvy::dotenv();
}
