//! Pipeline server binary
//!
//! Run with: cargo run -p rapid-pipeline --bin rapid-pipeline-server

use std::path::Path;
use std::time::Duration;

use rapid_pipeline::config::PipelineConfig;
use rapid_pipeline::output::cleanup_old_files;
use rapid_pipeline::server::PipelineServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rapid_pipeline=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration, falling back to defaults
    let config_path = Path::new("pipeline.toml");
    let config = if config_path.exists() {
        PipelineConfig::from_file(config_path)?
    } else {
        PipelineConfig::default()
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - AI model: {}", config.gemini.model);
    tracing::info!("  - Batch window: {}", config.batch.max_concurrent);
    tracing::info!("  - Combine ceiling: {} chars", config.combine.max_chars);
    tracing::info!("  - Prompt ceiling: {} chars", config.prompt.max_chars);

    // Hourly sweep of generated output files
    let output_dir = config.output.output_dir.clone();
    let max_age = Duration::from_secs(config.output.cleanup_max_age_hours * 3600);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let removed = cleanup_old_files(&output_dir, max_age);
            if removed > 0 {
                tracing::info!("Swept {} stale output files", removed);
            }
        }
    });

    // Create and start the server
    let server = PipelineServer::new(config)?;

    // Hourly prune of completed jobs; failed ones stay for inspection
    let queue = server.state().job_queue().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let pruned = queue.sweep_completed();
            if pruned > 0 {
                tracing::info!("Pruned {} completed jobs", pruned);
            }
        }
    });

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/extract         - Extract text from one file");
    println!("  POST /api/process/batch   - Process a file list with the AI service");
    println!("  POST /api/process/folder  - Process a folder structure synchronously");
    println!("  POST /api/jobs/folder     - Enqueue a folder job");
    println!("  GET  /api/jobs/:id        - Job status and progress");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
