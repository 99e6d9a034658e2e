use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use micro_tasks::{
    create_router, sample_or_default, AppState, Config, HttpSampleSource, NoiseGate,
    RecordingSettings, SimulatedNoiseSource, TaskStore,
};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "micro-tasks", version, about = "Guided audio data-collection micro-tasks")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/micro-tasks")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API for task screens
    Serve,
    /// Run one ambient noise check and print the reading
    NoiseCheck {
        /// Seed for a reproducible simulated run
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Fetch one sample item and print it as JSON
    Sample,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Loaded config: {}", cfg.service.name);

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::NoiseCheck { seed } => {
            let source = match seed {
                Some(seed) => SimulatedNoiseSource::seeded(seed),
                None => SimulatedNoiseSource::new(),
            };
            let reading = NoiseGate::new(source).run().await;
            println!("Average: {:.1} dB", reading.average);
            println!("{}", reading.message());
            Ok(())
        }
        Command::Sample => {
            let source = HttpSampleSource::new(&cfg.samples.url)?;
            let item = sample_or_default(&source).await;
            println!("{}", serde_json::to_string_pretty(&item)?);
            Ok(())
        }
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let output_dir = cfg.recording.recordings_dir()?;
    std::fs::create_dir_all(&output_dir).context("Failed to create recordings directory")?;
    info!("Recordings directory: {}", output_dir.display());

    let samples = HttpSampleSource::new(&cfg.samples.url)?;
    let state = AppState::new(
        TaskStore::new(),
        Arc::new(samples),
        RecordingSettings {
            output_dir,
            sample_rate: cfg.recording.sample_rate,
            channels: cfg.recording.channels,
        },
        Box::new(SimulatedNoiseSource::new()),
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
