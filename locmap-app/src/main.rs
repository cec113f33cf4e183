use anyhow::{bail, Context};
use clap::Parser;
use locmap::{
    AppConfig, EngineFactory, HeadlessFactory, HttpFetcher, LifecycleState, MapApp, MapEvent,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Headless location-map viewer: loads the feature collection, lists it and
/// optionally focuses the map on one entry.
#[derive(Debug, Parser)]
#[command(name = "locmap-app", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Feature collection endpoint (overrides the config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Mount target id (overrides the config file)
    #[arg(long)]
    container: Option<String>,

    /// Focus the map on the entry at this list index
    #[arg(short, long)]
    focus: Option<usize>,
}

impl Cli {
    fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_path(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => AppConfig::default(),
        };

        if let Some(url) = &self.url {
            config.data.url = url.clone();
        }
        if let Some(container) = &self.container {
            config.map.container = container.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    locmap::init_logging();

    let cli = Cli::parse();
    let config = cli.app_config()?;
    log::info!("Loading locations from {}", config.data.url);

    let factory = HeadlessFactory::new();
    let engines: Arc<dyn EngineFactory> = Arc::new(factory.clone());
    let fetcher = Arc::new(HttpFetcher::new()?);
    let container = config.map.container.clone();

    let mut app = MapApp::new(config, engines, fetcher);
    app.on("fetchfailed", |event| {
        if let MapEvent::FetchFailed { url, message } = event {
            eprintln!("Could not load {}: {}", url, message);
        }
    });

    app.mount()?;
    tokio::select! {
        settled = app.settle() => {
            settled?;
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted");
            return Ok(());
        }
    }

    if app.state() == LifecycleState::Unmounted {
        bail!("map could not be created on '{}'", container);
    }

    let entries = app.entries();
    if entries.is_empty() {
        println!("No locations loaded.");
    }
    for (index, entry) in entries.iter().enumerate() {
        println!("{:>3}  {}", index, entry);
    }

    if let Some(index) = cli.focus {
        let data = app.data().context("no locations to focus on")?;
        app.sidebar().select_index(&data, index)?;
    }

    let Some(probe) = factory.probe(&container) else {
        return Ok(());
    };
    println!();
    println!("map '{}'", probe.container());
    println!("  sources: {}", probe.source_ids().join(", "));
    println!("  layers:  {}", probe.layer_ids().join(", "));
    println!("  markers: {}", probe.marker_count());

    if let Some(target) = probe.last_camera_command() {
        let arrival = probe.camera_at(Instant::now() + target.duration + Duration::from_millis(1));
        println!(
            "  camera:  flying to {} at zoom {} over {} ms (arrives at {}, zoom {})",
            target.center,
            target.zoom,
            target.duration.as_millis(),
            arrival.center,
            arrival.zoom
        );
    }

    app.unmount();
    Ok(())
}
