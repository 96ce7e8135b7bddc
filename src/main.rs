//! SmallTV dashboard service.
//!
//! Usage:
//!   smalltv-dashboard run --config dashboard.toml --states states.json [--clear]
//!   smalltv-dashboard render --config dashboard.toml --screen home --out home.png
//!   smalltv-dashboard samples --out samples/
//!
//! `run` keeps the device in sync until Ctrl-C and reloads the dashboard
//! when the configuration file changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use smalltv_dashboard::canvas::Frame;
use smalltv_dashboard::compose::{ScreenComposer, welcome_screen};
use smalltv_dashboard::config::{AppConfig, DashboardConfig, DeviceProfile, UploadFormat};
use smalltv_dashboard::samples;
use smalltv_dashboard::state::{EntityStateResolver, MemoryStateProvider};
use smalltv_dashboard::sync::DeviceSyncEngine;
use smalltv_dashboard::transport::{DeviceTransport, HttpTransport};
use smalltv_dashboard::widgets::WidgetRegistry;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// How often `run` checks the configuration file for changes.
const RELOAD_POLL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "smalltv-dashboard")]
#[command(about = "Render dashboards and keep a GeekMagic SmallTV in sync")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync the device until interrupted
    Run {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Entity state fixture (JSON)
        #[arg(short, long)]
        states: Option<PathBuf>,

        /// Delete images stored on the device before syncing
        #[arg(long)]
        clear: bool,
    },
    /// Render one screen to a PNG or JPEG file
    Render {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        states: Option<PathBuf>,

        /// Screen id
        #[arg(long)]
        screen: String,

        /// Output file; `.jpg`/`.jpeg` writes JPEG, anything else PNG
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Render every layout with demo data
    Samples {
        #[arg(short, long, default_value = "samples")]
        out: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Run { config, states, clear } => run(&config, states.as_deref(), clear).await,
        Commands::Render { config, states, screen, out } => render(&config, states.as_deref(), &screen, &out),
        Commands::Samples { out } => render_samples(&out),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,smalltv_dashboard=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

// =============================================================================
// Commands
// =============================================================================

async fn run(
    config_path: &Path,
    states: Option<&Path>,
    clear: bool,
) -> Result<()> {
    let app = load_config(config_path)?;
    let resolver = EntityStateResolver::new(Arc::new(load_states(states)?));
    let transport = HttpTransport::new(&app.device)?;
    info!(host = %app.device.host, screens = app.screens.len(), "starting");
    if transport.ping().await {
        info!(host = %app.device.host, "device answered");
        if let Err(err) = transport.ensure_space(clear).await {
            warn!(error = %err, "storage check failed");
        }
    } else {
        warn!(host = %app.device.host, "device not answering, will keep retrying");
    }

    let (config_tx, _) = watch::channel(Arc::new(app.dashboard()));
    let composer = ScreenComposer::new(WidgetRegistry::new(), app.render.unit_px);
    let engine = DeviceSyncEngine::new(composer, resolver, Arc::new(transport), app.device, app.sync, config_tx.clone());

    let cancel = CancellationToken::new();
    let (handle, task) = engine.spawn_with_token(cancel.clone());
    tokio::spawn(watch_config(config_path.to_path_buf(), config_tx, cancel.clone()));

    tokio::signal::ctrl_c().await.context("listening for ctrl-c")?;
    info!("shutting down");
    cancel.cancel();
    task.await.context("sync engine task")?;

    let status = handle.status();
    info!(
        generation = status.generation,
        last_successful = ?status.last_successful_generation,
        connectivity = status.connectivity.name(),
        "stopped"
    );
    Ok(())
}

fn render(
    config_path: &Path,
    states: Option<&Path>,
    screen_id: &str,
    out: &Path,
) -> Result<()> {
    let app = load_config(config_path)?;
    let dashboard = app.dashboard();
    let Some(screen) = dashboard.screens.iter().find(|s| s.id == screen_id) else {
        bail!("no screen {screen_id:?} in {}", config_path.display());
    };

    let resolver = EntityStateResolver::new(Arc::new(load_states(states)?));
    let composer = ScreenComposer::new(WidgetRegistry::new(), app.render.unit_px);
    let frame = composer.compose(screen, &app.device, &resolver, Local::now().fixed_offset(), 0)?;
    write_frame(&frame, out)
}

fn render_samples(out: &Path) -> Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let resolver = EntityStateResolver::new(Arc::new(samples::demo_provider()?));
    let composer = ScreenComposer::default();
    let profile = DeviceProfile::default();
    let now = Local::now().fixed_offset();

    let mut screens = samples::demo_screens();
    screens.push(welcome_screen(&profile));
    for screen in &screens {
        let frame = composer.compose(screen, &profile, &resolver, now, 0)?;
        write_frame(&frame, &out.join(format!("{}.png", screen.id)))?;
    }
    info!(count = screens.len(), dir = %out.display(), "samples written");
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

/// Fixture-backed states, or an empty provider when none is given.
fn load_states(path: Option<&Path>) -> Result<MemoryStateProvider> {
    let Some(path) = path else {
        info!("no state fixture, entities will show as unavailable");
        return Ok(MemoryStateProvider::new());
    };
    let provider = MemoryStateProvider::from_file(path).with_context(|| format!("loading {}", path.display()))?;
    info!(entities = provider.entity_ids().len(), path = %path.display(), "states loaded");
    Ok(provider)
}

fn write_frame(
    frame: &Frame,
    out: &Path,
) -> Result<()> {
    let format = match out.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => UploadFormat::Jpeg,
        _ => UploadFormat::Png,
    };
    let bytes = frame.encode(format, 90)?;
    std::fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
    info!(screen = %frame.screen_id, path = %out.display(), bytes = bytes.len(), "frame written");
    Ok(())
}

fn modified(path: &Path) -> Option<SystemTime> { std::fs::metadata(path).and_then(|m| m.modified()).ok() }

/// Poll the configuration file and publish a new dashboard when it changes.
/// Invalid edits are logged and the previous dashboard stays active.
async fn watch_config(
    path: PathBuf,
    dashboard: watch::Sender<Arc<DashboardConfig>>,
    cancel: CancellationToken,
) {
    let mut seen = modified(&path);
    let mut poll = tokio::time::interval(RELOAD_POLL);
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = poll.tick() => {}
        }
        let current = modified(&path);
        if current == seen {
            continue;
        }
        seen = current;
        match AppConfig::load(&path) {
            Ok(app) => {
                debug!(path = %path.display(), "configuration changed");
                dashboard.send_replace(Arc::new(app.dashboard()));
            }
            Err(err) => warn!(path = %path.display(), error = %err, "configuration reload rejected"),
        }
    }
}
