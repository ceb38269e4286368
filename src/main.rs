//! hue-hotkeys: toggle Philips Hue lights with global keyboard shortcuts
//!
//! Default invocation runs the interactive setup when no settings exist,
//! then listens for the configured hotkeys until interrupted:
//! - `--username` acquires a new Hue API username
//! - `--edit` re-selects the devices bound to hotkeys
//! - `--console` reads hotkeys from stdin instead of the global event tap

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use hue_hotkeys::bridge::HueClient;
use hue_hotkeys::config::{Config, Settings};
use hue_hotkeys::dispatch::{build_bindings, Dispatcher};
use hue_hotkeys::events::DispatchEvent;
use hue_hotkeys::hotkey::{ConsoleSource, Hotkey, HotkeyEvent, HotkeySource};
use hue_hotkeys::lifecycle::ShutdownSignal;
use hue_hotkeys::setup::{self, Console, RegistrationPolicy};

/// Timeout for bridge calls made before settings exist
const SETUP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Toggle Philips Hue lights with global keyboard shortcuts",
    after_help = "While listening, stop with Ctrl-C or SIGTERM. Esc is not a quit key."
)]
struct Cli {
    /// Acquire a new Hue API username and store it
    #[arg(long, conflicts_with = "edit")]
    username: bool,

    /// Re-select the devices bound to hotkeys
    #[arg(long)]
    edit: bool,

    /// Settings file to use instead of the default location
    #[arg(long, env = "HUE_HOTKEYS_CONFIG")]
    config: Option<PathBuf>,

    /// Read hotkeys from stdin, one per line, instead of the global event tap
    #[arg(long)]
    console: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "hue-hotkeys starting");

    let config = Config::load(cli.config.clone())?;
    info!(settings = %config.settings_path.display(), "configuration loaded");

    if cli.username {
        return update_username(&config).await;
    }
    if cli.edit {
        return edit_devices(&config).await;
    }
    listen(&config, cli.console).await
}

fn read_existing(config: &Config) -> Result<Settings> {
    if !config.has_settings() {
        anyhow::bail!(
            "no settings found at {}; run without flags to set up first",
            config.settings_path.display()
        );
    }
    Ok(Settings::read(&config.settings_path)?)
}

async fn update_username(config: &Config) -> Result<()> {
    let mut settings = read_existing(config)?;
    let client = HueClient::new(settings.request_timeout()).context("failed to build HTTP client")?;

    let mut console = Console::new(io::stdin().lock(), io::stdout());
    setup::update_username(&mut console, &client, &mut settings, RegistrationPolicy::default()).await?;

    settings.save(&config.settings_path)?;
    info!("username saved");
    Ok(())
}

async fn edit_devices(config: &Config) -> Result<()> {
    let mut settings = read_existing(config)?;
    let client = HueClient::new(settings.request_timeout()).context("failed to build HTTP client")?;

    let mut console = Console::new(io::stdin().lock(), io::stdout());
    setup::edit_devices(&mut console, &client, &mut settings).await?;

    settings.save(&config.settings_path)?;
    info!("device configuration saved");
    Ok(())
}

async fn first_run(config: &Config) -> Result<Settings> {
    info!("no settings found, starting interactive setup");
    let client = HueClient::new(SETUP_TIMEOUT).context("failed to build HTTP client")?;

    let mut console = Console::new(io::stdin().lock(), io::stdout());
    let settings = setup::initial_setup(&mut console, &client, RegistrationPolicy::default()).await?;

    settings.save(&config.settings_path)?;
    info!(settings = %config.settings_path.display(), "configuration saved");
    Ok(settings)
}

async fn listen(config: &Config, console: bool) -> Result<()> {
    let settings = if config.has_settings() {
        Settings::read(&config.settings_path)?
    } else {
        first_run(config).await?
    };
    settings
        .validate()
        .context("incomplete settings; re-run with --edit or --username")?;

    let bindings = build_bindings(&settings.devices)?;
    for binding in bindings.iter() {
        info!(
            hotkey = %binding.hotkey,
            device_id = %binding.device_id,
            label = %binding.label,
            "registered hotkey"
        );
    }

    let client = HueClient::new(settings.request_timeout()).context("failed to build HTTP client")?;
    let (event_tx, event_rx) = broadcast::channel::<DispatchEvent>(64);
    let (hotkey_tx, hotkey_rx) = mpsc::channel(32);
    let event_log = tokio::spawn(log_events(event_rx));

    let source = hotkey_source(console, hotkey_tx, bindings.hotkeys());
    let mut dispatcher = Dispatcher::new(client, settings.session(), bindings, event_tx);

    source.start().context("failed to start hotkey source")?;
    dispatcher.prepare().await;

    info!("monitoring for hotkey presses, press Ctrl-C to exit (Esc does not quit)");
    let shutdown = ShutdownSignal::new();
    dispatcher.run(hotkey_rx, shutdown.wait()).await;

    source.stop();
    drop(dispatcher);
    let _ = event_log.await;
    info!("hue-hotkeys stopped");
    Ok(())
}

/// Log every dispatch outcome until the dispatcher drops its sender
async fn log_events(mut event_rx: broadcast::Receiver<DispatchEvent>) {
    loop {
        match event_rx.recv().await {
            Ok(event) => debug!("{event}"),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "dispatch event receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(target_os = "macos")]
fn hotkey_source(
    console: bool,
    hotkey_tx: mpsc::Sender<HotkeyEvent>,
    watched: std::collections::HashSet<Hotkey>,
) -> Box<dyn HotkeySource> {
    if console {
        return Box::new(ConsoleSource::new(io::BufReader::new(io::stdin()), hotkey_tx));
    }
    Box::new(hue_hotkeys::hotkey::HotkeyListener::new(hotkey_tx, watched))
}

#[cfg(not(target_os = "macos"))]
fn hotkey_source(
    console: bool,
    hotkey_tx: mpsc::Sender<HotkeyEvent>,
    _watched: std::collections::HashSet<Hotkey>,
) -> Box<dyn HotkeySource> {
    if !console {
        warn!("global hotkeys are only supported on macOS; reading hotkeys from stdin");
    }
    Box::new(ConsoleSource::new(io::BufReader::new(io::stdin()), hotkey_tx))
}
