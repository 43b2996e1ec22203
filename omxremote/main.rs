mod config;
mod dbus;
mod error;
mod player;
mod remote;

use crate::config::{config_dir, load_playlist, Config};
use crate::error::App;
use crate::remote::Remote;
use clap::Parser;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};
use log::{error, info, warn};
use std::path::PathBuf;
use tokio::fs;
use tokio::signal;
use tokio::sync::watch;
use tokio::task;

#[derive(Parser)]
#[command(
    name = "omxremote",
    about = "Remote-controlled media player daemon.",
    version
)]
struct Args {
    #[arg(short = 'c', long = "config", help = "Path to config.toml")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), App> {
    let args = Args::parse();
    let dir = config_dir()?;
    let log_dir = dir.join("logs");
    fs::create_dir_all(&log_dir).await?;

    let config_path = args.config.unwrap_or_else(|| dir.join("config.toml"));
    let config = Config::load(&config_path).await?;

    // Logger setup
    let duplicate = if config.log_to_stderr {
        Duplicate::All
    } else {
        Duplicate::None
    };
    let _logger = Logger::try_with_str(&config.log_level)?
        .log_to_file(FileSpec::default().directory(&log_dir))
        .rotate(
            Criterion::Size(1_000_000),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(3),
        )
        .duplicate_to_stderr(duplicate)
        .start()?;

    info!("omxremote v{}", env!("CARGO_PKG_VERSION"));
    info!("Player: {} {}", config.player.program, config.player.args.join(" "));

    let entries = match config.playlist_path(&dir) {
        Some(path) => load_playlist(&path).await?,
        None => Vec::new(),
    };
    let remote = Remote::start(&config.player, entries);

    let (stop_sender, stop_receiver) = watch::channel(());
    let server = task::spawn({
        let remote = remote.clone();
        let stop_sender = stop_sender.clone();
        async move {
            if let Err(e) = dbus::run_dbus_server(remote, stop_sender.clone()).await {
                error!("DBus server error: {}", e);
            }
            let _ = stop_sender.send(());
        }
    });

    wait_for_stop_signal(stop_receiver).await;
    let _ = stop_sender.send(());
    if let Err(e) = server.await {
        warn!("DBus server task failed: {}", e);
    }

    info!("Shutting down player...");
    remote.stop().await?;
    info!("Shutdown complete");
    Ok(())
}

/// Returns on Ctrl+C, SIGTERM, a `Shutdown` call, or when the DBus server ends.
async fn wait_for_stop_signal(mut stop_receiver: watch::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
        _ = stop_receiver.changed() => info!("Stop requested, shutting down..."),
    }
}
