use futures_util::StreamExt;
use log::{debug, error, info};
use serde_json::{Map, Value};
use std::pin::pin;
use tokio::sync::watch;
use zbus::{fdo, interface, Connection, ConnectionBuilder, SignalContext};

use crate::error::App;
use crate::player::MediaEntry;
use crate::remote::Remote;

pub const SERVICE_NAME: &str = "org.omxremote.Player";
pub const OBJECT_PATH: &str = "/org/omxremote/Player";

#[derive(Clone)]
pub struct PlayerDBus {
    remote: Remote,
    stop_signal: watch::Sender<()>,
}

#[interface(name = "org.omxremote.Player")]
impl PlayerDBus {
    async fn test_connection(&self) -> fdo::Result<()> {
        Ok(())
    }

    async fn play(&self, url: String, metadata: String) -> fdo::Result<()> {
        let entry = media_entry(url, &metadata)?;
        self.remote.play(entry).await?;
        Ok(())
    }

    async fn command(&self, name: String) -> fdo::Result<()> {
        self.remote.command(&name).await?;
        Ok(())
    }

    async fn playlist_replace(&self, entries: String) -> fdo::Result<()> {
        let entries: Vec<MediaEntry> = serde_json::from_str(&entries).map_err(App::from)?;
        self.remote.playlist_replace(entries).await?;
        Ok(())
    }

    async fn playlist_next(&self) -> fdo::Result<String> {
        let entry = self.remote.playlist_next().await?;
        Ok(entry_json(entry.as_ref())?)
    }

    async fn playlist_select(&self, position: i64) -> fdo::Result<String> {
        let entry = self.remote.playlist_select(position).await?;
        Ok(entry_json(entry.as_ref())?)
    }

    async fn playlist_append(&self, url: String, metadata: String) -> fdo::Result<u64> {
        let entry = media_entry(url, &metadata)?;
        let index = self.remote.playlist_append(entry).await?;
        Ok(index as u64)
    }

    async fn playlist_clear(&self) -> fdo::Result<()> {
        self.remote.playlist_clear().await?;
        Ok(())
    }

    async fn status(&self) -> fdo::Result<String> {
        let snapshot = self.remote.status().await?;
        Ok(serde_json::to_string(&snapshot).map_err(App::from)?)
    }

    async fn shutdown(&self) -> fdo::Result<()> {
        if let Err(e) = self.stop_signal.send(()) {
            error!("Failed to send stop signal: {}", e);
        }
        Ok(())
    }

    #[zbus(signal)]
    async fn status_changed(ctxt: &SignalContext<'_>, status: &str) -> zbus::Result<()>;
}

/// Builds an entry from a location and an optional JSON object.
fn media_entry(url: String, metadata: &str) -> Result<MediaEntry, App> {
    let entry = MediaEntry::new(url);
    if metadata.trim().is_empty() {
        return Ok(entry);
    }
    let metadata: Map<String, Value> = serde_json::from_str(metadata)?;
    Ok(entry.with_metadata(metadata))
}

/// Empty string stands for "no entry".
fn entry_json(entry: Option<&MediaEntry>) -> Result<String, App> {
    match entry {
        Some(entry) => Ok(serde_json::to_string(entry)?),
        None => Ok(String::new()),
    }
}

pub async fn run_dbus_server(remote: Remote, stop_signal: watch::Sender<()>) -> Result<(), App> {
    let player_dbus = PlayerDBus {
        remote: remote.clone(),
        stop_signal: stop_signal.clone(),
    };

    let connection = ConnectionBuilder::session()?
        .name(SERVICE_NAME)?
        .serve_at(OBJECT_PATH, player_dbus)?
        .build()
        .await?;
    info!("DBus service {} is up", SERVICE_NAME);

    let mut stop_receiver = stop_signal.subscribe();

    tokio::select! {
        result = forward_status(&connection, &remote) => result?,
        _ = stop_receiver.changed() => {
            info!("Stop signal received, shutting down DBus server...");
        }
    }

    Ok(())
}

async fn forward_status(connection: &Connection, remote: &Remote) -> Result<(), App> {
    let ctxt = SignalContext::new(connection, OBJECT_PATH)?;
    let mut snapshots = pin!(remote.status_stream().await.into_stream());
    while let Some(snapshot) = snapshots.next().await {
        let json = serde_json::to_string(&snapshot)?;
        if let Err(e) = PlayerDBus::status_changed(&ctxt, &json).await {
            debug!("Failed to emit status signal: {}", e);
        }
    }
    Ok(())
}
