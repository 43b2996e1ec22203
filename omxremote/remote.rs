//! Entry point for every request coming from outside the player.
//!
//! `Remote` wires the supervisor, the command router and the status
//! broadcaster together. Play requests and playlist requests go straight to
//! the supervisor; symbolic commands are validated here and queued on the
//! router.

use crate::config::PlayerConfig;
use crate::error::App;
use crate::player::{
    Command, CommandRouter, MediaEntry, PlaybackSnapshot, Playlist, StatusBroadcaster,
    StatusStream, Supervisor,
};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Remote {
    supervisor: Supervisor,
    router: CommandRouter,
    broadcaster: Arc<StatusBroadcaster>,
}

impl Remote {
    /// Spawns the player tasks with `entries` as the initial playlist.
    pub fn start(config: &PlayerConfig, entries: Vec<MediaEntry>) -> Self {
        let broadcaster = Arc::new(StatusBroadcaster::new());
        let playlist = Playlist::with_history(entries, config.history_size);
        let supervisor = Supervisor::spawn(config, playlist, Arc::clone(&broadcaster));
        let router = CommandRouter::spawn(supervisor.clone(), config.command_queue);
        Self {
            supervisor,
            router,
            broadcaster,
        }
    }

    /// Plays `entry` right away and makes it the selected playlist entry.
    pub async fn play(&self, entry: MediaEntry) -> Result<(), App> {
        self.supervisor.play(entry).await
    }

    pub async fn command(&self, name: &str) -> Result<(), App> {
        let command: Command = name.parse()?;
        self.router.submit(command).await
    }

    pub async fn stop(&self) -> Result<(), App> {
        self.supervisor.stop().await
    }

    pub async fn playlist_replace(&self, entries: Vec<MediaEntry>) -> Result<(), App> {
        self.supervisor.replace(entries).await
    }

    pub async fn playlist_next(&self) -> Result<Option<MediaEntry>, App> {
        self.supervisor.next().await
    }

    pub async fn playlist_select(&self, position: i64) -> Result<Option<MediaEntry>, App> {
        let Ok(position) = usize::try_from(position) else {
            return Ok(None);
        };
        self.supervisor.select(position).await
    }

    pub async fn playlist_append(&self, entry: MediaEntry) -> Result<usize, App> {
        self.supervisor.append(entry).await
    }

    pub async fn playlist_clear(&self) -> Result<(), App> {
        self.supervisor.clear().await
    }

    pub async fn status(&self) -> Result<PlaybackSnapshot, App> {
        self.supervisor.snapshot().await
    }

    pub async fn status_stream(&self) -> StatusStream {
        self.broadcaster.subscribe().await
    }
}
