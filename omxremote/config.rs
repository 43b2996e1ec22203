use crate::error::App;
use crate::player::playlist::{MediaEntry, HISTORY_SIZE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub log_to_stderr: bool,
    /// Playlist loaded at startup.
    pub playlist: Option<PathBuf>,
    pub player: PlayerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_stderr: false,
            playlist: None,
            player: PlayerConfig::default(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PlayerConfig {
    pub program: String,
    /// Passed before the media location on every start.
    pub args: Vec<String>,
    pub history_size: usize,
    pub command_queue: usize,
    pub request_queue: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "omxplayer".to_string(),
            args: vec![
                "--blank".to_string(),
                "--adev".to_string(),
                "hdmi".to_string(),
            ],
            history_size: HISTORY_SIZE,
            command_queue: 16,
            request_queue: 32,
        }
    }
}

pub fn config_dir() -> Result<PathBuf, App> {
    let home_dir = std::env::var("HOME")?;
    Ok(Path::new(&home_dir).join(".config").join("omxremote"))
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub async fn load(path: &Path) -> Result<Self, App> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, App> {
        Ok(toml::from_str(content)?)
    }

    /// The configured playlist, or `playlist.toml` next to the config if present.
    pub fn playlist_path(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(path) = &self.playlist {
            return Some(path.clone());
        }
        let default = dir.join("playlist.toml");
        default.exists().then_some(default)
    }
}

#[derive(Deserialize)]
struct PlaylistFile {
    #[serde(default)]
    entries: Vec<MediaEntry>,
}

pub async fn load_playlist(path: &Path) -> Result<Vec<MediaEntry>, App> {
    log::info!("Loading playlist from {}", path.display());
    let content = fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let playlist: PlaylistFile = toml::from_str(&content)?;
    Ok(playlist.entries)
}
