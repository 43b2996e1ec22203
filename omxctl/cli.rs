mod error;

use clap::{Parser, Subcommand};
use error::App;
use futures_util::stream::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::process::Command;
use zbus::{proxy, Connection};

type StdResult<T> = std::result::Result<T, App>;

#[proxy(
    interface = "org.omxremote.Player",
    default_service = "org.omxremote.Player",
    default_path = "/org/omxremote/Player"
)]
trait Player {
    async fn test_connection(&self) -> zbus::Result<()>;
    async fn play(&self, url: &str, metadata: &str) -> zbus::Result<()>;
    async fn command(&self, name: &str) -> zbus::Result<()>;
    async fn playlist_replace(&self, entries: &str) -> zbus::Result<()>;
    async fn playlist_next(&self) -> zbus::Result<String>;
    async fn playlist_select(&self, position: i64) -> zbus::Result<String>;
    async fn playlist_append(&self, url: &str, metadata: &str) -> zbus::Result<u64>;
    async fn playlist_clear(&self) -> zbus::Result<()>;
    async fn status(&self) -> zbus::Result<String>;
    async fn shutdown(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn status_changed(&self, status: String) -> zbus::Result<()>;
}

#[derive(Parser)]
#[command(name = "omxctl", about = "Control the omxremote player.", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start omxremote")]
    Start,

    #[command(about = "Play a media location now")]
    Play(EntryArgs),

    #[command(about = "Send a player command (pause, stop, volume_up, seek_forward, ...)")]
    Cmd { name: String },

    #[command(about = "Stop playback")]
    Stop,

    #[command(about = "Show the player status")]
    Status,

    #[command(about = "Print every status change")]
    Watch,

    #[command(about = "Add a media location to the playlist")]
    Add(EntryArgs),

    #[command(about = "Replace the playlist")]
    Load {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    #[command(about = "Play the next playlist entry")]
    Next,

    #[command(about = "Play the playlist entry at a position")]
    Select {
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    #[command(about = "Clear the playlist, keeping what is playing")]
    Clear,

    #[command(about = "Stop omxremote")]
    Shutdown,
}

#[derive(Parser)]
struct EntryArgs {
    url: String,
    #[arg(short = 'm', long = "meta", help = "Metadata as a JSON object")]
    meta: Option<String>,
}

#[derive(Deserialize)]
struct Entry {
    url: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct Playlist {
    current_index: Option<usize>,
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default)]
    auto_play: bool,
}

#[derive(Deserialize)]
struct Status {
    running: bool,
    entry: Option<Entry>,
    playlist: Option<Playlist>,
}

#[tokio::main]
async fn main() -> StdResult<()> {
    let cli = Cli::parse();
    let connection = Connection::session().await?;
    let proxy = PlayerProxy::new(&connection).await?;
    handle_command(cli, proxy).await
}

async fn handle_command(cli: Cli, proxy: PlayerProxy<'_>) -> StdResult<()> {
    if let Commands::Start = cli.command {
        return start_omxremote(&proxy).await;
    }
    if !is_omxremote_running(&proxy).await? {
        eprintln!("omxremote is not running");
        return Ok(());
    }
    match cli.command {
        Commands::Start => Ok(()),
        Commands::Play(args) => {
            let metadata = metadata_arg(args.meta.as_deref())?;
            proxy.play(&args.url, &metadata).await?;
            println!("Playing {}", args.url);
            Ok(())
        }
        Commands::Cmd { name } => {
            proxy.command(&name).await?;
            println!("Sent {name}");
            Ok(())
        }
        Commands::Stop => {
            proxy.command("stop").await?;
            println!("Stopped");
            Ok(())
        }
        Commands::Status => {
            let status: Status = serde_json::from_str(&proxy.status().await?)?;
            print_status(&status);
            Ok(())
        }
        Commands::Watch => watch_status(&proxy).await,
        Commands::Add(args) => {
            let metadata = metadata_arg(args.meta.as_deref())?;
            let index = proxy.playlist_append(&args.url, &metadata).await?;
            println!("Added {} at position {index}", args.url);
            Ok(())
        }
        Commands::Load { urls } => {
            let entries: Vec<_> = urls
                .iter()
                .map(|url| serde_json::json!({ "url": url }))
                .collect();
            proxy
                .playlist_replace(&serde_json::to_string(&entries)?)
                .await?;
            println!("Loaded {} entries", urls.len());
            Ok(())
        }
        Commands::Next => print_selected(&proxy.playlist_next().await?),
        Commands::Select { position } => {
            print_selected(&proxy.playlist_select(position).await?)
        }
        Commands::Clear => {
            proxy.playlist_clear().await?;
            println!("Playlist cleared");
            Ok(())
        }
        Commands::Shutdown => {
            proxy.shutdown().await?;
            println!("omxremote is shutting down");
            Ok(())
        }
    }
}

async fn is_omxremote_running(proxy: &PlayerProxy<'_>) -> StdResult<bool> {
    match proxy.test_connection().await {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Validates `--meta` locally so typos fail before reaching the daemon.
fn metadata_arg(meta: Option<&str>) -> StdResult<String> {
    let Some(meta) = meta else {
        return Ok(String::new());
    };
    let parsed: Value = serde_json::from_str(meta)?;
    if !parsed.is_object() {
        return Err(App::InvalidInput(
            "metadata must be a JSON object".to_string(),
        ));
    }
    Ok(parsed.to_string())
}

fn print_selected(entry: &str) -> StdResult<()> {
    if entry.is_empty() {
        println!("No playlist entry at that position");
        return Ok(());
    }
    let entry: Entry = serde_json::from_str(entry)?;
    println!("Playing {}", entry.url);
    Ok(())
}

fn print_status(status: &Status) {
    match (&status.entry, status.running) {
        (Some(entry), true) => println!("Playing: {}", describe(entry)),
        _ => println!("Idle"),
    }
    let Some(playlist) = &status.playlist else {
        return;
    };
    println!(
        "Playlist ({} entries, auto play {}):",
        playlist.entries.len(),
        if playlist.auto_play { "on" } else { "off" }
    );
    for (i, entry) in playlist.entries.iter().enumerate() {
        let marker = if playlist.current_index == Some(i) {
            ">"
        } else {
            " "
        };
        println!("{marker} {i}. {}", describe(entry));
    }
}

fn describe(entry: &Entry) -> String {
    let title = entry
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.get("title"))
        .and_then(Value::as_str);
    match title {
        Some(title) => format!("{title} ({})", entry.url),
        None => entry.url.clone(),
    }
}

async fn watch_status(proxy: &PlayerProxy<'_>) -> StdResult<()> {
    let mut changes = proxy.receive_status_changed().await?;
    println!("Watching status, press Ctrl+C to quit");
    while let Some(change) = changes.next().await {
        let args = change.args()?;
        let status: Status = serde_json::from_str(args.status())?;
        print_status(&status);
        println!();
    }
    Ok(())
}

async fn start_omxremote(proxy: &PlayerProxy<'_>) -> StdResult<()> {
    if is_omxremote_running(proxy).await? {
        println!("omxremote is already running");
        return Ok(());
    }

    let current_exe_path = std::env::current_exe()?;
    let exe_dir = current_exe_path.parent().ok_or_else(|| {
        App::InvalidInput("Failed to get the directory of the executable".to_string())
    })?;
    let omxremote_path = exe_dir.join("omxremote");

    if !omxremote_path.exists() {
        return Err(App::InvalidInput(
            "omxremote executable not found in the same directory".to_string(),
        ));
    }

    let child = Command::new(omxremote_path).spawn()?;
    println!("omxremote started, process ID: {:?}", child.id());
    Ok(())
}
