use crate::config::PlayerConfig;
use crate::error::App;
use crate::player::control::Command;
use crate::player::playlist::{MediaEntry, Playlist};
use crate::player::status::{PlaybackSnapshot, StatusBroadcaster};
use log::{debug, error, info, warn};
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::{mpsc, oneshot};
use tokio::task;
use tokio::time::timeout;
use url::Url;

type KillReply = oneshot::Sender<io::Result<()>>;

/// Longest a control write may hold up the supervisor.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

pub(crate) enum Request {
    Play {
        entry: MediaEntry,
        reply: oneshot::Sender<Result<(), App>>,
    },
    Write {
        command: Command,
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Exited {
        generation: u64,
        status: io::Result<ExitStatus>,
    },
    Replace {
        entries: Vec<MediaEntry>,
        reply: oneshot::Sender<()>,
    },
    Next {
        reply: oneshot::Sender<Option<MediaEntry>>,
    },
    Select {
        position: usize,
        reply: oneshot::Sender<Option<MediaEntry>>,
    },
    Append {
        entry: MediaEntry,
        reply: oneshot::Sender<usize>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<PlaybackSnapshot>,
    },
}

/// Handle to the task that owns the player process and the playlist.
///
/// Every operation is a message on one queue, so starting, stopping,
/// exit cleanup and playlist changes never interleave.
#[derive(Clone, Debug)]
pub struct Supervisor {
    requests: mpsc::Sender<Request>,
}

impl Supervisor {
    pub fn spawn(
        config: &PlayerConfig,
        playlist: Playlist,
        broadcaster: Arc<StatusBroadcaster>,
    ) -> Self {
        let (requests, receiver) = mpsc::channel(config.request_queue.max(1));
        let task = SupervisorTask {
            program: config.program.clone(),
            args: config.args.clone(),
            playlist,
            process: None,
            current: None,
            generation: 0,
            broadcaster,
            events: requests.downgrade(),
        };
        task::spawn(task.run(receiver));
        Self { requests }
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, App> {
        let (reply, response) = oneshot::channel();
        self.requests.send(request(reply)).await?;
        Ok(response.await?)
    }

    /// Appends `entry` to the playlist, selects it and starts playing it.
    /// Nothing is appended when the request is rejected.
    pub async fn play(&self, entry: MediaEntry) -> Result<(), App> {
        self.call(|reply| Request::Play { entry, reply }).await?
    }

    /// Resolves once the bytes are written, or once the write is given up.
    /// Dropped when nothing plays.
    pub async fn write(&self, command: Command) -> Result<(), App> {
        self.call(|reply| Request::Write { command, reply }).await
    }

    pub async fn stop(&self) -> Result<(), App> {
        self.call(|reply| Request::Stop { reply }).await
    }

    pub async fn replace(&self, entries: Vec<MediaEntry>) -> Result<(), App> {
        self.call(|reply| Request::Replace { entries, reply }).await
    }

    pub async fn next(&self) -> Result<Option<MediaEntry>, App> {
        self.call(|reply| Request::Next { reply }).await
    }

    pub async fn select(&self, position: usize) -> Result<Option<MediaEntry>, App> {
        self.call(|reply| Request::Select { position, reply }).await
    }

    pub async fn append(&self, entry: MediaEntry) -> Result<usize, App> {
        self.call(|reply| Request::Append { entry, reply }).await
    }

    pub async fn clear(&self) -> Result<(), App> {
        self.call(|reply| Request::Clear { reply }).await
    }

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, App> {
        self.call(|reply| Request::Snapshot { reply }).await
    }
}

struct ProcessHandle {
    generation: u64,
    pid: Option<u32>,
    stdin: ChildStdin,
    kill: oneshot::Sender<KillReply>,
    /// Cleared when the playlist moved on without this process.
    advance_on_exit: bool,
}

impl ProcessHandle {
    async fn write(&mut self, code: &[u8]) -> io::Result<()> {
        let written = timeout(WRITE_TIMEOUT, async {
            self.stdin.write_all(code).await?;
            self.stdin.flush().await
        })
        .await;
        written.unwrap_or_else(|_| {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "player is not reading its input",
            ))
        })
    }
}

struct SupervisorTask {
    program: String,
    args: Vec<String>,
    playlist: Playlist,
    process: Option<ProcessHandle>,
    current: Option<MediaEntry>,
    generation: u64,
    broadcaster: Arc<StatusBroadcaster>,
    events: mpsc::WeakSender<Request>,
}

impl SupervisorTask {
    async fn run(mut self, mut requests: mpsc::Receiver<Request>) {
        info!("Player supervisor started");
        while let Some(request) = requests.recv().await {
            self.handle(request).await;
        }
        if let Some(process) = self.process.take() {
            self.terminate(process).await;
        }
        info!("Player supervisor stopped");
    }

    async fn handle(&mut self, request: Request) {
        match request {
            Request::Play { entry, reply } => {
                let result = self.play(entry).await;
                let _ = reply.send(result);
            }
            Request::Write { command, reply } => {
                self.write(command).await;
                let _ = reply.send(());
            }
            Request::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(());
            }
            Request::Exited { generation, status } => {
                self.exited(generation, status).await;
            }
            Request::Replace { entries, reply } => {
                info!("Replacing playlist with {} entries", entries.len());
                self.playlist.reset(entries);
                if let Some(process) = self.process.as_mut() {
                    process.advance_on_exit = true;
                }
                self.publish().await;
                let _ = reply.send(());
            }
            Request::Next { reply } => {
                let entry = self.playlist.next();
                debug!(
                    "Playlist cursor moved to {:?} of {}",
                    self.playlist.cursor(),
                    self.playlist.len()
                );
                let _ = reply.send(self.switch_to(entry).await);
            }
            Request::Select { position, reply } => {
                let entry = self.playlist.select(position);
                if entry.is_none() {
                    debug!("No playlist entry at position {position}");
                }
                let _ = reply.send(self.switch_to(entry).await);
            }
            Request::Append { entry, reply } => {
                let index = self.playlist.append(entry);
                self.publish().await;
                let _ = reply.send(index);
            }
            Request::Clear { reply } => {
                self.clear();
                self.publish().await;
                let _ = reply.send(());
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            running: self.process.is_some(),
            current: self.current.clone(),
            playlist: Some(self.playlist.clone()),
        }
    }

    async fn publish(&self) {
        let reached = self.broadcaster.publish(&self.snapshot()).await;
        debug!("Status published to {reached} subscribers");
    }

    async fn play(&mut self, entry: MediaEntry) -> Result<(), App> {
        if self.process.is_some() {
            return Err(App::AlreadyActive);
        }
        validate_location(&entry.url)?;
        let index = self.playlist.append(entry.clone());
        self.playlist.select(index);
        let result = self.start(entry).await;
        if result.is_err() {
            self.publish().await;
        }
        result
    }

    async fn start(&mut self, entry: MediaEntry) -> Result<(), App> {
        if self.process.is_some() {
            return Err(App::AlreadyActive);
        }
        validate_location(&entry.url)?;
        let events = self
            .events
            .upgrade()
            .ok_or_else(|| App::Send("player supervisor is shutting down".to_string()))?;

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&entry.url)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(App::Spawn)?;
        let stdin = child.stdin.take().ok_or_else(|| {
            App::Spawn(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "player standard input is unavailable",
            ))
        })?;

        self.generation += 1;
        let generation = self.generation;
        let pid = child.id();
        let (kill, kill_requests) = oneshot::channel();
        task::spawn(watch_process(child, generation, kill_requests, events));

        info!("Playing {} (pid {:?})", entry.url, pid);
        self.process = Some(ProcessHandle {
            generation,
            pid,
            stdin,
            kill,
            advance_on_exit: true,
        });
        self.current = Some(entry);
        self.publish().await;
        Ok(())
    }

    async fn write(&mut self, command: Command) {
        let Some(process) = self.process.as_mut() else {
            debug!("No player running, dropping {command}");
            return;
        };
        debug!("Sending {command} to player");
        if let Err(e) = process.write(command.code()).await {
            warn!("Failed to send {command} to player: {e}");
        }
    }

    async fn stop(&mut self) {
        let Some(process) = self.process.take() else {
            return;
        };
        self.playlist.set_auto_play(false);
        self.terminate(process).await;
        self.current = None;
        self.publish().await;
    }

    async fn terminate(&self, process: ProcessHandle) {
        info!("Terminating player process (pid {:?})", process.pid);
        let (reply, done) = oneshot::channel();
        if process.kill.send(reply).is_err() {
            debug!("Player process already exited");
            return;
        }
        match done.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to kill player process: {e}"),
            Err(_) => debug!("Player process exited before it was killed"),
        }
    }

    async fn exited(&mut self, generation: u64, status: io::Result<ExitStatus>) {
        let process = match self.process.take() {
            Some(process) if process.generation == generation => process,
            other => {
                self.process = other;
                debug!("Ignoring exit of a replaced player process");
                return;
            }
        };
        self.current = None;
        match status {
            Ok(status) if status.success() => info!("Player process finished"),
            Ok(status) => warn!("{}", App::ProcessExit(status.to_string())),
            Err(e) => warn!("{}", App::ProcessExit(e.to_string())),
        }
        self.publish().await;
        if process.advance_on_exit {
            self.advance().await;
        } else {
            debug!("Playlist moved past the finished entry, not advancing");
        }
    }

    async fn advance(&mut self) {
        while self.playlist.auto_play() {
            let Some(entry) = self.playlist.next() else {
                info!("Reached the end of the playlist");
                self.publish().await;
                return;
            };
            let url = entry.url.clone();
            match self.start(entry).await {
                Ok(()) => return,
                Err(e) => warn!("Skipping {url}: {e}"),
            }
        }
    }

    /// Replaces whatever plays with `entry`. Auto-advance is not triggered
    /// by the replaced process. Without an entry the current process keeps
    /// playing but no longer advances the playlist when it ends.
    async fn switch_to(&mut self, entry: Option<MediaEntry>) -> Option<MediaEntry> {
        let Some(entry) = entry else {
            if let Some(process) = self.process.as_mut() {
                process.advance_on_exit = false;
            }
            self.publish().await;
            return None;
        };
        if let Some(process) = self.process.take() {
            self.terminate(process).await;
            self.current = None;
        }
        if let Err(e) = self.start(entry.clone()).await {
            warn!("Failed to play {}: {e}", entry.url);
            self.publish().await;
        }
        Some(entry)
    }

    fn clear(&mut self) {
        if !self.playlist.is_empty() {
            info!("Clearing {} playlist entries", self.playlist.len());
        }
        self.playlist.reset(Vec::new());
        if let Some(playing) = self.current.clone() {
            let index = self.playlist.append(playing);
            self.playlist.select(index);
        }
    }
}

async fn watch_process(
    mut child: Child,
    generation: u64,
    kill_requests: oneshot::Receiver<KillReply>,
    events: mpsc::Sender<Request>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        Ok(reply) = kill_requests => {
            let _ = reply.send(child.kill().await);
            return;
        }
    };
    if events
        .send(Request::Exited { generation, status })
        .await
        .is_err()
    {
        debug!("Player supervisor gone before process exit was reported");
    }
}

/// Accepts absolute URLs and absolute file system paths.
pub fn validate_location(location: &str) -> Result<(), App> {
    if Url::parse(location).is_ok() || Path::new(location).is_absolute() {
        Ok(())
    } else {
        Err(App::InvalidLocation(location.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testing::{settle, shell, wait_for_file};
    use tempfile::TempDir;
    use tokio::time::sleep;

    fn supervisor(config: &PlayerConfig, entries: Vec<MediaEntry>) -> Supervisor {
        Supervisor::spawn(
            config,
            Playlist::new(entries),
            Arc::new(StatusBroadcaster::new()),
        )
    }

    fn long_running() -> PlayerConfig {
        shell("cat > /dev/null", "player")
    }

    #[test]
    fn locations() {
        assert!(validate_location("http://x/a").is_ok());
        assert!(validate_location("rtsp://camera.local:554/stream").is_ok());
        assert!(validate_location("/media/movies/film.mkv").is_ok());
        assert!(matches!(
            validate_location("not a url"),
            Err(App::InvalidLocation(_))
        ));
        assert!(validate_location("").is_err());
    }

    #[tokio::test]
    async fn second_play_conflicts() {
        let supervisor = supervisor(&long_running(), Vec::new());
        supervisor.play(MediaEntry::new("http://x/a")).await.unwrap();

        let err = supervisor.play(MediaEntry::new("http://x/a")).await;
        assert!(matches!(err, Err(App::AlreadyActive)));

        let snapshot = supervisor.snapshot().await.unwrap();
        assert!(snapshot.running);
        assert_eq!(snapshot.current.unwrap().url, "http://x/a");
        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_location_is_rejected() {
        let supervisor = supervisor(&long_running(), Vec::new());
        let err = supervisor.play(MediaEntry::new("not a url")).await;
        assert!(matches!(err, Err(App::InvalidLocation(_))));

        let snapshot = supervisor.snapshot().await.unwrap();
        assert!(!snapshot.running);
        assert!(snapshot.playlist.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let config = PlayerConfig {
            program: "/nonexistent/omxplayer".to_string(),
            ..PlayerConfig::default()
        };
        let supervisor = supervisor(&config, Vec::new());
        let err = supervisor.play(MediaEntry::new("http://x/a")).await;
        assert!(matches!(err, Err(App::Spawn(_))));
        assert!(!supervisor.snapshot().await.unwrap().running);
    }

    #[tokio::test]
    async fn queued_play_selects_the_entry() {
        let supervisor = supervisor(&long_running(), vec![MediaEntry::new("http://x/0")]);
        supervisor
            .play(MediaEntry::new("http://x/a"))
            .await
            .unwrap();

        let playlist = supervisor.snapshot().await.unwrap().playlist.unwrap();
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.cursor(), Some(1));
        assert_eq!(playlist.current().unwrap().url, "http://x/a");
        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_when_idle_changes_nothing() {
        let broadcaster = Arc::new(StatusBroadcaster::new());
        let supervisor = Supervisor::spawn(
            &long_running(),
            Playlist::new(vec![MediaEntry::new("http://x/a")]),
            Arc::clone(&broadcaster),
        );
        let before = supervisor.snapshot().await.unwrap();
        let mut status = broadcaster.subscribe().await;

        supervisor.stop().await.unwrap();

        assert_eq!(supervisor.snapshot().await.unwrap(), before);
        assert!(timeout(Duration::from_millis(100), status.next())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn stop_kills_and_disables_auto_play() {
        let supervisor = supervisor(
            &long_running(),
            vec![MediaEntry::new("http://x/a"), MediaEntry::new("http://x/b")],
        );
        supervisor.next().await.unwrap();
        assert!(supervisor.snapshot().await.unwrap().running);

        supervisor.stop().await.unwrap();

        let snapshot = supervisor.snapshot().await.unwrap();
        assert!(!snapshot.running);
        assert_eq!(snapshot.current, None);
        let playlist = snapshot.playlist.unwrap();
        assert!(!playlist.auto_play());
        assert_eq!(playlist.cursor(), Some(0));

        sleep(Duration::from_millis(100)).await;
        assert!(!supervisor.snapshot().await.unwrap().running);
    }

    #[tokio::test]
    async fn write_without_process_is_dropped() {
        let supervisor = supervisor(&long_running(), vec![MediaEntry::new("http://x/a")]);
        let before = supervisor.snapshot().await.unwrap();

        supervisor.write(Command::Pause).await.unwrap();

        assert_eq!(supervisor.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn natural_exits_advance_through_the_playlist() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("played");
        let config = shell(r#"echo "$1" >> "$0""#, log.to_str().unwrap());
        let supervisor = supervisor(
            &config,
            vec![
                MediaEntry::new("http://x/1"),
                MediaEntry::new("http://x/2"),
                MediaEntry::new("http://x/3"),
            ],
        );

        let first = supervisor.next().await.unwrap().unwrap();
        assert_eq!(first.url, "http://x/1");

        let snapshot = settle(&supervisor, |snapshot| {
            !snapshot.running && snapshot.playlist.as_ref().unwrap().cursor().is_none()
        })
        .await;
        assert_eq!(snapshot.current, None);

        let played = std::fs::read_to_string(&log).unwrap();
        assert_eq!(played, "http://x/1\nhttp://x/2\nhttp://x/3\n");
    }

    #[tokio::test]
    async fn failing_exit_still_advances() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("played");
        let config = shell(r#"echo "$1" >> "$0"; exit 3"#, log.to_str().unwrap());
        let supervisor = supervisor(
            &config,
            vec![MediaEntry::new("http://x/1"), MediaEntry::new("http://x/2")],
        );

        supervisor.next().await.unwrap();
        settle(&supervisor, |snapshot| {
            !snapshot.running && snapshot.playlist.as_ref().unwrap().cursor().is_none()
        })
        .await;

        let played = std::fs::read_to_string(&log).unwrap();
        assert_eq!(played, "http://x/1\nhttp://x/2\n");
    }

    #[tokio::test]
    async fn unplayable_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("played");
        let config = shell(r#"echo "$1" >> "$0""#, log.to_str().unwrap());
        let supervisor = supervisor(
            &config,
            vec![
                MediaEntry::new("http://x/1"),
                MediaEntry::new("not a url"),
                MediaEntry::new("http://x/3"),
            ],
        );

        supervisor.next().await.unwrap();
        settle(&supervisor, |snapshot| {
            !snapshot.running && snapshot.playlist.as_ref().unwrap().cursor().is_none()
        })
        .await;

        let played = std::fs::read_to_string(&log).unwrap();
        assert_eq!(played, "http://x/1\nhttp://x/3\n");
    }

    #[tokio::test]
    async fn select_switches_playback() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("played");
        let config = shell(r#"echo "$1" >> "$0"; exec cat > /dev/null"#, log.to_str().unwrap());
        let supervisor = supervisor(
            &config,
            vec![MediaEntry::new("http://x/a"), MediaEntry::new("http://x/b")],
        );

        supervisor.next().await.unwrap();
        wait_for_file(&log, "http://x/a\n".len()).await;
        let selected = supervisor.select(1).await.unwrap().unwrap();
        assert_eq!(selected.url, "http://x/b");

        let snapshot = supervisor.snapshot().await.unwrap();
        assert!(snapshot.running);
        assert_eq!(snapshot.current.unwrap().url, "http://x/b");
        assert!(snapshot.playlist.unwrap().auto_play());

        assert_eq!(supervisor.select(5).await.unwrap(), None);
        let snapshot = supervisor.snapshot().await.unwrap();
        assert_eq!(snapshot.current.unwrap().url, "http://x/b");

        wait_for_file(&log, "http://x/a\nhttp://x/b\n".len()).await;
        supervisor.stop().await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&log).unwrap(),
            "http://x/a\nhttp://x/b\n"
        );
    }

    #[tokio::test]
    async fn clear_keeps_the_playing_entry() {
        let supervisor = supervisor(&long_running(), vec![MediaEntry::new("http://x/0")]);
        supervisor
            .play(MediaEntry::new("http://x/a"))
            .await
            .unwrap();
        supervisor
            .append(MediaEntry::new("http://x/b"))
            .await
            .unwrap();

        supervisor.clear().await.unwrap();

        let playlist = supervisor.snapshot().await.unwrap().playlist.unwrap();
        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist.cursor(), Some(0));
        assert_eq!(playlist.current().unwrap().url, "http://x/a");
        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn clear_when_idle_empties_the_playlist() {
        let supervisor = supervisor(&long_running(), vec![MediaEntry::new("http://x/0")]);
        supervisor.clear().await.unwrap();

        let playlist = supervisor.snapshot().await.unwrap().playlist.unwrap();
        assert!(playlist.is_empty());
        assert_eq!(playlist.cursor(), None);
    }

    #[tokio::test]
    async fn publishes_start_and_exit_in_order() {
        let broadcaster = Arc::new(StatusBroadcaster::new());
        let supervisor = Supervisor::spawn(
            &shell("head -c 2 > /dev/null", "player"),
            Playlist::default(),
            Arc::clone(&broadcaster),
        );
        let mut status = broadcaster.subscribe().await;

        supervisor.play(MediaEntry::new("http://x/a")).await.unwrap();
        let started = status.next().await.unwrap();
        assert!(started.running);

        supervisor.write(Command::Pause).await.unwrap();
        supervisor.write(Command::Stop).await.unwrap();
        let mut last = status.next().await.unwrap();
        while last.running {
            last = status.next().await.unwrap();
        }
        assert_eq!(last.current, None);
    }

    #[tokio::test]
    async fn next_past_the_end_does_not_restart_the_playlist() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("played");
        let config = shell(r#"echo "$1" >> "$0"; head -c 1 > /dev/null"#, log.to_str().unwrap());
        let supervisor = supervisor(
            &config,
            vec![MediaEntry::new("http://x/1"), MediaEntry::new("http://x/2")],
        );

        supervisor.select(1).await.unwrap();
        wait_for_file(&log, "http://x/2\n".len()).await;
        assert_eq!(supervisor.next().await.unwrap(), None);
        assert!(supervisor.snapshot().await.unwrap().running);

        supervisor.write(Command::Pause).await.unwrap();
        settle(&supervisor, |snapshot| !snapshot.running).await;
        sleep(Duration::from_millis(200)).await;

        let snapshot = supervisor.snapshot().await.unwrap();
        assert!(!snapshot.running);
        assert_eq!(snapshot.playlist.unwrap().cursor(), None);
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "http://x/2\n");
    }

    #[tokio::test]
    async fn replace_while_playing_advances_into_the_new_playlist() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("played");
        let config = shell(r#"echo "$1" >> "$0"; head -c 1 > /dev/null"#, log.to_str().unwrap());
        let supervisor = supervisor(&config, vec![MediaEntry::new("http://x/1")]);

        supervisor.next().await.unwrap();
        wait_for_file(&log, "http://x/1\n".len()).await;
        assert_eq!(supervisor.next().await.unwrap(), None);
        supervisor
            .replace(vec![MediaEntry::new("http://x/a")])
            .await
            .unwrap();

        supervisor.write(Command::Pause).await.unwrap();
        wait_for_file(&log, "http://x/1\nhttp://x/a\n".len()).await;
        supervisor.stop().await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&log).unwrap(),
            "http://x/1\nhttp://x/a\n"
        );
    }

    #[tokio::test]
    async fn stalled_player_input_does_not_block_stop() {
        let supervisor = supervisor(&shell("exec sleep 30", "player"), Vec::new());
        supervisor.play(MediaEntry::new("http://x/a")).await.unwrap();

        // fill the pipe until a write has to give up
        for _ in 0..100_000 {
            let started = std::time::Instant::now();
            supervisor.write(Command::SeekForward).await.unwrap();
            if started.elapsed() >= Duration::from_millis(500) {
                break;
            }
        }

        timeout(Duration::from_secs(5), supervisor.stop())
            .await
            .expect("stop was blocked behind a write")
            .unwrap();
        assert!(!supervisor.snapshot().await.unwrap().running);
    }
}
