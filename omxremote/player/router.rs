use crate::error::App;
use crate::player::control::Command;
use crate::player::supervisor::Supervisor;
use log::{error, info};
use tokio::sync::mpsc;
use tokio::task;

/// Queue in front of the player's standard input.
///
/// A single task drains the queue and waits for each write to land before
/// taking the next command, so control codes never interleave.
#[derive(Clone, Debug)]
pub struct CommandRouter {
    commands: mpsc::Sender<Command>,
}

impl CommandRouter {
    pub fn spawn(supervisor: Supervisor, capacity: usize) -> Self {
        let (commands, receiver) = mpsc::channel(capacity.max(1));
        task::spawn(dispatch(supervisor, receiver));
        Self { commands }
    }

    /// Queues `command`. Returns once it is accepted, not once it is applied.
    pub async fn submit(&self, command: Command) -> Result<(), App> {
        self.commands.send(command).await?;
        Ok(())
    }
}

async fn dispatch(supervisor: Supervisor, mut commands: mpsc::Receiver<Command>) {
    while let Some(command) = commands.recv().await {
        info!("Command: {command}");
        if let Err(e) = supervisor.write(command).await {
            error!("Failed to dispatch {command}: {e}");
            break;
        }
        // The player gets the quit key first, then is killed regardless.
        if command == Command::Stop {
            if let Err(e) = supervisor.stop().await {
                error!("Failed to stop player: {e}");
                break;
            }
        }
    }
    info!("Command router stopped");
}
