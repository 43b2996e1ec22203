use crate::player::playlist::{MediaEntry, Playlist};
use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

/// Point-in-time view of the player.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct PlaybackSnapshot {
    pub running: bool,
    #[serde(rename = "entry", skip_serializing_if = "Option::is_none")]
    pub current: Option<MediaEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<Playlist>,
}

/// Fans snapshots out to subscribers without ever waiting on them.
///
/// Every subscriber owns a single slot. Publishing overwrites whatever the
/// subscriber has not read yet, so a slow observer only misses intermediate
/// states.
#[derive(Debug, Default)]
pub struct StatusBroadcaster {
    subscribers: Mutex<Vec<watch::Sender<Option<PlaybackSnapshot>>>>,
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many subscribers were handed the snapshot.
    pub async fn publish(&self, snapshot: &PlaybackSnapshot) -> usize {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|slot| !slot.is_closed());
        for slot in subscribers.iter() {
            slot.send_replace(Some(snapshot.clone()));
        }
        subscribers.len()
    }

    pub async fn subscribe(&self) -> StatusStream {
        let (slot, receiver) = watch::channel(None);
        self.subscribers.lock().await.push(slot);
        StatusStream { receiver }
    }
}

/// Receiving end of a subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct StatusStream {
    receiver: watch::Receiver<Option<PlaybackSnapshot>>,
}

impl StatusStream {
    /// Waits for the next published snapshot. Returns `None` once the
    /// broadcaster is gone.
    pub async fn next(&mut self) -> Option<PlaybackSnapshot> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(snapshot) = self.receiver.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = PlaybackSnapshot> {
        stream::unfold(self, |mut status| async move {
            let snapshot = status.next().await?;
            Some((snapshot, status))
        })
    }
}
