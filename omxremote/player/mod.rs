pub mod control;
pub mod playlist;
pub mod router;
pub mod status;
pub mod supervisor;

pub use control::Command;
pub use playlist::{MediaEntry, Playlist};
pub use router::CommandRouter;
pub use status::{PlaybackSnapshot, StatusBroadcaster, StatusStream};
pub use supervisor::Supervisor;
