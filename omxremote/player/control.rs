use crate::error::App;
use std::fmt;
use std::str::FromStr;

/// Transport commands understood by the player on its standard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Pause,
    Stop,
    VolumeUp,
    VolumeDown,
    Subtitles,
    SeekBack,
    SeekBackFast,
    SeekForward,
    SeekForwardFast,
    NextAudioStream,
    PrevAudioStream,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Command::Pause,
        Command::Stop,
        Command::VolumeUp,
        Command::VolumeDown,
        Command::Subtitles,
        Command::SeekBack,
        Command::SeekBackFast,
        Command::SeekForward,
        Command::SeekForwardFast,
        Command::NextAudioStream,
        Command::PrevAudioStream,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::VolumeUp => "volume_up",
            Command::VolumeDown => "volume_down",
            Command::Subtitles => "subtitles",
            Command::SeekBack => "seek_back",
            Command::SeekBackFast => "seek_back_fast",
            Command::SeekForward => "seek_forward",
            Command::SeekForwardFast => "seek_forward_fast",
            Command::NextAudioStream => "next_audio_stream",
            Command::PrevAudioStream => "prev_audio_stream",
        }
    }

    /// Bytes written to the player for this command.
    pub fn code(self) -> &'static [u8] {
        match self {
            Command::Pause => b"p",
            Command::Stop => b"q",
            Command::VolumeUp => b"+",
            Command::VolumeDown => b"-",
            Command::Subtitles => b"s",
            // arrow keys: left, down, right, up
            Command::SeekBack => b"\x1b[D",
            Command::SeekBackFast => b"\x1b[B",
            Command::SeekForward => b"\x1b[C",
            Command::SeekForwardFast => b"\x1b[A",
            Command::NextAudioStream => b"k",
            Command::PrevAudioStream => b"j",
        }
    }
}

impl FromStr for Command {
    type Err = App;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name() == name)
            .ok_or_else(|| App::UnknownCommand(name.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
