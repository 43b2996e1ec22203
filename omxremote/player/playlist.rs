use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of entries kept up to and including the selected one.
pub const HISTORY_SIZE: usize = 3;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MediaEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl MediaEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Ordered media entries with a cursor on the selected one.
///
/// Entries are only appended or replaced wholesale. Selecting far enough
/// into the list drops the oldest entries so that at most `history_size`
/// entries remain up to and including the cursor.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Playlist {
    #[serde(rename = "current_index")]
    cursor: Option<usize>,
    entries: Vec<MediaEntry>,
    auto_play: bool,
    #[serde(skip)]
    history_size: usize,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Playlist {
    pub fn new(entries: Vec<MediaEntry>) -> Self {
        Self::with_history(entries, HISTORY_SIZE)
    }

    pub fn with_history(entries: Vec<MediaEntry>, history_size: usize) -> Self {
        Self {
            cursor: None,
            entries,
            auto_play: true,
            history_size: history_size.max(1),
        }
    }

    /// Moves the cursor one step forward. Past the end the cursor is cleared
    /// and nothing is returned; there is no wrap-around.
    pub fn next(&mut self) -> Option<MediaEntry> {
        let next_index = self.cursor.map_or(0, |cursor| cursor + 1);
        if next_index >= self.entries.len() {
            self.cursor = None;
            return None;
        }
        self.select(next_index)
    }

    /// Points the cursor at `position`. Out-of-range positions leave the
    /// cursor untouched.
    pub fn select(&mut self, position: usize) -> Option<MediaEntry> {
        if position >= self.entries.len() {
            return None;
        }
        self.cursor = Some(position);
        self.trim_history();
        self.current().cloned()
    }

    pub fn append(&mut self, entry: MediaEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn reset(&mut self, entries: Vec<MediaEntry>) {
        self.entries = entries;
        self.cursor = None;
        self.auto_play = true;
    }

    fn trim_history(&mut self) {
        let Some(cursor) = self.cursor else {
            return;
        };
        let kept = cursor + 1;
        if kept < self.history_size {
            return;
        }
        let dropped = kept - self.history_size;
        if dropped > 0 {
            log::debug!("Dropping {dropped} old playlist entries");
            self.entries.drain(..dropped);
            self.cursor = Some(cursor - dropped);
        }
    }

    pub fn current(&self) -> Option<&MediaEntry> {
        self.cursor.and_then(|cursor| self.entries.get(cursor))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    pub fn set_auto_play(&mut self, auto_play: bool) {
        self.auto_play = auto_play;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(count: usize) -> Vec<MediaEntry> {
        (1..=count)
            .map(|n| MediaEntry::new(format!("http://example/{n}")))
            .collect()
    }

    #[test]
    fn new_empty_playlist() {
        let playlist = Playlist::new(Vec::new());
        assert!(playlist.auto_play());
        assert_eq!(playlist.cursor(), None);
        assert!(playlist.is_empty());
    }

    #[test]
    fn new_seeded_playlist() {
        let playlist = Playlist::new(numbered(2));
        assert!(playlist.auto_play());
        assert_eq!(playlist.cursor(), None);
        assert_eq!(playlist.len(), 2);
    }

    #[test]
    fn next_from_nothing_selects_first() {
        let mut playlist = Playlist::new(numbered(1));
        let entry = playlist.next().unwrap();
        assert_eq!(entry.url, "http://example/1");
        assert_eq!(playlist.cursor(), Some(0));
    }

    #[test]
    fn next_past_the_end_clears_cursor() {
        let mut playlist = Playlist::new(numbered(1));
        playlist.next();
        assert_eq!(playlist.next(), None);
        assert_eq!(playlist.cursor(), None);
    }

    #[test]
    fn next_on_empty_playlist() {
        let mut playlist = Playlist::default();
        assert_eq!(playlist.next(), None);
        assert_eq!(playlist.cursor(), None);
    }

    #[test]
    fn next_does_not_wrap() {
        let mut playlist = Playlist::new(numbered(2));
        playlist.select(1);
        assert_eq!(playlist.next(), None);
        assert_eq!(playlist.cursor(), None);
        assert_eq!(playlist.len(), 2);
    }

    #[test]
    fn select_returns_entry() {
        let mut playlist = Playlist::new(numbered(3));
        let entry = playlist.select(2).unwrap();
        assert_eq!(entry.url, "http://example/3");
        assert_eq!(playlist.cursor(), Some(2));
    }

    #[test]
    fn select_out_of_range_keeps_cursor() {
        let mut playlist = Playlist::new(numbered(3));
        playlist.select(1);
        assert_eq!(playlist.select(3), None);
        assert_eq!(playlist.select(100), None);
        assert_eq!(playlist.cursor(), Some(1));
    }

    #[test]
    fn select_on_empty_playlist() {
        let mut playlist = Playlist::default();
        assert_eq!(playlist.select(0), None);
        assert_eq!(playlist.cursor(), None);
    }

    #[test]
    fn select_trims_history() {
        let mut playlist = Playlist::new(numbered(6));
        let entry = playlist.select(5).unwrap();

        assert_eq!(entry.url, "http://example/6");
        assert_eq!(playlist.len(), 3);
        assert_eq!(playlist.cursor(), Some(2));
        assert_eq!(playlist.current().unwrap().url, "http://example/6");
        assert_eq!(playlist.entries[0].url, "http://example/4");
    }

    #[test]
    fn trimming_keeps_entries_after_cursor() {
        let mut playlist = Playlist::new(numbered(6));
        playlist.select(3);

        assert_eq!(playlist.cursor(), Some(2));
        assert_eq!(playlist.current().unwrap().url, "http://example/4");
        let urls: Vec<_> = playlist.entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "http://example/2",
                "http://example/3",
                "http://example/4",
                "http://example/5",
                "http://example/6"
            ]
        );
    }

    #[test]
    fn short_history_is_not_trimmed() {
        let mut playlist = Playlist::new(numbered(6));
        playlist.select(1);
        assert_eq!(playlist.len(), 6);
        assert_eq!(playlist.cursor(), Some(1));
    }

    #[test]
    fn walking_a_long_playlist_stays_bounded() {
        let mut playlist = Playlist::with_history(numbered(20), 4);
        let mut seen = Vec::new();
        while let Some(entry) = playlist.next() {
            seen.push(entry.url);
            assert!(playlist.cursor().unwrap() < 4);
        }
        assert_eq!(seen.len(), 20);
        assert_eq!(seen.last().unwrap(), "http://example/20");
        assert_eq!(playlist.len(), 4);
    }

    #[test]
    fn append_keeps_cursor() {
        let mut playlist = Playlist::new(Vec::new());
        let index = playlist.append(MediaEntry::new("http://example/1"));
        assert_eq!(index, 0);
        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist.cursor(), None);
    }

    #[test]
    fn append_then_select() {
        let mut playlist = Playlist::new(Vec::new());
        playlist.append(MediaEntry::new("http://example/1"));
        let index = playlist.append(MediaEntry::new("http://example/2"));
        let entry = playlist.select(index).unwrap();

        assert_eq!(entry.url, "http://example/2");
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.cursor(), Some(1));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut playlist = Playlist::new(numbered(3));
        playlist.select(1);
        playlist.set_auto_play(false);
        playlist.reset(numbered(2));

        assert_eq!(playlist.cursor(), None);
        assert!(playlist.auto_play());
        assert_eq!(playlist.len(), 2);
    }

    #[test]
    fn serializes_like_the_status_payload() {
        let mut playlist = Playlist::new(numbered(2));
        playlist.select(0);
        let json = serde_json::to_value(&playlist).unwrap();
        assert_eq!(json["current_index"], 0);
        assert_eq!(json["auto_play"], true);
        assert_eq!(json["entries"][1]["url"], "http://example/2");
        assert!(json["entries"][1].get("metadata").is_none());
    }
}
