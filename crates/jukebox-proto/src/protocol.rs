use std::fmt;

use serde::{Deserialize, Serialize};

/// Search categories, in tab-bar order (F1..F5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Albums,
    Tracks,
    Artists,
    RadioStations,
    SonosPlaylists,
}

pub const NUM_CATEGORIES: usize = 5;

impl Category {
    pub const ALL: [Category; NUM_CATEGORIES] = [
        Category::Albums,
        Category::Tracks,
        Category::Artists,
        Category::RadioStations,
        Category::SonosPlaylists,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or_default()
    }

    /// Identifier used on the wire (`category=` query parameter).
    pub fn id(self) -> &'static str {
        match self {
            Category::Albums => "albums",
            Category::Tracks => "tracks",
            Category::Artists => "artists",
            Category::RadioStations => "radio_stations",
            Category::SonosPlaylists => "sonos_playlists",
        }
    }

    /// Short name shown in the tab bar (≤6 chars).
    pub fn label(self) -> &'static str {
        match self {
            Category::Albums => "album",
            Category::Tracks => "song",
            Category::Artists => "artist",
            Category::RadioStations => "radio",
            Category::SonosPlaylists => "plist",
        }
    }

    /// Live streams are played directly; replace-vs-enqueue makes no sense for them
    /// and there is nothing to type a search term into.
    pub fn is_live_stream(self) -> bool {
        matches!(self, Category::RadioStations)
    }
}

/// Opaque playback handle as handed out by the bridge.
///
/// Library items are plain URIs; radio stations carry DIDL metadata next to
/// the stream URI so the speaker can show the station title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Handle {
    Uri(String),
    Stream { uri: String, metadata: String },
}

impl Handle {
    pub fn uri(&self) -> &str {
        match self {
            Handle::Uri(uri) => uri,
            Handle::Stream { uri, .. } => uri,
        }
    }
}

/// One search result: display label plus playback handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub label: String,
    pub handle: Handle,
}

impl ResultItem {
    pub fn new(label: impl Into<String>, handle: Handle) -> Self {
        Self {
            label: label.into(),
            handle,
        }
    }
}

/// Transport state as reported by the speaker (UPnP AVTransport names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportState {
    Playing,
    PausedPlayback,
    #[default]
    Stopped,
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// `GET /speakers/{idx}/status` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransportStatus {
    pub transport: TransportState,
    pub volume: u8,
    #[serde(default)]
    pub repeat: RepeatMode,
}

/// Renders the top-right indicator, e.g. `"> 35%"` or `"|| 20% R"`.
/// The LCD fonts are Latin-1 only, so the symbols stay ASCII.
impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.transport {
            TransportState::PausedPlayback => "||",
            TransportState::Playing => ">",
            TransportState::Stopped => "[]",
            TransportState::Transitioning => "",
        };
        write!(f, "{} {}%", symbol, self.volume)?;
        match self.repeat {
            RepeatMode::Off => Ok(()),
            RepeatMode::All => write!(f, " R"),
            RepeatMode::One => write!(f, " R1"),
        }
    }
}

/// Body of `play` / `queue` requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleBody {
    pub handle: Handle,
}

/// Body of `volume` requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolumeDelta {
    pub delta: i8,
}

/// Query of `GET /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub category: Category,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub offset: usize,
    pub max_items: usize,
}
