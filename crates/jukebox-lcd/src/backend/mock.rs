//! In-process backend for development without speakers, and for tests.
//!
//! Holds a tiny fixed library, keeps per-speaker transport state and records
//! every call so tests can assert on the exact command sequence.

use jukebox_proto::protocol::{
    Category, Handle, RepeatMode, ResultItem, TransportState, TransportStatus,
};
use tracing::info;

use super::{BackendError, BackendResult, MediaBackend};

const ALBUMS: &[&str] = &[
    "Appetite for Destruction",
    "OK Computer",
    "The Four Seasons",
    "Music for a jilted generation",
];

const TRACKS: &[&str] = &["Hamba hamba", "Everybody", "Take Five", "Paranoid Android"];

const ARTISTS: &[&str] = &["Radiohead", "The Prodigy", "Vivaldi"];

const PLAYLISTS: &[&str] = &["Sunday", "Kitchen"];

const STATIONS: &[(&str, &str)] = &[
    ("FM4", "x-rincon-mp3radio://orf-live.ors-shoutcast.at/fm4-q2a"),
    ("Radio Paradise", "x-rincon-mp3radio://stream.radioparadise.com/mp3-128"),
];

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search {
        category: Category,
        term: String,
        offset: usize,
        max_items: usize,
    },
    Play { speaker: usize, handle: Handle },
    AddToQueue { speaker: usize, handle: Handle },
    Status { speaker: usize },
    PlayPause { speaker: usize },
    ChangeVolume { speaker: usize, delta: i8 },
    Next { speaker: usize },
    Previous { speaker: usize },
    CycleRepeat { speaker: usize },
    Reindex,
}

#[derive(Debug, Clone)]
pub struct MockBackend {
    speakers: Vec<String>,
    status: Vec<TransportStatus>,
    fail_next: bool,
    pub calls: Vec<Call>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(["Schwarz", "Weiss"])
    }
}

impl MockBackend {
    pub fn new<S: Into<String>>(speakers: impl IntoIterator<Item = S>) -> Self {
        let speakers: Vec<String> = speakers.into_iter().map(Into::into).collect();
        let status = speakers
            .iter()
            .map(|_| TransportStatus {
                transport: TransportState::Playing,
                volume: 50,
                repeat: RepeatMode::Off,
            })
            .collect();
        Self {
            speakers,
            status,
            fail_next: false,
            calls: Vec::new(),
        }
    }

    /// Make the next call fail as if the bridge were unreachable.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    pub fn status(&self, speaker: usize) -> Option<&TransportStatus> {
        self.status.get(speaker)
    }

    /// Calls of one kind only, e.g. all searches.
    pub fn searches(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Search { .. }))
            .collect()
    }

    fn record(&mut self, call: Call) -> BackendResult<()> {
        self.calls.push(call);
        if std::mem::take(&mut self.fail_next) {
            return Err(BackendError::Status {
                path: "mock".to_string(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(())
    }

    fn speaker_mut(&mut self, speaker: usize) -> BackendResult<&mut TransportStatus> {
        self.status
            .get_mut(speaker)
            .ok_or(BackendError::UnknownSpeaker(speaker))
    }

    fn library(category: Category) -> Vec<ResultItem> {
        let plain = |names: &[&str]| -> Vec<ResultItem> {
            names
                .iter()
                .map(|n| ResultItem::new(*n, Handle::Uri(format!("mock:{}/{}", category.id(), n))))
                .collect()
        };
        match category {
            Category::Albums => plain(ALBUMS),
            Category::Tracks => plain(TRACKS),
            Category::Artists => plain(ARTISTS),
            Category::SonosPlaylists => plain(PLAYLISTS),
            Category::RadioStations => STATIONS
                .iter()
                .map(|(title, uri)| {
                    ResultItem::new(
                        *title,
                        Handle::Stream {
                            uri: uri.to_string(),
                            metadata: format!(
                                "<DIDL-Lite><item><dc:title>{}</dc:title></item></DIDL-Lite>",
                                title
                            ),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl MediaBackend for MockBackend {
    fn speakers(&mut self) -> BackendResult<Vec<String>> {
        Ok(self.speakers.clone())
    }

    fn search(
        &mut self,
        category: Category,
        term: &str,
        offset: usize,
        max_items: usize,
    ) -> BackendResult<Vec<ResultItem>> {
        self.record(Call::Search {
            category,
            term: term.to_string(),
            offset,
            max_items,
        })?;
        let needle = term.to_lowercase();
        Ok(Self::library(category)
            .into_iter()
            // radio favourites cannot be searched, the term is ignored
            .filter(|item| {
                category.is_live_stream() || item.label.to_lowercase().contains(&needle)
            })
            .skip(offset)
            .take(max_items)
            .collect())
    }

    fn play(&mut self, speaker: usize, handle: &Handle) -> BackendResult<()> {
        self.record(Call::Play {
            speaker,
            handle: handle.clone(),
        })?;
        info!("mock: play {} on {}", handle.uri(), speaker);
        self.speaker_mut(speaker)?.transport = TransportState::Playing;
        Ok(())
    }

    fn add_to_queue(&mut self, speaker: usize, handle: &Handle) -> BackendResult<()> {
        self.record(Call::AddToQueue {
            speaker,
            handle: handle.clone(),
        })?;
        info!("mock: enqueue {} on {}", handle.uri(), speaker);
        self.speaker_mut(speaker).map(|_| ())
    }

    fn volume_play_as_string(&mut self, speaker: usize) -> BackendResult<String> {
        self.record(Call::Status { speaker })?;
        Ok(self.speaker_mut(speaker)?.to_string())
    }

    fn play_pause(&mut self, speaker: usize) -> BackendResult<()> {
        self.record(Call::PlayPause { speaker })?;
        let status = self.speaker_mut(speaker)?;
        status.transport = match status.transport {
            TransportState::Playing => TransportState::PausedPlayback,
            TransportState::PausedPlayback => TransportState::Playing,
            other => other,
        };
        Ok(())
    }

    fn change_volume(&mut self, speaker: usize, delta: i8) -> BackendResult<()> {
        self.record(Call::ChangeVolume { speaker, delta })?;
        let status = self.speaker_mut(speaker)?;
        status.volume = (status.volume as i16 + delta as i16).clamp(0, 100) as u8;
        Ok(())
    }

    fn next(&mut self, speaker: usize) -> BackendResult<()> {
        self.record(Call::Next { speaker })?;
        self.speaker_mut(speaker).map(|_| ())
    }

    fn previous(&mut self, speaker: usize) -> BackendResult<()> {
        self.record(Call::Previous { speaker })?;
        self.speaker_mut(speaker).map(|_| ())
    }

    fn cycle_repeat(&mut self, speaker: usize) -> BackendResult<()> {
        self.record(Call::CycleRepeat { speaker })?;
        let status = self.speaker_mut(speaker)?;
        status.repeat = status.repeat.cycled();
        Ok(())
    }

    fn reindex(&mut self) -> BackendResult<()> {
        self.record(Call::Reindex)
    }
}
