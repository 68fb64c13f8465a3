//! Media backend: search and playback commands, addressed by speaker index.

pub mod http;
pub mod mock;

use jukebox_proto::protocol::{Category, Handle, ResultItem};
use thiserror::Error;

pub use http::HttpBackend;
pub use mock::MockBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{path}: request failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path}: bridge answered {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("{path}: malformed response: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no speaker with index {0}")]
    UnknownSpeaker(usize),

    #[error("starting HTTP runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

pub trait MediaBackend {
    /// Speaker names; list position is the speaker index used by every command.
    fn speakers(&mut self) -> BackendResult<Vec<String>>;

    fn search(
        &mut self,
        category: Category,
        term: &str,
        offset: usize,
        max_items: usize,
    ) -> BackendResult<Vec<ResultItem>>;

    /// Replace the queue with `handle` and start playing.
    fn play(&mut self, speaker: usize, handle: &Handle) -> BackendResult<()>;

    fn add_to_queue(&mut self, speaker: usize, handle: &Handle) -> BackendResult<()>;

    /// Transport and volume as shown in the top-right corner, e.g. `"> 35%"`.
    fn volume_play_as_string(&mut self, speaker: usize) -> BackendResult<String>;

    fn play_pause(&mut self, speaker: usize) -> BackendResult<()>;

    fn change_volume(&mut self, speaker: usize, delta: i8) -> BackendResult<()>;

    fn next(&mut self, speaker: usize) -> BackendResult<()>;

    fn previous(&mut self, speaker: usize) -> BackendResult<()>;

    fn cycle_repeat(&mut self, speaker: usize) -> BackendResult<()>;

    /// Ask the speakers to rescan the music library.
    fn reindex(&mut self) -> BackendResult<()>;
}

impl<B: MediaBackend + ?Sized> MediaBackend for Box<B> {
    fn speakers(&mut self) -> BackendResult<Vec<String>> {
        (**self).speakers()
    }

    fn search(
        &mut self,
        category: Category,
        term: &str,
        offset: usize,
        max_items: usize,
    ) -> BackendResult<Vec<ResultItem>> {
        (**self).search(category, term, offset, max_items)
    }

    fn play(&mut self, speaker: usize, handle: &Handle) -> BackendResult<()> {
        (**self).play(speaker, handle)
    }

    fn add_to_queue(&mut self, speaker: usize, handle: &Handle) -> BackendResult<()> {
        (**self).add_to_queue(speaker, handle)
    }

    fn volume_play_as_string(&mut self, speaker: usize) -> BackendResult<String> {
        (**self).volume_play_as_string(speaker)
    }

    fn play_pause(&mut self, speaker: usize) -> BackendResult<()> {
        (**self).play_pause(speaker)
    }

    fn change_volume(&mut self, speaker: usize, delta: i8) -> BackendResult<()> {
        (**self).change_volume(speaker, delta)
    }

    fn next(&mut self, speaker: usize) -> BackendResult<()> {
        (**self).next(speaker)
    }

    fn previous(&mut self, speaker: usize) -> BackendResult<()> {
        (**self).previous(speaker)
    }

    fn cycle_repeat(&mut self, speaker: usize) -> BackendResult<()> {
        (**self).cycle_repeat(speaker)
    }

    fn reindex(&mut self) -> BackendResult<()> {
        (**self).reindex()
    }
}
