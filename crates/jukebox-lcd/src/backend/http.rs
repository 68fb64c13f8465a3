//! HTTP client for the speaker bridge.
//!
//! The bridge owns the speaker-specific wire protocol; this side only speaks
//! the small JSON API described in `jukebox_proto::protocol`.  The controller
//! is single-threaded and synchronous, so every request is driven to
//! completion on a private current-thread runtime.

use std::time::Duration;

use jukebox_proto::protocol::{
    Category, Handle, HandleBody, ResultItem, SearchQuery, TransportStatus, VolumeDelta,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::{BackendError, BackendResult, MediaBackend};

pub struct HttpBackend {
    base_url: String,
    client: Client,
    runtime: Runtime,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BackendError::Transport {
                path: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            runtime,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> BackendResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let started = std::time::Instant::now();
        let mut request = self.client.get(self.url(path));
        if let Some(query) = query {
            request = request.query(query);
        }
        let result = self.runtime.block_on(async {
            let response = request
                .send()
                .await
                .map_err(|source| transport(path, source))?;
            let response = check_status(path, response)?;
            response
                .json::<T>()
                .await
                .map_err(|source| BackendError::Decode {
                    path: path.to_string(),
                    source,
                })
        });
        debug!("GET {} took {:?}", path, started.elapsed());
        result
    }

    fn post<B>(&self, path: &str, body: Option<&B>) -> BackendResult<()>
    where
        B: Serialize + ?Sized,
    {
        let started = std::time::Instant::now();
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let result = self.runtime.block_on(async {
            let response = request
                .send()
                .await
                .map_err(|source| transport(path, source))?;
            check_status(path, response).map(|_| ())
        });
        debug!("POST {} took {:?}", path, started.elapsed());
        result
    }

    fn post_empty(&self, path: &str) -> BackendResult<()> {
        self.post::<()>(path, None)
    }
}

fn transport(path: &str, source: reqwest::Error) -> BackendError {
    BackendError::Transport {
        path: path.to_string(),
        source,
    }
}

fn check_status(path: &str, response: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Status {
            path: path.to_string(),
            status,
        });
    }
    Ok(response)
}

impl MediaBackend for HttpBackend {
    fn speakers(&mut self) -> BackendResult<Vec<String>> {
        let speakers: Vec<String> = self.get_json::<_, ()>("/speakers", None)?;
        info!("bridge reports {} speakers: {:?}", speakers.len(), speakers);
        Ok(speakers)
    }

    fn search(
        &mut self,
        category: Category,
        term: &str,
        offset: usize,
        max_items: usize,
    ) -> BackendResult<Vec<ResultItem>> {
        let query = SearchQuery {
            category,
            term: term.to_string(),
            offset,
            max_items,
        };
        self.get_json("/search", Some(&query))
    }

    fn play(&mut self, speaker: usize, handle: &Handle) -> BackendResult<()> {
        let body = HandleBody {
            handle: handle.clone(),
        };
        self.post(&format!("/speakers/{}/play", speaker), Some(&body))
    }

    fn add_to_queue(&mut self, speaker: usize, handle: &Handle) -> BackendResult<()> {
        let body = HandleBody {
            handle: handle.clone(),
        };
        self.post(&format!("/speakers/{}/queue", speaker), Some(&body))
    }

    fn volume_play_as_string(&mut self, speaker: usize) -> BackendResult<String> {
        let status: TransportStatus =
            self.get_json::<_, ()>(&format!("/speakers/{}/status", speaker), None)?;
        Ok(status.to_string())
    }

    fn play_pause(&mut self, speaker: usize) -> BackendResult<()> {
        self.post_empty(&format!("/speakers/{}/play-pause", speaker))
    }

    fn change_volume(&mut self, speaker: usize, delta: i8) -> BackendResult<()> {
        self.post(
            &format!("/speakers/{}/volume", speaker),
            Some(&VolumeDelta { delta }),
        )
    }

    fn next(&mut self, speaker: usize) -> BackendResult<()> {
        self.post_empty(&format!("/speakers/{}/next", speaker))
    }

    fn previous(&mut self, speaker: usize) -> BackendResult<()> {
        self.post_empty(&format!("/speakers/{}/previous", speaker))
    }

    fn cycle_repeat(&mut self, speaker: usize) -> BackendResult<()> {
        self.post_empty(&format!("/speakers/{}/repeat", speaker))
    }

    fn reindex(&mut self) -> BackendResult<()> {
        self.post_empty("/library/reindex")
    }
}
