//! `HttpBackend` against an in-process speaker bridge.
//!
//! The bridge runs on its own runtime in a background thread; the backend under
//! test drives its private current-thread runtime from the test thread.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use jukebox_lcd::backend::{BackendError, HttpBackend, MediaBackend};
use jukebox_proto::protocol::{
    Category, Handle, HandleBody, RepeatMode, ResultItem, SearchQuery, TransportState,
    TransportStatus, VolumeDelta,
};

type Log = Arc<Mutex<Vec<String>>>;

const SPEAKERS: usize = 2;

fn record(log: &Log, line: String) {
    log.lock().unwrap().push(line);
}

fn known(idx: usize) -> Result<(), StatusCode> {
    if idx < SPEAKERS {
        Ok(())
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn speakers() -> Json<Vec<&'static str>> {
    Json(vec!["Kitchen", "Living Room"])
}

async fn search(State(log): State<Log>, Query(q): Query<SearchQuery>) -> Json<Vec<ResultItem>> {
    record(
        &log,
        format!("search {} {:?} {} {}", q.category.id(), q.term, q.offset, q.max_items),
    );
    let items = (q.offset..q.offset + 2)
        .map(|i| ResultItem::new(format!("{} {}", q.term, i), Handle::Uri(format!("x-file:{}", i))))
        .take(q.max_items)
        .collect();
    Json(items)
}

async fn play(
    State(log): State<Log>,
    Path(idx): Path<usize>,
    Json(body): Json<HandleBody>,
) -> Result<StatusCode, StatusCode> {
    known(idx)?;
    record(&log, format!("play {} {}", idx, body.handle.uri()));
    Ok(StatusCode::NO_CONTENT)
}

async fn queue(
    State(log): State<Log>,
    Path(idx): Path<usize>,
    Json(body): Json<HandleBody>,
) -> Result<StatusCode, StatusCode> {
    known(idx)?;
    record(&log, format!("queue {} {:?}", idx, body.handle));
    Ok(StatusCode::NO_CONTENT)
}

async fn status(Path(idx): Path<usize>) -> Response {
    if idx == 7 {
        return "not json".into_response();
    }
    if known(idx).is_err() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(TransportStatus {
        transport: TransportState::PausedPlayback,
        volume: 20 + idx as u8,
        repeat: RepeatMode::All,
    })
    .into_response()
}

async fn volume(
    State(log): State<Log>,
    Path(idx): Path<usize>,
    Json(body): Json<VolumeDelta>,
) -> Result<StatusCode, StatusCode> {
    known(idx)?;
    record(&log, format!("volume {} {}", idx, body.delta));
    Ok(StatusCode::OK)
}

fn command(name: &'static str) -> axum::routing::MethodRouter<Log> {
    post(move |State(log): State<Log>, Path(idx): Path<usize>| async move {
        known(idx)?;
        record(&log, format!("{} {}", name, idx));
        Ok::<_, StatusCode>(StatusCode::OK)
    })
}

async fn reindex(State(log): State<Log>) -> StatusCode {
    record(&log, "reindex".to_string());
    StatusCode::ACCEPTED
}

/// Start the bridge; returns its base URL and the request log.
fn spawn_bridge() -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/speakers", get(speakers))
        .route("/search", get(search))
        .route("/speakers/:idx/play", post(play))
        .route("/speakers/:idx/queue", post(queue))
        .route("/speakers/:idx/status", get(status))
        .route("/speakers/:idx/volume", post(volume))
        .route("/speakers/:idx/play-pause", command("play-pause"))
        .route("/speakers/:idx/next", command("next"))
        .route("/speakers/:idx/previous", command("previous"))
        .route("/speakers/:idx/repeat", command("repeat"))
        .route("/library/reindex", post(reindex))
        .with_state(log.clone());

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    (format!("http://{}/", addr), log)
}

fn backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(2)).unwrap()
}

#[test]
fn test_speakers_and_search() {
    let (url, log) = spawn_bridge();
    let mut b = backend(&url);

    assert_eq!(b.speakers().unwrap(), vec!["Kitchen", "Living Room"]);

    let items = b.search(Category::RadioStations, "jazz fm", 3, 1).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "jazz fm 3");
    assert_eq!(items[0].handle, Handle::Uri("x-file:3".into()));
    assert_eq!(
        log.lock().unwrap().as_slice(),
        ["search radio_stations \"jazz fm\" 3 1"]
    );
}

#[test]
fn test_commands_hit_their_routes() {
    let (url, log) = spawn_bridge();
    let mut b = backend(&url);

    b.play(0, &Handle::Uri("x-file:a".into())).unwrap();
    b.add_to_queue(
        1,
        &Handle::Stream {
            uri: "x-rincon-mp3radio://s".into(),
            metadata: "<DIDL/>".into(),
        },
    )
    .unwrap();
    b.play_pause(1).unwrap();
    b.change_volume(0, -2).unwrap();
    b.next(0).unwrap();
    b.previous(0).unwrap();
    b.cycle_repeat(1).unwrap();
    b.reindex().unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0], "play 0 x-file:a");
    assert!(log[1].starts_with("queue 1 Stream"), "{}", log[1]);
    assert_eq!(
        log[2..],
        [
            "play-pause 1",
            "volume 0 -2",
            "next 0",
            "previous 0",
            "repeat 1",
            "reindex",
        ]
    );
}

#[test]
fn test_status_string() {
    let (url, _log) = spawn_bridge();
    let mut b = backend(&url);
    assert_eq!(b.volume_play_as_string(1).unwrap(), "|| 21% R");
}

#[test]
fn test_http_errors_are_typed() {
    let (url, _log) = spawn_bridge();
    let mut b = backend(&url);

    match b.next(5) {
        Err(BackendError::Status { path, status }) => {
            assert_eq!(path, "/speakers/5/next");
            assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(matches!(
        b.volume_play_as_string(7),
        Err(BackendError::Decode { .. })
    ));
}

#[test]
fn test_unreachable_bridge() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let mut b = HttpBackend::new(&format!("http://127.0.0.1:{}", port), Duration::from_millis(500))
        .unwrap();
    assert!(matches!(
        b.speakers(),
        Err(BackendError::Transport { .. })
    ));
}
