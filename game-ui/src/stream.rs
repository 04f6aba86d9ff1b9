//! NDJSON event streams for game routes.
//!
//! Games are synchronous, so each one runs on a blocking worker and hands its
//! events to the response body through a bounded channel.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use game::error::GameError;
use game::events::{EventSink, GameEvent, WireEvent};
use game::modes::finish;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const EVENT_BUFFER: usize = 32;

pub const NDJSON: &str = "application/x-ndjson";

/// Forwards events from a blocking worker to the async response body.
///
/// A closed channel means the client went away; the game stops at its next
/// emit with [`GameError::Abandoned`].
pub struct ChannelSink {
    tx: mpsc::Sender<GameEvent>,
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: GameEvent) -> Result<(), GameError> {
        self.tx.blocking_send(event).map_err(|_| GameError::Abandoned)
    }
}

/// Delays every event by one, so the caller can act before the client sees
/// the last one.
pub struct HoldLastSink<'a> {
    inner: &'a mut dyn EventSink,
    held: Option<GameEvent>,
}

impl<'a> HoldLastSink<'a> {
    pub fn new(inner: &'a mut dyn EventSink) -> Self {
        Self { inner, held: None }
    }

    /// Forward the held event, if any.
    pub fn release(self) -> Result<(), GameError> {
        match self.held {
            Some(event) => self.inner.emit(event),
            None => Ok(()),
        }
    }
}

impl EventSink for HoldLastSink<'_> {
    fn emit(&mut self, event: GameEvent) -> Result<(), GameError> {
        match self.held.replace(event) {
            Some(previous) => self.inner.emit(previous),
            None => Ok(()),
        }
    }
}

/// Start a per-turn game and `register` it before its last start-up event
/// (the one that invites the client's first move) is streamed.
pub fn start_session<G>(
    sink: &mut dyn EventSink,
    start: impl FnOnce(&mut dyn EventSink) -> Result<G, GameError>,
    register: impl FnOnce(G),
) -> Result<(), GameError> {
    let mut held = HoldLastSink::new(sink);
    let started = start(&mut held).map(register);
    let released = held.release();
    finish(started.and(released), sink)
}

/// One event as a newline-terminated JSON line.
pub fn ndjson_line(event: &GameEvent) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(&WireEvent::from(event))?;
    line.push('\n');
    Ok(line)
}

/// Run `game` on the blocking pool and stream what it emits.
///
/// Errors are already reported to the client as `error` events by the
/// coordinators, so the worker's result is only logged here.
pub fn ndjson_response<F>(game: F) -> Response
where
    F: FnOnce(&mut dyn EventSink) -> Result<(), GameError> + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<GameEvent>(EVENT_BUFFER);
    tokio::task::spawn_blocking(move || {
        let mut sink = ChannelSink { tx };
        if let Err(err) = game(&mut sink) {
            debug!(error = %err, "game stream ended with error");
        }
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match ndjson_line(&event) {
                Ok(line) => yield Ok::<_, Infallible>(line),
                Err(err) => warn!(error = %err, "failed to serialize game event"),
            }
        }
    };

    ([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(stream)).into_response()
}
