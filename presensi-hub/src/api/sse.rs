//! SSE stream for dashboard and capture events

use crate::state::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

/// GET /api/v1/events - stream hub events to a connected client
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected");

    let rx = state.subscribe_events();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(hub_event) => Event::default()
                .event(hub_event.event_type())
                .json_data(&hub_event)
                .ok()
                .map(Ok),
            Err(e) => {
                // BroadcastStream wraps RecvError (lagged client); log and
                // continue, the next dashboard event is a full snapshot
                warn!("SSE client lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}
