//! Server-Sent Events support

use crate::runtime::SessionEvent;
use crate::state_machine::Snapshot;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert session broadcasts to an SSE stream that opens with `init`
pub fn sse_stream(
    init: Snapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(snapshot_event("init", &init)) });

    // Renderers only draw snapshots; lagged receivers just skip ahead
    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(SessionEvent::Snapshot(snapshot)) => Some(Ok(snapshot_event("snapshot", &snapshot))),
        Ok(_) | Err(_) => None,
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn snapshot_event(event_type: &str, snapshot: &Snapshot) -> Event {
    let data = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event_type).data(data)
}
