use crate::api::AppState;
use crate::stream::StreamPublisher;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::{convert::Infallible, time::Duration};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};

/// `GET /sse`: fleet snapshots as server-sent events. The publisher task
/// stops when the client disconnects and the response stream is dropped.
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(1);
    let subscriber = uuid::Uuid::new_v4().to_string();

    StreamPublisher::new(state.source.clone(), state.config.clone(), subscriber).spawn(tx);

    let stream = ReceiverStream::new(rx).map(|payload| Ok(Event::default().data(payload)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}
