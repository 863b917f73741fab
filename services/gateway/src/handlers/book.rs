//! Streaming book view
//!
//! One frame per second per connection: a transport ping followed by the
//! `{asks, bids, time}` snapshot. The upgrade always happens; missing or
//! invalid query parameters are reported as an error frame over the socket.
//! The connection closes as soon as the ping or the frame cannot be
//! delivered.

use crate::models::BookStreamQuery;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{
        ws::{Message, Utf8Bytes, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::Utc;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use matching_engine::SnapshotFrame;
use std::time::Duration;

pub async fn book_stream(
    ws: WebSocketUpgrade,
    Path(pair_id): Path<String>,
    Query(query): Query<BookStreamQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| stream_book(socket, state, pair_id, query))
}

async fn stream_book(socket: WebSocket, state: AppState, pair_id: String, query: BookStreamQuery) {
    let (mut sender, mut receiver) = socket.split();

    // Bad parameters get an error frame, not a closed connection; the
    // stream then runs with zero levels.
    let (size, offset) = match query.levels() {
        Ok(levels) => levels,
        Err(err) => {
            if send_error_frame(&mut sender, &err.to_string()).await.is_err() {
                return;
            }
            (0, 0)
        }
    };

    tracing::debug!(pair_id = %pair_id, size, offset, "book stream opened");
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if sender
                    .send(Message::Ping(Bytes::from_static(b"ping")))
                    .await
                    .is_err()
                {
                    tracing::error!(pair_id = %pair_id, "ping failed, closing book stream");
                    break;
                }

                let view = state.engine.book_view(&pair_id, size, offset);
                let frame = SnapshotFrame::new(view, Utc::now());
                let payload = match serde_json::to_string(&frame) {
                    Ok(payload) => payload,
                    Err(err) => {
                        tracing::error!(pair_id = %pair_id, error = %err, "failed to encode book frame");
                        break;
                    }
                };
                if sender.send(Message::Text(Utf8Bytes::from(payload))).await.is_err() {
                    tracing::error!(pair_id = %pair_id, "failed to send book frame, closing");
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    tracing::debug!(pair_id = %pair_id, "book stream closed");
}

async fn send_error_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &str,
) -> Result<(), axum::Error> {
    let frame = serde_json::json!({
        "error": "INVALID_REQUEST",
        "message": message
    });
    sender
        .send(Message::Text(Utf8Bytes::from(frame.to_string())))
        .await
}
