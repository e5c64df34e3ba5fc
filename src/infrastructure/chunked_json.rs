// Chunked NDJSON streaming of live series updates
use crate::application::live_series::LiveSeries;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Create a chunked response with one JSON document per line
pub fn chunked_json_stream<S>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = LiveSeries> + Send + 'static,
{
    let byte_stream = stream.map(|update| serialize_chunk(&update));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single update to a newline-terminated chunk
fn serialize_chunk(update: &LiveSeries) -> Result<Bytes, std::io::Error> {
    let payload = serde_json::to_vec(update)?;
    let mut chunk = BytesMut::with_capacity(payload.len() + 1);
    chunk.put_slice(&payload);
    chunk.put_u8(b'\n');
    Ok(chunk.freeze())
}

/// Streaming response that starts with `first` (when present) and then follows
/// the broadcast until the sender goes away. Lagging clients skip missed ticks.
pub fn stream_from_broadcast(
    first: Option<LiveSeries>,
    mut rx: broadcast::Receiver<LiveSeries>,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        if let Some(update) = first {
            yield update;
        }
        loop {
            match rx.recv().await {
                Ok(update) => yield update,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("live stream lagged, skipped {} ticks", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    match chunked_json_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
