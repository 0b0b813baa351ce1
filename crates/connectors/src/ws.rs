//! WebSocket transport.

use barfeed_core::{Error, Result};
use barfeed_ingestion::RecordStream;
use futures_util::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

/// Connect to `url` and decode every text frame as JSON `T`.
///
/// Ping frames are answered by the transport while reading. Any ending that
/// the consumer did not ask for (close frame, dropped connection, read or
/// decode failure) yields one error item and ends the stream. Dropping the
/// stream closes the connection.
pub async fn connect_json<T>(url: &str) -> Result<RecordStream<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    info!(%url, "connecting stream");
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| Error::transport(format!("connecting {url}: {e}")))?;

    let feed = stream::unfold(Some(ws), |state| async move {
        let mut ws = state?;
        loop {
            let error = match ws.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<T>(&text) {
                    Ok(msg) => return Some((Ok(msg), Some(ws))),
                    Err(e) => {
                        warn!(error = %e, "undecodable stream message");
                        Error::conversion(format!("decoding stream message: {e}"))
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    warn!(?frame, "stream closed by venue");
                    Error::stream_closed(format!("closed by venue: {frame:?}"))
                }
                // Ping, pong, binary and raw frames carry no records
                Some(Ok(_)) => continue,
                Some(Err(e)) => Error::stream_closed(e.to_string()),
                None => Error::stream_closed("connection ended"),
            };
            return Some((Err(error), None));
        }
    });

    Ok(feed.boxed())
}
