//! Finalized-record gating for live feeds.
//!
//! A kline feed pushes in-progress updates of the forming bar and one final
//! message once the bar closes. Only the final messages are forwarded.
//! Feeds without a partial state (trade prints, mark-price snapshots) are
//! forwarded unchanged.

use crate::paginator::RecordStream;
use barfeed_core::{RawMarkPrice, RawTrade, Result, StreamedKline};
use futures_util::future;
use futures_util::stream::{Stream, StreamExt, TryStreamExt};
use tracing::trace;

/// A pushed message that may be a partial update.
pub trait Finality {
    /// Whether this message carries a finalized record.
    fn is_final(&self) -> bool {
        true
    }
}

impl Finality for StreamedKline {
    fn is_final(&self) -> bool {
        self.is_final
    }
}

impl Finality for RawTrade {}

impl Finality for RawMarkPrice {}

/// Forward only finalized messages from `feed`, in arrival order.
///
/// The first error is forwarded and ends the stream.
pub fn finalized<S, T>(feed: S) -> RecordStream<T>
where
    S: Stream<Item = Result<T>> + Send + 'static,
    T: Finality + Send + 'static,
{
    let mut failed = false;
    feed.take_while(move |item| {
        let keep = !failed;
        failed |= item.is_err();
        future::ready(keep)
    })
    .try_filter(|msg| {
        let keep = msg.is_final();
        if !keep {
            trace!("dropping partial update");
        }
        future::ready(keep)
    })
    .boxed()
}
