//! Cursor-based pagination over page-capped historical sources.
//!
//! A historical endpoint returns at most `P` records per request. The
//! paginator drives repeated requests over `[start, end]` and flattens them
//! into one lazy stream: each page is emitted in receipt order, a page
//! shorter than `P` ends the sequence, and otherwise the cursor moves to
//! one millisecond past the closing instant of the last record.

use async_trait::async_trait;
use barfeed_core::{Error, RawFundingRate, RawKline, Result, TimestampMs};
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

/// Stream of records produced by a paginated fetch or a live feed.
pub type RecordStream<T> = BoxStream<'static, Result<T>>;

/// Bounds of one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Inclusive lower bound (ms).
    pub start_ms: TimestampMs,
    /// Inclusive upper bound (ms), or open-ended.
    pub end_ms: Option<TimestampMs>,
    /// Maximum number of records to return.
    pub limit: usize,
}

/// A record that can advance a pagination cursor.
pub trait Paged {
    /// Closing instant of the record; the next page starts one ms later.
    fn cursor_end_ms(&self) -> TimestampMs;
}

impl Paged for RawKline {
    fn cursor_end_ms(&self) -> TimestampMs {
        self.close_time_ms
    }
}

impl Paged for RawFundingRate {
    fn cursor_end_ms(&self) -> TimestampMs {
        self.funding_time_ms
    }
}

/// One bounded historical request against a single resource.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Record: Paged + Send + 'static;

    /// Maximum records a single request may return.
    fn page_cap(&self) -> usize;

    /// Fetch one page, oldest record first.
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Self::Record>>;
}

/// Stream every record of `source` in `[start_ms, end_ms]`.
///
/// No request is issued once the cursor reaches `end_ms`, so an empty or
/// inverted range yields an empty stream. Page `n + 1` is only requested
/// after the consumer has drained page `n`.
pub fn paginate<S>(
    source: S,
    start_ms: TimestampMs,
    end_ms: Option<TimestampMs>,
) -> RecordStream<S::Record>
where
    S: PageSource + 'static,
{
    let pages = stream::try_unfold(Some((source, start_ms)), move |state| async move {
        let Some((source, cursor)) = state else {
            return Ok(None);
        };
        if let Some(end) = end_ms {
            if cursor >= end {
                debug!(cursor, end, "cursor reached end of range");
                return Ok(None);
            }
        }

        let cap = source.page_cap();
        if cap == 0 {
            return Err(Error::config("page capacity must be > 0"));
        }

        let request = PageRequest {
            start_ms: cursor,
            end_ms,
            limit: cap,
        };
        let page = source.fetch_page(request).await?;
        debug!(cursor, records = page.len(), cap, "fetched page");

        let next = match page.last() {
            Some(last) if page.len() >= cap => last.cursor_end_ms().saturating_add(1),
            // Short (or empty) page: this was the final one
            _ => return Ok(Some((page, None))),
        };
        if next <= cursor {
            return Err(Error::data(format!(
                "pagination cursor did not advance (at {cursor} ms, next {next} ms)"
            )));
        }
        Ok(Some((page, Some((source, next)))))
    });

    pages
        .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
}
