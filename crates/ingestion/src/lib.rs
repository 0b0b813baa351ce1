//! Data ingestion and normalization for the barfeed system.
//!
//! This crate handles:
//! - Wire-to-canonical normalization (decimals, timestamps, intervals)
//! - Cursor-based pagination over page-capped historical sources
//! - Finalized-record gating of live feeds
//! - Tick, volume and dollar bar building from trades

pub mod bar_builder;
pub mod normalizer;
pub mod paginator;
pub mod stream_filter;

pub use bar_builder::{
    aggregate, build_dollar_bars, build_tick_bars, build_volume_bars, BarBuilder, BarPolicy,
};
pub use paginator::{paginate, PageRequest, PageSource, Paged, RecordStream};
pub use stream_filter::{finalized, Finality};
