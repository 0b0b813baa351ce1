//! Canonical market-data clients for the barfeed system.
//!
//! Callers work with [`TimeBar`](barfeed_core::TimeBar),
//! [`Trade`](barfeed_core::Trade) and [`FundingRate`](barfeed_core::FundingRate)
//! through the capability traits in [`source`]; venue specifics stay in
//! `barfeed_connectors`.

pub mod binance;
pub mod logging;
pub mod source;

pub use barfeed_connectors::UpdateSpeed;
pub use binance::{BinanceClient, BinanceFuturesClient};
pub use logging::init_tracing;
pub use source::{FundingSource, HistoricalSource, LiveSource};
