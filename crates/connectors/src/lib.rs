//! Venue connectors for the barfeed system.
//!
//! Connectors return raw, venue-shaped records; normalization to canonical
//! types is handled separately in `barfeed_ingestion::normalizer`.
//!
//! This crate handles:
//! - REST requests (`http`) and WebSocket feeds (`ws`)
//! - Decoding of Binance payloads into wire records (`payload`)
//! - Paginated kline and funding-rate sources (`binance`)

pub mod binance;
pub mod http;
pub mod payload;
pub mod ws;

pub use binance::{BinanceConnector, Market, UpdateSpeed};
pub use http::RestClient;
