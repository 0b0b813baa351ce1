//! Core types and configuration for the barfeed system.
//!
//! This crate provides shared types used across all other crates:
//! - Canonical market data types (trades, bars, funding rates)
//! - Raw wire records as delivered by a venue
//! - Kline interval table and timestamp conversion
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod interval;
pub mod time;
pub mod types;
pub mod wire;

pub use config::{Config, VenueConfig};
pub use error::{Error, Result};
pub use interval::KlineInterval;
pub use types::*;
pub use wire::{RawFundingRate, RawKline, RawMarkPrice, RawTrade, StreamedKline};
