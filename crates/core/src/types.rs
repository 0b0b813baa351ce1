//! Canonical market data types for the barfeed system.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::time::TimestampMs;

/// A single executed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Venue symbol (e.g., "BTCUSDT").
    pub symbol: String,
    /// Execution price.
    pub price: Decimal,
    /// Executed base-asset quantity.
    pub quantity: Decimal,
    /// Execution time.
    pub timestamp: DateTime<Utc>,
    /// True when the buyer was the maker (the taker sold).
    pub is_buyer_maker: bool,
}

impl Trade {
    /// Quote-asset value of the trade (price × quantity), `None` on overflow.
    #[inline]
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

/// Bar variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarType {
    /// Fixed-duration bar.
    Time,
    /// Closed after a number of trades.
    Tick,
    /// Closed after a cumulative base-asset volume.
    Volume,
    /// Closed after a cumulative quote-asset notional.
    Dollar,
}

impl BarType {
    pub fn as_str(self) -> &'static str {
        match self {
            BarType::Time => "time",
            BarType::Tick => "tick",
            BarType::Volume => "volume",
            BarType::Dollar => "dollar",
        }
    }
}

impl fmt::Display for BarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OHLCV fields shared by every bar variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Venue symbol.
    pub symbol: String,
    /// Open price.
    pub open: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Total base-asset volume.
    pub volume: Decimal,
    /// Number of trades.
    pub trade_count: u64,
    /// Bar open time.
    pub timestamp: DateTime<Utc>,
    /// Bar close time.
    pub close_time: DateTime<Utc>,
}

impl Bar {
    /// Check the OHLC ordering, volume sign, trade count and time ordering.
    pub fn is_consistent(&self) -> bool {
        self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
            && self.volume >= Decimal::ZERO
            && self.trade_count >= 1
            && self.timestamp <= self.close_time
    }
}

/// Fixed-duration OHLCV bar.
///
/// `interval_seconds` records the nominal duration so downstream code does
/// not have to recompute it from `timestamp` / `close_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub interval_seconds: u32,
}

/// Bar that closes after `tick_threshold` trades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub tick_threshold: u32,
}

/// Bar that closes once cumulative base-asset volume reaches `volume_threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub volume_threshold: Decimal,
}

/// Bar that closes once cumulative notional reaches `dollar_threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DollarBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub dollar_threshold: Decimal,
}

/// Any bar variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "bar_type", rename_all = "lowercase")]
pub enum AnyBar {
    Time(TimeBar),
    Tick(TickBar),
    Volume(VolumeBar),
    Dollar(DollarBar),
}

impl AnyBar {
    /// Variant tag.
    pub fn bar_type(&self) -> BarType {
        match self {
            AnyBar::Time(_) => BarType::Time,
            AnyBar::Tick(_) => BarType::Tick,
            AnyBar::Volume(_) => BarType::Volume,
            AnyBar::Dollar(_) => BarType::Dollar,
        }
    }

    /// Shared OHLCV fields.
    pub fn bar(&self) -> &Bar {
        match self {
            AnyBar::Time(b) => &b.bar,
            AnyBar::Tick(b) => &b.bar,
            AnyBar::Volume(b) => &b.bar,
            AnyBar::Dollar(b) => &b.bar,
        }
    }

    pub fn into_bar(self) -> Bar {
        match self {
            AnyBar::Time(b) => b.bar,
            AnyBar::Tick(b) => b.bar,
            AnyBar::Volume(b) => b.bar,
            AnyBar::Dollar(b) => b.bar,
        }
    }
}

impl From<TimeBar> for AnyBar {
    fn from(b: TimeBar) -> Self {
        AnyBar::Time(b)
    }
}

impl From<TickBar> for AnyBar {
    fn from(b: TickBar) -> Self {
        AnyBar::Tick(b)
    }
}

impl From<VolumeBar> for AnyBar {
    fn from(b: VolumeBar) -> Self {
        AnyBar::Volume(b)
    }
}

impl From<DollarBar> for AnyBar {
    fn from(b: DollarBar) -> Self {
        AnyBar::Dollar(b)
    }
}

/// A funding-rate observation from a perpetual futures market.
///
/// `timestamp` is the settlement time for historical records, or the event
/// time for live snapshots. `next_funding_time` is only set on live snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRate {
    /// Venue symbol.
    pub symbol: String,
    /// Per-period rate, e.g. 0.0001 = 0.01 %.
    pub funding_rate: Decimal,
    /// Mark price at settlement or snapshot time.
    pub mark_price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub next_funding_time: Option<DateTime<Utc>>,
}
