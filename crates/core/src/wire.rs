//! Raw records exactly as a venue delivers them.
//!
//! Prices, quantities and rates are kept as decimal text to preserve the
//! precision sent by the exchange; times are epoch milliseconds. Conversion
//! to canonical types happens in the normalizer.

use crate::error::{Error, Result};
use crate::time::TimestampMs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw kline, shared by the REST and WebSocket feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKline {
    pub open_time_ms: TimestampMs,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    /// Base-asset volume.
    pub volume: String,
    pub close_time_ms: TimestampMs,
    /// Quote-asset volume.
    pub quote_volume: String,
    pub trade_count: u64,
    pub taker_buy_volume: String,
    pub taker_buy_quote_volume: String,
}

/// A kline pushed over a live feed, tagged with whether the bar has closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamedKline {
    pub kline: RawKline,
    pub is_final: bool,
}

/// Raw trade print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrade {
    pub id: u64,
    pub price: String,
    pub qty: String,
    pub quote_qty: String,
    pub time_ms: TimestampMs,
    pub is_buyer_maker: bool,
}

/// Raw funding settlement record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFundingRate {
    pub symbol: String,
    /// Settlement time.
    pub funding_time_ms: TimestampMs,
    /// e.g. "0.00010000".
    pub funding_rate: String,
    /// Mark price at settlement.
    pub mark_price: String,
}

/// Raw mark-price snapshot carrying the live funding rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMarkPrice {
    pub symbol: String,
    pub mark_price: String,
    pub index_price: String,
    pub last_funding_rate: String,
    pub next_funding_time_ms: TimestampMs,
    pub time_ms: TimestampMs,
}

/// Parse decimal text without a floating-point intermediate.
///
/// Text with more significant digits than `Decimal` holds is rejected rather
/// than rounded. `field` names the wire field in the error message.
pub fn parse_decimal(field: &str, text: &str) -> Result<Decimal> {
    let value = Decimal::from_str(text)
        .map_err(|e| Error::conversion(format!("{field}: invalid decimal {text:?}: {e}")))?;
    if significant_digits(text) != significant_digits(&value.normalize().to_string()) {
        return Err(Error::conversion(format!("{field}: {text:?} exceeds decimal precision")));
    }
    Ok(value)
}

/// Sign, integer digits and fraction digits with insignificant zeros removed.
fn significant_digits(text: &str) -> (bool, String, String) {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let unsigned: String = unsigned.chars().filter(|c| *c != '_').collect();
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned.as_str(), ""));
    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    let is_zero = int.is_empty() && frac.is_empty();
    (negative && !is_zero, int.to_string(), frac.to_string())
}

/// Exact product of two decimal texts, rendered back to text.
pub fn decimal_product(a: &str, b: &str) -> Result<String> {
    let lhs = parse_decimal("lhs", a)?;
    let rhs = parse_decimal("rhs", b)?;
    let product = lhs
        .checked_mul(rhs)
        .ok_or_else(|| Error::conversion(format!("overflow multiplying {a} by {b}")))?;
    // A shorter scale means the product was rounded to fit
    if product.scale() != lhs.scale() + rhs.scale() {
        return Err(Error::conversion(format!("product of {a} and {b} exceeds decimal precision")));
    }
    Ok(product.to_string())
}
