//! Conversion of raw wire records into canonical types.
//!
//! Every numeric field goes from decimal text straight to `Decimal`, and
//! every millisecond timestamp to a UTC instant. Venues omit some context
//! from their payloads (klines carry no symbol), so callers supply it.

use barfeed_core::time::ms_to_utc;
use barfeed_core::wire::parse_decimal;
use barfeed_core::{
    Bar, FundingRate, KlineInterval, RawFundingRate, RawKline, RawMarkPrice, RawTrade, Result,
    TimeBar, Trade,
};

/// Convert a raw kline into a [`TimeBar`].
pub fn to_time_bar(raw: &RawKline, symbol: &str, interval: KlineInterval) -> Result<TimeBar> {
    Ok(TimeBar {
        bar: Bar {
            symbol: symbol.to_string(),
            open: parse_decimal("open", &raw.open)?,
            high: parse_decimal("high", &raw.high)?,
            low: parse_decimal("low", &raw.low)?,
            close: parse_decimal("close", &raw.close)?,
            volume: parse_decimal("volume", &raw.volume)?,
            trade_count: raw.trade_count,
            timestamp: ms_to_utc(raw.open_time_ms)?,
            close_time: ms_to_utc(raw.close_time_ms)?,
        },
        interval_seconds: interval.seconds(),
    })
}

/// Convert a raw trade into a [`Trade`].
pub fn to_trade(raw: &RawTrade, symbol: &str) -> Result<Trade> {
    Ok(Trade {
        symbol: symbol.to_string(),
        price: parse_decimal("price", &raw.price)?,
        quantity: parse_decimal("qty", &raw.qty)?,
        timestamp: ms_to_utc(raw.time_ms)?,
        is_buyer_maker: raw.is_buyer_maker,
    })
}

/// Convert a historical settlement record into a [`FundingRate`].
pub fn to_funding_rate(raw: &RawFundingRate) -> Result<FundingRate> {
    Ok(FundingRate {
        symbol: raw.symbol.clone(),
        funding_rate: parse_decimal("funding_rate", &raw.funding_rate)?,
        mark_price: parse_decimal("mark_price", &raw.mark_price)?,
        timestamp: ms_to_utc(raw.funding_time_ms)?,
        next_funding_time: None,
    })
}

/// Convert a live mark-price snapshot into a [`FundingRate`].
///
/// The snapshot's rate is the current, not yet settled one, and
/// `next_funding_time` is populated from the scheduled settlement.
pub fn to_current_funding_rate(raw: &RawMarkPrice) -> Result<FundingRate> {
    Ok(FundingRate {
        symbol: raw.symbol.clone(),
        funding_rate: parse_decimal("last_funding_rate", &raw.last_funding_rate)?,
        mark_price: parse_decimal("mark_price", &raw.mark_price)?,
        timestamp: ms_to_utc(raw.time_ms)?,
        next_funding_time: Some(ms_to_utc(raw.next_funding_time_ms)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use barfeed_core::Error;
    use chrono::Timelike;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn raw_kline() -> RawKline {
        RawKline {
            open_time_ms: 1_499_040_000_000,
            open: "0.01634790".to_string(),
            high: "0.80000000".to_string(),
            low: "0.01575800".to_string(),
            close: "0.01577100".to_string(),
            volume: "148976.11427815".to_string(),
            close_time_ms: 1_499_644_799_999,
            quote_volume: "2434.19055334".to_string(),
            trade_count: 308,
            taker_buy_volume: "1756.87402397".to_string(),
            taker_buy_quote_volume: "28.46694368".to_string(),
        }
    }

    #[test]
    fn test_kline_to_time_bar() {
        let bar = to_time_bar(&raw_kline(), "BNBBTC", KlineInterval::W1).unwrap();
        assert_eq!(bar.bar.symbol, "BNBBTC");
        assert_eq!(bar.bar.open.to_string(), "0.01634790");
        assert_eq!(bar.bar.volume, d("148976.11427815"));
        assert_eq!(bar.bar.trade_count, 308);
        assert_eq!(bar.bar.timestamp.timestamp_millis(), 1_499_040_000_000);
        assert_eq!(bar.bar.close_time.timestamp_millis(), 1_499_644_799_999);
        assert_eq!(bar.bar.close_time.nanosecond(), 999_000_000);
        assert_eq!(bar.interval_seconds, 604_800);
        assert!(bar.bar.is_consistent());
    }

    #[test]
    fn test_month_interval_uses_thirty_days() {
        let bar = to_time_bar(&raw_kline(), "BNBBTC", KlineInterval::Mo1).unwrap();
        assert_eq!(bar.interval_seconds, 30 * 86_400);
    }

    #[test]
    fn test_malformed_kline_is_error() {
        let mut raw = raw_kline();
        raw.high = "NaN?".to_string();
        let err = to_time_bar(&raw, "BNBBTC", KlineInterval::M1).unwrap_err();
        assert!(matches!(err, Error::Conversion(msg) if msg.starts_with("high")));
    }

    #[test]
    fn test_trade() {
        let raw = RawTrade {
            id: 28457,
            price: "4.00000100".to_string(),
            qty: "12.00000000".to_string(),
            quote_qty: "48.000012".to_string(),
            time_ms: 1_499_865_549_590,
            is_buyer_maker: true,
        };
        let trade = to_trade(&raw, "BNBBTC").unwrap();
        assert_eq!(trade.price.to_string(), "4.00000100");
        assert_eq!(trade.quantity, d("12"));
        assert!(trade.is_buyer_maker);
        assert_eq!(trade.timestamp.timestamp_millis(), 1_499_865_549_590);
        assert_eq!(trade.notional(), Some(d("48.000012")));
    }

    #[test]
    fn test_funding_rate() {
        let raw = RawFundingRate {
            symbol: "BTCUSDT".to_string(),
            funding_time_ms: 1_570_608_000_000,
            funding_rate: "-0.03750000".to_string(),
            mark_price: "34287.54619963".to_string(),
        };
        let rate = to_funding_rate(&raw).unwrap();
        assert_eq!(rate.funding_rate.to_string(), "-0.03750000");
        assert_eq!(rate.mark_price, d("34287.54619963"));
        assert!(rate.next_funding_time.is_none());
    }

    #[test]
    fn test_current_funding_rate() {
        let raw = RawMarkPrice {
            symbol: "BTCUSDT".to_string(),
            mark_price: "11793.63104562".to_string(),
            index_price: "11781.80495970".to_string(),
            last_funding_rate: "0.00038246".to_string(),
            next_funding_time_ms: 1_597_392_000_000,
            time_ms: 1_597_370_495_002,
        };
        let rate = to_current_funding_rate(&raw).unwrap();
        assert_eq!(rate.funding_rate, d("0.00038246"));
        assert_eq!(rate.timestamp.timestamp_millis(), 1_597_370_495_002);
        assert_eq!(
            rate.next_funding_time.map(|t| t.timestamp_millis()),
            Some(1_597_392_000_000)
        );
    }
}
