//! Binance payload shapes and their conversion into wire records.
//!
//! Spot and USD-M futures share these layouts. Prices and quantities stay
//! decimal strings; numeric conversion happens in the normalizer.

use barfeed_core::wire::decimal_product;
use barfeed_core::{RawFundingRate, RawKline, RawMarkPrice, RawTrade, Result, StreamedKline};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// One row of `GET /klines`, a positional array.
///
/// The trailing element is an unused legacy field.
#[derive(Debug, Deserialize)]
pub struct RestKlineRow(
    pub i64,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub i64,
    pub String,
    pub u64,
    pub String,
    pub String,
    pub IgnoredAny,
);

impl From<RestKlineRow> for RawKline {
    fn from(row: RestKlineRow) -> Self {
        Self {
            open_time_ms: row.0,
            open: row.1,
            high: row.2,
            low: row.3,
            close: row.4,
            volume: row.5,
            close_time_ms: row.6,
            quote_volume: row.7,
            trade_count: row.8,
            taker_buy_volume: row.9,
            taker_buy_quote_volume: row.10,
        }
    }
}

/// `<symbol>@kline_<interval>` stream event.
#[derive(Debug, Deserialize)]
pub struct WsKlineEvent {
    #[serde(rename = "k")]
    pub kline: WsKline,
}

#[derive(Debug, Deserialize)]
pub struct WsKline {
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "T")]
    pub close_time: i64,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "v")]
    pub volume: String,
    #[serde(rename = "n")]
    pub trade_count: u64,
    #[serde(rename = "x")]
    pub is_closed: bool,
    #[serde(rename = "q")]
    pub quote_volume: String,
    #[serde(rename = "V")]
    pub taker_buy_volume: String,
    #[serde(rename = "Q")]
    pub taker_buy_quote_volume: String,
}

impl From<WsKlineEvent> for StreamedKline {
    fn from(event: WsKlineEvent) -> Self {
        let k = event.kline;
        Self {
            kline: RawKline {
                open_time_ms: k.open_time,
                open: k.open,
                high: k.high,
                low: k.low,
                close: k.close,
                volume: k.volume,
                close_time_ms: k.close_time,
                quote_volume: k.quote_volume,
                trade_count: k.trade_count,
                taker_buy_volume: k.taker_buy_volume,
                taker_buy_quote_volume: k.taker_buy_quote_volume,
            },
            is_final: k.is_closed,
        }
    }
}

/// One element of `GET /trades`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestTrade {
    pub id: u64,
    pub price: String,
    pub qty: String,
    pub quote_qty: String,
    pub time: i64,
    pub is_buyer_maker: bool,
}

impl From<RestTrade> for RawTrade {
    fn from(t: RestTrade) -> Self {
        Self {
            id: t.id,
            price: t.price,
            qty: t.qty,
            quote_qty: t.quote_qty,
            time_ms: t.time,
            is_buyer_maker: t.is_buyer_maker,
        }
    }
}

/// `<symbol>@trade` stream event.
#[derive(Debug, Deserialize)]
pub struct WsTrade {
    #[serde(rename = "t")]
    pub id: u64,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub qty: String,
    #[serde(rename = "T")]
    pub trade_time: i64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

impl WsTrade {
    /// The stream omits the quote quantity, so it is derived as price × qty.
    pub fn into_raw(self) -> Result<RawTrade> {
        let quote_qty = decimal_product(&self.price, &self.qty)?;
        Ok(RawTrade {
            id: self.id,
            price: self.price,
            qty: self.qty,
            quote_qty,
            time_ms: self.trade_time,
            is_buyer_maker: self.is_buyer_maker,
        })
    }
}

/// One element of `GET /fapi/v1/fundingRate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestFundingRate {
    pub symbol: String,
    pub funding_time: i64,
    pub funding_rate: String,
    /// Absent or empty on older records.
    #[serde(default, deserialize_with = "non_empty")]
    pub mark_price: Option<String>,
}

impl From<RestFundingRate> for RawFundingRate {
    fn from(f: RestFundingRate) -> Self {
        Self {
            symbol: f.symbol,
            funding_time_ms: f.funding_time,
            funding_rate: f.funding_rate,
            mark_price: f.mark_price.unwrap_or_else(|| "0".to_string()),
        }
    }
}

/// `GET /fapi/v1/premiumIndex` for a single symbol.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestPremiumIndex {
    pub symbol: String,
    pub mark_price: String,
    pub index_price: String,
    pub last_funding_rate: String,
    pub next_funding_time: i64,
    pub time: i64,
}

impl From<RestPremiumIndex> for RawMarkPrice {
    fn from(p: RestPremiumIndex) -> Self {
        Self {
            symbol: p.symbol,
            mark_price: p.mark_price,
            index_price: p.index_price,
            last_funding_rate: p.last_funding_rate,
            next_funding_time_ms: p.next_funding_time,
            time_ms: p.time,
        }
    }
}

/// `<symbol>@markPrice` stream event.
#[derive(Debug, Deserialize)]
pub struct WsMarkPrice {
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "p")]
    pub mark_price: String,
    #[serde(rename = "i")]
    pub index_price: String,
    #[serde(rename = "r")]
    pub funding_rate: String,
    #[serde(rename = "T")]
    pub next_funding_time: i64,
}

impl From<WsMarkPrice> for RawMarkPrice {
    fn from(m: WsMarkPrice) -> Self {
        Self {
            symbol: m.symbol,
            mark_price: m.mark_price,
            index_price: m.index_price,
            last_funding_rate: m.funding_rate,
            next_funding_time_ms: m.next_funding_time,
            time_ms: m.event_time,
        }
    }
}

fn non_empty<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_kline_row() {
        let json = r#"[[1499040000000,"0.01634790","0.80000000","0.01575800","0.01577100",
            "148976.11427815",1499644799999,"2434.19055334",308,"1756.87402397",
            "28.46694368","17928899.62484339"]]"#;
        let rows: Vec<RestKlineRow> = serde_json::from_str(json).unwrap();
        let kline = RawKline::from(rows.into_iter().next().unwrap());

        assert_eq!(kline.open_time_ms, 1_499_040_000_000);
        assert_eq!(kline.open, "0.01634790");
        assert_eq!(kline.close, "0.01577100");
        assert_eq!(kline.close_time_ms, 1_499_644_799_999);
        assert_eq!(kline.trade_count, 308);
        assert_eq!(kline.taker_buy_quote_volume, "28.46694368");
    }

    #[test]
    fn test_ws_kline_event() {
        let json = r#"{"e":"kline","E":1672515782136,"s":"BTCUSDT","k":{
            "t":1672515780000,"T":1672515839999,"s":"BTCUSDT","i":"1m",
            "f":100,"L":200,"o":"0.0010","c":"0.0020","h":"0.0025","l":"0.0015",
            "v":"1000","n":100,"x":false,"q":"1.0000","V":"500","Q":"0.500","B":"123456"}}"#;
        let event: WsKlineEvent = serde_json::from_str(json).unwrap();
        let kline = StreamedKline::from(event);

        assert!(!kline.is_final);
        assert_eq!(kline.kline.open_time_ms, 1_672_515_780_000);
        assert_eq!(kline.kline.close_time_ms, 1_672_515_839_999);
        assert_eq!(kline.kline.high, "0.0025");
        assert_eq!(kline.kline.taker_buy_volume, "500");
        assert_eq!(kline.kline.trade_count, 100);
    }

    #[test]
    fn test_rest_trade() {
        let json = r#"[{"id":28457,"price":"4.00000100","qty":"12.00000000",
            "quoteQty":"48.000012","time":1499865549590,"isBuyerMaker":true,
            "isBestMatch":true}]"#;
        let trades: Vec<RestTrade> = serde_json::from_str(json).unwrap();
        let trade = RawTrade::from(trades.into_iter().next().unwrap());

        assert_eq!(trade.id, 28_457);
        assert_eq!(trade.quote_qty, "48.000012");
        assert_eq!(trade.time_ms, 1_499_865_549_590);
        assert!(trade.is_buyer_maker);
    }

    #[test]
    fn test_ws_trade_derives_quote_qty() {
        let json = r#"{"e":"trade","E":1672515782136,"s":"BNBBTC","t":12345,
            "p":"0.001","q":"100","T":1672515782136,"m":true,"M":true}"#;
        let trade = serde_json::from_str::<WsTrade>(json).unwrap().into_raw().unwrap();

        assert_eq!(trade.id, 12_345);
        assert_eq!(trade.quote_qty, "0.100");
        assert_eq!(trade.time_ms, 1_672_515_782_136);
    }

    #[test]
    fn test_ws_trade_bad_price_is_conversion_error() {
        let json = r#"{"t":1,"p":"abc","q":"1","T":0,"m":false}"#;
        let trade: WsTrade = serde_json::from_str(json).unwrap();
        assert!(matches!(
            trade.into_raw(),
            Err(barfeed_core::Error::Conversion(_))
        ));
    }

    #[test]
    fn test_funding_mark_price_defaults_to_zero() {
        let json = r#"[
            {"symbol":"BTCUSDT","fundingRate":"-0.03750000",
             "fundingTime":1570608000000,"markPrice":"34287.54619963"},
            {"symbol":"BTCUSDT","fundingRate":"0.00010000","fundingTime":1570636800000},
            {"symbol":"BTCUSDT","fundingRate":"0.00010000",
             "fundingTime":1570665600000,"markPrice":""}
        ]"#;
        let rates: Vec<RawFundingRate> = serde_json::from_str::<Vec<RestFundingRate>>(json)
            .unwrap()
            .into_iter()
            .map(RawFundingRate::from)
            .collect();

        assert_eq!(rates[0].mark_price, "34287.54619963");
        assert_eq!(rates[0].funding_rate, "-0.03750000");
        assert_eq!(rates[1].mark_price, "0");
        assert_eq!(rates[2].mark_price, "0");
        assert_eq!(rates[2].funding_time_ms, 1_570_665_600_000);
    }

    #[test]
    fn test_premium_index() {
        let json = r#"{"symbol":"BTCUSDT","markPrice":"11793.63104562",
            "indexPrice":"11781.80495970","estimatedSettlePrice":"11781.16138815",
            "lastFundingRate":"0.00038246","interestRate":"0.00010000",
            "nextFundingTime":1597392000000,"time":1597370495002}"#;
        let mark = RawMarkPrice::from(serde_json::from_str::<RestPremiumIndex>(json).unwrap());

        assert_eq!(mark.last_funding_rate, "0.00038246");
        assert_eq!(mark.next_funding_time_ms, 1_597_392_000_000);
        assert_eq!(mark.time_ms, 1_597_370_495_002);
    }

    #[test]
    fn test_ws_mark_price() {
        let json = r#"{"e":"markPriceUpdate","E":1562305380000,"s":"BTCUSDT",
            "p":"11794.15000000","i":"11784.62659091","P":"11784.25641265",
            "r":"0.00038167","T":1562306400000}"#;
        let mark = RawMarkPrice::from(serde_json::from_str::<WsMarkPrice>(json).unwrap());

        assert_eq!(mark.mark_price, "11794.15000000");
        assert_eq!(mark.index_price, "11784.62659091");
        assert_eq!(mark.last_funding_rate, "0.00038167");
        assert_eq!(mark.time_ms, 1_562_305_380_000);
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let json = r#"[[1499040000000,"0.1","0.2"]]"#;
        assert!(serde_json::from_str::<Vec<RestKlineRow>>(json).is_err());
    }
}
