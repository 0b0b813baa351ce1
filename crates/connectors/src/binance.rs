//! Binance spot and USD-M futures connector.
//!
//! Both markets share payload layouts and differ only in endpoint paths.
//! Funding endpoints exist on futures only.

use async_trait::async_trait;
use barfeed_core::{
    Error, KlineInterval, RawFundingRate, RawKline, RawMarkPrice, RawTrade, Result,
    StreamedKline, TimestampMs, VenueConfig,
};
use barfeed_ingestion::{finalized, paginate, PageRequest, PageSource, RecordStream};
use futures_util::StreamExt;
use tracing::{debug, info};

use crate::http::RestClient;
use crate::payload::{
    RestFundingRate, RestKlineRow, RestPremiumIndex, RestTrade, WsKlineEvent, WsMarkPrice,
    WsTrade,
};
use crate::ws::connect_json;

/// Binance market family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    Spot,
    UsdMFutures,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Spot => "spot",
            Market::UsdMFutures => "futures",
        }
    }

    fn klines_path(&self) -> &'static str {
        match self {
            Market::Spot => "/api/v3/klines",
            Market::UsdMFutures => "/fapi/v1/klines",
        }
    }

    fn trades_path(&self) -> &'static str {
        match self {
            Market::Spot => "/api/v3/trades",
            Market::UsdMFutures => "/fapi/v1/trades",
        }
    }

    fn funding_rate_path(&self) -> Result<&'static str> {
        self.require_futures("funding rate history")?;
        Ok("/fapi/v1/fundingRate")
    }

    fn premium_index_path(&self) -> Result<&'static str> {
        self.require_futures("current funding rate")?;
        Ok("/fapi/v1/premiumIndex")
    }

    fn require_futures(&self, what: &str) -> Result<()> {
        match self {
            Market::UsdMFutures => Ok(()),
            Market::Spot => Err(Error::config(format!("{what} is only available on futures"))),
        }
    }
}

/// Mark-price push cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateSpeed {
    OneSecond,
    #[default]
    ThreeSeconds,
}

impl UpdateSpeed {
    /// Accepts 1 or 3 seconds.
    pub fn from_seconds(seconds: u32) -> Result<Self> {
        match seconds {
            1 => Ok(UpdateSpeed::OneSecond),
            3 => Ok(UpdateSpeed::ThreeSeconds),
            other => Err(Error::config(format!(
                "mark price update speed must be 1 or 3 seconds, got {other}"
            ))),
        }
    }
}

fn stream_url(ws_base_url: &str, symbol: &str, channel: &str) -> String {
    format!(
        "{}/{}@{}",
        ws_base_url.trim_end_matches('/'),
        symbol.to_lowercase(),
        channel
    )
}

/// Raw-record access to one Binance market.
#[derive(Debug, Clone)]
pub struct BinanceConnector {
    market: Market,
    rest: RestClient,
    ws_base_url: String,
    kline_page_limit: usize,
    funding_page_limit: usize,
    max_trade_limit: usize,
}

impl BinanceConnector {
    pub fn new(market: Market, venue: &VenueConfig) -> Result<Self> {
        venue.validate(market.as_str())?;
        Ok(Self {
            market,
            rest: RestClient::new(venue)?,
            ws_base_url: venue.ws_base_url.clone(),
            kline_page_limit: venue.kline_page_limit,
            funding_page_limit: venue.funding_page_limit,
            max_trade_limit: venue.max_trade_limit,
        })
    }

    pub fn spot(venue: &VenueConfig) -> Result<Self> {
        Self::new(Market::Spot, venue)
    }

    pub fn futures(venue: &VenueConfig) -> Result<Self> {
        Self::new(Market::UsdMFutures, venue)
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn max_trade_limit(&self) -> usize {
        self.max_trade_limit
    }

    /// Every closed kline whose open time lies in `[start_ms, end_ms]`.
    pub fn fetch_klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        start_ms: TimestampMs,
        end_ms: TimestampMs,
    ) -> RecordStream<RawKline> {
        let pages = KlinePages {
            rest: self.rest.clone(),
            path: self.market.klines_path(),
            symbol: symbol.to_string(),
            interval,
            cap: self.kline_page_limit,
        };
        paginate(pages, start_ms, Some(end_ms))
    }

    /// The `limit` most recent trades, oldest first.
    pub async fn fetch_trades(&self, symbol: &str, limit: usize) -> Result<Vec<RawTrade>> {
        if limit == 0 || limit > self.max_trade_limit {
            return Err(Error::config(format!(
                "trade limit must be in 1..={}, got {limit}",
                self.max_trade_limit
            )));
        }
        let query = [
            ("symbol", symbol.to_string()),
            ("limit", limit.to_string()),
        ];
        let trades: Vec<RestTrade> = self
            .rest
            .get_json(self.market.trades_path(), &query)
            .await?;
        debug!(symbol, count = trades.len(), "fetched recent trades");
        Ok(trades.into_iter().map(RawTrade::from).collect())
    }

    /// Funding events from `start_ms` up to `end_ms` (or the latest).
    pub fn fetch_funding_rates(
        &self,
        symbol: &str,
        start_ms: TimestampMs,
        end_ms: Option<TimestampMs>,
    ) -> Result<RecordStream<RawFundingRate>> {
        let pages = FundingPages {
            rest: self.rest.clone(),
            path: self.market.funding_rate_path()?,
            symbol: symbol.to_string(),
            cap: self.funding_page_limit,
        };
        Ok(paginate(pages, start_ms, end_ms))
    }

    /// Latest mark price and funding rate snapshot.
    pub async fn fetch_premium_index(&self, symbol: &str) -> Result<RawMarkPrice> {
        let path = self.market.premium_index_path()?;
        let index: RestPremiumIndex = self
            .rest
            .get_json(path, &[("symbol", symbol.to_string())])
            .await?;
        Ok(index.into())
    }

    /// Closed klines as they finalize. In-progress updates are dropped.
    pub async fn stream_klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<RecordStream<StreamedKline>> {
        let url = stream_url(&self.ws_base_url, symbol, &format!("kline_{interval}"));
        info!(market = self.market.as_str(), symbol, %interval, "subscribing to klines");
        let events = connect_json::<WsKlineEvent>(&url).await?;
        Ok(finalized(events.map(|event| event.map(StreamedKline::from))))
    }

    /// Every trade print as it happens.
    pub async fn stream_trades(&self, symbol: &str) -> Result<RecordStream<RawTrade>> {
        let url = stream_url(&self.ws_base_url, symbol, "trade");
        info!(market = self.market.as_str(), symbol, "subscribing to trades");
        let events = connect_json::<WsTrade>(&url).await?;
        Ok(finalized(events.map(|event| event.and_then(WsTrade::into_raw))))
    }

    /// Mark price and funding rate pushes.
    pub async fn stream_mark_price(
        &self,
        symbol: &str,
        speed: UpdateSpeed,
    ) -> Result<RecordStream<RawMarkPrice>> {
        self.market.require_futures("mark price stream")?;
        let channel = match speed {
            UpdateSpeed::OneSecond => "markPrice@1s",
            UpdateSpeed::ThreeSeconds => "markPrice",
        };
        let url = stream_url(&self.ws_base_url, symbol, channel);
        info!(symbol, ?speed, "subscribing to mark price");
        let events = connect_json::<WsMarkPrice>(&url).await?;
        Ok(finalized(events.map(|event| event.map(RawMarkPrice::from))))
    }
}

struct KlinePages {
    rest: RestClient,
    path: &'static str,
    symbol: String,
    interval: KlineInterval,
    cap: usize,
}

#[async_trait]
impl PageSource for KlinePages {
    type Record = RawKline;

    fn page_cap(&self) -> usize {
        self.cap
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<RawKline>> {
        let mut query = vec![
            ("symbol", self.symbol.clone()),
            ("interval", self.interval.to_string()),
            ("startTime", request.start_ms.to_string()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(end) = request.end_ms {
            query.push(("endTime", end.to_string()));
        }
        let rows: Vec<RestKlineRow> = self.rest.get_json(self.path, &query).await?;
        Ok(rows.into_iter().map(RawKline::from).collect())
    }
}

struct FundingPages {
    rest: RestClient,
    path: &'static str,
    symbol: String,
    cap: usize,
}

#[async_trait]
impl PageSource for FundingPages {
    type Record = RawFundingRate;

    fn page_cap(&self) -> usize {
        self.cap
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<RawFundingRate>> {
        let mut query = vec![
            ("symbol", self.symbol.clone()),
            ("startTime", request.start_ms.to_string()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(end) = request.end_ms {
            query.push(("endTime", end.to_string()));
        }
        let rows: Vec<RestFundingRate> = self.rest.get_json(self.path, &query).await?;
        Ok(rows.into_iter().map(RawFundingRate::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot() -> BinanceConnector {
        BinanceConnector::spot(&VenueConfig::binance_spot()).unwrap()
    }

    #[test]
    fn test_stream_url_lowercases_symbol() {
        assert_eq!(
            stream_url("wss://stream.binance.com:9443/ws", "BTCUSDT", "kline_1m"),
            "wss://stream.binance.com:9443/ws/btcusdt@kline_1m"
        );
        assert_eq!(
            stream_url("wss://fstream.binance.com/ws/", "ETHUSDT", "markPrice@1s"),
            "wss://fstream.binance.com/ws/ethusdt@markPrice@1s"
        );
    }

    #[test]
    fn test_market_paths() {
        assert_eq!(Market::Spot.klines_path(), "/api/v3/klines");
        assert_eq!(Market::UsdMFutures.klines_path(), "/fapi/v1/klines");
        assert_eq!(Market::Spot.trades_path(), "/api/v3/trades");
        assert_eq!(Market::UsdMFutures.trades_path(), "/fapi/v1/trades");
        assert_eq!(
            Market::UsdMFutures.funding_rate_path().unwrap(),
            "/fapi/v1/fundingRate"
        );
        assert!(Market::Spot.premium_index_path().is_err());
    }

    #[test]
    fn test_update_speed() {
        assert_eq!(UpdateSpeed::from_seconds(1).unwrap(), UpdateSpeed::OneSecond);
        assert_eq!(UpdateSpeed::from_seconds(3).unwrap(), UpdateSpeed::ThreeSeconds);
        assert_eq!(UpdateSpeed::default(), UpdateSpeed::ThreeSeconds);
        assert!(matches!(UpdateSpeed::from_seconds(2), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_venue_rejected() {
        let venue = VenueConfig {
            kline_page_limit: 0,
            ..VenueConfig::binance_spot()
        };
        assert!(matches!(
            BinanceConnector::spot(&venue),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_trade_limit_checked_before_request() {
        let connector = spot();
        for limit in [0, connector.max_trade_limit() + 1] {
            let result = connector.fetch_trades("BTCUSDT", limit).await;
            assert!(matches!(result, Err(Error::Config(_))));
        }
    }

    #[tokio::test]
    async fn test_funding_endpoints_need_futures() {
        let connector = spot();
        assert!(matches!(
            connector.fetch_funding_rates("BTCUSDT", 0, None),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            connector.fetch_premium_index("BTCUSDT").await,
            Err(Error::Config(_))
        ));
        assert!(matches!(
            connector
                .stream_mark_price("BTCUSDT", UpdateSpeed::OneSecond)
                .await,
            Err(Error::Config(_))
        ));
    }
}
