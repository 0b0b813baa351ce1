//! Binance spot and USD-M futures clients.

use async_trait::async_trait;
use barfeed_connectors::{BinanceConnector, UpdateSpeed};
use barfeed_core::time::utc_to_ms;
use barfeed_core::{Config, FundingRate, KlineInterval, Result, TimeBar, Trade, VenueConfig};
use barfeed_ingestion::normalizer::{
    to_current_funding_rate, to_funding_rate, to_time_bar, to_trade,
};
use barfeed_ingestion::RecordStream;
use chrono::{DateTime, Utc};
use futures_util::{future, StreamExt, TryStreamExt};
use tracing::debug;

use crate::source::{FundingSource, HistoricalSource, LiveSource};

/// Spot market client.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    connector: BinanceConnector,
}

impl BinanceClient {
    pub fn new(venue: &VenueConfig) -> Result<Self> {
        Ok(Self {
            connector: BinanceConnector::spot(venue)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.spot)
    }

    pub fn connector(&self) -> &BinanceConnector {
        &self.connector
    }
}

/// USD-M perpetual futures client.
#[derive(Debug, Clone)]
pub struct BinanceFuturesClient {
    connector: BinanceConnector,
}

impl BinanceFuturesClient {
    pub fn new(venue: &VenueConfig) -> Result<Self> {
        Ok(Self {
            connector: BinanceConnector::futures(venue)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.futures)
    }

    pub fn connector(&self) -> &BinanceConnector {
        &self.connector
    }
}

// Both markets share payloads, so the capability impls delegate here.

async fn fetch_bars(
    connector: &BinanceConnector,
    symbol: &str,
    interval: KlineInterval,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<TimeBar>> {
    let symbol = symbol.to_uppercase();
    let bars: Vec<TimeBar> = connector
        .fetch_klines(&symbol, interval, utc_to_ms(start), utc_to_ms(end))
        .and_then(|raw| future::ready(to_time_bar(&raw, &symbol, interval)))
        .try_collect()
        .await?;
    debug!(%symbol, %interval, count = bars.len(), "fetched time bars");
    Ok(bars)
}

async fn fetch_trades(
    connector: &BinanceConnector,
    symbol: &str,
    limit: usize,
) -> Result<Vec<Trade>> {
    let symbol = symbol.to_uppercase();
    let raw = connector.fetch_trades(&symbol, limit).await?;
    raw.iter().map(|t| to_trade(t, &symbol)).collect()
}

async fn subscribe_bars(
    connector: &BinanceConnector,
    symbol: &str,
    interval: KlineInterval,
) -> Result<RecordStream<TimeBar>> {
    let symbol = symbol.to_uppercase();
    let klines = connector.stream_klines(&symbol, interval).await?;
    Ok(klines
        .and_then(move |k| future::ready(to_time_bar(&k.kline, &symbol, interval)))
        .boxed())
}

async fn subscribe_trades(
    connector: &BinanceConnector,
    symbol: &str,
) -> Result<RecordStream<Trade>> {
    let symbol = symbol.to_uppercase();
    let trades = connector.stream_trades(&symbol).await?;
    Ok(trades
        .and_then(move |raw| future::ready(to_trade(&raw, &symbol)))
        .boxed())
}

#[async_trait]
impl HistoricalSource for BinanceClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: KlineInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeBar>> {
        fetch_bars(&self.connector, symbol, interval, start, end).await
    }

    async fn fetch_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>> {
        fetch_trades(&self.connector, symbol, limit).await
    }
}

#[async_trait]
impl LiveSource for BinanceClient {
    async fn subscribe_bars(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<RecordStream<TimeBar>> {
        subscribe_bars(&self.connector, symbol, interval).await
    }

    async fn subscribe_trades(&self, symbol: &str) -> Result<RecordStream<Trade>> {
        subscribe_trades(&self.connector, symbol).await
    }
}

#[async_trait]
impl HistoricalSource for BinanceFuturesClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: KlineInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeBar>> {
        fetch_bars(&self.connector, symbol, interval, start, end).await
    }

    async fn fetch_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>> {
        fetch_trades(&self.connector, symbol, limit).await
    }
}

#[async_trait]
impl LiveSource for BinanceFuturesClient {
    async fn subscribe_bars(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<RecordStream<TimeBar>> {
        subscribe_bars(&self.connector, symbol, interval).await
    }

    async fn subscribe_trades(&self, symbol: &str) -> Result<RecordStream<Trade>> {
        subscribe_trades(&self.connector, symbol).await
    }
}

#[async_trait]
impl FundingSource for BinanceFuturesClient {
    async fn fetch_funding_rates(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<FundingRate>> {
        let symbol = symbol.to_uppercase();
        let rates: Vec<FundingRate> = self
            .connector
            .fetch_funding_rates(&symbol, utc_to_ms(start), end.map(utc_to_ms))?
            .and_then(|raw| future::ready(to_funding_rate(&raw)))
            .try_collect()
            .await?;
        debug!(%symbol, count = rates.len(), "fetched funding rates");
        Ok(rates)
    }

    async fn current_funding_rate(&self, symbol: &str) -> Result<FundingRate> {
        let index = self
            .connector
            .fetch_premium_index(&symbol.to_uppercase())
            .await?;
        to_current_funding_rate(&index)
    }

    async fn subscribe_funding_rates(
        &self,
        symbol: &str,
        speed: UpdateSpeed,
    ) -> Result<RecordStream<FundingRate>> {
        let marks = self
            .connector
            .stream_mark_price(&symbol.to_uppercase(), speed)
            .await?;
        Ok(marks
            .and_then(|raw| future::ready(to_current_funding_rate(&raw)))
            .boxed())
    }
}
