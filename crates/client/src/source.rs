//! Capability traits over canonical market data.
//!
//! A venue implements the capabilities it supports. Threshold bars are
//! derived from trades, so they come for free with [`HistoricalSource`] and
//! [`LiveSource`].

use async_trait::async_trait;
use barfeed_connectors::UpdateSpeed;
use barfeed_core::{
    AnyBar, DollarBar, FundingRate, KlineInterval, Result, TickBar, TimeBar, Trade, VolumeBar,
};
use barfeed_ingestion::{
    build_dollar_bars, build_tick_bars, build_volume_bars, BarBuilder, BarPolicy, RecordStream,
};
use chrono::{DateTime, Utc};
use futures_util::{future, StreamExt, TryStreamExt};
use rust_decimal::Decimal;

/// Historical bars and trades.
#[async_trait]
pub trait HistoricalSource: Send + Sync {
    /// Every closed time bar opening in `[start, end]`, in chronological order.
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: KlineInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeBar>>;

    /// The `limit` most recent trades, oldest first.
    async fn fetch_trades(&self, symbol: &str, limit: usize) -> Result<Vec<Trade>>;

    /// Tick bars over the `limit` most recent trades.
    async fn tick_bars(&self, symbol: &str, threshold: u32, limit: usize) -> Result<Vec<TickBar>> {
        BarPolicy::Tick(threshold).validate()?;
        let trades = self.fetch_trades(symbol, limit).await?;
        build_tick_bars(&trades, threshold)
    }

    /// Volume bars over the `limit` most recent trades.
    async fn volume_bars(
        &self,
        symbol: &str,
        threshold: Decimal,
        limit: usize,
    ) -> Result<Vec<VolumeBar>> {
        BarPolicy::Volume(threshold).validate()?;
        let trades = self.fetch_trades(symbol, limit).await?;
        build_volume_bars(&trades, threshold)
    }

    /// Dollar bars over the `limit` most recent trades.
    async fn dollar_bars(
        &self,
        symbol: &str,
        threshold: Decimal,
        limit: usize,
    ) -> Result<Vec<DollarBar>> {
        BarPolicy::Dollar(threshold).validate()?;
        let trades = self.fetch_trades(symbol, limit).await?;
        build_dollar_bars(&trades, threshold)
    }
}

/// Push feeds of finalized records.
///
/// Each stream owns one connection; dropping it unsubscribes. A stream that
/// ends on its own ends with an error item.
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Time bars as they close.
    async fn subscribe_bars(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<RecordStream<TimeBar>>;

    /// Every trade print.
    async fn subscribe_trades(&self, symbol: &str) -> Result<RecordStream<Trade>>;

    /// Threshold bars built from the live trade feed as each one closes.
    async fn subscribe_trade_bars(
        &self,
        symbol: &str,
        policy: BarPolicy,
    ) -> Result<RecordStream<AnyBar>> {
        let mut builder = BarBuilder::new(policy)?;
        let trades = self.subscribe_trades(symbol).await?;
        Ok(trades
            .try_filter_map(move |trade| future::ready(builder.push(&trade)))
            .boxed())
    }
}

/// Perpetual-futures funding data.
#[async_trait]
pub trait FundingSource: Send + Sync {
    /// Funding events from `start` up to `end`, or up to the latest when open.
    async fn fetch_funding_rates(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<FundingRate>>;

    /// The rate that will apply at the next settlement.
    async fn current_funding_rate(&self, symbol: &str) -> Result<FundingRate>;

    /// Funding-rate updates pushed at `speed`.
    async fn subscribe_funding_rates(
        &self,
        symbol: &str,
        speed: UpdateSpeed,
    ) -> Result<RecordStream<FundingRate>>;
}
