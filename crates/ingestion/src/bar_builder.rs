//! Tick, volume and dollar bar building from trades.
//!
//! All three policies share one skeleton: append the trade to the open
//! bucket, update the accumulator, then close the bucket once the
//! accumulator reaches the threshold. A bucket may overshoot by at most one
//! trade; trades are never split. Trades left in an unclosed bucket when the
//! input ends are discarded.

use barfeed_core::{AnyBar, Bar, BarType, DollarBar, Error, Result, TickBar, Trade, VolumeBar};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::borrow::Borrow;
use tracing::debug;

/// Closure rule for a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarPolicy {
    /// Close after this many trades.
    Tick(u32),
    /// Close once cumulative base-asset quantity reaches this value.
    Volume(Decimal),
    /// Close once cumulative price × quantity reaches this value.
    Dollar(Decimal),
}

impl BarPolicy {
    /// Bar variant produced by this policy.
    pub fn bar_type(&self) -> BarType {
        match self {
            BarPolicy::Tick(_) => BarType::Tick,
            BarPolicy::Volume(_) => BarType::Volume,
            BarPolicy::Dollar(_) => BarType::Dollar,
        }
    }

    /// Reject non-positive thresholds.
    pub fn validate(&self) -> Result<()> {
        let positive = match self {
            BarPolicy::Tick(n) => *n > 0,
            BarPolicy::Volume(t) | BarPolicy::Dollar(t) => *t > Decimal::ZERO,
        };
        if positive {
            Ok(())
        } else {
            Err(Error::config(format!("{} bar threshold must be > 0", self.bar_type())))
        }
    }

    fn wrap(&self, bar: Bar) -> AnyBar {
        match *self {
            BarPolicy::Tick(tick_threshold) => AnyBar::Tick(TickBar { bar, tick_threshold }),
            BarPolicy::Volume(volume_threshold) => AnyBar::Volume(VolumeBar {
                bar,
                volume_threshold,
            }),
            BarPolicy::Dollar(dollar_threshold) => AnyBar::Dollar(DollarBar {
                bar,
                dollar_threshold,
            }),
        }
    }
}

/// A bar that's currently being built.
#[derive(Debug, Clone)]
struct BarInProgress {
    symbol: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
    notional: Decimal,
    trade_count: u64,
    timestamp: DateTime<Utc>,
    close_time: DateTime<Utc>,
}

impl BarInProgress {
    fn new(trade: &Trade, policy: &BarPolicy) -> Result<Self> {
        Ok(Self {
            symbol: trade.symbol.clone(),
            open: trade.price,
            high: trade.price,
            low: trade.price,
            close: trade.price,
            volume: trade.quantity,
            notional: tracked_notional(trade, policy)?,
            trade_count: 1,
            timestamp: trade.timestamp,
            close_time: trade.timestamp,
        })
    }

    /// Fold `trade` into the bucket. On overflow the bucket is left unchanged.
    fn add_trade(&mut self, trade: &Trade, policy: &BarPolicy) -> Result<()> {
        let volume = self
            .volume
            .checked_add(trade.quantity)
            .ok_or_else(|| overflow("volume", trade))?;
        let notional = self
            .notional
            .checked_add(tracked_notional(trade, policy)?)
            .ok_or_else(|| overflow("notional", trade))?;

        self.high = self.high.max(trade.price);
        self.low = self.low.min(trade.price);
        self.close = trade.price;
        self.volume = volume;
        self.notional = notional;
        self.trade_count += 1;
        self.close_time = trade.timestamp;
        Ok(())
    }

    fn reached(&self, policy: &BarPolicy) -> bool {
        match policy {
            BarPolicy::Tick(n) => self.trade_count >= u64::from(*n),
            BarPolicy::Volume(threshold) => self.volume >= *threshold,
            BarPolicy::Dollar(threshold) => self.notional >= *threshold,
        }
    }

    fn into_bar(self) -> Bar {
        Bar {
            symbol: self.symbol,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            trade_count: self.trade_count,
            timestamp: self.timestamp,
            close_time: self.close_time,
        }
    }
}

/// Notional is only accumulated for dollar bars.
fn tracked_notional(trade: &Trade, policy: &BarPolicy) -> Result<Decimal> {
    match policy {
        BarPolicy::Dollar(_) => trade.notional().ok_or_else(|| overflow("notional", trade)),
        BarPolicy::Tick(_) | BarPolicy::Volume(_) => Ok(Decimal::ZERO),
    }
}

fn overflow(what: &str, trade: &Trade) -> Error {
    Error::data(format!(
        "{what} overflow adding trade at {} (price {}, qty {})",
        trade.timestamp, trade.price, trade.quantity
    ))
}

/// Incremental threshold bar builder.
///
/// Feed trades in chronological order with [`push`](Self::push); a bar is
/// returned each time the open bucket reaches the policy threshold.
#[derive(Debug, Clone)]
pub struct BarBuilder {
    policy: BarPolicy,
    current: Option<BarInProgress>,
}

impl BarBuilder {
    /// Create a builder. Fails if the threshold is not positive.
    pub fn new(policy: BarPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            current: None,
        })
    }

    /// Add a trade, returning the bar it closes, if any.
    ///
    /// A `Data` error is returned when the bucket's volume or notional would
    /// overflow; the trade is then not added.
    pub fn push(&mut self, trade: &Trade) -> Result<Option<AnyBar>> {
        let policy = self.policy;
        Ok(self.push_bar(trade)?.map(|bar| policy.wrap(bar)))
    }

    fn push_bar(&mut self, trade: &Trade) -> Result<Option<Bar>> {
        let policy = self.policy;
        let reached = match self.current.as_mut() {
            Some(bucket) => {
                bucket.add_trade(trade, &policy)?;
                bucket.reached(&policy)
            }
            None => {
                let bucket = BarInProgress::new(trade, &policy)?;
                let reached = bucket.reached(&policy);
                self.current = Some(bucket);
                reached
            }
        };
        if reached {
            Ok(self.current.take().map(BarInProgress::into_bar))
        } else {
            Ok(None)
        }
    }

    /// Number of trades in the open bucket.
    pub fn pending_trade_count(&self) -> u64 {
        self.current.as_ref().map_or(0, |b| b.trade_count)
    }

    /// Drop the open bucket, returning how many trades it held.
    pub fn discard_pending(&mut self) -> u64 {
        self.current.take().map_or(0, |b| b.trade_count)
    }
}

fn fold<I, B>(trades: I, policy: BarPolicy, wrap: impl Fn(Bar) -> B) -> Result<Vec<B>>
where
    I: IntoIterator,
    I::Item: Borrow<Trade>,
{
    let mut builder = BarBuilder::new(policy)?;
    let mut bars = Vec::new();
    for trade in trades {
        if let Some(bar) = builder.push_bar(trade.borrow())? {
            bars.push(wrap(bar));
        }
    }

    let discarded = builder.discard_pending();
    if discarded > 0 {
        debug!(
            bar_type = %policy.bar_type(),
            discarded,
            "dropping incomplete trailing bucket"
        );
    }
    Ok(bars)
}

/// Aggregate `trades` into bars under `policy`.
pub fn aggregate<I>(trades: I, policy: BarPolicy) -> Result<Vec<AnyBar>>
where
    I: IntoIterator,
    I::Item: Borrow<Trade>,
{
    fold(trades, policy, |bar| policy.wrap(bar))
}

/// Aggregate `trades` into tick bars (one bar per `threshold` trades).
pub fn build_tick_bars<I>(trades: I, threshold: u32) -> Result<Vec<TickBar>>
where
    I: IntoIterator,
    I::Item: Borrow<Trade>,
{
    fold(trades, BarPolicy::Tick(threshold), |bar| TickBar {
        bar,
        tick_threshold: threshold,
    })
}

/// Aggregate `trades` into volume bars.
pub fn build_volume_bars<I>(trades: I, threshold: Decimal) -> Result<Vec<VolumeBar>>
where
    I: IntoIterator,
    I::Item: Borrow<Trade>,
{
    fold(trades, BarPolicy::Volume(threshold), |bar| VolumeBar {
        bar,
        volume_threshold: threshold,
    })
}

/// Aggregate `trades` into dollar (notional) bars.
pub fn build_dollar_bars<I>(trades: I, threshold: Decimal) -> Result<Vec<DollarBar>>
where
    I: IntoIterator,
    I::Item: Borrow<Trade>,
{
    fold(trades, BarPolicy::Dollar(threshold), |bar| DollarBar {
        bar,
        dollar_threshold: threshold,
    })
}
