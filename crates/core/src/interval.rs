//! Kline interval tags and their nominal durations.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seconds in one day.
const DAY: u32 = 86_400;

/// Candlestick interval as tagged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "8h")]
    H8,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "3d")]
    D3,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1M")]
    Mo1,
}

impl KlineInterval {
    /// Every supported interval, shortest first.
    pub const ALL: [KlineInterval; 15] = [
        KlineInterval::M1,
        KlineInterval::M3,
        KlineInterval::M5,
        KlineInterval::M15,
        KlineInterval::M30,
        KlineInterval::H1,
        KlineInterval::H2,
        KlineInterval::H4,
        KlineInterval::H6,
        KlineInterval::H8,
        KlineInterval::H12,
        KlineInterval::D1,
        KlineInterval::D3,
        KlineInterval::W1,
        KlineInterval::Mo1,
    ];

    /// Wire tag, e.g. `"1h"`.
    pub fn as_str(self) -> &'static str {
        match self {
            KlineInterval::M1 => "1m",
            KlineInterval::M3 => "3m",
            KlineInterval::M5 => "5m",
            KlineInterval::M15 => "15m",
            KlineInterval::M30 => "30m",
            KlineInterval::H1 => "1h",
            KlineInterval::H2 => "2h",
            KlineInterval::H4 => "4h",
            KlineInterval::H6 => "6h",
            KlineInterval::H8 => "8h",
            KlineInterval::H12 => "12h",
            KlineInterval::D1 => "1d",
            KlineInterval::D3 => "3d",
            KlineInterval::W1 => "1w",
            KlineInterval::Mo1 => "1M",
        }
    }

    /// Nominal bucket duration in seconds.
    ///
    /// One month is approximated as 30 days.
    pub fn seconds(self) -> u32 {
        match self {
            KlineInterval::M1 => 60,
            KlineInterval::M3 => 180,
            KlineInterval::M5 => 300,
            KlineInterval::M15 => 900,
            KlineInterval::M30 => 1_800,
            KlineInterval::H1 => 3_600,
            KlineInterval::H2 => 7_200,
            KlineInterval::H4 => 14_400,
            KlineInterval::H6 => 21_600,
            KlineInterval::H8 => 28_800,
            KlineInterval::H12 => 43_200,
            KlineInterval::D1 => DAY,
            KlineInterval::D3 => 3 * DAY,
            KlineInterval::W1 => 7 * DAY,
            KlineInterval::Mo1 => 30 * DAY,
        }
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KlineInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        KlineInterval::ALL
            .iter()
            .copied()
            .find(|iv| iv.as_str() == s)
            .ok_or_else(|| Error::UnknownInterval(s.to_string()))
    }
}
