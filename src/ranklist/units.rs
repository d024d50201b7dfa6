use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::RanklistError;

/// A time unit used by srk durations.
///
/// Variants are declared from finest to coarsest, which is also the
/// priority order used when detecting the best comparison unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum TimeUnit {
    Ms,
    S,
    Min,
    H,
    D,
}

impl TimeUnit {
    /// Exact number of milliseconds in one unit.
    pub fn millis(self) -> i64 {
        match self {
            TimeUnit::Ms => 1,
            TimeUnit::S => 1_000,
            TimeUnit::Min => 60_000,
            TimeUnit::H => 3_600_000,
            TimeUnit::D => 86_400_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
            TimeUnit::Min => "min",
            TimeUnit::H => "h",
            TimeUnit::D => "d",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = RanklistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ms" => Ok(TimeUnit::Ms),
            "s" => Ok(TimeUnit::S),
            "min" => Ok(TimeUnit::Min),
            "h" => Ok(TimeUnit::H),
            "d" => Ok(TimeUnit::D),
            other => Err(RanklistError::InvalidUnit(other.to_string())),
        }
    }
}

impl TryFrom<String> for TimeUnit {
    type Error = RanklistError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeUnit> for &'static str {
    fn from(unit: TimeUnit) -> Self {
        unit.as_str()
    }
}

/// Rounding applied when converting milliseconds into a coarser unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    #[default]
    Floor,
    Ceil,
    /// Half rounds up, like `floor(x + 0.5)`.
    Round,
}

impl RoundingMode {
    pub const ALL: [RoundingMode; 3] = [RoundingMode::Floor, RoundingMode::Ceil, RoundingMode::Round];

    pub fn as_str(self) -> &'static str {
        match self {
            RoundingMode::Floor => "floor",
            RoundingMode::Ceil => "ceil",
            RoundingMode::Round => "round",
        }
    }

    /// Divide `value` by a positive `divisor` with this rounding, exactly.
    fn divide(self, value: i64, divisor: i64) -> i64 {
        let (value, divisor) = (i128::from(value), i128::from(divisor));
        let quotient = match self {
            RoundingMode::Floor => value.div_euclid(divisor),
            RoundingMode::Ceil => -(-value).div_euclid(divisor),
            RoundingMode::Round => (2 * value + divisor).div_euclid(2 * divisor),
        };
        // |quotient| <= |value| whenever divisor >= 1, so it fits back in i64.
        quotient as i64
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "floor" => Ok(RoundingMode::Floor),
            "ceil" => Ok(RoundingMode::Ceil),
            "round" => Ok(RoundingMode::Round),
            other => Err(format!("unknown rounding mode '{}'", other)),
        }
    }
}

/// A duration as stored in srk files: `[magnitude, "unit"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, TimeUnit)", into = "(i64, TimeUnit)")]
pub struct Duration {
    pub magnitude: i64,
    pub unit: TimeUnit,
}

impl Duration {
    pub const fn new(magnitude: i64, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    /// Exact length in milliseconds, or `None` if it does not fit in an `i64`.
    pub fn to_millis(self) -> Option<i64> {
        self.magnitude.checked_mul(self.unit.millis())
    }

    /// Build a duration in `unit` from milliseconds, rounding as requested.
    pub fn from_millis(ms: i64, unit: TimeUnit, rounding: RoundingMode) -> Self {
        Self::new(from_millis(ms, unit, rounding), unit)
    }
}

impl From<(i64, TimeUnit)> for Duration {
    fn from((magnitude, unit): (i64, TimeUnit)) -> Self {
        Self { magnitude, unit }
    }
}

impl From<Duration> for (i64, TimeUnit) {
    fn from(d: Duration) -> Self {
        (d.magnitude, d.unit)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit)
    }
}

/// Convert milliseconds into `unit`, rounding with `rounding`.
///
/// Converting into milliseconds is always exact and ignores the rounding.
pub fn from_millis(ms: i64, unit: TimeUnit, rounding: RoundingMode) -> i64 {
    rounding.divide(ms, unit.millis())
}

/// Finest unit among `durations`, or `d` when there are none.
pub fn best_unit<'a, I>(durations: I) -> TimeUnit
where
    I: IntoIterator<Item = &'a Duration>,
{
    durations
        .into_iter()
        .map(|d| d.unit)
        .min()
        .unwrap_or(TimeUnit::D)
}
