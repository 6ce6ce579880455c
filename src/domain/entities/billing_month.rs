use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A calendar month, the unit subscriptions are billed in.
///
/// Stored as the first day of the month so it maps directly onto a
/// Postgres `DATE` column. On the wire it is always `MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingMonth(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid month '{0}', expected MM-YYYY")]
pub struct ParseMonthError(pub String);

impl BillingMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Parse the `MM-YYYY` wire format. Two-digit month, four-digit year, nothing else.
    pub fn parse(input: &str) -> Result<Self, ParseMonthError> {
        let err = || ParseMonthError(input.to_string());

        let bytes = input.as_bytes();
        if bytes.len() != 7 || bytes[2] != b'-' {
            return Err(err());
        }
        let (month_part, year_part) = (&input[..2], &input[3..]);
        if !month_part.bytes().all(|b| b.is_ascii_digit())
            || !year_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }

        let month: u32 = month_part.parse().map_err(|_| err())?;
        let year: i32 = year_part.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }

    /// Truncate any date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// The month `Utc::now()` falls in.
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn as_date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Number of month boundaries from `self` to `later`. Negative when `later` is earlier.
    pub fn months_until(&self, later: BillingMonth) -> i64 {
        (later.year() as i64 - self.year() as i64) * 12
            + (later.month() as i64 - self.month() as i64)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl FromStr for BillingMonth {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<BillingMonth> for NaiveDate {
    fn from(month: BillingMonth) -> Self {
        month.0
    }
}

impl Serialize for BillingMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BillingMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
