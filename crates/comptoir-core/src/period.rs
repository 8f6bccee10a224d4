//! # Period Bucketing
//!
//! Turns an anchor date and a granularity into a half-open window, and
//! groups dated records into those windows.
//!
//! ## Bucket Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Month    [2024-02-01, 2024-03-01)   29 days (leap year)               │
//! │  Quarter  [2024-01-01, 2024-04-01)   start month = floor(m / 3) * 3    │
//! │  Year     [2024-01-01, 2025-01-01)                                     │
//! │                                                                         │
//! │  Inclusive start, exclusive end: a sale at 2024-03-01 00:00:00          │
//! │  belongs to March, never to February.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Current year only" views are simply `Bucket::year(reference_year)`:
//! records outside it are filtered out of the computation, nothing else.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// Period
// =============================================================================

/// Bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Period {
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    /// Length of the bucket in months.
    pub const fn months(&self) -> i32 {
        match self {
            Period::Month => 1,
            Period::Quarter => 3,
            Period::Year => 12,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month => write!(f, "month"),
            Period::Quarter => write!(f, "quarter"),
            Period::Year => write!(f, "year"),
        }
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" | "mois" => Ok(Period::Month),
            "quarter" | "trimestre" => Ok(Period::Quarter),
            "year" | "annee" | "année" => Ok(Period::Year),
            other => Err(CoreError::InvalidPeriod(other.to_string())),
        }
    }
}

// =============================================================================
// Bucket
// =============================================================================

/// A half-open date window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bucket {
    pub period: Period,
    #[ts(type = "string")]
    pub start: NaiveDate,
    #[ts(type = "string")]
    pub end: NaiveDate,
}

impl Bucket {
    /// The bucket of the given granularity containing `anchor`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use comptoir_core::period::{Bucket, Period};
    ///
    /// let anchor = NaiveDate::from_ymd_opt(2024, 8, 17).unwrap();
    /// let q = Bucket::containing(Period::Quarter, anchor);
    /// assert_eq!(q.start, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    /// assert_eq!(q.end, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
    /// ```
    pub fn containing(period: Period, anchor: NaiveDate) -> Self {
        let month0 = anchor.month0() as i32;
        let start_month0 = match period {
            Period::Month => month0,
            Period::Quarter => (month0 / 3) * 3,
            Period::Year => 0,
        };
        Self::from_month_index(period, anchor.year() * 12 + start_month0)
    }

    /// Calendar month bucket.
    pub fn month(year: i32, month: u32) -> Self {
        Self::from_month_index(Period::Month, year * 12 + month.clamp(1, 12) as i32 - 1)
    }

    /// Calendar year bucket.
    pub fn year(year: i32) -> Self {
        Self::from_month_index(Period::Year, year * 12)
    }

    fn from_month_index(period: Period, index: i32) -> Self {
        Bucket {
            period,
            start: first_of_month_index(index),
            end: first_of_month_index(index + period.months()),
        }
    }

    fn start_index(&self) -> i32 {
        self.start.year() * 12 + self.start.month0() as i32
    }

    /// True when `ts` falls inside `[start, end)`.
    #[inline]
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.contains_date(ts.date())
    }

    /// Date flavour of [`Bucket::contains`].
    #[inline]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// The bucket immediately before this one.
    pub fn previous(&self) -> Self {
        Self::from_month_index(self.period, self.start_index() - self.period.months())
    }

    /// The bucket immediately after this one.
    pub fn next(&self) -> Self {
        Self::from_month_index(self.period, self.start_index() + self.period.months())
    }

    /// Number of days in the bucket.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Share of the bucket already elapsed at `now`, in `[0, 1]`.
    pub fn elapsed_fraction(&self, now: NaiveDateTime) -> f64 {
        let start = self.start.and_time(chrono::NaiveTime::MIN);
        let end = self.end.and_time(chrono::NaiveTime::MIN);
        if now <= start {
            return 0.0;
        }
        if now >= end {
            return 1.0;
        }
        let total = (end - start).num_seconds() as f64;
        let elapsed = (now - start).num_seconds() as f64;
        if total > 0.0 {
            elapsed / total
        } else {
            0.0
        }
    }

    /// Short label: `2024-03`, `2024-Q1` or `2024`.
    pub fn label(&self) -> String {
        match self.period {
            Period::Month => MonthKey::of(self.start).to_string(),
            Period::Quarter => format!("{}-Q{}", self.start.year(), self.start.month0() / 3 + 1),
            Period::Year => self.start.year().to_string(),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {})", self.label(), self.start, self.end)
    }
}

/// First day of the month at `year * 12 + month0`.
///
/// Saturates at chrono's supported range instead of panicking.
fn first_of_month_index(index: i32) -> NaiveDate {
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(if index < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

// =============================================================================
// Month Key
// =============================================================================

/// A calendar month, displayed as `YYYY-MM`.
///
/// Orders chronologically, so it can key a `BTreeMap`. Serializes as the
/// `YYYY-MM` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month bucket for this key.
    pub fn bucket(&self) -> Bucket {
        Bucket::month(self.year, self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(MonthKey { year, month })
    }
}

impl TryFrom<String> for MonthKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// `"YYYY-MM"` for the month containing `ts`.
///
/// ## Example
/// ```rust
/// use comptoir_core::period::month_key;
/// use comptoir_core::timestamp::parse_timestamp;
///
/// let ts = parse_timestamp("2024-02-29T23:59:59").unwrap();
/// assert_eq!(month_key(ts), "2024-02");
/// ```
pub fn month_key(ts: NaiveDateTime) -> String {
    MonthKey::of(ts.date()).to_string()
}

// =============================================================================
// Bucket Sequences & Grouping
// =============================================================================

/// The bucket of the given granularity containing `anchor`.
pub fn bucket_for(period: Period, anchor: NaiveDate) -> Bucket {
    Bucket::containing(period, anchor)
}

/// `count` consecutive month buckets ending with the month of `anchor`,
/// oldest first.
pub fn trailing_months(anchor: NaiveDate, count: usize) -> Vec<Bucket> {
    let last = Bucket::containing(Period::Month, anchor);
    let mut months = Vec::with_capacity(count);
    let mut current = last;
    for _ in 0..count {
        months.push(current);
        current = current.previous();
    }
    months.reverse();
    months
}

/// The twelve month buckets of `year`, January first.
pub fn months_of_year(year: i32) -> Vec<Bucket> {
    (1..=12).map(|month| Bucket::month(year, month)).collect()
}

/// Groups records by the bucket containing their timestamp.
///
/// Every record lands in exactly one bucket; buckets without records are
/// absent. Iteration order is chronological.
pub fn group_by_bucket<'a, T, F>(
    records: &'a [T],
    period: Period,
    date_of: F,
) -> BTreeMap<Bucket, Vec<&'a T>>
where
    F: Fn(&T) -> NaiveDateTime,
{
    let mut groups: BTreeMap<Bucket, Vec<&'a T>> = BTreeMap::new();
    for record in records {
        let bucket = Bucket::containing(period, date_of(record).date());
        groups.entry(bucket).or_default().push(record);
    }
    groups
}

/// Records whose timestamp falls inside `bucket`, in input order.
pub fn filter_in_bucket<'a, T, F>(records: &'a [T], bucket: &Bucket, date_of: F) -> Vec<&'a T>
where
    F: Fn(&T) -> NaiveDateTime,
{
    records
        .iter()
        .filter(|record| bucket.contains(date_of(record)))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
