use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Days of the month on which payouts are generated.
pub const CYCLE_DAYS: [u32; 3] = [2, 12, 22];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("{0} is not a payout cycle day (expected the 2nd, 12th or 22nd)")]
    NotACycleDay(NaiveDate),
    #[error("invalid cycle date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// An administrative payout period, identified by its generation date.
///
/// # Examples
///
/// ```
/// use binary_payout_engine::core::cycle::PayoutCycle;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 13).unwrap();
/// let cycle = PayoutCycle::on_or_after(date);
/// assert_eq!(cycle.id(), "2026-10-22");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PayoutCycle(NaiveDate);

impl PayoutCycle {
    pub fn new(date: NaiveDate) -> Result<Self, CycleError> {
        if CYCLE_DAYS.contains(&date.day()) {
            Ok(Self(date))
        } else {
            Err(CycleError::NotACycleDay(date))
        }
    }

    /// Parse a `YYYY-MM-DD` cycle id.
    pub fn parse(s: &str) -> Result<Self, CycleError> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| CycleError::InvalidDate(s.to_string()))?;
        Self::new(date)
    }

    /// The first cycle falling on or after `date`.
    pub fn on_or_after(date: NaiveDate) -> Self {
        for day in CYCLE_DAYS {
            if day >= date.day() {
                if let Some(d) = date.with_day(day) {
                    return Self(d);
                }
            }
        }
        Self(first_cycle_of_next_month(date))
    }

    /// The cycle following this one.
    pub fn next(&self) -> Self {
        match self.0.succ_opt() {
            Some(d) => Self::on_or_after(d),
            None => *self,
        }
    }

    /// The cycle preceding this one.
    pub fn previous(&self) -> Self {
        let day = self.0.day();
        if let Some(&prev) = CYCLE_DAYS.iter().rev().find(|&&d| d < day) {
            if let Some(d) = self.0.with_day(prev) {
                return Self(d);
            }
        }
        let (year, month) = if self.0.month() == 1 {
            (self.0.year() - 1, 12)
        } else {
            (self.0.year(), self.0.month() - 1)
        };
        let last = CYCLE_DAYS[CYCLE_DAYS.len() - 1];
        NaiveDate::from_ymd_opt(year, month, last)
            .map(Self)
            .unwrap_or(*self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn id(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

fn first_cycle_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, CYCLE_DAYS[0]).unwrap_or(date)
}

impl fmt::Display for PayoutCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl TryFrom<String> for PayoutCycle {
    type Error = CycleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PayoutCycle> for String {
    fn from(cycle: PayoutCycle) -> Self {
        cycle.id()
    }
}
