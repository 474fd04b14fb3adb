//! Game dates and timespans.
//!
//! A date is a day count since the epoch (1.1.1 of year 1). The calendar
//! has 365-day years with standard month lengths and no leap days, so date
//! arithmetic is plain integer arithmetic. Game-internal durations use
//! [`Timespan`] with 365-day "years" and 30-day "months".

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const DAYS_PER_YEAR: i64 = 365;
const MONTH_LENGTHS: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Cumulative days before the start of each month within a year.
const MONTH_STARTS: [i64; 12] = {
    let mut starts = [0i64; 12];
    let mut month = 1;
    while month < 12 {
        starts[month] = starts[month - 1] + MONTH_LENGTHS[month - 1] as i64;
        month += 1;
    }
    starts
};

/// A span of days.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timespan(pub i64);

impl Timespan {
    pub const fn days(days: i64) -> Self {
        Timespan(days)
    }

    /// A game-internal month: 30 days.
    pub const fn months(months: i64) -> Self {
        Timespan(months * 30)
    }

    /// A game-internal year: 365 days.
    pub const fn years(years: i64) -> Self {
        Timespan(years * DAYS_PER_YEAR)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDateError {
    #[error("date literal must be year.month.day")]
    BadShape,
    #[error("date component out of range: {0}")]
    OutOfRange(String),
}

/// A calendar day, stored as days since the epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Date(i64);

impl Date {
    pub const fn from_days(days: i64) -> Self {
        Date(days)
    }

    pub const fn days_since_epoch(self) -> i64 {
        self.0
    }

    /// Build from year (≥ 1), month (1-12) and day (1-month length).
    pub fn from_ymd(year: i64, month: u8, day: u8) -> Option<Self> {
        if year < 1 || !(1..=12).contains(&month) {
            return None;
        }
        if day < 1 || day > MONTH_LENGTHS[month as usize - 1] {
            return None;
        }
        Some(Date(
            (year - 1) * DAYS_PER_YEAR + MONTH_STARTS[month as usize - 1] + day as i64 - 1,
        ))
    }

    pub fn year(self) -> i64 {
        self.0.div_euclid(DAYS_PER_YEAR) + 1
    }

    pub fn month(self) -> u8 {
        let in_year = self.0.rem_euclid(DAYS_PER_YEAR);
        (MONTH_STARTS.iter().rposition(|&s| s <= in_year).unwrap_or(0) + 1) as u8
    }

    pub fn day(self) -> u8 {
        let in_year = self.0.rem_euclid(DAYS_PER_YEAR);
        let month_start = MONTH_STARTS[self.month() as usize - 1];
        (in_year - month_start + 1) as u8
    }
}

impl std::ops::Add<Timespan> for Date {
    type Output = Date;
    fn add(self, span: Timespan) -> Date {
        Date(self.0 + span.0)
    }
}

impl std::ops::Sub<Timespan> for Date {
    type Output = Date;
    fn sub(self, span: Timespan) -> Date {
        Date(self.0 - span.0)
    }
}

impl std::ops::Sub for Date {
    type Output = Timespan;
    fn sub(self, other: Date) -> Timespan {
        Timespan(self.0 - other.0)
    }
}

impl FromStr for Date {
    type Err = ParseDateError;

    /// Parse `year.month.day`, e.g. `1836.1.1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let (year, month, day) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d), None) => (y, m, d),
            _ => return Err(ParseDateError::BadShape),
        };
        let year: i64 = year
            .parse()
            .map_err(|_| ParseDateError::OutOfRange(s.to_owned()))?;
        let month: u8 = month
            .parse()
            .map_err(|_| ParseDateError::OutOfRange(s.to_owned()))?;
        let day: u8 = day
            .parse()
            .map_err(|_| ParseDateError::OutOfRange(s.to_owned()))?;
        Date::from_ymd(year, month, day).ok_or(ParseDateError::OutOfRange(s.to_owned()))
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.year(), self.month(), self.day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_first_day() {
        let d = Date::from_ymd(1, 1, 1).unwrap();
        assert_eq!(d.days_since_epoch(), 0);
        assert_eq!((d.year(), d.month(), d.day()), (1, 1, 1));
    }

    #[test]
    fn ymd_roundtrip() {
        for (y, m, d) in [(1836, 1, 1), (1836, 12, 31), (1, 2, 28), (1936, 7, 15)] {
            let date = Date::from_ymd(y, m, d).unwrap();
            assert_eq!((date.year(), date.month(), date.day()), (y, m, d));
        }
    }

    #[test]
    fn invalid_ymd_rejected() {
        assert!(Date::from_ymd(0, 1, 1).is_none());
        assert!(Date::from_ymd(1836, 13, 1).is_none());
        assert!(Date::from_ymd(1836, 2, 29).is_none()); // no leap days
        assert!(Date::from_ymd(1836, 4, 31).is_none());
    }

    #[test]
    fn parse_and_format() {
        let date: Date = "1836.1.1".parse().unwrap();
        assert_eq!(date, Date::from_ymd(1836, 1, 1).unwrap());
        assert_eq!(date.to_string(), "1836.1.1");
        assert!("1836.1".parse::<Date>().is_err());
        assert!("1836.2.30".parse::<Date>().is_err());
    }

    #[test]
    fn timespan_constructors() {
        assert_eq!(Timespan::years(2), Timespan::days(730));
        assert_eq!(Timespan::months(3), Timespan::days(90));
        let start = Date::from_ymd(1836, 1, 1).unwrap();
        assert_eq!(start + Timespan::years(1), Date::from_ymd(1837, 1, 1).unwrap());
        assert_eq!(start + Timespan::days(31), Date::from_ymd(1836, 2, 1).unwrap());
    }

    #[test]
    fn ordering_follows_days() {
        let a = Date::from_ymd(1836, 1, 1).unwrap();
        let b = Date::from_ymd(1836, 1, 2).unwrap();
        assert!(a < b);
        assert_eq!(b - a, Timespan::days(1));
    }
}
