//! Month parsing and half-open month intervals

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Storage format for transaction dates
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A calendar month as the half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub year: i32,
    pub month: u32,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl MonthRange {
    /// Parse a `YYYY-MM` string
    ///
    /// Rejects anything that is not exactly seven characters with `-` at
    /// index 4 and ASCII digits elsewhere, or whose parts do not form a real month.
    pub fn parse(month: &str) -> Result<Self> {
        let invalid = || Error::InvalidMonth(month.to_string());

        let bytes = month.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let mut digits = bytes[..4].iter().chain(&bytes[5..]);
        if !digits.all(u8::is_ascii_digit) {
            return Err(invalid());
        }

        let year: i32 = month[..4].parse().map_err(|_| invalid())?;
        let mon: u32 = month[5..].parse().map_err(|_| invalid())?;

        Self::from_parts(year, mon).ok_or_else(invalid)
    }

    /// Build a range from numeric parts, `None` if the month is out of range
    pub fn from_parts(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;

        Some(Self {
            year,
            month,
            start: start.and_hms_opt(0, 0, 0)?,
            end: end.and_hms_opt(0, 0, 0)?,
        })
    }

    /// The month immediately before this one
    pub fn previous(&self) -> Option<Self> {
        if self.month == 1 {
            Self::from_parts(self.year - 1, 12)
        } else {
            Self::from_parts(self.year, self.month - 1)
        }
    }

    /// This month followed by up to `n - 1` months before it, newest first
    pub fn trailing(&self, n: usize) -> Vec<Self> {
        let mut months = Vec::with_capacity(n);
        let mut current = Some(*self);
        while months.len() < n {
            match current {
                Some(m) => {
                    months.push(m);
                    current = m.previous();
                }
                None => break,
            }
        }
        months
    }

    /// Whether a timestamp falls inside `[start, end)`
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at < self.end
    }

    /// `YYYY-MM` label
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Bounds formatted for SQL comparison against stored dates
    pub fn sql_bounds(&self) -> (String, String) {
        (
            self.start.format(DATE_FORMAT).to_string(),
            self.end.format(DATE_FORMAT).to_string(),
        )
    }

    /// `[Jan 1, next Jan 1)` of this month's year
    pub fn year_bounds(&self) -> (String, String) {
        let start = format!("{:04}-01-01 00:00:00", self.year);
        let end = format!("{:04}-01-01 00:00:00", self.year + 1);
        (start, end)
    }
}

/// `YYYY-MM` label of a timestamp
pub fn month_label(at: NaiveDateTime) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}
