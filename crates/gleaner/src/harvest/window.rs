//! Calendar windows used to split a search below the result cap.

use std::fmt;

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    Year,
    Month,
    Day,
}

/// A contiguous, inclusive range of creation dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchWindow {
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
}

impl SearchWindow {
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
            granularity: Granularity::Year,
        })
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next.pred_opt()?,
            granularity: Granularity::Month,
        })
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
            granularity: Granularity::Day,
        }
    }

    /// Whole-year windows from `first` to `last`, both included.
    pub fn years(first: i32, last: i32) -> Vec<Self> {
        (first..=last).filter_map(Self::year).collect()
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn can_subdivide(&self) -> bool {
        self.granularity != Granularity::Day
    }

    /// The next finer windows, in chronological order.
    ///
    /// A year yields its 12 months, a month yields its days. A day yields
    /// nothing.
    pub fn subdivide(&self) -> Vec<Self> {
        match self.granularity {
            Granularity::Year => (1..=12)
                .filter_map(|m| Self::month(self.start.year(), m))
                .collect(),
            Granularity::Month => self
                .start
                .iter_days()
                .take_while(|d| *d <= self.end)
                .map(Self::day)
                .collect(),
            Granularity::Day => Vec::new(),
        }
    }

    /// Search qualifier restricting results to this window.
    pub fn qualifier(&self) -> String {
        match self.granularity {
            Granularity::Day => format!("created:{}", self.start.format("%Y-%m-%d")),
            _ => format!(
                "created:{}..{}",
                self.start.format("%Y-%m-%d"),
                self.end.format("%Y-%m-%d")
            ),
        }
    }

    /// `base_query` restricted to this window.
    pub fn query(&self, base_query: &str) -> String {
        let base = base_query.trim();
        if base.is_empty() {
            self.qualifier()
        } else {
            format!("{} {}", base, self.qualifier())
        }
    }
}

impl fmt::Display for SearchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Year => write!(f, "{}", self.start.format("%Y")),
            Granularity::Month => write!(f, "{}", self.start.format("%Y-%m")),
            Granularity::Day => write!(f, "{}", self.start.format("%Y-%m-%d")),
        }
    }
}
