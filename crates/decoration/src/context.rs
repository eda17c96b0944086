//! Per-call decoration context.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

use closet_core::Season;

/// Inputs shared by every enricher during one `decorate` call.
///
/// The clock is read once per call, so all enrichers agree on "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorationContext {
    pub now: DateTime<Utc>,
}

impl DecorationContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn current_season(&self) -> Season {
        Season::for_month(self.now.month())
    }

    /// Whole days between `date` and today, ignoring direction.
    pub fn days_since(&self, date: NaiveDate) -> i64 {
        (self.today() - date).num_days().abs()
    }

    /// Days from today until `date`; negative once `date` has passed.
    pub fn days_until(&self, date: NaiveDate) -> i64 {
        (date - self.today()).num_days()
    }

    /// Whole calendar months between `date` and today, ignoring direction.
    pub fn months_since(&self, date: NaiveDate) -> i64 {
        let (from, to) = if date <= self.today() {
            (date, self.today())
        } else {
            (self.today(), date)
        };
        let mut months = i64::from(to.year() - from.year()) * 12 + i64::from(to.month()) - i64::from(from.month());
        if to.day() < from.day() {
            months -= 1;
        }
        months.max(0)
    }
}

/// Parses the date formats item records carry: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`
/// and RFC 3339 timestamps.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
