use std::sync::LazyLock;

use chrono::{Days, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::date_util::{last_day_of_month, parse_date};
use crate::error::{Error, Result};

static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
static RE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})\.\.(\d{4}-\d{2}-\d{2})$").unwrap()
});

/// A date span used to narrow queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Today(NaiveDate),
    /// Everything dated on or after `today - n` days.
    LastDays(u32, NaiveDate),
    Year(i32),
    Month(i32, u8),
    Week(i32, u8),
    Range(NaiveDate, NaiveDate),
}

impl Period {
    /// Parse a period string relative to `today`.
    ///
    /// Supported formats:
    /// - `today`
    /// - `7d`, `30d`: on or after N days ago
    /// - `2025`: year
    /// - `2025-03`: month
    /// - `2025-W05`: ISO week
    /// - `2025-03-01..2025-03-31`: inclusive range
    /// - `2025-03-01`: a single day
    pub fn parse(s: &str, today: NaiveDate) -> Result<Self> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("today") {
            return Ok(Period::Today(today));
        }

        if let Some(n) = s.strip_suffix(['d', 'D']) {
            if let Ok(n) = n.parse::<u32>() {
                let period = Period::LastDays(n, today);
                period.date_range()?;
                return Ok(period);
            }
        }

        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Period::Year(year));
            }
        }

        if let Ok(day) = parse_date(s) {
            return Ok(Period::Range(day, day));
        }

        let period = if let Some(caps) = RE_WEEK.captures(s) {
            Period::Week(parse_num(&caps[1], s)?, parse_num(&caps[2], s)?)
        } else if let Some(caps) = RE_MONTH.captures(s) {
            Period::Month(parse_num(&caps[1], s)?, parse_num(&caps[2], s)?)
        } else if let Some(caps) = RE_RANGE.captures(s) {
            let start = parse_date(&caps[1])?;
            let end = parse_date(&caps[2])?;
            if end < start {
                return Err(Error::PeriodParse(format!(
                    "range ends before it starts: {s}"
                )));
            }
            Period::Range(start, end)
        } else {
            return Err(Error::PeriodParse(format!("unrecognized period: {s}")));
        };

        // Reject out-of-range months and weeks up front.
        period.date_range()?;
        Ok(period)
    }

    /// Canonical key string.
    pub fn to_key(&self) -> String {
        match self {
            Period::Today(d) => format!("{d}"),
            Period::LastDays(n, _) => format!("{n}d"),
            Period::Year(y) => format!("{y}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Range(s, e) => format!("{s}..{e}"),
        }
    }

    /// Inclusive start and end. An open end (`None`) has no upper bound.
    pub fn date_range(&self) -> Result<(NaiveDate, Option<NaiveDate>)> {
        let invalid = || Error::PeriodParse(format!("out of range: {}", self.to_key()));
        match self {
            Period::Today(d) => Ok((*d, Some(*d))),
            Period::LastDays(n, today) => {
                let start = today
                    .checked_sub_days(Days::new(*n as u64))
                    .ok_or_else(invalid)?;
                Ok((start, None))
            }
            Period::Year(y) => {
                let start = NaiveDate::from_ymd_opt(*y, 1, 1).ok_or_else(invalid)?;
                let end = NaiveDate::from_ymd_opt(*y, 12, 31).ok_or_else(invalid)?;
                Ok((start, Some(end)))
            }
            Period::Month(y, m) => {
                let start = NaiveDate::from_ymd_opt(*y, *m as u32, 1).ok_or_else(invalid)?;
                let end = last_day_of_month(*y, *m as u32).ok_or_else(invalid)?;
                Ok((start, Some(end)))
            }
            Period::Week(y, w) => {
                let start =
                    NaiveDate::from_isoywd_opt(*y, *w as u32, Weekday::Mon).ok_or_else(invalid)?;
                Ok((start, Some(start + Duration::days(6))))
            }
            Period::Range(s, e) => Ok((*s, Some(*e))),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.date_range() {
            Ok((start, end)) => date >= start && end.map_or(true, |end| date <= end),
            Err(_) => false,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

fn parse_num<T: std::str::FromStr>(digits: &str, input: &str) -> Result<T> {
    digits
        .parse()
        .map_err(|_| Error::PeriodParse(format!("invalid number in period: {input}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_today_and_rolling() {
        let today = date(2025, 3, 10);
        assert_eq!(Period::parse("today", today).unwrap(), Period::Today(today));
        assert_eq!(
            Period::parse("7d", today).unwrap(),
            Period::LastDays(7, today)
        );
        assert_eq!(
            Period::parse("30D", today).unwrap(),
            Period::LastDays(30, today)
        );
    }

    #[test]
    fn test_parse_calendar_periods() {
        let today = date(2025, 3, 10);
        assert_eq!(Period::parse("2025", today).unwrap(), Period::Year(2025));
        assert_eq!(
            Period::parse("2025-02", today).unwrap(),
            Period::Month(2025, 2)
        );
        assert_eq!(
            Period::parse("2025-W05", today).unwrap(),
            Period::Week(2025, 5)
        );
        assert_eq!(
            Period::parse("2025-03-01..2025-03-07", today).unwrap(),
            Period::Range(date(2025, 3, 1), date(2025, 3, 7))
        );
        assert_eq!(
            Period::parse("2025-03-04", today).unwrap(),
            Period::Range(date(2025, 3, 4), date(2025, 3, 4))
        );
    }

    #[test]
    fn test_parse_invalid() {
        let today = date(2025, 3, 10);
        assert!(Period::parse("garbage", today).is_err());
        assert!(Period::parse("2025-13", today).is_err());
        assert!(Period::parse("2025-W60", today).is_err());
        assert!(Period::parse("2025-03-07..2025-03-01", today).is_err());
    }

    #[test]
    fn test_parse_rejects_rolling_window_before_calendar_start() {
        let today = date(2025, 3, 12);
        assert!(matches!(
            Period::parse("4000000000d", today),
            Err(Error::PeriodParse(_))
        ));

        // Built directly, it matches nothing rather than panicking.
        let p = Period::LastDays(4_000_000_000, today);
        assert!(p.date_range().is_err());
        assert!(!p.contains(today));
    }

    #[test]
    fn test_date_range_month() {
        let (s, e) = Period::Month(2024, 2).date_range().unwrap();
        assert_eq!(s, date(2024, 2, 1));
        assert_eq!(e, Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_date_range_week() {
        let (s, e) = Period::Week(2025, 1).date_range().unwrap();
        assert_eq!(s.weekday(), Weekday::Mon);
        assert_eq!((e.unwrap() - s).num_days(), 6);
    }

    #[test]
    fn test_rolling_is_open_ended() {
        let today = date(2025, 3, 10);
        let p = Period::LastDays(7, today);
        assert!(p.contains(date(2025, 3, 3)));
        assert!(!p.contains(date(2025, 3, 2)));
        assert!(p.contains(date(2025, 3, 12)));
    }

    #[test]
    fn test_to_key() {
        assert_eq!(Period::Month(2025, 1).to_key(), "2025-01");
        assert_eq!(Period::Week(2025, 5).to_key(), "2025-W05");
        assert_eq!(Period::LastDays(30, date(2025, 3, 10)).to_string(), "30d");
    }
}
