use chrono::NaiveDate;
use serde::Serialize;

use crate::date_util::days_before;

/// The named look-back windows used by the stats sidebars.
///
/// Comparisons are on calendar dates only. `today` must already be the
/// local date of the deployment; no timezone conversion happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Today,
    Last7Days,
    Last30Days,
}

impl TimeWindow {
    pub fn days(&self) -> u32 {
        match self {
            TimeWindow::Today => 0,
            TimeWindow::Last7Days => 7,
            TimeWindow::Last30Days => 30,
        }
    }

    /// Earliest date inside the window.
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        days_before(today, self.days())
    }

    /// `Today` is an exact match. The look-back windows only bound the
    /// start, so records dated after `today` are included as well.
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            TimeWindow::Today => date == today,
            _ => date >= self.cutoff(today),
        }
    }

    pub fn select<'a, T, F>(&self, records: &'a [T], today: NaiveDate, date_fn: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> NaiveDate,
    {
        records
            .iter()
            .filter(|r| self.contains(date_fn(r), today))
            .collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::Today => "today",
            TimeWindow::Last7Days => "last 7 days",
            TimeWindow::Last30Days => "last 30 days",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_today_record_in_today_and_week() {
        let today = date(2025, 3, 10);
        assert!(TimeWindow::Today.contains(today, today));
        assert!(TimeWindow::Last7Days.contains(today, today));
        assert!(TimeWindow::Last30Days.contains(today, today));
    }

    #[test]
    fn test_week_boundary_is_inclusive() {
        let today = date(2025, 3, 10);
        assert!(TimeWindow::Last7Days.contains(date(2025, 3, 3), today));
        assert!(!TimeWindow::Last7Days.contains(date(2025, 3, 2), today));
        assert!(!TimeWindow::Today.contains(date(2025, 3, 9), today));
    }

    #[test]
    fn test_month_window_crosses_month_start() {
        let today = date(2025, 3, 10);
        assert_eq!(TimeWindow::Last30Days.cutoff(today), date(2025, 2, 8));
        assert!(TimeWindow::Last30Days.contains(date(2025, 2, 8), today));
        assert!(!TimeWindow::Last30Days.contains(date(2025, 2, 7), today));
    }

    #[test]
    fn test_select() {
        let today = date(2025, 3, 10);
        let dates = [date(2025, 3, 10), date(2025, 3, 1), date(2025, 3, 8)];
        let week = TimeWindow::Last7Days.select(&dates, today, |d| *d);
        assert_eq!(week.len(), 2);
        let day = TimeWindow::Today.select(&dates, today, |d| *d);
        assert_eq!(day, vec![&dates[0]]);
    }

    #[test]
    fn test_labels() {
        assert_eq!(TimeWindow::Today.label(), "today");
        assert_eq!(TimeWindow::Last7Days.label(), "last 7 days");
        assert_eq!(TimeWindow::Last30Days.label(), "last 30 days");
    }
}
