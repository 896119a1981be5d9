use serde::Serialize;

use super::aggregate::{Distribution, RankedEntry, ScoreSummary};
use crate::model::StudentAttendanceSummary;

/// Knobs shared by every stats composer.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOptions {
    /// Length of every ranking table.
    pub top_n: usize,
    /// Pass threshold for assessments without explicit pass marks.
    pub pass_percentage: f64,
    /// Students attending below this rate are flagged.
    pub attendance_alert_threshold: f64,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            top_n: 5,
            pass_percentage: 40.0,
            attendance_alert_threshold: 75.0,
        }
    }
}

/// Attendance sidebar.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttendanceStats {
    pub total_records: u64,
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub excused: u64,
    /// Present and late over all records.
    pub overall_rate: f64,
    pub today_records: u64,
    pub today_rate: f64,
    pub weekly_rate: f64,
    pub monthly_rate: f64,
    pub status_distribution: Distribution,
    /// Classes ranked by attendance rate.
    pub top_classes: Vec<RankedEntry>,
    /// Students ranked by number of absences.
    pub top_absentees: Vec<RankedEntry>,
    pub absences_by_weekday: Distribution,
    /// Students whose rate falls below the alert threshold, lowest first.
    pub students_below_threshold: Vec<StudentAttendanceSummary>,
    pub total_events: u64,
    /// Pooled rate over events that were not cancelled.
    pub event_attendance_rate: f64,
    pub event_status_distribution: Distribution,
    pub has_data: bool,
}

/// Homework sidebar.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HomeworkStats {
    pub total_homework: u64,
    /// Counts by derived status, not the stored one.
    pub status_distribution: Distribution,
    pub active_count: u64,
    pub overdue_count: u64,
    /// Active homework due within the next seven days.
    pub due_soon_count: u64,
    pub assigned_last_7_days: u64,
    pub total_submissions: u64,
    pub turned_in: u64,
    pub late_submissions: u64,
    pub graded: u64,
    pub submission_rate: f64,
    /// Turned in on or before the due date, over everything turned in.
    pub on_time_rate: f64,
    pub grading_rate: f64,
    pub average_grade_percentage: Option<f64>,
    pub subject_distribution: Distribution,
    pub type_distribution: Distribution,
    pub priority_distribution: Distribution,
    /// Classes ranked by submission rate.
    pub top_classes: Vec<RankedEntry>,
    /// False when there are no submissions to report on.
    pub has_data: bool,
}

/// Marks sidebar.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarksStats {
    pub total_assessments: u64,
    pub total_results: u64,
    pub exempted: u64,
    /// Percentage scores over non-exempted results.
    pub scores: ScoreSummary,
    pub pass_count: u64,
    pub fail_count: u64,
    pub pass_rate: f64,
    pub grade_distribution: Distribution,
    pub subject_distribution: Distribution,
    pub type_distribution: Distribution,
    /// Students ranked by average percentage.
    pub top_students: Vec<RankedEntry>,
    /// Subjects ranked by average percentage.
    pub top_subjects: Vec<RankedEntry>,
    pub recent_assessments: u64,
    pub has_data: bool,
}

/// Schedule sidebar.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleStats {
    pub total_entries: u64,
    pub today_sessions: u64,
    /// Session occurrences in the Monday to Sunday week containing today.
    pub week_sessions: u64,
    pub weekly_hours: f64,
    pub day_distribution: Distribution,
    pub type_distribution: Distribution,
    pub status_distribution: Distribution,
    /// Entries not cancelled, over all entries.
    pub utilization_rate: f64,
    pub cancellation_rate: f64,
    /// Teachers ranked by weekly teaching hours.
    pub top_teachers: Vec<RankedEntry>,
    /// Classes ranked by weekly hours.
    pub class_hours: Vec<RankedEntry>,
    pub has_data: bool,
}
