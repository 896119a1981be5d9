use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::aggregate::rate;

labeled_enum! {
    /// Attendance mark for one student on one day.
    AttendanceStatus, "attendance status" {
        Present => "present",
        Absent => "absent",
        Late => "late",
        Excused => "excused",
    }
}

impl AttendanceStatus {
    /// Present and late both count towards the attendance rate.
    pub fn counts_as_attended(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

labeled_enum! {
    /// Lifecycle of a scheduled class session.
    EventStatus, "event status" {
        Scheduled => "scheduled",
        Ongoing => "ongoing",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Scheduled
    }
}

/// One student's attendance on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(default)]
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    #[serde(default)]
    pub class_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub time_in: Option<String>,
    #[serde(default)]
    pub time_out: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub marked_by: Option<String>,
    #[serde(default)]
    pub marked_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// A class session with aggregated attendance counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub class_id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    pub date: NaiveDate,
    pub total_students: u32,
    #[serde(default)]
    pub present_count: u32,
    #[serde(default)]
    pub absent_count: u32,
    #[serde(default)]
    pub late_count: u32,
    #[serde(default)]
    pub excused_count: u32,
    #[serde(default)]
    pub attendance_rate: f64,
    #[serde(default)]
    pub status: EventStatus,
}

impl AttendanceEvent {
    /// Replace all four counts and recompute the attendance rate.
    pub fn set_counts(&mut self, present: u32, absent: u32, late: u32, excused: u32) {
        self.present_count = present;
        self.absent_count = absent;
        self.late_count = late;
        self.excused_count = excused;
        self.recompute_rate();
    }

    pub fn recompute_rate(&mut self) {
        self.attendance_rate = rate(
            self.present_count as u64 + self.late_count as u64,
            self.total_students as u64,
        );
    }

    pub fn counted(&self) -> u64 {
        [
            self.present_count,
            self.absent_count,
            self.late_count,
            self.excused_count,
        ]
        .iter()
        .map(|&c| c as u64)
        .sum()
    }

    /// The four counts must partition `total_students`.
    pub fn validate(&self) -> Result<()> {
        if self.counted() != self.total_students as u64 {
            return Err(Error::invalid(
                &self.id,
                format!(
                    "attendance counts sum to {} but total_students is {}",
                    self.counted(),
                    self.total_students
                ),
            ));
        }
        Ok(())
    }
}

/// Per-student roll-up shown in the student detail dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentAttendanceSummary {
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub total_days: u64,
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub excused: u64,
    pub attendance_rate: f64,
}

/// Subject of the attendance detail dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttendanceDetail {
    Record(AttendanceRecord),
    Event(AttendanceEvent),
    StudentSummary(StudentAttendanceSummary),
}

impl AttendanceDetail {
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceDetail::Record(_) => "record",
            AttendanceDetail::Event(_) => "event",
            AttendanceDetail::StudentSummary(_) => "student_summary",
        }
    }

    /// Dialog heading.
    pub fn title(&self) -> String {
        match self {
            AttendanceDetail::Record(r) => format!("{} ({})", r.student_name, r.date),
            AttendanceDetail::Event(e) => format!("{} ({})", e.title, e.date),
            AttendanceDetail::StudentSummary(s) => s.student_name.clone(),
        }
    }

    /// Headline rate for the dialog, if the subject carries one.
    pub fn attendance_rate(&self) -> Option<f64> {
        match self {
            AttendanceDetail::Record(_) => None,
            AttendanceDetail::Event(e) => Some(e.attendance_rate),
            AttendanceDetail::StudentSummary(s) => Some(s.attendance_rate),
        }
    }
}
