use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

labeled_enum! {
    HomeworkStatus, "homework status" {
        Draft => "draft",
        Assigned => "assigned",
        InProgress => "in_progress",
        Completed => "completed",
        Overdue => "overdue",
    }
}

impl Default for HomeworkStatus {
    fn default() -> Self {
        HomeworkStatus::Assigned
    }
}

impl HomeworkStatus {
    /// Assigned and in-progress homework is still open to students.
    pub fn is_active(&self) -> bool {
        matches!(self, HomeworkStatus::Assigned | HomeworkStatus::InProgress)
    }
}

labeled_enum! {
    HomeworkKind, "homework type" {
        Assignment => "assignment",
        Project => "project",
        Reading => "reading",
        Practice => "practice",
        Research => "research",
        Presentation => "presentation",
    }
}

labeled_enum! {
    Priority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

labeled_enum! {
    Difficulty, "difficulty" {
        Easy => "easy",
        Medium => "medium",
        Hard => "hard",
    }
}

labeled_enum! {
    SubmissionStatus, "submission status" {
        NotSubmitted => "not_submitted",
        Submitted => "submitted",
        Late => "late",
        Graded => "graded",
        Returned => "returned",
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        SubmissionStatus::NotSubmitted
    }
}

impl SubmissionStatus {
    /// Anything past `not_submitted` has been handed in.
    pub fn is_turned_in(&self) -> bool {
        !matches!(self, SubmissionStatus::NotSubmitted)
    }

    pub fn is_graded(&self) -> bool {
        matches!(self, SubmissionStatus::Graded | SubmissionStatus::Returned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Homework {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub subject: String,
    pub class_id: String,
    #[serde(default)]
    pub class_name: String,
    pub teacher_id: String,
    #[serde(default)]
    pub teacher_name: String,
    pub assigned_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: HomeworkKind,
    pub priority: Priority,
    pub difficulty: Difficulty,
    pub total_marks: f64,
    #[serde(default)]
    pub status: HomeworkStatus,
}

impl Homework {
    pub fn validate(&self) -> Result<()> {
        if self.due_date < self.assigned_date {
            return Err(Error::invalid(
                &self.id,
                format!(
                    "due date {} is before assigned date {}",
                    self.due_date, self.assigned_date
                ),
            ));
        }
        if !self.total_marks.is_finite() || self.total_marks <= 0.0 {
            return Err(Error::invalid(&self.id, "total marks must be positive"));
        }
        Ok(())
    }
}

/// Effective status of a homework as of `today`.
///
/// `completed` is final. Otherwise a future assigned date means the homework
/// is still a draft, and a passed due date makes it overdue. A stored
/// `overdue` whose due date has been pushed back falls back to `assigned`.
pub fn derive_status(today: NaiveDate, homework: &Homework) -> HomeworkStatus {
    match homework.status {
        HomeworkStatus::Completed => HomeworkStatus::Completed,
        _ if homework.assigned_date > today => HomeworkStatus::Draft,
        _ if homework.due_date < today => HomeworkStatus::Overdue,
        HomeworkStatus::Overdue => HomeworkStatus::Assigned,
        other => other,
    }
}

/// One student's hand-in for one homework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkSubmission {
    #[serde(default)]
    pub id: String,
    pub homework_id: String,
    pub student_id: String,
    pub student_name: String,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub grade: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub is_late: bool,
    #[serde(default)]
    pub days_late: u32,
}

impl HomeworkSubmission {
    /// Refresh `is_late` and `days_late` against the homework due date.
    pub fn apply_lateness(&mut self, due_date: NaiveDate) {
        let (is_late, days_late) = derive_lateness(self.submitted_at, due_date);
        self.is_late = is_late;
        self.days_late = days_late;
    }

    /// Grade as a percentage of the homework's total marks.
    pub fn grade_percentage(&self, total_marks: f64) -> Option<f64> {
        self.grade
            .filter(|_| total_marks > 0.0)
            .map(|g| g / total_marks * 100.0)
    }

    pub fn validate(&self, homework: &Homework) -> Result<()> {
        if let Some(grade) = self.grade {
            if !grade.is_finite() || grade < 0.0 || grade > homework.total_marks {
                return Err(Error::invalid(
                    &self.id,
                    format!("grade {grade} outside 0..={}", homework.total_marks),
                ));
            }
        }
        if self.status.is_turned_in() && self.submitted_at.is_none() {
            return Err(Error::invalid(
                &self.id,
                format!("status {} requires submittedAt", self.status),
            ));
        }
        Ok(())
    }
}

/// A submission is late when it was handed in on a calendar day after the
/// due date. Unsubmitted work is never late here; overdue homework covers it.
pub fn derive_lateness(submitted_at: Option<NaiveDateTime>, due_date: NaiveDate) -> (bool, u32) {
    match submitted_at {
        Some(at) if at.date() > due_date => (true, (at.date() - due_date).num_days() as u32),
        _ => (false, 0),
    }
}
