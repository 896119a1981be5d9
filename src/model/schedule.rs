use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::date_util::{hhmm, hours_between, weekday_of};
use crate::error::{Error, Result};

labeled_enum! {
    SessionType, "session type" {
        Lecture => "lecture",
        Lab => "lab",
        Tutorial => "tutorial",
        Exam => "exam",
        Meeting => "meeting",
        Activity => "activity",
    }
}

labeled_enum! {
    ScheduleStatus, "schedule status" {
        Scheduled => "scheduled",
        Ongoing => "ongoing",
        Completed => "completed",
        Cancelled => "cancelled",
        Rescheduled => "rescheduled",
    }
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        ScheduleStatus::Scheduled
    }
}

labeled_enum! {
    Frequency, "recurrence frequency" {
        Daily => "daily",
        Weekly => "weekly",
        Biweekly => "biweekly",
        Monthly => "monthly",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub frequency: Frequency,
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

/// A single timetabled session. For recurring entries `date` is the first
/// occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub subject: String,
    pub class_id: String,
    #[serde(default)]
    pub class_name: String,
    pub teacher_id: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub room: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub day_of_week: String,
    #[serde(rename = "type")]
    pub kind: SessionType,
    #[serde(default)]
    pub status: ScheduleStatus,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

impl ScheduleEntry {
    pub fn duration_hours(&self) -> f64 {
        hours_between(self.start_time, self.end_time)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ScheduleStatus::Cancelled
    }

    /// Fill in `day_of_week` from the date when it was left blank.
    pub fn normalize(&mut self) {
        let day = self.day_of_week.trim().to_lowercase();
        self.day_of_week = if day.is_empty() {
            weekday_of(self.date).to_string()
        } else {
            day
        };
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_time <= self.start_time {
            return Err(Error::invalid(
                &self.id,
                format!(
                    "end time {} is not after start time {}",
                    self.end_time.format("%H:%M"),
                    self.start_time.format("%H:%M")
                ),
            ));
        }
        let expected = weekday_of(self.date);
        if self.day_of_week != expected {
            return Err(Error::invalid(
                &self.id,
                format!(
                    "day of week '{}' does not match date {} ({expected})",
                    self.day_of_week, self.date
                ),
            ));
        }
        if let Some(until) = self.recurrence.as_ref().and_then(|r| r.until) {
            if until < self.date {
                return Err(Error::invalid(&self.id, "recurrence ends before it starts"));
            }
        }
        Ok(())
    }

    /// Whether this entry has a session on `day`.
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        if day < self.date {
            return false;
        }
        let Some(recurrence) = &self.recurrence else {
            return day == self.date;
        };
        if recurrence.until.is_some_and(|until| day > until) {
            return false;
        }
        match recurrence.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => day.weekday() == self.date.weekday(),
            Frequency::Biweekly => {
                day.weekday() == self.date.weekday() && ((day - self.date).num_days() / 7) % 2 == 0
            }
            Frequency::Monthly => day.day() == self.date.day(),
        }
    }

    /// Number of sessions in the inclusive range `[start, end]`.
    pub fn occurrences_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        let mut count = 0;
        let mut day = start;
        while day <= end {
            if self.occurs_on(day) {
                count += 1;
            }
            day += Duration::days(1);
        }
        count
    }
}

/// Weekly roll-up of the entries for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSchedule {
    pub class_id: String,
    pub class_name: String,
    pub entries: Vec<ScheduleEntry>,
    pub total_weekly_hours: f64,
}

/// Weekly roll-up of the entries for one teacher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherSchedule {
    pub teacher_id: String,
    pub teacher_name: String,
    pub entries: Vec<ScheduleEntry>,
    pub total_weekly_hours: f64,
    pub subjects: Vec<String>,
}
