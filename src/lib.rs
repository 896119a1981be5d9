pub mod config;
pub mod date_util;
pub mod error;
pub mod fixtures;
pub mod metrics;
pub mod model;
pub mod query;
pub mod search;
pub mod storage;

use std::collections::HashSet;

use chrono::NaiveDate;

pub use config::Config;
pub use error::{Error, Result};
pub use metrics::{AttendanceStats, HomeworkStats, MarksStats, ScheduleStats, StatsOptions};
pub use query::filter::{Filterable, RecordFilter};
pub use query::period::Period;
pub use query::window::TimeWindow;
pub use search::{SearchHit, SearchHitType, SearchOptions, SearchResults};
pub use storage::{Record, Repository};

use model::{
    AttendanceDetail, AttendanceEvent, AttendanceRecord, ClassSchedule, GroupMark, Mark,
    TeacherSchedule,
};

/// Main entry point: the record repository plus the settings every stats
/// screen is computed with.
pub struct ClassroomStats {
    repo: Repository,
    config: Config,
}

impl ClassroomStats {
    pub fn new(repo: Repository, config: Config) -> Self {
        Self { repo, config }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Mutable access for create/update/delete.
    pub fn repo_mut(&mut self) -> &mut Repository {
        &mut self.repo
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The date every window and status derivation is evaluated against.
    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }

    /// Records of one type matching `filter`, in repository order.
    pub fn query<T: Record + Filterable>(&self, filter: &RecordFilter) -> Vec<&T> {
        filter.apply(self.repo.all::<T>(), self.today())
    }

    // ── Stats ──────────────────────────────────────────────────────

    /// Attendance sidebar over the records and events matching `filter`.
    pub fn attendance_stats(&self, filter: &RecordFilter) -> AttendanceStats {
        let today = self.today();
        let records = filter.apply_cloned(self.repo.attendance(), today);
        let events = filter.apply_cloned(self.repo.attendance_events(), today);
        metrics::compute_attendance_stats(&records, &events, today, &self.config.stats_options())
    }

    /// Homework sidebar. Submissions follow the homework that `filter` keeps.
    pub fn homework_stats(&self, filter: &RecordFilter) -> HomeworkStats {
        let today = self.today();
        let homework = filter.apply_cloned(self.repo.homework(), today);
        let ids: HashSet<&str> = homework.iter().map(|h| h.id.as_str()).collect();
        let submissions: Vec<_> = self
            .repo
            .submissions()
            .iter()
            .filter(|s| ids.contains(s.homework_id.as_str()))
            .cloned()
            .collect();
        metrics::compute_homework_stats(
            &homework,
            &submissions,
            today,
            &self.config.stats_options(),
        )
    }

    /// Marks sidebar. Results follow the assessments that `filter` keeps.
    pub fn marks_stats(&self, filter: &RecordFilter) -> MarksStats {
        let today = self.today();
        let marks = filter.apply_cloned(self.repo.marks(), today);
        let ids: HashSet<&str> = marks.iter().map(|m| m.id.as_str()).collect();
        let results: Vec<_> = self
            .repo
            .student_marks()
            .iter()
            .filter(|r| ids.contains(r.mark_id.as_str()))
            .cloned()
            .collect();
        metrics::compute_marks_stats(&marks, &results, today, &self.config.stats_options())
    }

    pub fn schedule_stats(&self, filter: &RecordFilter) -> ScheduleStats {
        let today = self.today();
        let entries = filter.apply_cloned(self.repo.schedule(), today);
        metrics::compute_schedule_stats(&entries, today, &self.config.stats_options())
    }

    // ── Roll-ups and details ───────────────────────────────────────

    /// Per-group aggregates for one assessment.
    pub fn group_marks(&self, mark_id: &str) -> Result<Vec<GroupMark>> {
        let mark: &Mark = self
            .repo
            .get(mark_id)
            .ok_or_else(|| Error::NotFound(mark_id.to_string()))?;
        Ok(metrics::group_marks(
            mark,
            self.repo.student_marks(),
            self.config.pass_percentage,
        ))
    }

    pub fn class_schedules(&self) -> Vec<ClassSchedule> {
        metrics::class_schedules(self.repo.schedule(), self.today())
    }

    pub fn teacher_schedules(&self) -> Vec<TeacherSchedule> {
        metrics::teacher_schedules(self.repo.schedule(), self.today())
    }

    /// Resolve an attendance record id, event id or student id to the
    /// subject of the attendance detail dialog.
    pub fn attendance_detail(&self, id: &str) -> Option<AttendanceDetail> {
        if let Some(record) = self.repo.get::<AttendanceRecord>(id) {
            return Some(AttendanceDetail::Record(record.clone()));
        }
        if let Some(event) = self.repo.get::<AttendanceEvent>(id) {
            return Some(AttendanceDetail::Event(event.clone()));
        }
        metrics::student_summaries(self.repo.attendance())
            .into_iter()
            .find(|s| s.student_id == id)
            .map(AttendanceDetail::StudentSummary)
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchResults {
        search::search(&self.repo, query, options)
    }
}
