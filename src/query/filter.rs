use chrono::NaiveDate;

use crate::model::{
    derive_status, AttendanceEvent, AttendanceRecord, Homework, HomeworkSubmission, Mark,
    ScheduleEntry, StudentMark,
};
use crate::query::period::Period;

/// Fields a record exposes to [`RecordFilter`].
///
/// Optional accessors default to `None`; a predicate on a field the record
/// does not carry never matches.
pub trait Filterable {
    /// String fields searched by free text. `None` entries are skipped.
    fn search_fields(&self) -> Vec<Option<&str>>;

    /// Status label as shown to the user on `today`.
    fn status_key(&self, today: NaiveDate) -> &'static str;

    fn record_date(&self) -> Option<NaiveDate>;

    fn class_id(&self) -> Option<&str> {
        None
    }

    fn subject(&self) -> Option<&str> {
        None
    }

    fn teacher_id(&self) -> Option<&str> {
        None
    }

    fn student_id(&self) -> Option<&str> {
        None
    }
}

/// Builder for narrowing a record collection. All set predicates must hold.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    search: Option<String>,
    status: Option<String>,
    class_id: Option<String>,
    subject: Option<String>,
    teacher_id: Option<String>,
    student_id: Option<String>,
    on_date: Option<NaiveDate>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    period: Option<Period>,
    limit: Option<usize>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring match on any searchable field.
    /// Blank text is ignored.
    pub fn search(mut self, text: &str) -> Self {
        let text = text.trim();
        self.search = if text.is_empty() {
            None
        } else {
            Some(text.to_lowercase())
        };
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.trim().to_lowercase().replace('-', "_"));
        self
    }

    pub fn class(mut self, class_id: &str) -> Self {
        self.class_id = Some(class_id.to_string());
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn teacher(mut self, teacher_id: &str) -> Self {
        self.teacher_id = Some(teacher_id.to_string());
        self
    }

    pub fn student(mut self, student_id: &str) -> Self {
        self.student_id = Some(student_id.to_string());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.on_date = Some(date);
        self
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.status.is_none()
            && self.class_id.is_none()
            && self.subject.is_none()
            && self.teacher_id.is_none()
            && self.student_id.is_none()
            && self.on_date.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.period.is_none()
    }

    pub fn matches<T: Filterable>(&self, record: &T, today: NaiveDate) -> bool {
        if let Some(ref needle) = self.search {
            let hit = record
                .search_fields()
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle.as_str()));
            if !hit {
                return false;
            }
        }
        if let Some(ref status) = self.status {
            if record.status_key(today) != status.as_str() {
                return false;
            }
        }
        if !field_matches(&self.class_id, record.class_id())
            || !field_matches(&self.subject, record.subject())
            || !field_matches(&self.teacher_id, record.teacher_id())
            || !field_matches(&self.student_id, record.student_id())
        {
            return false;
        }

        let has_date_predicate = self.on_date.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.period.is_some();
        if has_date_predicate {
            let Some(date) = record.record_date() else {
                return false;
            };
            if self.on_date.is_some_and(|d| date != d)
                || self.date_from.is_some_and(|d| date < d)
                || self.date_to.is_some_and(|d| date > d)
                || self.period.as_ref().is_some_and(|p| !p.contains(date))
            {
                return false;
            }
        }
        true
    }

    /// Records satisfying every predicate, in input order.
    pub fn apply<'a, T: Filterable>(&self, records: &'a [T], today: NaiveDate) -> Vec<&'a T> {
        let matched = records.iter().filter(|r| self.matches(*r, today));
        match self.limit {
            Some(n) => matched.take(n).collect(),
            None => matched.collect(),
        }
    }

    /// Owned copy of the matching records.
    pub fn apply_cloned<T: Filterable + Clone>(&self, records: &[T], today: NaiveDate) -> Vec<T> {
        self.apply(records, today).into_iter().cloned().collect()
    }
}

fn field_matches(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual == Some(w.as_str()),
    }
}

impl Filterable for AttendanceRecord {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.student_name.as_str()),
            Some(self.student_id.as_str()),
            Some(self.class_name.as_str()),
            self.notes.as_deref(),
            self.marked_by.as_deref(),
        ]
    }

    fn status_key(&self, _today: NaiveDate) -> &'static str {
        self.status.as_str()
    }

    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn class_id(&self) -> Option<&str> {
        Some(self.class_id.as_str())
    }

    fn student_id(&self) -> Option<&str> {
        Some(self.student_id.as_str())
    }
}

impl Filterable for AttendanceEvent {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.title.as_str()),
            Some(self.class_name.as_str()),
            self.subject.as_deref(),
            self.teacher_name.as_deref(),
        ]
    }

    fn status_key(&self, _today: NaiveDate) -> &'static str {
        self.status.as_str()
    }

    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn class_id(&self) -> Option<&str> {
        Some(self.class_id.as_str())
    }

    fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }
}

impl Filterable for Homework {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.title.as_str()),
            self.description.as_deref(),
            Some(self.subject.as_str()),
            Some(self.class_name.as_str()),
            Some(self.teacher_name.as_str()),
        ]
    }

    fn status_key(&self, today: NaiveDate) -> &'static str {
        derive_status(today, self).as_str()
    }

    /// Homework is filed under its due date.
    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.due_date)
    }

    fn class_id(&self) -> Option<&str> {
        Some(self.class_id.as_str())
    }

    fn subject(&self) -> Option<&str> {
        Some(self.subject.as_str())
    }

    fn teacher_id(&self) -> Option<&str> {
        Some(self.teacher_id.as_str())
    }
}

impl Filterable for HomeworkSubmission {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.student_name.as_str()),
            Some(self.student_id.as_str()),
            self.feedback.as_deref(),
        ]
    }

    fn status_key(&self, _today: NaiveDate) -> &'static str {
        self.status.as_str()
    }

    fn record_date(&self) -> Option<NaiveDate> {
        self.submitted_at.map(|at| at.date())
    }

    fn student_id(&self) -> Option<&str> {
        Some(self.student_id.as_str())
    }
}

impl Filterable for Mark {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.title.as_str()),
            Some(self.subject.as_str()),
            Some(self.class_name.as_str()),
            Some(self.teacher_name.as_str()),
        ]
    }

    fn status_key(&self, _today: NaiveDate) -> &'static str {
        self.assessment_type.as_str()
    }

    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn class_id(&self) -> Option<&str> {
        Some(self.class_id.as_str())
    }

    fn subject(&self) -> Option<&str> {
        Some(self.subject.as_str())
    }

    fn teacher_id(&self) -> Option<&str> {
        Some(self.teacher_id.as_str())
    }
}

impl Filterable for StudentMark {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.student_name.as_str()),
            Some(self.student_id.as_str()),
            self.grade.as_deref(),
            self.remarks.as_deref(),
        ]
    }

    fn status_key(&self, _today: NaiveDate) -> &'static str {
        if self.is_exempted {
            "exempted"
        } else {
            "assessed"
        }
    }

    fn record_date(&self) -> Option<NaiveDate> {
        None
    }

    fn student_id(&self) -> Option<&str> {
        Some(self.student_id.as_str())
    }
}

impl Filterable for ScheduleEntry {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.title.as_str()),
            Some(self.subject.as_str()),
            Some(self.class_name.as_str()),
            Some(self.teacher_name.as_str()),
            self.room.as_deref(),
        ]
    }

    fn status_key(&self, _today: NaiveDate) -> &'static str {
        self.status.as_str()
    }

    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn class_id(&self) -> Option<&str> {
        Some(self.class_id.as_str())
    }

    fn subject(&self) -> Option<&str> {
        Some(self.subject.as_str())
    }

    fn teacher_id(&self) -> Option<&str> {
        Some(self.teacher_id.as_str())
    }
}
