use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{
    AttendanceEvent, AttendanceRecord, Homework, HomeworkSubmission, Mark, ScheduleEntry,
    StudentMark,
};
use crate::storage::Repository;

/// A record type held in one [`Table`] of the [`Repository`].
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Prefix of synthetic ids, e.g. `hw` in `hw_1741600000000`.
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn table(repo: &Repository) -> &Table<Self>;

    fn table_mut(repo: &mut Repository) -> &mut Table<Self>;

    /// Refresh derived fields and check invariants before the record is
    /// stored. May look at other tables.
    fn prepare(&mut self, _repo: &Repository) -> Result<()> {
        Ok(())
    }

    /// Refresh records derived from this one after it replaced the stored
    /// version.
    fn on_update(_id: &str, _repo: &mut Repository) {}

    /// Remove records that only make sense alongside this one.
    fn on_delete(_id: &str, _repo: &mut Repository) {}
}

/// Insertion-ordered arena of records keyed by id.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn all(&self) -> &[T] {
        &self.rows
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A fresh `{prefix}_{unix_millis}` id, suffixed when several records
    /// are created within the same millisecond.
    pub fn next_id(&self) -> String {
        let base = format!("{}_{}", T::ID_PREFIX, chrono::Utc::now().timestamp_millis());
        if !self.contains(&base) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub(crate) fn insert(&mut self, record: T) -> Result<()> {
        let id = record.id().to_string();
        if id.is_empty() {
            return Err(Error::invalid("", "record id is empty"));
        }
        if self.contains(&id) {
            return Err(Error::Duplicate(id));
        }
        self.index.insert(id, self.rows.len());
        self.rows.push(record);
        Ok(())
    }

    pub(crate) fn replace(&mut self, record: T) -> Result<()> {
        let i = *self
            .index
            .get(record.id())
            .ok_or_else(|| Error::NotFound(record.id().to_string()))?;
        self.rows[i] = record;
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.retain(|r| r.id() != id);
        true
    }

    /// Edit rows in place. Ids must not change.
    pub(crate) fn for_each_mut<F: FnMut(&mut T)>(&mut self, f: F) {
        self.rows.iter_mut().for_each(f);
    }

    pub(crate) fn retain<F: FnMut(&T) -> bool>(&mut self, keep: F) {
        self.rows.retain(keep);
        self.index = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id().to_string(), i))
            .collect();
    }
}

// ── Attendance ─────────────────────────────────────────────────────

impl Record for AttendanceRecord {
    const ID_PREFIX: &'static str = "att";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn table(repo: &Repository) -> &Table<Self> {
        &repo.attendance
    }

    fn table_mut(repo: &mut Repository) -> &mut Table<Self> {
        &mut repo.attendance
    }
}

impl Record for AttendanceEvent {
    const ID_PREFIX: &'static str = "evt";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn table(repo: &Repository) -> &Table<Self> {
        &repo.attendance_events
    }

    fn table_mut(repo: &mut Repository) -> &mut Table<Self> {
        &mut repo.attendance_events
    }

    fn prepare(&mut self, _repo: &Repository) -> Result<()> {
        self.validate()?;
        self.recompute_rate();
        Ok(())
    }
}

// ── Homework ───────────────────────────────────────────────────────

impl Record for Homework {
    const ID_PREFIX: &'static str = "hw";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn table(repo: &Repository) -> &Table<Self> {
        &repo.homework
    }

    fn table_mut(repo: &mut Repository) -> &mut Table<Self> {
        &mut repo.homework
    }

    /// Existing grades must still fit under `total_marks`.
    fn prepare(&mut self, repo: &Repository) -> Result<()> {
        self.validate()?;
        let over = repo
            .submissions
            .all()
            .iter()
            .filter(|s| s.homework_id == self.id)
            .find_map(|s| Some((s, s.grade.filter(|&g| g > self.total_marks)?)));
        if let Some((sub, grade)) = over {
            return Err(Error::invalid(
                &self.id,
                format!(
                    "submission {} is graded {grade}, above total marks {}",
                    sub.id, self.total_marks
                ),
            ));
        }
        Ok(())
    }

    fn on_update(id: &str, repo: &mut Repository) {
        let Some(due_date) = repo.homework.get(id).map(|h| h.due_date) else {
            return;
        };
        repo.submissions.for_each_mut(|s| {
            if s.homework_id == id {
                s.apply_lateness(due_date);
            }
        });
    }

    fn on_delete(id: &str, repo: &mut Repository) {
        repo.submissions.retain(|s| s.homework_id != id);
    }
}

impl Record for HomeworkSubmission {
    const ID_PREFIX: &'static str = "sub";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn table(repo: &Repository) -> &Table<Self> {
        &repo.submissions
    }

    fn table_mut(repo: &mut Repository) -> &mut Table<Self> {
        &mut repo.submissions
    }

    fn prepare(&mut self, repo: &Repository) -> Result<()> {
        let homework = repo.homework.get(&self.homework_id).ok_or_else(|| {
            Error::invalid(&self.id, format!("unknown homework {}", self.homework_id))
        })?;
        let duplicate = repo
            .submissions
            .all()
            .iter()
            .any(|s| {
                s.id != self.id
                    && s.homework_id == self.homework_id
                    && s.student_id == self.student_id
            });
        if duplicate {
            return Err(Error::invalid(
                &self.id,
                format!(
                    "student {} already has a submission for {}",
                    self.student_id, self.homework_id
                ),
            ));
        }
        self.validate(homework)?;
        self.apply_lateness(homework.due_date);
        Ok(())
    }
}

// ── Marks ──────────────────────────────────────────────────────────

impl Record for Mark {
    const ID_PREFIX: &'static str = "mark";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn table(repo: &Repository) -> &Table<Self> {
        &repo.marks
    }

    fn table_mut(repo: &mut Repository) -> &mut Table<Self> {
        &mut repo.marks
    }

    fn prepare(&mut self, _repo: &Repository) -> Result<()> {
        self.validate()
    }

    fn on_delete(id: &str, repo: &mut Repository) {
        repo.student_marks.retain(|m| m.mark_id != id);
    }
}

impl Record for StudentMark {
    const ID_PREFIX: &'static str = "sm";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn table(repo: &Repository) -> &Table<Self> {
        &repo.student_marks
    }

    fn table_mut(repo: &mut Repository) -> &mut Table<Self> {
        &mut repo.student_marks
    }

    fn prepare(&mut self, repo: &Repository) -> Result<()> {
        if !repo.marks.contains(&self.mark_id) {
            return Err(Error::invalid(
                &self.id,
                format!("unknown assessment {}", self.mark_id),
            ));
        }
        self.validate()
    }
}

// ── Schedule ───────────────────────────────────────────────────────

impl Record for ScheduleEntry {
    const ID_PREFIX: &'static str = "sch";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn table(repo: &Repository) -> &Table<Self> {
        &repo.schedule
    }

    fn table_mut(repo: &mut Repository) -> &mut Table<Self> {
        &mut repo.schedule
    }

    fn prepare(&mut self, _repo: &Repository) -> Result<()> {
        self.normalize();
        self.validate()
    }
}
