pub mod repository;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    AttendanceEvent, AttendanceRecord, Homework, HomeworkSubmission, Mark, ScheduleEntry,
    StudentMark,
};
pub use repository::{Record, Table};

/// Serialized form of a [`Repository`], as handed over by the data loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub attendance: Vec<AttendanceRecord>,
    pub attendance_events: Vec<AttendanceEvent>,
    pub homework: Vec<Homework>,
    pub submissions: Vec<HomeworkSubmission>,
    pub marks: Vec<Mark>,
    pub student_marks: Vec<StudentMark>,
    pub schedule: Vec<ScheduleEntry>,
}

/// In-memory store of every classroom record, one [`Table`] per type.
///
/// Every write goes through [`Record::prepare`], so stored records always
/// have their derived fields refreshed and their invariants checked.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    pub(crate) attendance: Table<AttendanceRecord>,
    pub(crate) attendance_events: Table<AttendanceEvent>,
    pub(crate) homework: Table<Homework>,
    pub(crate) submissions: Table<HomeworkSubmission>,
    pub(crate) marks: Table<Mark>,
    pub(crate) student_marks: Table<StudentMark>,
    pub(crate) schedule: Table<ScheduleEntry>,
}

impl Repository {
    /// An empty repository.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Default snapshot location (`~/.classstats/snapshot.json`).
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".classstats");
        Ok(dir.join("snapshot.json"))
    }

    /// Load the snapshot at the default path. A missing file yields an
    /// empty repository.
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::info!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::in_memory());
        }
        Self::open_at(path)
    }

    /// Load a JSON snapshot from `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        let repo = Self::from_snapshot(snapshot)?;
        log::info!(
            "Loaded {} records from {}",
            repo.record_count(),
            path.display()
        );
        Ok(repo)
    }

    /// Write the repository as a JSON snapshot, creating parent directories.
    pub fn save_at(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.to_snapshot())?;
        std::fs::write(path, json)?;
        log::info!(
            "Saved {} records to {}",
            self.record_count(),
            path.display()
        );
        Ok(())
    }

    /// Build a repository from a snapshot, validating every record.
    /// Records without an id get a synthetic one.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut repo = Self::in_memory();
        // Parents before children: submissions and results look up their
        // homework and assessment.
        repo.load_all(snapshot.attendance)?;
        repo.load_all(snapshot.attendance_events)?;
        repo.load_all(snapshot.homework)?;
        repo.load_all(snapshot.submissions)?;
        repo.load_all(snapshot.marks)?;
        repo.load_all(snapshot.student_marks)?;
        repo.load_all(snapshot.schedule)?;
        Ok(repo)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            attendance: self.attendance.all().to_vec(),
            attendance_events: self.attendance_events.all().to_vec(),
            homework: self.homework.all().to_vec(),
            submissions: self.submissions.all().to_vec(),
            marks: self.marks.all().to_vec(),
            student_marks: self.student_marks.all().to_vec(),
            schedule: self.schedule.all().to_vec(),
        }
    }

    fn load_all<T: Record>(&mut self, records: Vec<T>) -> Result<()> {
        for mut record in records {
            if record.id().is_empty() {
                record.set_id(T::table(self).next_id());
            }
            record.prepare(self)?;
            T::table_mut(self).insert(record)?;
        }
        Ok(())
    }

    // ── CRUD ───────────────────────────────────────────────────────

    /// Store a new record under a fresh synthetic id and return the id.
    /// Any id already on the record is replaced.
    pub fn create<T: Record>(&mut self, mut record: T) -> Result<String> {
        let id = T::table(self).next_id();
        record.set_id(id.clone());
        record.prepare(self)?;
        T::table_mut(self).insert(record)?;
        log::debug!("Created {id}");
        Ok(id)
    }

    /// Replace the stored record with the same id.
    pub fn update<T: Record>(&mut self, mut record: T) -> Result<()> {
        if !T::table(self).contains(record.id()) {
            return Err(Error::NotFound(record.id().to_string()));
        }
        record.prepare(self)?;
        let id = record.id().to_string();
        T::table_mut(self).replace(record)?;
        T::on_update(&id, self);
        log::debug!("Updated {id}");
        Ok(())
    }

    /// Delete by id. Returns whether a record was removed.
    pub fn delete<T: Record>(&mut self, id: &str) -> bool {
        let removed = T::table_mut(self).remove(id);
        if removed {
            T::on_delete(id, self);
            log::debug!("Deleted {id}");
        }
        removed
    }

    pub fn get<T: Record>(&self, id: &str) -> Option<&T> {
        T::table(self).get(id)
    }

    pub fn all<T: Record>(&self) -> &[T] {
        T::table(self).all()
    }

    // ── Typed accessors ────────────────────────────────────────────

    pub fn attendance(&self) -> &[AttendanceRecord] {
        self.attendance.all()
    }

    pub fn attendance_events(&self) -> &[AttendanceEvent] {
        self.attendance_events.all()
    }

    pub fn homework(&self) -> &[Homework] {
        self.homework.all()
    }

    pub fn submissions(&self) -> &[HomeworkSubmission] {
        self.submissions.all()
    }

    pub fn marks(&self) -> &[Mark] {
        self.marks.all()
    }

    pub fn student_marks(&self) -> &[StudentMark] {
        self.student_marks.all()
    }

    pub fn schedule(&self) -> &[ScheduleEntry] {
        self.schedule.all()
    }

    pub fn record_count(&self) -> usize {
        self.attendance.len()
            + self.attendance_events.len()
            + self.homework.len()
            + self.submissions.len()
            + self.marks.len()
            + self.student_marks.len()
            + self.schedule.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::model::{AttendanceStatus, SubmissionStatus};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    #[test]
    fn test_create_assigns_prefixed_unique_ids() {
        let mut repo = Repository::in_memory();
        let record = fixtures::attendance_record("s1", "c1", today(), AttendanceStatus::Present);
        let a = repo.create(record.clone()).unwrap();
        let b = repo.create(record).unwrap();
        assert!(a.starts_with("att_"));
        assert_ne!(a, b);
        assert_eq!(repo.attendance().len(), 2);
    }

    #[test]
    fn test_update_replaces_by_id() {
        let mut repo = Repository::in_memory();
        let record = fixtures::attendance_record("s1", "c1", today(), AttendanceStatus::Present);
        let id = repo.create(record).unwrap();

        let mut changed = repo.get::<AttendanceRecord>(&id).unwrap().clone();
        changed.status = AttendanceStatus::Absent;
        repo.update(changed).unwrap();

        assert_eq!(
            repo.get::<AttendanceRecord>(&id).unwrap().status,
            AttendanceStatus::Absent
        );
        assert_eq!(repo.attendance().len(), 1);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let mut repo = Repository::in_memory();
        let mut record =
            fixtures::attendance_record("s1", "c1", today(), AttendanceStatus::Present);
        record.id = "att_missing".into();
        assert!(matches!(repo.update(record), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let mut repo = Repository::in_memory();
        let record = fixtures::attendance_record("s1", "c1", today(), AttendanceStatus::Present);
        let id = repo.create(record).unwrap();
        assert!(repo.delete::<AttendanceRecord>(&id));
        assert!(!repo.delete::<AttendanceRecord>(&id));
        assert!(repo.attendance().is_empty());
    }

    #[test]
    fn test_submission_requires_homework_and_derives_lateness() {
        let mut repo = Repository::in_memory();
        let hw = fixtures::homework("Essay", "c1", "English", today(), today());
        let orphan = fixtures::submission("hw_missing", "s1", SubmissionStatus::NotSubmitted, None);
        assert!(matches!(
            repo.create(orphan),
            Err(Error::InvalidRecord { .. })
        ));

        let hw_id = repo.create(hw).unwrap();
        let late_at = (today() + chrono::Duration::days(2)).and_hms_opt(10, 0, 0);
        let sub = fixtures::submission(&hw_id, "s1", SubmissionStatus::Late, late_at);
        let sub_id = repo.create(sub).unwrap();
        let stored = repo.get::<HomeworkSubmission>(&sub_id).unwrap();
        assert!(stored.is_late);
        assert_eq!(stored.days_late, 2);

        // One submission per (homework, student).
        let again = fixtures::submission(&hw_id, "s1", SubmissionStatus::NotSubmitted, None);
        assert!(repo.create(again).is_err());
    }

    #[test]
    fn test_updating_homework_rederives_submissions() {
        let mut repo = Repository::in_memory();
        let essay = fixtures::homework("Essay", "c1", "English", today(), today());
        let hw_id = repo.create(essay).unwrap();
        let late_at = (today() + chrono::Duration::days(2)).and_hms_opt(9, 0, 0);
        let mut sub = fixtures::submission(&hw_id, "s1", SubmissionStatus::Graded, late_at);
        sub.grade = Some(15.0);
        let sub_id = repo.create(sub).unwrap();
        assert!(repo.get::<HomeworkSubmission>(&sub_id).unwrap().is_late);

        // Lowering the total below an existing grade is refused.
        let mut hw = repo.get::<Homework>(&hw_id).unwrap().clone();
        hw.total_marks = 5.0;
        assert!(matches!(
            repo.update(hw.clone()),
            Err(Error::InvalidRecord { .. })
        ));
        assert_eq!(repo.get::<Homework>(&hw_id).unwrap().total_marks, 20.0);

        // Pushing the due date back clears the lateness.
        hw.total_marks = 20.0;
        hw.due_date = today() + chrono::Duration::days(5);
        repo.update(hw).unwrap();
        let stored = repo.get::<HomeworkSubmission>(&sub_id).unwrap();
        assert!(!stored.is_late);
        assert_eq!(stored.days_late, 0);

        let stats = crate::metrics::compute_homework_stats(
            repo.homework(),
            repo.submissions(),
            today(),
            &crate::metrics::StatsOptions::default(),
        );
        assert_eq!(stats.late_submissions, 0);
        assert_eq!(stats.average_grade_percentage, Some(75.0));
    }

    #[test]
    fn test_deleting_homework_removes_its_submissions() {
        let mut repo = Repository::in_memory();
        let essay = fixtures::homework("Essay", "c1", "English", today(), today());
        let hw_id = repo.create(essay).unwrap();
        let pending = fixtures::submission(&hw_id, "s1", SubmissionStatus::NotSubmitted, None);
        repo.create(pending).unwrap();
        assert_eq!(repo.submissions().len(), 1);

        assert!(repo.delete::<Homework>(&hw_id));
        assert!(repo.submissions().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip_through_file() {
        let repo = fixtures::sample_repository(today()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snapshot.json");
        repo.save_at(&path).unwrap();

        let loaded = Repository::open_at(&path).unwrap();
        assert_eq!(loaded.record_count(), repo.record_count());
        assert_eq!(loaded.attendance(), repo.attendance());
        assert_eq!(loaded.schedule(), repo.schedule());
    }

    #[test]
    fn test_snapshot_rejects_invalid_event_counts() {
        let json = r#"{
            "attendanceEvents": [{
                "id": "evt_1",
                "title": "Biology",
                "classId": "c1",
                "date": "2025-03-12",
                "totalStudents": 10,
                "presentCount": 4,
                "absentCount": 1
            }]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Repository::from_snapshot(snapshot),
            Err(Error::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_snapshot_rejects_event_counts_that_overflow() {
        let json = r#"{
            "attendanceEvents": [{
                "id": "evt_1",
                "title": "Biology",
                "classId": "c1",
                "date": "2025-03-12",
                "totalStudents": 0,
                "presentCount": 4294967295,
                "absentCount": 1
            }]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Repository::from_snapshot(snapshot),
            Err(Error::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_snapshot_recomputes_event_rate_and_fills_ids() {
        let json = r#"{
            "attendance": [{
                "studentId": "s1",
                "studentName": "Ada",
                "classId": "c1",
                "date": "2025-03-12",
                "status": "present"
            }],
            "attendanceEvents": [{
                "id": "evt_1",
                "title": "Biology",
                "classId": "c1",
                "date": "2025-03-12",
                "totalStudents": 4,
                "presentCount": 2,
                "absentCount": 1,
                "lateCount": 1,
                "attendanceRate": 12.0
            }]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let repo = Repository::from_snapshot(snapshot).unwrap();
        assert_eq!(repo.attendance_events()[0].attendance_rate, 75.0);
        assert!(repo.attendance()[0].id.starts_with("att_"));
    }

    #[test]
    fn test_snapshot_duplicate_ids() {
        let record = fixtures::attendance_record("s1", "c1", today(), AttendanceStatus::Present);
        let mut a = record.clone();
        a.id = "att_1".into();
        let mut b = record;
        b.id = "att_1".into();
        let snapshot = Snapshot {
            attendance: vec![a, b],
            ..Snapshot::default()
        };
        assert!(matches!(
            Repository::from_snapshot(snapshot),
            Err(Error::Duplicate(_))
        ));
    }
}
