//! Deterministic sample data for demos and tests.
//!
//! Builders fill display names from a small fixed roster; ids not on the
//! roster are used as their own display name.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::date_util::{week_bounds, weekday_of};
use crate::error::Result;
use crate::model::{
    AssessmentType, AttendanceEvent, AttendanceRecord, AttendanceStatus, Difficulty, EventStatus,
    Frequency, Homework, HomeworkKind, HomeworkStatus, HomeworkSubmission, Mark, Priority,
    Recurrence, ScheduleEntry, ScheduleStatus, SessionType, StudentMark, SubmissionStatus,
};
use crate::storage::Repository;

const CLASSES: &[(&str, &str)] = &[("c1", "Grade 8A"), ("c2", "Grade 8B"), ("c3", "Grade 9A")];

const TEACHERS: &[(&str, &str)] = &[
    ("t1", "Mr. Mensah"),
    ("t2", "Ms. Okafor"),
    ("t3", "Mrs. Lindqvist"),
];

/// (student id, name, class id)
const STUDENTS: &[(&str, &str, &str)] = &[
    ("s1", "Ada Obi", "c1"),
    ("s2", "Ben Carter", "c1"),
    ("s3", "Chloe Nakamura", "c1"),
    ("s4", "Daniel Ruiz", "c2"),
    ("s5", "Esi Boateng", "c2"),
    ("s6", "Farid Haddad", "c3"),
];

fn name_of(table: &[(&str, &str)], id: &str) -> String {
    table
        .iter()
        .find(|(key, _)| *key == id)
        .map_or(id, |(_, name)| name)
        .to_string()
}

fn student_name(id: &str) -> String {
    STUDENTS
        .iter()
        .find(|(key, _, _)| *key == id)
        .map_or(id, |(_, name, _)| name)
        .to_string()
}

fn clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn at(date: NaiveDate, hour: u32) -> Option<NaiveDateTime> {
    date.and_hms_opt(hour, 0, 0)
}

// ── Builders ───────────────────────────────────────────────────────

pub fn attendance_record(
    student_id: &str,
    class_id: &str,
    date: NaiveDate,
    status: AttendanceStatus,
) -> AttendanceRecord {
    AttendanceRecord {
        id: String::new(),
        student_id: student_id.to_string(),
        student_name: student_name(student_id),
        class_id: class_id.to_string(),
        class_name: name_of(CLASSES, class_id),
        date,
        status,
        time_in: status.counts_as_attended().then(|| {
            if status == AttendanceStatus::Late {
                "08:20".to_string()
            } else {
                "07:55".to_string()
            }
        }),
        time_out: None,
        notes: None,
        marked_by: Some(name_of(TEACHERS, "t1")),
        marked_at: at(date, 8),
        updated_at: None,
    }
}

/// An event whose counts are `[present, absent, late, excused]`.
pub fn attendance_event(
    title: &str,
    class_id: &str,
    date: NaiveDate,
    counts: [u32; 4],
) -> AttendanceEvent {
    let mut event = AttendanceEvent {
        id: String::new(),
        title: title.to_string(),
        class_id: class_id.to_string(),
        class_name: name_of(CLASSES, class_id),
        subject: None,
        teacher_name: None,
        date,
        total_students: counts.iter().sum(),
        present_count: 0,
        absent_count: 0,
        late_count: 0,
        excused_count: 0,
        attendance_rate: 0.0,
        status: EventStatus::default(),
    };
    event.set_counts(counts[0], counts[1], counts[2], counts[3]);
    event
}

pub fn homework(
    title: &str,
    class_id: &str,
    subject: &str,
    assigned: NaiveDate,
    due: NaiveDate,
) -> Homework {
    Homework {
        id: String::new(),
        title: title.to_string(),
        description: None,
        subject: subject.to_string(),
        class_id: class_id.to_string(),
        class_name: name_of(CLASSES, class_id),
        teacher_id: "t1".to_string(),
        teacher_name: name_of(TEACHERS, "t1"),
        assigned_date: assigned,
        due_date: due,
        kind: HomeworkKind::Assignment,
        priority: Priority::Medium,
        difficulty: Difficulty::Medium,
        total_marks: 20.0,
        status: HomeworkStatus::Assigned,
    }
}

pub fn submission(
    homework_id: &str,
    student_id: &str,
    status: SubmissionStatus,
    submitted_at: Option<NaiveDateTime>,
) -> HomeworkSubmission {
    HomeworkSubmission {
        id: String::new(),
        homework_id: homework_id.to_string(),
        student_id: student_id.to_string(),
        student_name: student_name(student_id),
        status,
        submitted_at,
        grade: None,
        feedback: None,
        is_late: false,
        days_late: 0,
    }
}

pub fn mark(title: &str, class_id: &str, subject: &str, date: NaiveDate, total_marks: f64) -> Mark {
    Mark {
        id: String::new(),
        title: title.to_string(),
        subject: subject.to_string(),
        class_id: class_id.to_string(),
        class_name: name_of(CLASSES, class_id),
        teacher_id: "t1".to_string(),
        teacher_name: name_of(TEACHERS, "t1"),
        date,
        assessment_type: AssessmentType::Exam,
        total_marks,
        pass_marks: None,
    }
}

pub fn student_mark(
    mark_id: &str,
    student_id: &str,
    group_id: &str,
    obtained: f64,
    total: f64,
) -> StudentMark {
    StudentMark {
        id: String::new(),
        mark_id: mark_id.to_string(),
        student_id: student_id.to_string(),
        student_name: student_name(student_id),
        group_id: group_id.to_string(),
        obtained_marks: obtained,
        total_marks: total,
        grade: None,
        is_exempted: false,
        remarks: None,
    }
}

/// A one-off lecture. `start` and `end` are `(hour, minute)`.
pub fn schedule_entry(
    title: &str,
    class_id: &str,
    teacher_id: &str,
    date: NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
) -> ScheduleEntry {
    ScheduleEntry {
        id: String::new(),
        title: title.to_string(),
        subject: title.to_string(),
        class_id: class_id.to_string(),
        class_name: name_of(CLASSES, class_id),
        teacher_id: teacher_id.to_string(),
        teacher_name: name_of(TEACHERS, teacher_id),
        room: None,
        date,
        start_time: clock(start.0, start.1),
        end_time: clock(end.0, end.1),
        day_of_week: weekday_of(date).to_string(),
        kind: SessionType::Lecture,
        status: ScheduleStatus::Scheduled,
        recurrence: None,
    }
}

// ── Sample repository ──────────────────────────────────────────────

/// A small school populated around `today`: two weeks of attendance,
/// homework in every lifecycle state, three assessments and a weekly
/// timetable.
pub fn sample_repository(today: NaiveDate) -> Result<Repository> {
    let mut repo = Repository::in_memory();
    seed_attendance(&mut repo, today)?;
    seed_homework(&mut repo, today)?;
    seed_marks(&mut repo, today)?;
    seed_schedule(&mut repo, today)?;
    log::info!(
        "Built sample repository with {} records",
        repo.record_count()
    );
    Ok(repo)
}

fn seed_attendance(repo: &mut Repository, today: NaiveDate) -> Result<()> {
    for offset in 0..14i64 {
        let date = today - Duration::days(offset);
        if matches!(weekday_of(date), "saturday" | "sunday") {
            continue;
        }
        for (i, (student_id, _, class_id)) in STUDENTS.iter().enumerate() {
            let seed = i as i64 * 7 + offset;
            let status = match seed % 11 {
                _ if i == 5 && offset % 3 == 0 => AttendanceStatus::Absent,
                0 => AttendanceStatus::Absent,
                4 => AttendanceStatus::Late,
                9 => AttendanceStatus::Excused,
                _ => AttendanceStatus::Present,
            };
            let mut record = attendance_record(student_id, class_id, date, status);
            if status == AttendanceStatus::Excused {
                record.notes = Some("Medical appointment".to_string());
            }
            repo.create(record)?;
        }
    }

    let mut algebra = attendance_event("Algebra", "c1", today, [2, 0, 1, 0]);
    algebra.subject = Some("Mathematics".to_string());
    algebra.teacher_name = Some(name_of(TEACHERS, "t1"));
    algebra.status = EventStatus::Ongoing;
    repo.create(algebra)?;

    let mut lab = attendance_event("Physics lab", "c2", today - Duration::days(1), [1, 1, 0, 0]);
    lab.subject = Some("Science".to_string());
    lab.teacher_name = Some(name_of(TEACHERS, "t2"));
    lab.status = EventStatus::Completed;
    repo.create(lab)?;

    let mut trip = attendance_event(
        "Museum visit",
        "c3",
        today + Duration::days(2),
        [0, 0, 0, 1],
    );
    trip.status = EventStatus::Cancelled;
    repo.create(trip)?;
    Ok(())
}

fn seed_homework(repo: &mut Repository, today: NaiveDate) -> Result<()> {
    let days = Duration::days;

    let worksheet = repo.create(Homework {
        description: Some("Exercises 4.1 to 4.6".to_string()),
        ..homework(
            "Fractions worksheet",
            "c1",
            "Mathematics",
            today - days(10),
            today - days(3),
        )
    })?;

    let lab_report = repo.create(Homework {
        teacher_id: "t2".to_string(),
        teacher_name: name_of(TEACHERS, "t2"),
        kind: HomeworkKind::Project,
        priority: Priority::High,
        difficulty: Difficulty::Hard,
        total_marks: 50.0,
        ..homework(
            "Pendulum lab report",
            "c2",
            "Science",
            today - days(5),
            today + days(2),
        )
    })?;

    let essay = repo.create(Homework {
        teacher_id: "t3".to_string(),
        teacher_name: name_of(TEACHERS, "t3"),
        kind: HomeworkKind::Research,
        priority: Priority::Low,
        status: HomeworkStatus::Completed,
        ..homework(
            "Persuasive essay",
            "c3",
            "English",
            today - days(20),
            today - days(6),
        )
    })?;

    repo.create(Homework {
        kind: HomeworkKind::Project,
        difficulty: Difficulty::Hard,
        ..homework(
            "Statistics project",
            "c1",
            "Mathematics",
            today + days(3),
            today + days(14),
        )
    })?;

    repo.create(Homework {
        teacher_id: "t3".to_string(),
        teacher_name: name_of(TEACHERS, "t3"),
        kind: HomeworkKind::Reading,
        priority: Priority::Low,
        difficulty: Difficulty::Easy,
        status: HomeworkStatus::InProgress,
        ..homework(
            "Chapter 3 reading",
            "c2",
            "English",
            today - days(2),
            today + days(5),
        )
    })?;

    let worksheet_due = today - days(3);
    repo.create(HomeworkSubmission {
        grade: Some(18.0),
        feedback: Some("Neat working".to_string()),
        ..submission(
            &worksheet,
            "s1",
            SubmissionStatus::Graded,
            at(worksheet_due - days(1), 19),
        )
    })?;
    repo.create(HomeworkSubmission {
        grade: Some(11.0),
        ..submission(
            &worksheet,
            "s2",
            SubmissionStatus::Returned,
            at(worksheet_due + days(2), 8),
        )
    })?;
    repo.create(submission(
        &worksheet,
        "s3",
        SubmissionStatus::NotSubmitted,
        None,
    ))?;

    repo.create(submission(
        &lab_report,
        "s4",
        SubmissionStatus::Submitted,
        at(today - days(1), 16),
    ))?;
    repo.create(submission(
        &lab_report,
        "s5",
        SubmissionStatus::NotSubmitted,
        None,
    ))?;

    repo.create(HomeworkSubmission {
        grade: Some(16.5),
        ..submission(
            &essay,
            "s6",
            SubmissionStatus::Graded,
            at(today - days(7), 21),
        )
    })?;
    Ok(())
}

fn seed_marks(repo: &mut Repository, today: NaiveDate) -> Result<()> {
    let days = Duration::days;

    let midterm = repo.create(mark("Midterm", "c1", "Mathematics", today - days(7), 50.0))?;
    let quiz = repo.create(Mark {
        teacher_id: "t2".to_string(),
        teacher_name: name_of(TEACHERS, "t2"),
        assessment_type: AssessmentType::Quiz,
        pass_marks: Some(6.0),
        ..mark("Forces quiz", "c2", "Science", today - days(2), 10.0)
    })?;
    let test = repo.create(Mark {
        teacher_id: "t3".to_string(),
        teacher_name: name_of(TEACHERS, "t3"),
        assessment_type: AssessmentType::Test,
        ..mark("Grammar test", "c3", "English", today - days(40), 100.0)
    })?;

    for (student, group, obtained) in [("s1", "g1", 46.0), ("s2", "g1", 31.5), ("s3", "g2", 17.0)] {
        repo.create(student_mark(&midterm, student, group, obtained, 50.0))?;
    }
    repo.create(student_mark(&quiz, "s4", "g1", 7.0, 10.0))?;
    repo.create(StudentMark {
        is_exempted: true,
        remarks: Some("Absent with leave".to_string()),
        ..student_mark(&quiz, "s5", "g1", 0.0, 10.0)
    })?;
    repo.create(StudentMark {
        grade: Some("B".to_string()),
        ..student_mark(&test, "s6", "g1", 74.0, 100.0)
    })?;
    Ok(())
}

fn seed_schedule(repo: &mut Repository, today: NaiveDate) -> Result<()> {
    let (monday, _) = week_bounds(today);
    let first = monday - Duration::days(14);
    let weekly = Some(Recurrence {
        frequency: Frequency::Weekly,
        until: None,
    });

    repo.create(ScheduleEntry {
        subject: "Mathematics".to_string(),
        room: Some("B12".to_string()),
        recurrence: weekly.clone(),
        ..schedule_entry("Algebra", "c1", "t1", first, (9, 0), (10, 30))
    })?;
    repo.create(ScheduleEntry {
        subject: "Science".to_string(),
        room: Some("Lab 2".to_string()),
        kind: SessionType::Lab,
        recurrence: weekly.clone(),
        ..schedule_entry(
            "Physics lab",
            "c2",
            "t2",
            first + Duration::days(1),
            (13, 0),
            (15, 0),
        )
    })?;
    repo.create(ScheduleEntry {
        subject: "English".to_string(),
        room: Some("A3".to_string()),
        recurrence: weekly,
        ..schedule_entry(
            "Literature",
            "c3",
            "t3",
            first + Duration::days(2),
            (10, 0),
            (11, 0),
        )
    })?;
    repo.create(ScheduleEntry {
        subject: "Mathematics".to_string(),
        kind: SessionType::Tutorial,
        recurrence: Some(Recurrence {
            frequency: Frequency::Biweekly,
            until: None,
        }),
        ..schedule_entry(
            "Algebra clinic",
            "c1",
            "t1",
            first + Duration::days(3),
            (14, 0),
            (15, 0),
        )
    })?;
    repo.create(ScheduleEntry {
        subject: "Mathematics".to_string(),
        room: Some("Hall".to_string()),
        kind: SessionType::Exam,
        ..schedule_entry(
            "Term exam",
            "c2",
            "t1",
            monday + Duration::days(4),
            (9, 0),
            (11, 0),
        )
    })?;
    repo.create(ScheduleEntry {
        subject: "Assembly".to_string(),
        kind: SessionType::Activity,
        status: ScheduleStatus::Cancelled,
        ..schedule_entry("Assembly", "c3", "t3", today, (8, 0), (8, 30))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_repository_is_deterministic() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let a = sample_repository(today).unwrap();
        let b = sample_repository(today).unwrap();
        assert_eq!(a.record_count(), b.record_count());
        assert_eq!(
            a.attendance().iter().map(|r| r.status).collect::<Vec<_>>(),
            b.attendance().iter().map(|r| r.status).collect::<Vec<_>>()
        );
        assert!(!a.attendance().is_empty());
        assert_eq!(a.homework().len(), 5);
        assert_eq!(a.submissions().len(), 6);
        assert_eq!(a.schedule().len(), 6);
    }

    #[test]
    fn test_sample_submission_lateness_is_derived() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let repo = sample_repository(today).unwrap();
        let late: Vec<_> = repo.submissions().iter().filter(|s| s.is_late).collect();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].student_id, "s2");
        assert_eq!(late[0].days_late, 2);
    }

    #[test]
    fn test_builders_fill_names() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let record = attendance_record("s1", "c1", day, AttendanceStatus::Late);
        assert_eq!(record.student_name, "Ada Obi");
        assert_eq!(record.class_name, "Grade 8A");
        assert_eq!(record.time_in.as_deref(), Some("08:20"));

        let entry = schedule_entry("Algebra", "c9", "t1", day, (9, 0), (10, 0));
        assert_eq!(entry.class_name, "c9");
        assert_eq!(entry.day_of_week, "wednesday");
        assert_eq!(entry.duration_hours(), 1.0);
    }
}
