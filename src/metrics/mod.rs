pub mod aggregate;
pub mod types;

pub use types::*;

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::date_util::{week_bounds, weekday_of};
use crate::model::{
    derive_status, AttendanceEvent, AttendanceRecord, AttendanceStatus, ClassSchedule, EventStatus,
    GroupMark, Homework, HomeworkStatus, HomeworkSubmission, Mark, ScheduleEntry,
    StudentAttendanceSummary, StudentMark, SubmissionStatus, TeacherSchedule,
};
use crate::query::window::TimeWindow;
use aggregate::{group_by, rate, score_summary, tabulate, top_n, RankedEntry};

// ── Attendance ─────────────────────────────────────────────────────

/// Compose the attendance sidebar from all records and events.
pub fn compute_attendance_stats(
    records: &[AttendanceRecord],
    events: &[AttendanceEvent],
    today: NaiveDate,
    opts: &StatsOptions,
) -> AttendanceStats {
    log::debug!(
        "Composing attendance stats: {} records, {} events, today={today}",
        records.len(),
        events.len()
    );

    let status_distribution = tabulate(records, |r| Some(r.status.as_str()));
    let todays = TimeWindow::Today.select(records, today, |r| r.date);
    let weekly = TimeWindow::Last7Days.select(records, today, |r| r.date);
    let monthly = TimeWindow::Last30Days.select(records, today, |r| r.date);

    let class_rates: Vec<RankedEntry> = group_by(records, |r| r.class_id.clone())
        .into_iter()
        .map(|(class_id, rows)| RankedEntry {
            label: display_name(&rows[0].class_name, &class_id),
            value: attended_rate(rows.iter().copied()),
            count: rows.len() as u64,
            id: class_id,
        })
        .collect();

    let summaries = student_summaries(records);
    let absentees: Vec<RankedEntry> = summaries
        .iter()
        .filter(|s| s.absent > 0)
        .map(|s| RankedEntry {
            id: s.student_id.clone(),
            label: display_name(&s.student_name, &s.student_id),
            value: s.absent as f64,
            count: s.total_days,
        })
        .collect();

    let mut below: Vec<StudentAttendanceSummary> = summaries
        .into_iter()
        .filter(|s| s.attendance_rate < opts.attendance_alert_threshold)
        .collect();
    below.sort_by(|a, b| a.attendance_rate.total_cmp(&b.attendance_rate));

    let held: Vec<&AttendanceEvent> = events
        .iter()
        .filter(|e| e.status != EventStatus::Cancelled)
        .collect();
    let event_attended: u64 = held
        .iter()
        .map(|e| e.present_count as u64 + e.late_count as u64)
        .sum();
    let event_total: u64 = held.iter().map(|e| e.total_students as u64).sum();

    AttendanceStats {
        total_records: records.len() as u64,
        present: status_distribution.get(AttendanceStatus::Present.as_str()),
        absent: status_distribution.get(AttendanceStatus::Absent.as_str()),
        late: status_distribution.get(AttendanceStatus::Late.as_str()),
        excused: status_distribution.get(AttendanceStatus::Excused.as_str()),
        overall_rate: attended_rate(records),
        today_records: todays.len() as u64,
        today_rate: attended_rate(todays),
        weekly_rate: attended_rate(weekly),
        monthly_rate: attended_rate(monthly),
        status_distribution,
        top_classes: top_n(class_rates, opts.top_n, |e| e.value),
        top_absentees: top_n(absentees, opts.top_n, |e| e.value),
        absences_by_weekday: tabulate(records, |r| {
            (r.status == AttendanceStatus::Absent).then(|| weekday_of(r.date))
        }),
        students_below_threshold: below,
        total_events: events.len() as u64,
        event_attendance_rate: rate(event_attended, event_total),
        event_status_distribution: tabulate(events, |e| Some(e.status.as_str())),
        has_data: !records.is_empty(),
    }
}

/// Present and late over everything given.
fn attended_rate<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let (mut attended, mut total) = (0u64, 0u64);
    for record in records {
        total += 1;
        if record.status.counts_as_attended() {
            attended += 1;
        }
    }
    rate(attended, total)
}

/// Per-student attendance roll-up, in first-seen order.
pub fn student_summaries(records: &[AttendanceRecord]) -> Vec<StudentAttendanceSummary> {
    group_by(records, |r| r.student_id.clone())
        .into_iter()
        .map(|(student_id, rows)| {
            let count = |status: AttendanceStatus| {
                rows.iter().filter(|r| r.status == status).count() as u64
            };
            StudentAttendanceSummary {
                student_name: rows[0].student_name.clone(),
                class_id: rows[0].class_id.clone(),
                total_days: rows.len() as u64,
                present: count(AttendanceStatus::Present),
                absent: count(AttendanceStatus::Absent),
                late: count(AttendanceStatus::Late),
                excused: count(AttendanceStatus::Excused),
                attendance_rate: attended_rate(rows.iter().copied()),
                student_id,
            }
        })
        .collect()
}

// ── Homework ───────────────────────────────────────────────────────

/// Compose the homework sidebar. Statuses are derived as of `today`.
pub fn compute_homework_stats(
    homework: &[Homework],
    submissions: &[HomeworkSubmission],
    today: NaiveDate,
    opts: &StatsOptions,
) -> HomeworkStats {
    log::debug!(
        "Composing homework stats: {} homework, {} submissions, today={today}",
        homework.len(),
        submissions.len()
    );

    let statuses: Vec<HomeworkStatus> = homework.iter().map(|h| derive_status(today, h)).collect();
    let soon = today + Duration::days(7);
    let due_soon_count = homework
        .iter()
        .zip(&statuses)
        .filter(|(h, s)| s.is_active() && h.due_date >= today && h.due_date <= soon)
        .count() as u64;
    let assigned_last_7_days = TimeWindow::Last7Days
        .select(homework, today, |h| h.assigned_date)
        .into_iter()
        .filter(|h| h.assigned_date <= today)
        .count() as u64;

    let by_id: HashMap<&str, &Homework> = homework.iter().map(|h| (h.id.as_str(), h)).collect();

    let turned_in = submissions.iter().filter(|s| s.status.is_turned_in()).count() as u64;
    let late_submissions = submissions
        .iter()
        .filter(|s| s.status.is_turned_in() && is_late(s))
        .count() as u64;
    let graded = submissions.iter().filter(|s| s.status.is_graded()).count() as u64;

    let grade_pcts: Vec<f64> = submissions
        .iter()
        .filter_map(|s| {
            let hw = by_id.get(s.homework_id.as_str())?;
            s.grade_percentage(hw.total_marks)
        })
        .collect();

    let class_rates: Vec<RankedEntry> = group_by(submissions, |s| {
        by_id
            .get(s.homework_id.as_str())
            .map(|h| (h.class_id.clone(), h.class_name.clone()))
    })
    .into_iter()
    .filter_map(|(class, rows)| {
        let (class_id, class_name) = class?;
        let handed = rows.iter().filter(|s| s.status.is_turned_in()).count() as u64;
        Some(RankedEntry {
            label: display_name(&class_name, &class_id),
            value: rate(handed, rows.len() as u64),
            count: rows.len() as u64,
            id: class_id,
        })
    })
    .collect();

    let orphaned = submissions
        .iter()
        .filter(|s| !by_id.contains_key(s.homework_id.as_str()))
        .count();
    if orphaned > 0 {
        log::warn!(
            "{orphaned} submissions reference unknown homework, left out of class rankings"
        );
    }

    HomeworkStats {
        total_homework: homework.len() as u64,
        status_distribution: tabulate(&statuses, |s| Some(s.as_str())),
        active_count: statuses.iter().filter(|s| s.is_active()).count() as u64,
        overdue_count: statuses
            .iter()
            .filter(|s| **s == HomeworkStatus::Overdue)
            .count() as u64,
        due_soon_count,
        assigned_last_7_days,
        total_submissions: submissions.len() as u64,
        turned_in,
        late_submissions,
        graded,
        submission_rate: rate(turned_in, submissions.len() as u64),
        on_time_rate: rate(turned_in - late_submissions, turned_in),
        grading_rate: rate(graded, turned_in),
        average_grade_percentage: score_summary(&grade_pcts).average,
        subject_distribution: tabulate(homework, |h| Some(h.subject.clone())),
        type_distribution: tabulate(homework, |h| Some(h.kind.as_str())),
        priority_distribution: tabulate(homework, |h| Some(h.priority.as_str())),
        top_classes: top_n(class_rates, opts.top_n, |e| e.value),
        has_data: !submissions.is_empty(),
    }
}

fn is_late(submission: &HomeworkSubmission) -> bool {
    submission.is_late || submission.status == SubmissionStatus::Late
}

// ── Marks ──────────────────────────────────────────────────────────

/// Compose the marks sidebar. Exempted results count towards
/// `total_results` and `exempted` only.
pub fn compute_marks_stats(
    marks: &[Mark],
    results: &[StudentMark],
    today: NaiveDate,
    opts: &StatsOptions,
) -> MarksStats {
    log::debug!(
        "Composing marks stats: {} assessments, {} results, today={today}",
        marks.len(),
        results.len()
    );

    let by_id: HashMap<&str, &Mark> = marks.iter().map(|m| (m.id.as_str(), m)).collect();
    let scored: Vec<(&StudentMark, f64)> = results
        .iter()
        .filter_map(|r| r.percentage().map(|p| (r, p)))
        .collect();
    let pcts: Vec<f64> = scored.iter().map(|(_, p)| *p).collect();

    let pass_count = scored
        .iter()
        .filter(|(r, p)| {
            let threshold = by_id
                .get(r.mark_id.as_str())
                .map_or(opts.pass_percentage, |m| m.pass_percentage(opts.pass_percentage));
            *p >= threshold
        })
        .count() as u64;

    let top_students: Vec<RankedEntry> = group_by(&scored, |(r, _)| r.student_id.clone())
        .into_iter()
        .map(|(student_id, rows)| RankedEntry {
            label: display_name(&rows[0].0.student_name, &student_id),
            value: mean(rows.iter().map(|(_, p)| *p)),
            count: rows.len() as u64,
            id: student_id,
        })
        .collect();

    let top_subjects: Vec<RankedEntry> = group_by(&scored, |(r, _)| {
        by_id.get(r.mark_id.as_str()).map(|m| m.subject.clone())
    })
    .into_iter()
    .filter_map(|(subject, rows)| {
        let subject = subject?;
        Some(RankedEntry {
            id: subject.clone(),
            label: subject,
            value: mean(rows.iter().map(|(_, p)| *p)),
            count: rows.len() as u64,
        })
    })
    .collect();

    MarksStats {
        total_assessments: marks.len() as u64,
        total_results: results.len() as u64,
        exempted: (results.len() - scored.len()) as u64,
        scores: score_summary(&pcts),
        pass_count,
        fail_count: scored.len() as u64 - pass_count,
        pass_rate: rate(pass_count, scored.len() as u64),
        grade_distribution: tabulate(results, |r| r.effective_grade()),
        subject_distribution: tabulate(marks, |m| Some(m.subject.clone())),
        type_distribution: tabulate(marks, |m| Some(m.assessment_type.as_str())),
        top_students: top_n(top_students, opts.top_n, |e| e.value),
        top_subjects: top_n(top_subjects, opts.top_n, |e| e.value),
        recent_assessments: TimeWindow::Last30Days
            .select(marks, today, |m| m.date)
            .len() as u64,
        has_data: !results.is_empty(),
    }
}

/// Results of one assessment aggregated per teaching group, in first-seen
/// group order.
pub fn group_marks(
    mark: &Mark,
    results: &[StudentMark],
    default_pass_percentage: f64,
) -> Vec<GroupMark> {
    let own: Vec<&StudentMark> = results.iter().filter(|r| r.mark_id == mark.id).collect();
    let pass_percentage = mark.pass_percentage(default_pass_percentage);
    group_by(&own, |r| r.group_id.clone())
        .into_iter()
        .map(|(group_id, rows)| {
            let rows: Vec<&StudentMark> = rows.into_iter().copied().collect();
            GroupMark::from_results(&mark.id, &group_id, &rows, pass_percentage)
        })
        .collect()
}

// ── Schedule ───────────────────────────────────────────────────────

/// Compose the schedule sidebar for the Monday to Sunday week containing
/// `today`.
pub fn compute_schedule_stats(
    entries: &[ScheduleEntry],
    today: NaiveDate,
    opts: &StatsOptions,
) -> ScheduleStats {
    log::debug!(
        "Composing schedule stats: {} entries, today={today}",
        entries.len()
    );

    let (week_start, week_end) = week_bounds(today);
    let held: Vec<&ScheduleEntry> = entries.iter().filter(|e| !e.is_cancelled()).collect();
    let cancelled = (entries.len() - held.len()) as u64;
    let total = entries.len() as u64;

    let teachers: Vec<RankedEntry> = teacher_schedules(entries, today)
        .into_iter()
        .map(|t| RankedEntry {
            label: display_name(&t.teacher_name, &t.teacher_id),
            value: t.total_weekly_hours,
            count: t.entries.len() as u64,
            id: t.teacher_id,
        })
        .collect();
    let classes: Vec<RankedEntry> = class_schedules(entries, today)
        .into_iter()
        .map(|c| RankedEntry {
            label: display_name(&c.class_name, &c.class_id),
            value: c.total_weekly_hours,
            count: c.entries.len() as u64,
            id: c.class_id,
        })
        .collect();

    ScheduleStats {
        total_entries: total,
        today_sessions: held.iter().filter(|e| e.occurs_on(today)).count() as u64,
        week_sessions: held
            .iter()
            .map(|e| e.occurrences_between(week_start, week_end) as u64)
            .sum(),
        weekly_hours: weekly_hours(entries.iter(), today),
        day_distribution: tabulate(entries, |e| Some(e.day_of_week.clone())),
        type_distribution: tabulate(entries, |e| Some(e.kind.as_str())),
        status_distribution: tabulate(entries, |e| Some(e.status.as_str())),
        utilization_rate: rate(total - cancelled, total),
        cancellation_rate: rate(cancelled, total),
        top_teachers: top_n(teachers, opts.top_n, |e| e.value),
        class_hours: top_n(classes, opts.top_n, |e| e.value),
        has_data: !entries.is_empty(),
    }
}

/// Hours of non-cancelled sessions falling in the week containing `today`.
pub fn weekly_hours<'a, I>(entries: I, today: NaiveDate) -> f64
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    let (start, end) = week_bounds(today);
    entries
        .into_iter()
        .filter(|e| !e.is_cancelled())
        .map(|e| e.duration_hours() * e.occurrences_between(start, end) as f64)
        .sum()
}

/// Entries rolled up per class, in first-seen order.
pub fn class_schedules(entries: &[ScheduleEntry], today: NaiveDate) -> Vec<ClassSchedule> {
    group_by(entries, |e| e.class_id.clone())
        .into_iter()
        .map(|(class_id, rows)| ClassSchedule {
            class_name: rows[0].class_name.clone(),
            total_weekly_hours: weekly_hours(rows.iter().copied(), today),
            entries: rows.into_iter().cloned().collect(),
            class_id,
        })
        .collect()
}

/// Entries rolled up per teacher, in first-seen order.
pub fn teacher_schedules(entries: &[ScheduleEntry], today: NaiveDate) -> Vec<TeacherSchedule> {
    group_by(entries, |e| e.teacher_id.clone())
        .into_iter()
        .map(|(teacher_id, rows)| {
            let mut subjects: Vec<String> = Vec::new();
            for row in &rows {
                if !subjects.contains(&row.subject) {
                    subjects.push(row.subject.clone());
                }
            }
            TeacherSchedule {
                teacher_name: rows[0].teacher_name.clone(),
                total_weekly_hours: weekly_hours(rows.iter().copied(), today),
                entries: rows.into_iter().cloned().collect(),
                subjects,
                teacher_id,
            }
        })
        .collect()
}

// ── Helpers ────────────────────────────────────────────────────────

fn display_name(name: &str, id: &str) -> String {
    if name.trim().is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values.fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::model::{Frequency, Recurrence, ScheduleStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Wednesday
    fn today() -> NaiveDate {
        date(2025, 3, 12)
    }

    fn at(day: NaiveDate, hour: u32) -> Option<chrono::NaiveDateTime> {
        day.and_hms_opt(hour, 0, 0)
    }

    #[test]
    fn test_attendance_rate_example() {
        use AttendanceStatus::*;
        let records: Vec<AttendanceRecord> = [Present, Present, Absent, Late]
            .into_iter()
            .enumerate()
            .map(|(i, status)| fixtures::attendance_record(&format!("s{i}"), "c1", today(), status))
            .collect();

        let stats = compute_attendance_stats(&records, &[], today(), &StatsOptions::default());
        assert_eq!(stats.overall_rate, 75.0);
        assert_eq!(stats.today_rate, 75.0);
        assert_eq!(stats.today_records, 4);
        assert_eq!(stats.present, 2);
        assert_eq!(stats.status_distribution.total(), 4);
        assert_eq!(stats.status_distribution.get("excused"), 0);
        assert_eq!(stats.status_distribution.len(), 3);
        assert_eq!(stats.absences_by_weekday.get("wednesday"), 1);
        assert!(stats.has_data);
    }

    #[test]
    fn test_attendance_empty_is_zeroed() {
        let stats = compute_attendance_stats(&[], &[], today(), &StatsOptions::default());
        assert_eq!(stats.overall_rate, 0.0);
        assert_eq!(stats.weekly_rate, 0.0);
        assert_eq!(stats.event_attendance_rate, 0.0);
        assert!(stats.top_classes.is_empty());
        assert!(stats.status_distribution.is_empty());
        assert!(!stats.has_data);
    }

    #[test]
    fn test_attendance_windows_and_alerts() {
        use AttendanceStatus::*;
        let records = vec![
            fixtures::attendance_record("s1", "c1", today(), Present),
            fixtures::attendance_record("s1", "c1", today() - Duration::days(3), Present),
            fixtures::attendance_record("s2", "c2", today() - Duration::days(3), Absent),
            fixtures::attendance_record("s2", "c2", today() - Duration::days(20), Absent),
            fixtures::attendance_record("s2", "c2", today() - Duration::days(60), Present),
        ];
        let stats = compute_attendance_stats(&records, &[], today(), &StatsOptions::default());

        assert_eq!(stats.today_rate, 100.0);
        assert!((stats.weekly_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.monthly_rate, 50.0);
        assert_eq!(stats.overall_rate, 60.0);

        assert_eq!(stats.top_classes[0].id, "c1");
        assert_eq!(stats.top_classes[0].value, 100.0);
        assert_eq!(stats.top_absentees.len(), 1);
        assert_eq!(stats.top_absentees[0].id, "s2");
        assert_eq!(stats.top_absentees[0].value, 2.0);

        assert_eq!(stats.students_below_threshold.len(), 1);
        assert_eq!(stats.students_below_threshold[0].student_id, "s2");
    }

    #[test]
    fn test_event_rate_skips_cancelled() {
        let mut held = fixtures::attendance_event("Algebra", "c1", today(), [6, 2, 2, 0]);
        held.status = EventStatus::Completed;
        let mut cancelled = fixtures::attendance_event("Biology", "c1", today(), [0, 10, 0, 0]);
        cancelled.status = EventStatus::Cancelled;

        let stats =
            compute_attendance_stats(&[], &[held, cancelled], today(), &StatsOptions::default());
        assert_eq!(stats.total_events, 2);
        assert_eq!(stats.event_attendance_rate, 80.0);
        assert_eq!(stats.event_status_distribution.get("cancelled"), 1);
    }

    #[test]
    fn test_student_summaries() {
        use AttendanceStatus::*;
        let records = vec![
            fixtures::attendance_record("s1", "c1", today(), Late),
            fixtures::attendance_record("s2", "c1", today(), Excused),
            fixtures::attendance_record("s1", "c1", today() - Duration::days(1), Absent),
        ];
        let summaries = student_summaries(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].student_id, "s1");
        assert_eq!(summaries[0].total_days, 2);
        assert_eq!(summaries[0].late, 1);
        assert_eq!(summaries[0].attendance_rate, 50.0);
        assert_eq!(summaries[1].attendance_rate, 0.0);
    }

    #[test]
    fn test_homework_zero_submissions_has_no_data() {
        let hw = vec![fixtures::homework("Essay", "c1", "English", today(), today())];
        let stats = compute_homework_stats(&hw, &[], today(), &StatsOptions::default());
        assert_eq!(stats.submission_rate, 0.0);
        assert_eq!(stats.on_time_rate, 0.0);
        assert!(stats.average_grade_percentage.is_none());
        assert!(!stats.has_data);
        assert_eq!(stats.total_homework, 1);
    }

    #[test]
    fn test_homework_rates_and_derived_statuses() {
        let mut essay = fixtures::homework(
            "Essay",
            "c1",
            "English",
            today() - Duration::days(10),
            today() - Duration::days(2),
        );
        essay.id = "hw_1".into();
        let mut lab = fixtures::homework(
            "Lab report",
            "c2",
            "Science",
            today() - Duration::days(1),
            today() + Duration::days(3),
        );
        lab.id = "hw_2".into();
        let mut future = fixtures::homework(
            "Reading",
            "c2",
            "English",
            today() + Duration::days(2),
            today() + Duration::days(9),
        );
        future.id = "hw_3".into();
        let homework = vec![essay, lab, future];

        let mut graded = fixtures::submission(
            "hw_1",
            "s1",
            SubmissionStatus::Graded,
            at(today() - Duration::days(3), 9),
        );
        graded.grade = Some(15.0);
        let mut late = fixtures::submission("hw_1", "s2", SubmissionStatus::Late, at(today(), 9));
        late.apply_lateness(today() - Duration::days(2));
        let missing = fixtures::submission("hw_2", "s3", SubmissionStatus::NotSubmitted, None);
        let on_time =
            fixtures::submission("hw_2", "s4", SubmissionStatus::Submitted, at(today(), 8));
        let submissions = vec![graded, late, missing, on_time];

        let stats =
            compute_homework_stats(&homework, &submissions, today(), &StatsOptions::default());
        assert_eq!(stats.status_distribution.get("overdue"), 1);
        assert_eq!(stats.status_distribution.get("assigned"), 1);
        assert_eq!(stats.status_distribution.get("draft"), 1);
        assert_eq!(stats.overdue_count, 1);
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.due_soon_count, 1);
        assert_eq!(stats.assigned_last_7_days, 1);

        assert_eq!(stats.turned_in, 3);
        assert_eq!(stats.submission_rate, 75.0);
        assert!((stats.on_time_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.late_submissions, 1);
        assert_eq!(stats.graded, 1);
        assert_eq!(stats.average_grade_percentage, Some(75.0));

        assert_eq!(stats.top_classes[0].id, "c1");
        assert_eq!(stats.top_classes[0].value, 100.0);
        assert_eq!(stats.top_classes[1].value, 50.0);
        assert_eq!(stats.subject_distribution.get("English"), 2);
        assert!(stats.has_data);
    }

    #[test]
    fn test_marks_stats() {
        let mut exam = fixtures::mark(
            "Midterm",
            "c1",
            "Mathematics",
            today() - Duration::days(5),
            50.0,
        );
        exam.id = "mark_1".into();
        let mut quiz = fixtures::mark(
            "Quiz 1",
            "c1",
            "Science",
            today() - Duration::days(45),
            10.0,
        );
        quiz.id = "mark_2".into();
        quiz.pass_marks = Some(6.0);
        let marks = vec![exam, quiz];

        let mut exempt = fixtures::student_mark("mark_1", "s3", "g1", 0.0, 50.0);
        exempt.is_exempted = true;
        let results = vec![
            fixtures::student_mark("mark_1", "s1", "g1", 45.0, 50.0),
            fixtures::student_mark("mark_1", "s2", "g1", 15.0, 50.0),
            exempt,
            fixtures::student_mark("mark_2", "s1", "g1", 5.0, 10.0),
        ];

        let stats = compute_marks_stats(&marks, &results, today(), &StatsOptions::default());
        assert_eq!(stats.total_results, 4);
        assert_eq!(stats.exempted, 1);
        // Quiz passes at 6/10, so 50% fails it.
        assert_eq!(stats.pass_count, 1);
        assert_eq!(stats.fail_count, 2);
        assert!((stats.pass_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.scores.highest, Some(90.0));
        assert_eq!(stats.scores.lowest, Some(30.0));
        assert_eq!(stats.grade_distribution.get("A+"), 1);
        assert_eq!(stats.grade_distribution.get("F"), 1);
        assert_eq!(stats.grade_distribution.total(), 3);
        assert_eq!(stats.top_students[0].id, "s1");
        assert_eq!(stats.top_students[0].value, 70.0);
        assert_eq!(stats.top_subjects[0].id, "Mathematics");
        assert_eq!(stats.recent_assessments, 1);
    }

    #[test]
    fn test_group_marks_partition_students() {
        let mut exam = fixtures::mark("Midterm", "c1", "Mathematics", today(), 50.0);
        exam.id = "mark_1".into();
        let mut exempt = fixtures::student_mark("mark_1", "s3", "g2", 0.0, 50.0);
        exempt.is_exempted = true;
        let results = vec![
            fixtures::student_mark("mark_1", "s1", "g1", 45.0, 50.0),
            fixtures::student_mark("mark_1", "s2", "g2", 10.0, 50.0),
            exempt,
            fixtures::student_mark("mark_9", "s4", "g1", 10.0, 50.0),
        ];

        let groups = group_marks(&exam, &results, 40.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_id, "g1");
        assert_eq!(groups[0].total_students, 1);
        for g in &groups {
            assert_eq!(
                g.pass_count + g.fail_count + g.exempted_count,
                g.total_students
            );
        }
        assert_eq!(groups[1].fail_count, 1);
        assert_eq!(groups[1].exempted_count, 1);
    }

    #[test]
    fn test_schedule_stats() {
        let monday = date(2025, 3, 10);
        let mut weekly = fixtures::schedule_entry("Algebra", "c1", "t1", monday, (9, 0), (10, 30));
        weekly.recurrence = Some(Recurrence {
            frequency: Frequency::Weekly,
            until: None,
        });
        let lab = fixtures::schedule_entry("Lab", "c2", "t2", today(), (13, 0), (15, 0));
        let mut cancelled =
            fixtures::schedule_entry("Assembly", "c1", "t1", today(), (8, 0), (9, 0));
        cancelled.status = ScheduleStatus::Cancelled;
        let next_week = fixtures::schedule_entry(
            "Exam",
            "c2",
            "t2",
            monday + Duration::days(7),
            (9, 0),
            (11, 0),
        );
        let entries = vec![weekly, lab, cancelled, next_week];

        let stats = compute_schedule_stats(&entries, today(), &StatsOptions::default());
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.week_sessions, 2);
        assert_eq!(stats.weekly_hours, 3.5);
        assert_eq!(stats.utilization_rate, 75.0);
        assert_eq!(stats.cancellation_rate, 25.0);
        assert_eq!(stats.day_distribution.get("wednesday"), 2);
        assert_eq!(stats.top_teachers[0].id, "t2");
        assert_eq!(stats.top_teachers[0].value, 2.0);
        assert_eq!(stats.class_hours[0].id, "c2");
    }

    #[test]
    fn test_teacher_schedules_collect_subjects() {
        let mut a = fixtures::schedule_entry("Algebra", "c1", "t1", today(), (9, 0), (10, 0));
        a.subject = "Mathematics".into();
        let mut b = fixtures::schedule_entry("Physics", "c2", "t1", today(), (10, 0), (11, 0));
        b.subject = "Science".into();
        let mut c = fixtures::schedule_entry("Geometry", "c2", "t1", today(), (11, 0), (12, 0));
        c.subject = "Mathematics".into();

        let teachers = teacher_schedules(&[a, b, c], today());
        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].subjects, vec!["Mathematics", "Science"]);
        assert_eq!(teachers[0].total_weekly_hours, 3.0);

        let classes = class_schedules(&teachers[0].entries, today());
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[1].total_weekly_hours, 2.0);
    }
}
