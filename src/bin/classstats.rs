use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use classstats::date_util::parse_date;
use classstats::metrics::aggregate::{Distribution, RankedEntry};
use classstats::model::{AttendanceRecord, Homework, HomeworkSubmission, Mark, ScheduleEntry};
use classstats::{ClassroomStats, Config, Period, RecordFilter, Repository, TimeWindow};

#[derive(Parser)]
#[command(
    name = "classstats",
    about = "Classroom attendance, homework, marks and schedule statistics"
)]
struct Cli {
    /// Snapshot path (default: ~/.classstats/snapshot.json)
    #[arg(long)]
    snapshot: Option<String>,

    /// Config path (default: ~/.classstats/config.json)
    #[arg(long)]
    config: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a stats sidebar
    Stats {
        #[command(subcommand)]
        target: StatsTarget,
    },
    /// List records matching filters
    Query {
        #[command(subcommand)]
        target: QueryTarget,
    },
    /// Search across all records
    Search {
        /// Search text
        query: String,
        /// Filter by type: attendance, event, homework, submission, assessment, result, schedule
        #[arg(long, value_name = "TYPE")]
        r#type: Option<String>,
        /// Maximum results
        #[arg(long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Weekly timetable roll-ups
    Schedule {
        #[command(subcommand)]
        view: ScheduleView,
    },
    /// Per-group results for one assessment
    Groups {
        /// Assessment id
        mark_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Write a sample snapshot to the snapshot path
    Sample {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },
    /// Show record counts
    Status,
}

#[derive(Subcommand)]
enum StatsTarget {
    Attendance(StatsArgs),
    Homework(StatsArgs),
    Marks(StatsArgs),
    Schedule(StatsArgs),
}

#[derive(Args)]
struct StatsArgs {
    /// Filter by class id
    #[arg(long)]
    class: Option<String>,
    /// Filter by subject (homework, marks and schedule)
    #[arg(long)]
    subject: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum QueryTarget {
    Attendance(QueryArgs),
    Homework(QueryArgs),
    Submissions(QueryArgs),
    Marks(QueryArgs),
    Schedule(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Filter by status (homework uses the derived status)
    #[arg(long)]
    status: Option<String>,
    /// Filter by class id
    #[arg(long)]
    class: Option<String>,
    /// Filter by subject
    #[arg(long)]
    subject: Option<String>,
    /// Filter by student id
    #[arg(long)]
    student: Option<String>,
    /// Case-insensitive text search
    #[arg(long)]
    search: Option<String>,
    /// On date (YYYY-MM-DD)
    #[arg(long)]
    on: Option<String>,
    /// From date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// To date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
    /// Period: today, 7d, 30d, YYYY, YYYY-MM, YYYY-Www, or START..END
    #[arg(long)]
    period: Option<String>,
    /// Maximum results
    #[arg(long, default_value = "100")]
    limit: usize,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ScheduleView {
    /// Hours per class this week
    Classes {
        #[arg(long)]
        json: bool,
    },
    /// Hours and subjects per teacher this week
    Teachers {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => Config::default_path()?,
    };
    let snapshot_path = match &cli.snapshot {
        Some(path) => PathBuf::from(path),
        None => Repository::default_path()?,
    };
    let config = Config::load_from(&config_path)?;

    match cli.command {
        Commands::Config { action } => {
            handle_config(config, &config_path, action)?;
        }
        Commands::Sample { force } => {
            handle_sample(&config, &snapshot_path, force)?;
        }
        Commands::Stats { target } => {
            let app = ClassroomStats::new(open_repository(&snapshot_path)?, config);
            handle_stats(&app, target)?;
        }
        Commands::Query { target } => {
            let app = ClassroomStats::new(open_repository(&snapshot_path)?, config);
            handle_query(&app, target)?;
        }
        Commands::Search {
            query,
            r#type,
            limit,
            json,
        } => {
            let app = ClassroomStats::new(open_repository(&snapshot_path)?, config);
            handle_search(&app, &query, r#type.as_deref(), limit, json)?;
        }
        Commands::Schedule { view } => {
            let app = ClassroomStats::new(open_repository(&snapshot_path)?, config);
            handle_schedule(&app, view)?;
        }
        Commands::Groups { mark_id, json } => {
            let app = ClassroomStats::new(open_repository(&snapshot_path)?, config);
            handle_groups(&app, &mark_id, json)?;
        }
        Commands::Status => {
            let app = ClassroomStats::new(open_repository(&snapshot_path)?, config);
            print_status(&app, &snapshot_path);
        }
    }

    Ok(())
}

fn open_repository(path: &Path) -> anyhow::Result<Repository> {
    if !path.exists() {
        log::warn!(
            "No snapshot at {}; run 'classstats sample' to create one",
            path.display()
        );
        return Ok(Repository::in_memory());
    }
    Ok(Repository::open_at(path)?)
}

fn handle_config(mut config: Config, path: &Path, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match config.get(&key)? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save_to(path)?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            for (k, v) in config.list() {
                println!("{k} = {v}");
            }
        }
    }
    Ok(())
}

fn handle_sample(config: &Config, path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Pass --force to overwrite it.",
            path.display()
        );
    }
    let repo = classstats::fixtures::sample_repository(config.today())?;
    repo.save_at(path)?;
    println!(
        "Wrote {} sample records to {}",
        repo.record_count(),
        path.display()
    );
    Ok(())
}

fn stats_filter(args: &StatsArgs) -> RecordFilter {
    let mut filter = RecordFilter::new();
    if let Some(ref c) = args.class {
        filter = filter.class(c);
    }
    if let Some(ref s) = args.subject {
        filter = filter.subject(s);
    }
    filter
}

fn handle_stats(app: &ClassroomStats, target: StatsTarget) -> anyhow::Result<()> {
    match target {
        StatsTarget::Attendance(args) => {
            if args.subject.is_some() {
                log::warn!("Attendance records carry no subject; ignoring --subject");
            }
            let filter = RecordFilter::new();
            let filter = match args.class {
                Some(ref c) => filter.class(c),
                None => filter,
            };
            let stats = app.attendance_stats(&filter);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_attendance_stats(&stats, app);
            }
        }
        StatsTarget::Homework(args) => {
            let stats = app.homework_stats(&stats_filter(&args));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_homework_stats(&stats, app);
            }
        }
        StatsTarget::Marks(args) => {
            let stats = app.marks_stats(&stats_filter(&args));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_marks_stats(&stats, app);
            }
        }
        StatsTarget::Schedule(args) => {
            let stats = app.schedule_stats(&stats_filter(&args));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_schedule_stats(&stats, app);
            }
        }
    }
    Ok(())
}

fn query_filter(app: &ClassroomStats, args: &QueryArgs) -> anyhow::Result<RecordFilter> {
    let mut filter = RecordFilter::new().limit(args.limit);
    if let Some(ref s) = args.status {
        filter = filter.status(s);
    }
    if let Some(ref c) = args.class {
        filter = filter.class(c);
    }
    if let Some(ref s) = args.subject {
        filter = filter.subject(s);
    }
    if let Some(ref s) = args.student {
        filter = filter.student(s);
    }
    if let Some(ref s) = args.search {
        filter = filter.search(s);
    }
    if let Some(ref d) = args.on {
        filter = filter.on(parse_date(d)?);
    }
    if let Some(ref d) = args.from {
        filter = filter.since(parse_date(d)?);
    }
    if let Some(ref d) = args.to {
        filter = filter.until(parse_date(d)?);
    }
    if let Some(ref p) = args.period {
        filter = filter.period(Period::parse(p, app.today())?);
    }
    Ok(filter)
}

fn handle_query(app: &ClassroomStats, target: QueryTarget) -> anyhow::Result<()> {
    match target {
        QueryTarget::Attendance(args) => {
            let rows: Vec<&AttendanceRecord> = app.query(&query_filter(app, &args)?);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for r in &rows {
                    println!(
                        "{}  {:<18} {:<10} {:<8} in {:<5}  {}",
                        r.date,
                        r.student_name,
                        placeholder(&r.class_name),
                        r.status,
                        r.time_in.as_deref().unwrap_or("-"),
                        r.notes.as_deref().unwrap_or("")
                    );
                }
                println!("{} records", rows.len());
            }
        }
        QueryTarget::Homework(args) => {
            let rows: Vec<&Homework> = app.query(&query_filter(app, &args)?);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                let today = app.today();
                for h in &rows {
                    println!(
                        "{}  {:<24} {:<12} {:<9} due {}  [{}]",
                        h.id,
                        h.title,
                        h.subject,
                        placeholder(&h.class_name),
                        h.due_date,
                        classstats::model::derive_status(today, h)
                    );
                }
                println!("{} homework", rows.len());
            }
        }
        QueryTarget::Submissions(args) => {
            let rows: Vec<&HomeworkSubmission> = app.query(&query_filter(app, &args)?);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for s in &rows {
                    let late = if s.is_late {
                        format!(" ({} days late)", s.days_late)
                    } else {
                        String::new()
                    };
                    println!(
                        "{}  {:<18} {:<13} grade {}{}",
                        s.homework_id,
                        s.student_name,
                        s.status,
                        s.grade.map_or("Not recorded".to_string(), |g| format!("{g}")),
                        late
                    );
                }
                println!("{} submissions", rows.len());
            }
        }
        QueryTarget::Marks(args) => {
            let rows: Vec<&Mark> = app.query(&query_filter(app, &args)?);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for m in &rows {
                    println!(
                        "{}  {}  {:<20} {:<12} {:<10} out of {}",
                        m.id,
                        m.date,
                        m.title,
                        m.subject,
                        m.assessment_type,
                        m.total_marks
                    );
                }
                println!("{} assessments", rows.len());
            }
        }
        QueryTarget::Schedule(args) => {
            let rows: Vec<&ScheduleEntry> = app.query(&query_filter(app, &args)?);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for e in &rows {
                    println!(
                        "{} {:<9} {}-{}  {:<16} {:<10} room {:<6} [{}]",
                        e.date,
                        e.day_of_week,
                        e.start_time.format("%H:%M"),
                        e.end_time.format("%H:%M"),
                        e.title,
                        placeholder(&e.class_name),
                        e.room.as_deref().unwrap_or("-"),
                        e.status
                    );
                }
                println!("{} entries", rows.len());
            }
        }
    }
    Ok(())
}

fn handle_search(
    app: &ClassroomStats,
    query: &str,
    hit_type: Option<&str>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let options = classstats::SearchOptions {
        limit: Some(limit),
        hit_type: hit_type
            .map(|t| t.parse::<classstats::SearchHitType>())
            .transpose()?,
    };
    let results = app.search(query, &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("Search: \"{}\" ({} results)", results.query, results.total);
        for hit in &results.hits {
            println!("  [{}] {} ({})", hit.hit_type, hit.title, hit.id);
            println!("    {}", hit.snippet);
        }
    }
    Ok(())
}

fn handle_schedule(app: &ClassroomStats, view: ScheduleView) -> anyhow::Result<()> {
    match view {
        ScheduleView::Classes { json } => {
            let classes = app.class_schedules();
            if json {
                println!("{}", serde_json::to_string_pretty(&classes)?);
            } else {
                for c in &classes {
                    println!(
                        "{} {}: {:.1} h/week, {} entries",
                        c.class_id,
                        placeholder(&c.class_name),
                        c.total_weekly_hours,
                        c.entries.len()
                    );
                }
            }
        }
        ScheduleView::Teachers { json } => {
            let teachers = app.teacher_schedules();
            if json {
                println!("{}", serde_json::to_string_pretty(&teachers)?);
            } else {
                for t in &teachers {
                    println!(
                        "{} {}: {:.1} h/week ({})",
                        t.teacher_id,
                        placeholder(&t.teacher_name),
                        t.total_weekly_hours,
                        t.subjects.join(", ")
                    );
                }
            }
        }
    }
    Ok(())
}

fn handle_groups(app: &ClassroomStats, mark_id: &str, json: bool) -> anyhow::Result<()> {
    let groups = app.group_marks(mark_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }
    if groups.is_empty() {
        println!("No results recorded for {mark_id}.");
    }
    for g in &groups {
        println!("Group {}", g.group_id);
        println!("  Students:  {}", g.total_students);
        println!(
            "  Average:   {:.1} ({:.1}%)",
            g.average_marks, g.average_percentage
        );
        println!(
            "  Pass/fail: {}/{} ({} exempted)",
            g.pass_count, g.fail_count, g.exempted_count
        );
        println!(
            "  Range:     {}-{}",
            opt_num(g.lowest_marks),
            opt_num(g.highest_marks)
        );
    }
    Ok(())
}

fn print_status(app: &ClassroomStats, snapshot: &Path) {
    let repo = app.repo();
    println!("Classroom Status");
    println!("  Snapshot:     {}", snapshot.display());
    println!("  Today:        {}", app.today());
    println!("  Attendance:   {}", repo.attendance().len());
    println!("  Events:       {}", repo.attendance_events().len());
    println!("  Homework:     {}", repo.homework().len());
    println!("  Submissions:  {}", repo.submissions().len());
    println!("  Assessments:  {}", repo.marks().len());
    println!("  Results:      {}", repo.student_marks().len());
    println!("  Schedule:     {}", repo.schedule().len());
}

fn print_attendance_stats(s: &classstats::AttendanceStats, app: &ClassroomStats) {
    println!("Attendance ({})", app.today());
    if !s.has_data {
        println!("  No attendance recorded.");
        return;
    }
    println!("  Records:   {}", s.total_records);
    println!(
        "  Present {} / Absent {} / Late {} / Excused {}",
        s.present, s.absent, s.late, s.excused
    );
    println!("  Overall:   {:.1}%", s.overall_rate);
    let windows = [
        (TimeWindow::Today, s.today_rate),
        (TimeWindow::Last7Days, s.weekly_rate),
        (TimeWindow::Last30Days, s.monthly_rate),
    ];
    for (window, value) in windows {
        println!("  {:<13} {value:.1}%", format!("{}:", window.label()));
    }
    println!("  Records today: {}", s.today_records);
    println!(
        "  Events:    {} ({:.1}% attended)",
        s.total_events, s.event_attendance_rate
    );
    print_ranking("Top classes", &s.top_classes, "%");
    print_ranking("Most absences", &s.top_absentees, "");
    print_distribution("Absences by weekday", &s.absences_by_weekday);
    if !s.students_below_threshold.is_empty() {
        println!(
            "  Below {:.0}%:",
            app.config().attendance_alert_threshold
        );
        for st in &s.students_below_threshold {
            println!(
                "    {:<18} {:.1}% ({} of {} days absent)",
                st.student_name, st.attendance_rate, st.absent, st.total_days
            );
        }
    }
}

fn print_homework_stats(s: &classstats::HomeworkStats, app: &ClassroomStats) {
    println!("Homework ({})", app.today());
    println!(
        "  Homework:  {} ({} active, {} overdue, {} due this week)",
        s.total_homework, s.active_count, s.overdue_count, s.due_soon_count
    );
    println!(
        "  Assigned in {}: {}",
        TimeWindow::Last7Days.label(),
        s.assigned_last_7_days
    );
    print_distribution("Status", &s.status_distribution);
    print_top_keys("Subjects", &s.subject_distribution, app.config().top_n);
    if !s.has_data {
        println!("  No submissions yet.");
        return;
    }
    println!(
        "  Submissions: {} ({} turned in, {} late, {} graded)",
        s.total_submissions, s.turned_in, s.late_submissions, s.graded
    );
    println!("  Submission rate: {:.1}%", s.submission_rate);
    println!("  On time:         {:.1}%", s.on_time_rate);
    println!("  Graded:          {:.1}%", s.grading_rate);
    println!(
        "  Average grade:   {}",
        s.average_grade_percentage
            .map_or("Not recorded".to_string(), |g| format!("{g:.1}%"))
    );
    print_ranking("Top classes", &s.top_classes, "%");
}

fn print_marks_stats(s: &classstats::MarksStats, app: &ClassroomStats) {
    println!("Marks ({})", app.today());
    println!(
        "  Assessments: {} ({} in {})",
        s.total_assessments,
        s.recent_assessments,
        TimeWindow::Last30Days.label()
    );
    if !s.has_data {
        println!("  No results recorded.");
        return;
    }
    println!(
        "  Results:     {} ({} exempted)",
        s.total_results, s.exempted
    );
    println!(
        "  Scores:      avg {}  median {}  range {}-{}",
        opt_pct(s.scores.average),
        opt_pct(s.scores.median),
        opt_pct(s.scores.lowest),
        opt_pct(s.scores.highest)
    );
    println!(
        "  Pass rate:   {:.1}% ({} pass, {} fail)",
        s.pass_rate, s.pass_count, s.fail_count
    );
    print_distribution("Grades", &s.grade_distribution);
    print_top_keys("Subjects", &s.subject_distribution, app.config().top_n);
    print_ranking("Top students", &s.top_students, "%");
    print_ranking("Top subjects", &s.top_subjects, "%");
}

fn print_schedule_stats(s: &classstats::ScheduleStats, app: &ClassroomStats) {
    println!("Schedule ({})", app.today());
    if !s.has_data {
        println!("  Nothing scheduled.");
        return;
    }
    println!("  Entries:     {}", s.total_entries);
    println!("  Today:       {} sessions", s.today_sessions);
    println!(
        "  This week:   {} sessions, {:.1} h",
        s.week_sessions, s.weekly_hours
    );
    println!(
        "  Utilization: {:.1}% ({:.1}% cancelled)",
        s.utilization_rate, s.cancellation_rate
    );
    print_distribution("By day", &s.day_distribution);
    print_distribution("By type", &s.type_distribution);
    print_ranking("Busiest teachers (h)", &s.top_teachers, "");
    print_ranking("Class hours (h)", &s.class_hours, "");
}

fn print_ranking(title: &str, entries: &[RankedEntry], unit: &str) {
    println!("  {title}:");
    if entries.is_empty() {
        println!("    No data");
    }
    for (i, e) in entries.iter().enumerate() {
        println!("    {}. {:<20} {:.1}{unit}", i + 1, e.label, e.value);
    }
}

fn print_distribution(title: &str, dist: &Distribution) {
    if dist.is_empty() {
        println!("  {title}: -");
        return;
    }
    let parts: Vec<String> = dist
        .entries()
        .iter()
        .map(|e| format!("{} {}", e.key, e.count))
        .collect();
    println!("  {title}: {}", parts.join(", "));
}

/// The `n` most frequent keys, largest first.
fn print_top_keys(title: &str, dist: &Distribution, n: usize) {
    if dist.is_empty() {
        println!("  {title}: -");
        return;
    }
    let top = dist.top(n);
    let mut parts: Vec<String> = top.iter().map(|e| format!("{} {}", e.key, e.count)).collect();
    if dist.len() > top.len() {
        parts.push(format!("+{} more", dist.len() - top.len()));
    }
    println!("  {title}: {}", parts.join(", "));
}

fn placeholder(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

fn opt_num(v: Option<f64>) -> String {
    v.map_or("-".to_string(), |v| format!("{v}"))
}

fn opt_pct(v: Option<f64>) -> String {
    v.map_or("-".to_string(), |v| format!("{v:.1}%"))
}
