use serde::Serialize;

use crate::model::{
    AttendanceEvent, AttendanceRecord, Homework, HomeworkSubmission, Mark, ScheduleEntry,
    StudentMark,
};
use crate::query::filter::Filterable;
use crate::storage::{Record, Repository};

const DEFAULT_LIMIT: usize = 50;
const SNIPPET_BEFORE: usize = 30;
const SNIPPET_AFTER: usize = 50;

/// What kind of record matched the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchHitType {
    Attendance,
    Event,
    Homework,
    Submission,
    Assessment,
    Result,
    Schedule,
}

impl SearchHitType {
    pub const ALL: &'static [SearchHitType] = &[
        SearchHitType::Attendance,
        SearchHitType::Event,
        SearchHitType::Homework,
        SearchHitType::Submission,
        SearchHitType::Assessment,
        SearchHitType::Result,
        SearchHitType::Schedule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchHitType::Attendance => "attendance",
            SearchHitType::Event => "event",
            SearchHitType::Homework => "homework",
            SearchHitType::Submission => "submission",
            SearchHitType::Assessment => "assessment",
            SearchHitType::Result => "result",
            SearchHitType::Schedule => "schedule",
        }
    }
}

impl std::fmt::Display for SearchHitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchHitType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        let needle = s.trim().to_lowercase();
        SearchHitType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| crate::error::Error::UnknownValue {
                kind: "search type",
                value: s.to_string(),
            })
    }
}

/// A single search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub hit_type: SearchHitType,
    pub id: String,
    /// Display name / title.
    pub title: String,
    /// Excerpt of the first field that matched.
    pub snippet: String,
}

/// Options controlling a search operation.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Maximum number of results to return (default 50).
    pub limit: Option<usize>,
    /// Restrict search to a specific hit type.
    pub hit_type: Option<SearchHitType>,
}

/// Search results container.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
    /// Matches before the limit was applied.
    pub total: usize,
}

/// Case-insensitive substring search across every record type.
///
/// Hits are grouped by type in the order of [`SearchHitType::ALL`], then by
/// record order within each table.
pub fn search(repo: &Repository, query: &str, options: &SearchOptions) -> SearchResults {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return SearchResults {
            query: query.to_string(),
            hits: Vec::new(),
            total: 0,
        };
    }

    let wanted = |t: SearchHitType| options.hit_type.map_or(true, |only| only == t);
    let mut hits = Vec::new();
    if wanted(SearchHitType::Attendance) {
        collect(
            &mut hits,
            SearchHitType::Attendance,
            repo.attendance(),
            &needle,
        );
    }
    if wanted(SearchHitType::Event) {
        collect(
            &mut hits,
            SearchHitType::Event,
            repo.attendance_events(),
            &needle,
        );
    }
    if wanted(SearchHitType::Homework) {
        collect(&mut hits, SearchHitType::Homework, repo.homework(), &needle);
    }
    if wanted(SearchHitType::Submission) {
        collect(
            &mut hits,
            SearchHitType::Submission,
            repo.submissions(),
            &needle,
        );
    }
    if wanted(SearchHitType::Assessment) {
        collect(&mut hits, SearchHitType::Assessment, repo.marks(), &needle);
    }
    if wanted(SearchHitType::Result) {
        collect(
            &mut hits,
            SearchHitType::Result,
            repo.student_marks(),
            &needle,
        );
    }
    if wanted(SearchHitType::Schedule) {
        collect(&mut hits, SearchHitType::Schedule, repo.schedule(), &needle);
    }

    let total = hits.len();
    hits.truncate(options.limit.unwrap_or(DEFAULT_LIMIT));
    log::debug!(
        "Search '{query}': {total} matches, returning {}",
        hits.len()
    );

    SearchResults {
        query: query.to_string(),
        hits,
        total,
    }
}

fn collect<T>(hits: &mut Vec<SearchHit>, hit_type: SearchHitType, records: &[T], needle: &str)
where
    T: Record + Filterable + HitTitle,
{
    for record in records {
        let matched = record
            .search_fields()
            .into_iter()
            .flatten()
            .find(|field| field.to_lowercase().contains(needle));
        if let Some(field) = matched {
            hits.push(SearchHit {
                hit_type,
                id: record.id().to_string(),
                title: record.hit_title(),
                snippet: snippet(field, needle),
            });
        }
    }
}

/// Window of `text` around the first case-insensitive occurrence of
/// `needle`, with ellipses where it was cut.
fn snippet(text: &str, needle: &str) -> String {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    if chars.len() <= SNIPPET_BEFORE + SNIPPET_AFTER {
        return text.to_string();
    }
    // Lowercase once, remembering where each source char starts.
    let mut lowered = String::with_capacity(text.len());
    let mut starts = Vec::with_capacity(chars.len());
    for (_, c) in &chars {
        starts.push(lowered.len());
        lowered.extend(c.to_lowercase());
    }
    let at = lowered
        .find(needle)
        .map_or(0, |byte| starts.partition_point(|&s| s <= byte) - 1);
    let start = at.saturating_sub(SNIPPET_BEFORE);
    let end = (at + SNIPPET_AFTER).min(chars.len());

    let from = chars[start].0;
    let to = chars.get(end).map_or(text.len(), |(i, _)| *i);
    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.push_str(&text[from..to]);
    if end < chars.len() {
        out.push_str("...");
    }
    out
}

/// Heading shown for a hit.
trait HitTitle {
    fn hit_title(&self) -> String;
}

impl HitTitle for AttendanceRecord {
    fn hit_title(&self) -> String {
        format!("{} {} ({})", self.student_name, self.status, self.date)
    }
}

impl HitTitle for AttendanceEvent {
    fn hit_title(&self) -> String {
        format!("{} ({})", self.title, self.date)
    }
}

impl HitTitle for Homework {
    fn hit_title(&self) -> String {
        format!("{} (due {})", self.title, self.due_date)
    }
}

impl HitTitle for HomeworkSubmission {
    fn hit_title(&self) -> String {
        format!("{} for {}", self.student_name, self.homework_id)
    }
}

impl HitTitle for Mark {
    fn hit_title(&self) -> String {
        format!("{} ({})", self.title, self.subject)
    }
}

impl HitTitle for StudentMark {
    fn hit_title(&self) -> String {
        format!("{} on {}", self.student_name, self.mark_id)
    }
}

impl HitTitle for ScheduleEntry {
    fn hit_title(&self) -> String {
        format!(
            "{} ({} {})",
            self.title,
            self.date,
            self.start_time.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::NaiveDate;

    fn repo() -> Repository {
        fixtures::sample_repository(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()).unwrap()
    }

    #[test]
    fn test_search_is_case_insensitive_across_types() {
        let results = search(&repo(), "MATHEMATICS", &SearchOptions::default());
        assert!(results.total > 0);
        let types: Vec<SearchHitType> = results.hits.iter().map(|h| h.hit_type).collect();
        assert!(types.contains(&SearchHitType::Homework));
        assert!(types.contains(&SearchHitType::Schedule));
        assert!(results
            .hits
            .iter()
            .all(|h| h.snippet.to_lowercase().contains("mathematics")));
    }

    #[test]
    fn test_search_no_results() {
        let results = search(&repo(), "zzzz-nothing", &SearchOptions::default());
        assert_eq!(results.total, 0);
        assert!(results.hits.is_empty());

        let blank = search(&repo(), "   ", &SearchOptions::default());
        assert!(blank.hits.is_empty());
    }

    #[test]
    fn test_search_filter_by_type_and_limit() {
        let opts = SearchOptions {
            limit: Some(2),
            hit_type: Some(SearchHitType::Attendance),
        };
        let results = search(&repo(), "ada", &opts);
        assert!(results.total >= 2);
        assert_eq!(results.hits.len(), 2);
        assert!(results
            .hits
            .iter()
            .all(|h| h.hit_type == SearchHitType::Attendance));
    }

    #[test]
    fn test_snippet_window() {
        let text = format!("{}needle{}", "a".repeat(100), "b".repeat(100));
        let s = snippet(&text, "needle");
        assert!(s.starts_with("..."));
        assert!(s.ends_with("..."));
        assert!(s.contains("needle"));

        assert_eq!(snippet("short text", "text"), "short text");
    }

    #[test]
    fn test_snippet_on_long_text_with_multibyte_prefix() {
        let text = format!("İ{}Needle{}", "é".repeat(20_000), "z".repeat(20_000));
        let s = snippet(&text, "needle");
        assert!(s.starts_with("..."));
        assert!(s.ends_with("..."));
        assert!(s.contains("Needle"));
        assert_eq!(s.chars().count(), SNIPPET_BEFORE + SNIPPET_AFTER + 6);
    }

    #[test]
    fn test_hit_type_parse() {
        assert_eq!(
            "Homework".parse::<SearchHitType>().unwrap(),
            SearchHitType::Homework
        );
        assert!("task".parse::<SearchHitType>().is_err());
    }
}
