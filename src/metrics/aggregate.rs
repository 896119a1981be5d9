//! Aggregation primitives shared by every stats screen.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

/// Percentage of `numerator` over `denominator`, 0 to 100.
///
/// Returns `0.0` for an empty denominator so callers always get a finite number.
pub fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Occurrence counts keyed by label, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Distribution {
    entries: Vec<DistributionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub key: String,
    pub count: u64,
}

impl Distribution {
    pub fn get(&self, key: &str) -> u64 {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map_or(0, |e| e.count)
    }

    pub fn entries(&self) -> &[DistributionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Entries sorted by count, largest first, truncated to `n`.
    pub fn top(&self, n: usize) -> Vec<DistributionEntry> {
        top_n(self.entries.clone(), n, |e| e.count as f64)
    }
}

/// Count records per key. Records whose key is `None` are skipped, and no
/// zero-count keys are ever added.
pub fn tabulate<T, K, F>(records: &[T], key_fn: F) -> Distribution
where
    K: AsRef<str>,
    F: Fn(&T) -> Option<K>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<DistributionEntry> = Vec::new();
    for record in records {
        let Some(key) = key_fn(record) else {
            continue;
        };
        let key = key.as_ref();
        match index.get(key) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(key.to_string(), entries.len());
                entries.push(DistributionEntry {
                    key: key.to_string(),
                    count: 1,
                });
            }
        }
    }
    Distribution { entries }
}

/// Sort descending by `metric` and keep the first `n`.
///
/// The sort is stable: ties keep their input order. NaN metrics sort last.
pub fn top_n<T, F>(mut items: Vec<T>, n: usize, metric: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| {
        let (a, b) = (metric(a), metric(b));
        b.partial_cmp(&a).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
    });
    items.truncate(n);
    items
}

/// Group records by key, preserving first-seen key order.
pub fn group_by<'a, T, K, F>(records: &'a [T], key_fn: F) -> Vec<(K, Vec<&'a T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a T>)> = Vec::new();
    for record in records {
        let key = key_fn(record);
        match index.get(&key) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }
    groups
}

/// One row of a ranking table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub id: String,
    pub label: String,
    pub value: f64,
    /// Number of records behind `value`.
    pub count: u64,
}

/// Summary of a set of percentage scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub highest: Option<f64>,
    pub lowest: Option<f64>,
}

pub fn score_summary(scores: &[f64]) -> ScoreSummary {
    let mut sorted: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
    if sorted.is_empty() {
        return ScoreSummary::default();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let avg = sorted.iter().sum::<f64>() / sorted.len() as f64;

    #[allow(clippy::manual_is_multiple_of)]
    let median = if sorted.len() % 2 == 0 {
        let mid = sorted.len() / 2;
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[sorted.len() / 2]
    };

    ScoreSummary {
        average: Some(avg),
        median: Some(median),
        highest: sorted.last().copied(),
        lowest: sorted.first().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_guards_zero_denominator() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(5, 0), 0.0);
        assert!(rate(0, 0).is_finite());
    }

    #[test]
    fn test_rate_within_bounds() {
        for total in 1..=25u64 {
            for attended in 0..=total {
                let r = rate(attended, total);
                assert!((0.0..=100.0).contains(&r), "{attended}/{total} gave {r}");
            }
        }
        assert_eq!(rate(3, 4), 75.0);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(75.0), 75.0);
        assert_eq!(round1(0.04), 0.0);
    }

    #[test]
    fn test_tabulate_counts_only_observed_keys() {
        let records = ["present", "present", "absent", "late"];
        let dist = tabulate(&records, |r| Some(*r));
        assert_eq!(dist.get("present"), 2);
        assert_eq!(dist.get("absent"), 1);
        assert_eq!(dist.get("excused"), 0);
        assert_eq!(dist.len(), 3);
        assert_eq!(dist.entries()[0].key, "present");
    }

    #[test]
    fn test_tabulate_sum_matches_records_with_key() {
        let records = [Some("math"), None, Some("art"), Some("math"), None];
        let dist = tabulate(&records, |r| *r);
        assert_eq!(dist.total(), 3);
    }

    #[test]
    fn test_tabulate_by_string_field() {
        struct Row {
            subject: String,
        }
        let rows: Vec<Row> = ["Mathematics", "Physics", "Mathematics"]
            .iter()
            .map(|s| Row {
                subject: s.to_string(),
            })
            .collect();
        let dist = tabulate(&rows, |r| Some(r.subject.clone()));
        assert_eq!(dist.get("Mathematics"), 2);
        assert_eq!(dist.get("Physics"), 1);
        assert_eq!(dist.top(1)[0].key, "Mathematics");
    }

    #[test]
    fn test_tabulate_empty() {
        let records: [&str; 0] = [];
        let dist = tabulate(&records, |r| Some(*r));
        assert!(dist.is_empty());
        assert_eq!(dist.total(), 0);
        assert!(dist.top(5).is_empty());
    }

    #[test]
    fn test_top_n_sorted_and_truncated() {
        let items = vec![("a", 1.0), ("b", 5.0), ("c", 3.0), ("d", 4.0)];
        let top = top_n(items, 2, |i| i.1);
        assert_eq!(top, vec![("b", 5.0), ("d", 4.0)]);
    }

    #[test]
    fn test_top_n_fewer_than_n() {
        let items = vec![("a", 1.0), ("b", 2.0)];
        let top = top_n(items, 5, |i| i.1);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "b");
    }

    #[test]
    fn test_top_n_ties_keep_input_order() {
        let items = vec![("A", 92.0), ("B", 78.5), ("C", 92.0)];
        let top = top_n(items, 2, |i| i.1);
        assert_eq!(top, vec![("A", 92.0), ("C", 92.0)]);

        let reversed = vec![("C", 92.0), ("B", 78.5), ("A", 92.0)];
        let top = top_n(reversed, 2, |i| i.1);
        assert_eq!(top, vec![("C", 92.0), ("A", 92.0)]);
    }

    #[test]
    fn test_top_n_nan_sorts_last() {
        let items = vec![("x", f64::NAN), ("y", 1.0)];
        let top = top_n(items, 1, |i| i.1);
        assert_eq!(top[0].0, "y");
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let records = [("c2", 1), ("c1", 2), ("c2", 3)];
        let groups = group_by(&records, |r| r.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "c2");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "c1");
    }

    #[test]
    fn test_score_summary() {
        assert_eq!(score_summary(&[]), ScoreSummary::default());

        let s = score_summary(&[70.0, 90.0, 50.0, 80.0]);
        assert_eq!(s.average, Some(72.5));
        assert_eq!(s.median, Some(75.0));
        assert_eq!(s.highest, Some(90.0));
        assert_eq!(s.lowest, Some(50.0));

        let odd = score_summary(&[10.0, 30.0, 20.0]);
        assert_eq!(odd.median, Some(20.0));
    }
}
