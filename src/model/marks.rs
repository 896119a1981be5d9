use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

labeled_enum! {
    AssessmentType, "assessment type" {
        Exam => "exam",
        Test => "test",
        Quiz => "quiz",
        Assignment => "assignment",
        Project => "project",
        Practical => "practical",
    }
}

/// An assessment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
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
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    pub total_marks: f64,
    /// Pass threshold in marks; falls back to the configured pass percentage.
    #[serde(default)]
    pub pass_marks: Option<f64>,
}

impl Mark {
    pub fn validate(&self) -> Result<()> {
        if !self.total_marks.is_finite() || self.total_marks <= 0.0 {
            return Err(Error::invalid(&self.id, "total marks must be positive"));
        }
        if let Some(pass) = self.pass_marks {
            if !(0.0..=self.total_marks).contains(&pass) {
                return Err(Error::invalid(
                    &self.id,
                    format!("pass marks {pass} outside 0..={}", self.total_marks),
                ));
            }
        }
        Ok(())
    }

    /// Pass threshold as a percentage of total marks.
    pub fn pass_percentage(&self, default_pct: f64) -> f64 {
        match self.pass_marks {
            Some(pass) if self.total_marks > 0.0 => pass / self.total_marks * 100.0,
            _ => default_pct,
        }
    }
}

/// One student's result for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMark {
    #[serde(default)]
    pub id: String,
    pub mark_id: String,
    pub student_id: String,
    pub student_name: String,
    /// Teaching group (section) the student sat the assessment with.
    pub group_id: String,
    #[serde(default)]
    pub obtained_marks: f64,
    pub total_marks: f64,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub is_exempted: bool,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl StudentMark {
    /// Percentage score, `None` for exempted students.
    pub fn percentage(&self) -> Option<f64> {
        if self.is_exempted || self.total_marks <= 0.0 {
            None
        } else {
            Some(self.obtained_marks / self.total_marks * 100.0)
        }
    }

    /// Recorded grade, or the letter derived from the percentage.
    pub fn effective_grade(&self) -> Option<String> {
        match &self.grade {
            Some(g) if !g.trim().is_empty() => Some(g.trim().to_string()),
            _ => self.percentage().map(|p| grade_for(p).to_string()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_exempted {
            return Ok(());
        }
        if !self.total_marks.is_finite() || self.total_marks <= 0.0 {
            return Err(Error::invalid(&self.id, "total marks must be positive"));
        }
        if !self.obtained_marks.is_finite()
            || self.obtained_marks < 0.0
            || self.obtained_marks > self.total_marks
        {
            return Err(Error::invalid(
                &self.id,
                format!(
                    "obtained marks {} outside 0..={}",
                    self.obtained_marks, self.total_marks
                ),
            ));
        }
        Ok(())
    }
}

/// Letter grade for a percentage score.
pub fn grade_for(percentage: f64) -> &'static str {
    match percentage {
        p if p >= 90.0 => "A+",
        p if p >= 80.0 => "A",
        p if p >= 70.0 => "B",
        p if p >= 60.0 => "C",
        p if p >= 50.0 => "D",
        p if p >= 40.0 => "E",
        _ => "F",
    }
}

/// Results of one assessment aggregated over one teaching group.
///
/// `pass_count + fail_count + exempted_count == total_students`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMark {
    pub mark_id: String,
    pub group_id: String,
    pub total_students: u64,
    /// Mean obtained marks over non-exempted students.
    pub average_marks: f64,
    pub average_percentage: f64,
    pub pass_count: u64,
    pub fail_count: u64,
    pub exempted_count: u64,
    pub highest_marks: Option<f64>,
    pub lowest_marks: Option<f64>,
}

impl GroupMark {
    pub fn from_results(
        mark_id: &str,
        group_id: &str,
        results: &[&StudentMark],
        pass_percentage: f64,
    ) -> Self {
        let mut group = GroupMark {
            mark_id: mark_id.to_string(),
            group_id: group_id.to_string(),
            total_students: results.len() as u64,
            average_marks: 0.0,
            average_percentage: 0.0,
            pass_count: 0,
            fail_count: 0,
            exempted_count: 0,
            highest_marks: None,
            lowest_marks: None,
        };

        let mut obtained_sum = 0.0;
        let mut pct_sum = 0.0;
        for result in results {
            let Some(pct) = result.percentage() else {
                group.exempted_count += 1;
                continue;
            };
            obtained_sum += result.obtained_marks;
            pct_sum += pct;
            if pct >= pass_percentage {
                group.pass_count += 1;
            } else {
                group.fail_count += 1;
            }
            group.highest_marks = Some(
                group
                    .highest_marks
                    .map_or(result.obtained_marks, |h| h.max(result.obtained_marks)),
            );
            group.lowest_marks = Some(
                group
                    .lowest_marks
                    .map_or(result.obtained_marks, |l| l.min(result.obtained_marks)),
            );
        }

        let assessed = group.pass_count + group.fail_count;
        if assessed > 0 {
            group.average_marks = obtained_sum / assessed as f64;
            group.average_percentage = pct_sum / assessed as f64;
        }
        group
    }
}
