//! Attempt scoring and question validation.
//!
//! Pure functions shared by the participant flow (scoring an attempt) and the
//! admin question editor (validating option sets before they are persisted).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Minimum number of options a question must offer.
pub const MIN_OPTIONS: usize = 2;

/// Maximum number of options a question may offer.
pub const MAX_OPTIONS: usize = 10;

/// One answered question, joined with the data needed to score it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredAnswer {
    pub question_id: DbId,
    pub option_id: DbId,
    /// Weight of the chosen option.
    pub option_score: i32,
    /// Keyed option for the question, if it has one.
    pub correct_option_id: Option<DbId>,
    /// Leadership dimension the question measures.
    pub dimension: String,
}

/// Totals for a completed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptScore {
    pub total: i32,
    pub correct_count: i32,
    pub answered: usize,
}

/// Sum option weights and count keyed answers that match.
pub fn score_attempt(answers: &[ScoredAnswer]) -> AttemptScore {
    let total = answers.iter().map(|a| a.option_score).sum();
    let correct_count = answers
        .iter()
        .filter(|a| a.correct_option_id == Some(a.option_id))
        .count() as i32;
    AttemptScore {
        total,
        correct_count,
        answered: answers.len(),
    }
}

/// Mean option weight per dimension, ordered by dimension name.
pub fn dimension_averages(answers: &[ScoredAnswer]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (i64, u32)> = BTreeMap::new();
    for answer in answers {
        let slot = sums.entry(answer.dimension.clone()).or_insert((0, 0));
        slot.0 += i64::from(answer.option_score);
        slot.1 += 1;
    }
    sums.into_iter()
        .map(|(dimension, (sum, n))| (dimension, sum as f64 / f64::from(n)))
        .collect()
}

/// Validate a question's option labels and optional keyed option index.
///
/// Rules:
/// - Between [`MIN_OPTIONS`] and [`MAX_OPTIONS`] options.
/// - Labels must be non-blank and unique (case-insensitive).
/// - `correct_index`, if given, must point at one of the options.
pub fn validate_options(labels: &[&str], correct_index: Option<usize>) -> Result<(), CoreError> {
    if labels.len() < MIN_OPTIONS || labels.len() > MAX_OPTIONS {
        return Err(CoreError::Validation(format!(
            "A question must have between {MIN_OPTIONS} and {MAX_OPTIONS} options"
        )));
    }
    let mut seen = Vec::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        let normalized = label.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::Validation(format!(
                "Option at index {i} must not be blank"
            )));
        }
        if seen.contains(&normalized) {
            return Err(CoreError::Validation(format!(
                "Duplicate option label: {}",
                label.trim()
            )));
        }
        seen.push(normalized);
    }
    if let Some(idx) = correct_index {
        if idx >= labels.len() {
            return Err(CoreError::Validation(format!(
                "Correct option index {idx} is out of range"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn answer(question_id: DbId, option_id: DbId, score: i32, correct: Option<DbId>, dim: &str) -> ScoredAnswer {
        ScoredAnswer {
            question_id,
            option_id,
            option_score: score,
            correct_option_id: correct,
            dimension: dim.to_string(),
        }
    }

    #[test]
    fn score_sums_weights_and_counts_correct() {
        let answers = vec![
            answer(1, 10, 4, Some(10), "vision"),
            answer(2, 21, 2, Some(20), "vision"),
            answer(3, 30, 5, None, "empathy"),
        ];
        let score = score_attempt(&answers);
        assert_eq!(
            score,
            AttemptScore {
                total: 11,
                correct_count: 1,
                answered: 3
            }
        );
    }

    #[test]
    fn empty_attempt_scores_zero() {
        assert_eq!(score_attempt(&[]).total, 0);
        assert!(dimension_averages(&[]).is_empty());
    }

    #[test]
    fn averages_group_by_dimension() {
        let answers = vec![
            answer(1, 10, 4, None, "vision"),
            answer(2, 20, 1, None, "vision"),
            answer(3, 30, 3, None, "empathy"),
        ];
        let avgs = dimension_averages(&answers);
        assert_eq!(avgs.len(), 2);
        assert!((avgs["vision"] - 2.5).abs() < f64::EPSILON);
        assert!((avgs["empathy"] - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn option_validation_rules() {
        assert!(validate_options(&["Agree", "Disagree"], Some(0)).is_ok());
        assert_matches!(validate_options(&["Only"], None), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_options(&["Yes", " yes "], None),
            Err(CoreError::Validation(msg)) if msg.contains("Duplicate")
        );
        assert_matches!(validate_options(&["A", "  "], None), Err(CoreError::Validation(_)));
        assert_matches!(validate_options(&["A", "B"], Some(2)), Err(CoreError::Validation(_)));
    }
}
