//! Spaced repetition scheduling, queue priority and mastery scoring.

pub mod mastery;
pub mod priority;
pub mod sm2;

use crate::types::{Quality, ReviewState};
use chrono::{DateTime, Utc};

/// Result of scheduling an item after review.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOutcome {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
}

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate the next schedule after a review. Lifetime counters are untouched.
    fn schedule(&self, state: &ReviewState, quality: Quality, now: DateTime<Utc>) -> ScheduleOutcome;

    /// Initial state for an item reviewed for the first time.
    fn initial_state(&self, now: DateTime<Utc>) -> ReviewState;

    /// Apply a review to the stored state, creating it on first review and
    /// advancing the lifetime counters.
    fn review(
        &self,
        prior: Option<&ReviewState>,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> ReviewState {
        let state = prior.cloned().unwrap_or_else(|| self.initial_state(now));
        let outcome = self.schedule(&state, quality, now);

        ReviewState {
            ease_factor: outcome.ease_factor,
            interval_days: outcome.interval_days,
            repetitions: outcome.repetitions,
            next_review_at: outcome.next_review_at,
            total_reviews: state.total_reviews + 1,
            correct_reviews: state.correct_reviews + u32::from(quality.is_correct()),
            last_quality: Some(quality.value()),
            last_reviewed_at: Some(now),
        }
    }
}

/// Get algorithm by name.
pub fn get_algorithm(name: &str) -> Option<Box<dyn SpacedRepetitionAlgorithm>> {
    match name {
        "sm2" => Some(Box::new(sm2::Sm2::default())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_creates_state_on_first_review() {
        let algorithm = get_algorithm("sm2").unwrap();
        let now = Utc::now();
        let state = algorithm.review(None, Quality::new(4), now);

        assert_eq!(state.total_reviews, 1);
        assert_eq!(state.correct_reviews, 1);
        assert_eq!(state.repetitions, 1);
        assert_eq!(state.last_quality, Some(4));
        assert_eq!(state.last_reviewed_at, Some(now));
    }

    #[test]
    fn failed_review_counts_towards_total_only() {
        let algorithm = get_algorithm("sm2").unwrap();
        let now = Utc::now();
        let first = algorithm.review(None, Quality::new(5), now);
        let second = algorithm.review(Some(&first), Quality::new(2), now);

        assert_eq!(second.total_reviews, 2);
        assert_eq!(second.correct_reviews, 1);
    }

    #[test]
    fn unknown_algorithm_is_none() {
        assert!(get_algorithm("leitner").is_none());
    }
}
