//! Mastery scoring for vocabulary terms.

use crate::types::{ReviewState, MIN_EASE_FACTOR};

/// Mastery percentage at or above which a term counts as mastered in stats.
pub const STATS_MASTERY_THRESHOLD: f64 = 80.0;

const MASTERED_REPETITIONS: u32 = 5;
const MASTERED_EASE: f64 = 2.3;
const MASTERED_ACCURACY: f64 = 0.8;

const ACCURACY_WEIGHT: f64 = 40.0;
const EASE_WEIGHT: f64 = 30.0;
const REPETITION_WEIGHT: f64 = 30.0;
const EASE_SPAN: f64 = 1.7;

fn accuracy(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        (f64::from(correct) / f64::from(total)).min(1.0)
    }
}

/// Weighted mastery score in `0.0..=100.0`, rounded to one decimal.
pub fn mastery_percent(ease_factor: f64, repetitions: u32, correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let ease_score = ((ease_factor - MIN_EASE_FACTOR) / EASE_SPAN).clamp(0.0, 1.0);
    let rep_score = (f64::from(repetitions) / f64::from(MASTERED_REPETITIONS)).min(1.0);

    let raw = accuracy(correct, total) * ACCURACY_WEIGHT
        + ease_score * EASE_WEIGHT
        + rep_score * REPETITION_WEIGHT;

    (raw.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// Strict mastery predicate used by the review queue.
pub fn is_mastered(ease_factor: f64, repetitions: u32, correct: u32, total: u32) -> bool {
    total > 0
        && repetitions >= MASTERED_REPETITIONS
        && ease_factor >= MASTERED_EASE
        && accuracy(correct, total) >= MASTERED_ACCURACY
}

/// Looser mastery predicate used by category and overall statistics.
pub fn meets_stats_threshold(mastery_percent: f64) -> bool {
    mastery_percent >= STATS_MASTERY_THRESHOLD
}

impl ReviewState {
    pub fn mastery_percent(&self) -> f64 {
        mastery_percent(
            self.ease_factor,
            self.repetitions,
            self.correct_reviews,
            self.total_reviews,
        )
    }

    pub fn is_mastered(&self) -> bool {
        is_mastered(
            self.ease_factor,
            self.repetitions,
            self.correct_reviews,
            self.total_reviews,
        )
    }
}
