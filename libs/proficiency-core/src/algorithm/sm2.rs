//! SM-2 spaced repetition algorithm.
//!
//! Quality 0-2 is a failed recall and restarts the item at a one day
//! interval. Quality 3-5 grows the interval: 1 day, 6 days, then the
//! previous interval multiplied by the updated ease factor.

use super::{ScheduleOutcome, SpacedRepetitionAlgorithm};
use crate::types::{Quality, ReviewState, DEFAULT_EASE_FACTOR, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR};
use chrono::{DateTime, Duration, Utc};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub first_interval: u32,
    pub second_interval: u32,
    pub maximum_interval: u32,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: DEFAULT_EASE_FACTOR,
            minimum_ease: MIN_EASE_FACTOR,
            first_interval: 1,
            second_interval: 6,
            maximum_interval: MAX_INTERVAL_DAYS,
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_state(&self, now: DateTime<Utc>) -> ReviewState {
        ReviewState {
            ease_factor: self.initial_ease,
            ..ReviewState::initial(now)
        }
    }

    fn schedule(&self, state: &ReviewState, quality: Quality, now: DateTime<Utc>) -> ScheduleOutcome {
        self.update(
            quality,
            state.ease_factor,
            state.interval_days,
            state.repetitions,
            now,
        )
    }
}

impl Sm2 {
    /// Compute the next ease, interval and repetition count from the prior values.
    pub fn update(
        &self,
        quality: Quality,
        prior_ease: f64,
        prior_interval: u32,
        prior_reps: u32,
        now: DateTime<Utc>,
    ) -> ScheduleOutcome {
        let missed = f64::from(Quality::MAX - quality.value());
        let ease = (prior_ease + (0.1 - missed * (0.08 + missed * 0.02))).max(self.minimum_ease);

        let (repetitions, interval) = if quality.is_correct() {
            let repetitions = prior_reps + 1;
            let interval = match repetitions {
                1 => self.first_interval,
                2 => self.second_interval,
                _ => (f64::from(prior_interval) * ease).round() as u32,
            };
            (repetitions, interval)
        } else {
            (0, self.first_interval)
        };

        let interval_days = interval.clamp(1, self.maximum_interval);

        ScheduleOutcome {
            ease_factor: round_to_hundredths(ease),
            interval_days,
            repetitions,
            next_review_at: now + Duration::days(i64::from(interval_days)),
        }
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn first_perfect_review() {
        let sm2 = Sm2::default();
        let now = now();
        let state = sm2.initial_state(now);
        let result = sm2.schedule(&state, Quality::new(5), now);

        assert_eq!(result.ease_factor, 2.6);
        assert_eq!(result.interval_days, 1);
        assert_eq!(result.repetitions, 1);
        assert_eq!(result.next_review_at, now + Duration::days(1));
    }

    #[test]
    fn second_perfect_review_jumps_to_six_days() {
        let sm2 = Sm2::default();
        let result = sm2.update(Quality::new(5), 2.6, 1, 1, now());

        assert_eq!(result.ease_factor, 2.7);
        assert_eq!(result.interval_days, 6);
        assert_eq!(result.repetitions, 2);
    }

    #[test]
    fn failed_review_resets_progress() {
        let sm2 = Sm2::default();
        let result = sm2.update(Quality::new(1), 2.7, 6, 2, now());

        assert_eq!(result.repetitions, 0);
        assert_eq!(result.interval_days, 1);
        assert_eq!(result.ease_factor, 2.16);
    }

    #[test]
    fn mature_interval_multiplies_by_new_ease() {
        let sm2 = Sm2::default();
        let result = sm2.update(Quality::new(4), 2.5, 6, 2, now());

        // quality 4 leaves the ease unchanged: round(6 * 2.5) = 15
        assert_eq!(result.ease_factor, 2.5);
        assert_eq!(result.interval_days, 15);
        assert_eq!(result.repetitions, 3);
    }

    #[test]
    fn ease_factor_never_below_minimum() {
        let sm2 = Sm2::default();
        let result = sm2.update(Quality::new(0), 1.35, 10, 4, now());
        assert_eq!(result.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn interval_capped_at_one_year() {
        let sm2 = Sm2::default();
        let result = sm2.update(Quality::new(5), 2.9, 300, 8, now());
        assert_eq!(result.interval_days, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn out_of_range_quality_is_clamped() {
        let sm2 = Sm2::default();
        let high = sm2.update(Quality::new(12), 2.5, 1, 0, now());
        let low = sm2.update(Quality::new(-4), 2.5, 1, 0, now());

        assert_eq!(high.ease_factor, 2.6);
        assert_eq!(low.repetitions, 0);
        assert_eq!(low.ease_factor, 1.7);
    }
}
