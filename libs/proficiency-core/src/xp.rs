//! Experience point rules for each kind of learning activity.

use serde::Serialize;

use crate::types::{Quality, MAX_DAILY_COUNT};

const XP_BY_QUALITY: [u32; 6] = [0, 2, 3, 5, 8, 10];

const FIRST_TRY_BONUS: f64 = 1.5;
const TOP_SCORE_BONUS: f64 = 1.25;

const MIN_LISTENING_XP: u32 = 1;
const MIN_SPEAKING_XP: u32 = 5;

const XP_PER_LEVEL: u64 = 1000;

/// XP for one vocabulary review.
pub fn review_xp(quality: Quality) -> u32 {
    XP_BY_QUALITY[usize::from(quality.value())]
}

/// XP for a completed listening exercise scored in percent.
pub fn listening_xp(score_percent: f64, difficulty: i32, first_attempt: bool) -> u32 {
    let base = match difficulty {
        2 => 15.0,
        3 => 20.0,
        _ => 10.0,
    };
    let score = score_percent.clamp(0.0, 100.0);
    let first = if first_attempt { FIRST_TRY_BONUS } else { 1.0 };
    let perfect = if score >= 100.0 { TOP_SCORE_BONUS } else { 1.0 };

    ((base * score / 100.0 * first * perfect) as u32).max(MIN_LISTENING_XP)
}

/// XP for a completed speaking submission with an overall ICAO score of 1-6.
pub fn speaking_xp(overall_score: f64, difficulty: i32, first_submission: bool) -> u32 {
    let base = match difficulty {
        2 => 25.0,
        3 => 35.0,
        _ => 15.0,
    };
    let multiplier = ((overall_score - 1.0) / 5.0).max(0.2);
    let first = if first_submission { FIRST_TRY_BONUS } else { 1.0 };
    let high = if overall_score >= 5.0 { TOP_SCORE_BONUS } else { 1.0 };

    ((base * multiplier * first * high) as u32).max(MIN_SPEAKING_XP)
}

/// Activity counts reported for a free-form practice session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounts {
    pub vocab_reviewed: u32,
    pub listening_completed: u32,
    pub speaking_completed: u32,
    pub practice_minutes: u32,
}

impl SessionCounts {
    /// Build counts from client input, clamped to `0..=MAX_DAILY_COUNT`.
    pub fn clamped(vocab: i64, listening: i64, speaking: i64, minutes: i64) -> Self {
        let clamp = |v: i64| v.clamp(0, i64::from(MAX_DAILY_COUNT)) as u32;
        Self {
            vocab_reviewed: clamp(vocab),
            listening_completed: clamp(listening),
            speaking_completed: clamp(speaking),
            practice_minutes: clamp(minutes),
        }
    }
}

/// XP for a logged practice session.
pub fn session_xp(counts: &SessionCounts) -> u32 {
    counts
        .vocab_reviewed
        .saturating_mul(2)
        .saturating_add(counts.listening_completed.saturating_mul(10))
        .saturating_add(counts.speaking_completed.saturating_mul(15))
        .saturating_add(counts.practice_minutes / 5)
}

/// Coarse level derived from lifetime XP, one level per thousand points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XpLevel {
    pub total_xp: u64,
    pub level: u64,
    pub xp_in_level: u64,
    pub xp_to_next_level: u64,
    pub level_progress_percent: f64,
}

impl XpLevel {
    pub fn from_total(total_xp: u64) -> Self {
        let xp_in_level = total_xp % XP_PER_LEVEL;
        Self {
            total_xp,
            level: 1 + total_xp / XP_PER_LEVEL,
            xp_in_level,
            xp_to_next_level: XP_PER_LEVEL - xp_in_level,
            level_progress_percent: (xp_in_level as f64 / XP_PER_LEVEL as f64 * 1000.0).round() / 10.0,
        }
    }
}
