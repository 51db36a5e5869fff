//! Daily practice streak tracking.

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::StreakState;

/// How a practice date affected the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakOutcome {
    /// First recorded practice.
    Started,
    /// Already practiced on this date.
    SameDay,
    /// Practiced the day after the last practice.
    Extended,
    /// More than one day passed; the streak restarted at 1.
    Broken,
    /// Date earlier than the last practice; nothing changed.
    Ignored,
}

impl StreakOutcome {
    pub fn maintained(&self) -> bool {
        !matches!(self, Self::Broken)
    }

    pub fn increased(&self) -> bool {
        matches!(self, Self::Started | Self::Extended)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub state: StreakState,
    pub outcome: StreakOutcome,
    /// Longest streak grew with this update.
    pub new_record: bool,
}

/// Apply a practice on `date` to the streak.
pub fn record_practice(state: &StreakState, date: NaiveDate) -> StreakUpdate {
    let mut next = state.clone();

    let outcome = match state.last_practice_date {
        None => {
            next.current_streak = 1;
            StreakOutcome::Started
        }
        Some(last) => match (date - last).num_days() {
            0 => StreakOutcome::SameDay,
            1 => {
                next.current_streak += 1;
                StreakOutcome::Extended
            }
            gap if gap > 1 => {
                next.current_streak = 1;
                StreakOutcome::Broken
            }
            _ => StreakOutcome::Ignored,
        },
    };

    if outcome != StreakOutcome::Ignored {
        next.last_practice_date = Some(date);
    }
    next.longest_streak = next.longest_streak.max(next.current_streak);

    StreakUpdate {
        new_record: next.longest_streak > state.longest_streak,
        state: next,
        outcome,
    }
}

/// True when the learner practiced yesterday but not yet today.
pub fn is_at_risk(state: &StreakState, today: NaiveDate) -> bool {
    match state.last_practice_date {
        Some(last) => (today - last).num_days() == 1 && state.current_streak > 0,
        None => false,
    }
}

/// Streak as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_practice_date: Option<NaiveDate>,
    pub is_at_risk: bool,
}

impl StreakSummary {
    pub fn new(state: &StreakState, today: NaiveDate) -> Self {
        Self {
            current_streak: state.current_streak,
            longest_streak: state.longest_streak,
            last_practice_date: state.last_practice_date,
            is_at_risk: is_at_risk(state, today),
        }
    }
}
