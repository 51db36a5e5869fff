//! Core types for review scheduling and learner progression.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Ease factor assigned to an item on its first review.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lower bound for the ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Upper bound for a review interval, in days.
pub const MAX_INTERVAL_DAYS: u32 = 365;

/// Upper bound for daily and per-session counters, the largest value the
/// store's INT columns hold.
pub const MAX_DAILY_COUNT: u32 = i32::MAX as u32;

/// Self-reported recall quality on the 0-5 scale.
///
/// Out-of-range input is clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Build a quality rating, clamping into 0..=5.
    pub fn new(raw: i32) -> Self {
        Self(raw.clamp(0, i32::from(Self::MAX)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Quality 3 and above counts as a successful recall.
    pub fn is_correct(self) -> bool {
        self.0 >= 3
    }
}

impl From<i32> for Quality {
    fn from(raw: i32) -> Self {
        Self::new(raw)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Spaced-repetition state for one user and one vocabulary term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
    pub total_reviews: u32,
    pub correct_reviews: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// State of an item that has never been reviewed.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 1,
            repetitions: 0,
            next_review_at: now,
            total_reviews: 0,
            correct_reviews: 0,
            last_quality: None,
            last_reviewed_at: None,
        }
    }
}

/// Kind of learning activity counted in daily aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Vocabulary,
    Listening,
    Speaking,
}

/// Activity totals for one user on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub vocab_reviewed: u32,
    pub listening_completed: u32,
    pub speaking_completed: u32,
    pub practice_minutes: u32,
    pub xp_earned: u32,
    pub goal_met: bool,
}

impl DailyProgress {
    /// Empty record for a date with no activity yet.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            vocab_reviewed: 0,
            listening_completed: 0,
            speaking_completed: 0,
            practice_minutes: 0,
            xp_earned: 0,
            goal_met: false,
        }
    }

    pub fn total_activities(&self) -> u32 {
        self.vocab_reviewed
            .saturating_add(self.listening_completed)
            .saturating_add(self.speaking_completed)
    }

    /// Add `count` completed activities of the given kind. Each counter
    /// saturates at [`MAX_DAILY_COUNT`].
    pub fn record_activity(&mut self, kind: ActivityKind, count: u32) {
        let counter = match kind {
            ActivityKind::Vocabulary => &mut self.vocab_reviewed,
            ActivityKind::Listening => &mut self.listening_completed,
            ActivityKind::Speaking => &mut self.speaking_completed,
        };
        *counter = capped_add(*counter, count);
    }

    /// Add practice minutes, saturating at [`MAX_DAILY_COUNT`].
    pub fn add_minutes(&mut self, minutes: u32) {
        self.practice_minutes = capped_add(self.practice_minutes, minutes);
    }
}

fn capped_add(current: u32, delta: u32) -> u32 {
    current.saturating_add(delta).min(MAX_DAILY_COUNT)
}

/// Streak bookkeeping for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_practice_date: Option<NaiveDate>,
}

/// Achievement grouping, also used to resolve `first` requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Vocabulary,
    Listening,
    Speaking,
    Streak,
    General,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Listening => "listening",
            Self::Speaking => "speaking",
            Self::Streak => "streak",
            Self::General => "general",
        }
    }
}

impl FromStr for AchievementCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vocabulary" => Ok(Self::Vocabulary),
            "listening" => Ok(Self::Listening),
            "speaking" => Ok(Self::Speaking),
            "streak" => Ok(Self::Streak),
            "general" => Ok(Self::General),
            other => Err(CoreError::UnknownCategory(other.to_string())),
        }
    }
}

impl fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which counter an achievement is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    First,
    VocabCount,
    ListeningCount,
    SpeakingCount,
    Streak,
    LongestStreak,
    TotalXp,
}

impl RequirementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::VocabCount => "vocab_count",
            Self::ListeningCount => "listening_count",
            Self::SpeakingCount => "speaking_count",
            Self::Streak => "streak",
            Self::LongestStreak => "longest_streak",
            Self::TotalXp => "total_xp",
        }
    }
}

impl FromStr for RequirementType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "vocab_count" => Ok(Self::VocabCount),
            "listening_count" => Ok(Self::ListeningCount),
            "speaking_count" => Ok(Self::SpeakingCount),
            "streak" => Ok(Self::Streak),
            "longest_streak" => Ok(Self::LongestStreak),
            "total_xp" => Ok(Self::TotalXp),
            other => Err(CoreError::UnknownRequirementType(other.to_string())),
        }
    }
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only achievement content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub requirement_type: RequirementType,
    pub requirement_value: u32,
    pub xp_reward: u32,
    pub is_hidden: bool,
    pub sort_order: i32,
}

/// Per-user progress towards one achievement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub progress: u32,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a speaking submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Only completed submissions count towards XP, streaks and achievements.
    pub fn awards_progress(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl FromStr for SubmissionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::UnknownSubmissionStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quality_clamps_out_of_range_input() {
        assert_eq!(Quality::new(-3).value(), 0);
        assert_eq!(Quality::new(9).value(), 5);
        assert_eq!(Quality::new(4).value(), 4);
    }

    #[test]
    fn quality_deserializes_with_clamping() {
        let quality: Quality = serde_json::from_str("7").unwrap();
        assert_eq!(quality.value(), 5);
        assert_eq!(serde_json::to_string(&quality).unwrap(), "5");
    }

    #[test]
    fn initial_state_has_no_reviews() {
        let state = ReviewState::initial(Utc::now());
        assert_eq!(state.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(state.total_reviews, 0);
        assert_eq!(state.mastery_percent(), 0.0);
    }

    #[test]
    fn counters_saturate_at_max_daily_count() {
        let mut daily = DailyProgress::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        daily.record_activity(ActivityKind::Vocabulary, 3);
        daily.record_activity(ActivityKind::Vocabulary, u32::MAX);
        daily.add_minutes(u32::MAX);
        daily.record_activity(ActivityKind::Listening, MAX_DAILY_COUNT);
        assert_eq!(daily.vocab_reviewed, MAX_DAILY_COUNT);
        assert_eq!(daily.practice_minutes, MAX_DAILY_COUNT);
        assert_eq!(daily.total_activities(), 2 * MAX_DAILY_COUNT);
    }

    #[test]
    fn total_activities_sums_counts() {
        let mut daily = DailyProgress::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        daily.record_activity(ActivityKind::Vocabulary, 3);
        daily.record_activity(ActivityKind::Listening, 1);
        daily.record_activity(ActivityKind::Speaking, 2);
        assert_eq!(daily.total_activities(), 6);
    }

    #[test]
    fn requirement_type_round_trips_through_str() {
        for raw in ["first", "vocab_count", "listening_count", "speaking_count", "streak", "longest_streak", "total_xp"] {
            let parsed: RequirementType = raw.parse().unwrap();
            assert_eq!(parsed.as_str(), raw);
        }
        assert_eq!(
            "score".parse::<RequirementType>(),
            Err(CoreError::UnknownRequirementType("score".to_string()))
        );
    }

    #[test]
    fn only_completed_submissions_award_progress() {
        assert!(SubmissionStatus::Completed.awards_progress());
        assert!(!SubmissionStatus::Pending.awards_progress());
        assert!(!SubmissionStatus::Failed.awards_progress());
        assert_eq!("processing".parse(), Ok(SubmissionStatus::Processing));
    }
}
