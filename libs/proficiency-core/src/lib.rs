//! Learning progression engine for the aviation English backend.
//!
//! Provides:
//! - SM-2 review scheduling, review queue priority and mastery scoring
//! - Daily streak tracking
//! - Achievement evaluation with the built-in catalog
//! - XP rules and predicted ICAO level
//! - The progression state machine tying these together per learning event

pub mod achievements;
pub mod algorithm;
pub mod catalog;
pub mod date_utils;
pub mod error;
pub mod level;
pub mod progress;
pub mod streak;
pub mod types;
pub mod xp;

pub use achievements::{AchievementBoard, AchievementEngine, AchievementLedger, BoardEntry, Evaluation, UserCounters};
pub use algorithm::mastery::{is_mastered, mastery_percent, meets_stats_threshold, STATS_MASTERY_THRESHOLD};
pub use algorithm::priority::{build_queue, priority, DueItem, NewItem, Priority, QueueEntry};
pub use algorithm::sm2::Sm2;
pub use algorithm::{get_algorithm, ScheduleOutcome, SpacedRepetitionAlgorithm};
pub use error::{CoreError, Result};
pub use level::{predict_level, IcaoCriteria, LevelInputs, LevelWeights, PredictedLevel};
pub use progress::{EventOutcome, LearningEvent, ProgressOrchestrator, ProgressSnapshot};
pub use streak::{is_at_risk, record_practice, StreakOutcome, StreakSummary, StreakUpdate};
pub use types::{
    AchievementCategory, AchievementDefinition, AchievementProgress, ActivityKind, DailyProgress, Quality,
    RequirementType, ReviewState, StreakState, SubmissionStatus, MAX_DAILY_COUNT,
};
pub use xp::{SessionCounts, XpLevel};
