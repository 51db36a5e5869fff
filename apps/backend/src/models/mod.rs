//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use proficiency_core::{
    AchievementDefinition, AchievementProgress, DailyProgress, IcaoCriteria, PredictedLevel, ReviewState,
    StreakState, StreakSummary, SubmissionStatus, XpLevel,
};

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// === Database Entity Types ===

/// Registered learner
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub daily_goal_minutes: i32,
    pub utc_offset_minutes: i32,
    pub target_icao_level: i32,
    pub predicted_icao_level: f64,
    pub total_xp: i64,
    pub total_practice_minutes: i64,
    pub last_practice_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Vocabulary term content
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbVocabularyTerm {
    pub id: Uuid,
    pub term: String,
    pub definition: String,
    pub example_sentence: Option<String>,
    pub category: String,
    pub difficulty: i32,
}

/// Row of `vocabulary_progress`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReviewState {
    pub user_id: Uuid,
    pub term_id: Uuid,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetitions: i32,
    pub next_review_at: DateTime<Utc>,
    pub total_reviews: i32,
    pub correct_reviews: i32,
    pub last_quality: Option<i16>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl DbReviewState {
    /// Create from a proficiency-core ReviewState
    pub fn from_core_state(user_id: Uuid, term_id: Uuid, state: &ReviewState) -> Self {
        Self {
            user_id,
            term_id,
            ease_factor: state.ease_factor,
            interval_days: to_i32(state.interval_days),
            repetitions: to_i32(state.repetitions),
            next_review_at: state.next_review_at,
            total_reviews: to_i32(state.total_reviews),
            correct_reviews: to_i32(state.correct_reviews),
            last_quality: state.last_quality.map(i16::from),
            last_reviewed_at: state.last_reviewed_at,
        }
    }

    /// Convert to a proficiency-core ReviewState
    pub fn to_core_state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval_days: to_u32(self.interval_days),
            repetitions: to_u32(self.repetitions),
            next_review_at: self.next_review_at,
            total_reviews: to_u32(self.total_reviews),
            correct_reviews: to_u32(self.correct_reviews),
            last_quality: self.last_quality.and_then(|q| u8::try_from(q).ok()),
            last_reviewed_at: self.last_reviewed_at,
        }
    }
}

/// Due term joined with its review state, used to build the queue
#[derive(Debug, Clone, FromRow)]
pub struct DbDueTerm {
    pub id: Uuid,
    pub term: String,
    pub definition: String,
    pub category: String,
    pub difficulty: i32,
    pub ease_factor: f64,
    pub repetitions: i32,
    pub next_review_at: DateTime<Utc>,
    pub total_reviews: i32,
    pub correct_reviews: i32,
}

/// Term joined with the learner's optional review state, used for stats
#[derive(Debug, Clone, FromRow)]
pub struct DbTermProgress {
    pub category: String,
    pub ease_factor: Option<f64>,
    pub repetitions: Option<i32>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub total_reviews: Option<i32>,
    pub correct_reviews: Option<i32>,
}

/// Listening exercise or speaking scenario reference
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbActivity {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub difficulty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDailyProgress {
    pub date: NaiveDate,
    pub vocab_reviewed: i32,
    pub listening_completed: i32,
    pub speaking_completed: i32,
    pub practice_minutes: i32,
    pub xp_earned: i32,
    pub goal_met: bool,
}

impl DbDailyProgress {
    pub fn to_core(&self) -> DailyProgress {
        DailyProgress {
            date: self.date,
            vocab_reviewed: to_u32(self.vocab_reviewed),
            listening_completed: to_u32(self.listening_completed),
            speaking_completed: to_u32(self.speaking_completed),
            practice_minutes: to_u32(self.practice_minutes),
            xp_earned: to_u32(self.xp_earned),
            goal_met: self.goal_met,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbStreak {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_practice_date: Option<NaiveDate>,
}

impl DbStreak {
    pub fn to_core(&self) -> StreakState {
        StreakState {
            current_streak: to_u32(self.current_streak),
            longest_streak: to_u32(self.longest_streak),
            last_practice_date: self.last_practice_date,
        }
    }
}

/// Achievement definition as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAchievement {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub requirement_type: String,
    pub requirement_value: i32,
    pub xp_reward: i32,
    pub is_hidden: bool,
    pub sort_order: i32,
}

impl DbAchievement {
    /// Convert to a proficiency-core definition, rejecting unknown labels
    pub fn to_definition(&self) -> proficiency_core::Result<AchievementDefinition> {
        Ok(AchievementDefinition {
            code: self.code.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            category: self.category.parse()?,
            requirement_type: self.requirement_type.parse()?,
            requirement_value: to_u32(self.requirement_value),
            xp_reward: to_u32(self.xp_reward),
            is_hidden: self.is_hidden,
            sort_order: self.sort_order,
        })
    }
}

/// Per-user achievement progress keyed by code
#[derive(Debug, Clone, FromRow)]
pub struct DbUserAchievement {
    pub code: String,
    pub progress: i32,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl DbUserAchievement {
    pub fn to_core(&self) -> AchievementProgress {
        AchievementProgress {
            progress: to_u32(self.progress),
            unlocked: self.unlocked,
            unlocked_at: self.unlocked_at,
        }
    }
}

/// Per-criterion averages over completed speaking submissions
#[derive(Debug, Clone, FromRow)]
pub struct DbSpeakingAverages {
    pub completed: i64,
    pub pronunciation: Option<f64>,
    pub structure: Option<f64>,
    pub vocabulary: Option<f64>,
    pub fluency: Option<f64>,
    pub comprehension: Option<f64>,
    pub interaction: Option<f64>,
}

impl DbSpeakingAverages {
    /// Criteria averages, `None` without completed submissions.
    /// A criterion that was never scored counts as 3.0.
    pub fn to_criteria(&self) -> Option<IcaoCriteria> {
        if self.completed == 0 {
            return None;
        }
        Some(IcaoCriteria {
            pronunciation: self.pronunciation.unwrap_or(3.0),
            structure: self.structure.unwrap_or(3.0),
            vocabulary: self.vocabulary.unwrap_or(3.0),
            fluency: self.fluency.unwrap_or(3.0),
            comprehension: self.comprehension.unwrap_or(3.0),
            interaction: self.interaction.unwrap_or(3.0),
        })
    }
}

// === API Request/Response Types ===

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub display_name: Option<String>,
    pub daily_goal_minutes: Option<i32>,
    pub utc_offset_minutes: Option<i32>,
    pub target_icao_level: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
    pub daily_goal_minutes: i32,
}

/// Brief description of an achievement unlocked by an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub xp_reward: u32,
}

impl From<&AchievementDefinition> for UnlockedAchievement {
    fn from(definition: &AchievementDefinition) -> Self {
        Self {
            code: definition.code.clone(),
            title: definition.title.clone(),
            description: definition.description.clone(),
            icon: definition.icon.clone(),
            xp_reward: definition.xp_reward,
        }
    }
}

/// Progression side effects shared by every learning event response
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub xp_earned: u32,
    pub achievement_xp: u64,
    pub total_xp: u64,
    pub daily_progress: DailyProgressItem,
    pub streak_maintained: bool,
    pub streak_increased: bool,
    pub current_streak: u32,
    pub goal_met: bool,
    pub goal_progress_percent: f64,
    pub new_achievements: Vec<UnlockedAchievement>,
    pub predicted_level: f64,
    pub level_change: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewQueueQuery {
    pub limit: Option<usize>,
    pub include_new: Option<bool>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueueItem {
    pub term_id: Uuid,
    pub term: String,
    pub definition: String,
    pub category: String,
    pub difficulty: i32,
    pub priority: i64,
    pub overdue_days: i64,
    pub is_new: bool,
    pub mastery_percent: f64,
    pub is_mastered: bool,
    pub next_review_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueueResponse {
    pub items: Vec<ReviewQueueItem>,
    pub total_due: i64,
    pub total_new: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub quality: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReviewResponse {
    pub term_id: Uuid,
    pub new_ease: f64,
    pub new_interval: u32,
    pub new_reps: u32,
    pub next_review_at: DateTime<Utc>,
    pub mastery_percent: f64,
    pub is_mastered: bool,
    #[serde(flatten)]
    pub progress: ProgressUpdate,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub total_terms: u32,
    pub learned: u32,
    pub mastered: u32,
    pub due: u32,
    pub average_mastery: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VocabularyStatsResponse {
    pub total_terms: u32,
    pub learned: u32,
    pub mastered: u32,
    pub due: u32,
    pub mastery_percent: f64,
    pub categories: Vec<CategoryStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListeningResultRequest {
    pub score_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListeningResultResponse {
    pub attempt_id: Uuid,
    pub exercise_id: Uuid,
    pub score_percent: f64,
    pub first_attempt: bool,
    #[serde(flatten)]
    pub progress: ProgressUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingResultRequest {
    #[serde(default = "completed_status")]
    pub status: SubmissionStatus,
    pub criteria: Option<IcaoCriteria>,
}

fn completed_status() -> SubmissionStatus {
    SubmissionStatus::Completed
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeakingResultResponse {
    pub submission_id: Uuid,
    pub scenario_id: Uuid,
    pub status: SubmissionStatus,
    pub overall_score: Option<f64>,
    pub weakest_criterion: Option<&'static str>,
    pub first_submission: bool,
    /// Present only when the submission completed
    pub progress: Option<ProgressUpdate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeSessionRequest {
    #[serde(default)]
    pub vocab_reviewed: i64,
    #[serde(default)]
    pub listening_completed: i64,
    #[serde(default)]
    pub speaking_completed: i64,
    #[serde(default)]
    pub practice_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PracticeSessionResponse {
    pub streak: StreakSummary,
    #[serde(flatten)]
    pub progress: ProgressUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyProgressItem {
    pub date: NaiveDate,
    pub vocab_reviewed: u32,
    pub listening_completed: u32,
    pub speaking_completed: u32,
    pub practice_minutes: u32,
    pub xp_earned: u32,
    pub goal_met: bool,
    pub total_activities: u32,
}

impl From<&DailyProgress> for DailyProgressItem {
    fn from(daily: &DailyProgress) -> Self {
        Self {
            date: daily.date,
            vocab_reviewed: daily.vocab_reviewed,
            listening_completed: daily.listening_completed,
            speaking_completed: daily.speaking_completed,
            practice_minutes: daily.practice_minutes,
            xp_earned: daily.xp_earned,
            goal_met: daily.goal_met,
            total_activities: daily.total_activities(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyProgressQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyProgressResponse {
    pub items: Vec<DailyProgressItem>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active_days: usize,
    pub total_days: i64,
    pub streak: StreakSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelResponse {
    #[serde(flatten)]
    pub predicted: PredictedLevel,
    pub target_icao_level: i32,
    pub on_track_for_goal: bool,
    pub vocabulary_mastery_percent: f64,
    pub listening_average_score: f64,
    pub speaking: Option<IcaoCriteria>,
    pub xp: XpLevel,
}
