//! Achievement evaluation and listing.
//!
//! The engine compares a learner's counters against each definition in the
//! catalog. Progress is kept per achievement code in a ledger owned by the
//! caller; once an entry is unlocked it is never touched again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::default_catalog;
use crate::types::{AchievementCategory, AchievementDefinition, AchievementProgress, RequirementType};

/// Per-user progress keyed by achievement code.
pub type AchievementLedger = BTreeMap<String, AchievementProgress>;

/// Learner counters that achievements are measured against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserCounters {
    /// Distinct vocabulary terms reviewed at least once.
    pub vocab_count: u32,
    /// Distinct listening exercises completed.
    pub listening_count: u32,
    /// Distinct speaking scenarios with a completed submission.
    pub speaking_count: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_xp: u64,
}

impl UserCounters {
    /// Current value of the counter a definition is measured against.
    pub fn value_for(&self, definition: &AchievementDefinition) -> u64 {
        match definition.requirement_type {
            RequirementType::Streak => u64::from(self.current_streak),
            RequirementType::LongestStreak => u64::from(self.longest_streak),
            RequirementType::VocabCount => u64::from(self.vocab_count),
            RequirementType::ListeningCount => u64::from(self.listening_count),
            RequirementType::SpeakingCount => u64::from(self.speaking_count),
            RequirementType::TotalXp => self.total_xp,
            RequirementType::First => {
                let count = match definition.category {
                    AchievementCategory::Vocabulary => self.vocab_count,
                    AchievementCategory::Listening => self.listening_count,
                    AchievementCategory::Speaking => self.speaking_count,
                    AchievementCategory::Streak | AchievementCategory::General => 0,
                };
                u64::from(count > 0)
            }
        }
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub newly_unlocked: Vec<AchievementDefinition>,
    /// Codes whose ledger entry was created or modified.
    pub changed: Vec<String>,
    pub xp_awarded: u64,
}

#[derive(Debug, Clone)]
pub struct AchievementEngine {
    catalog: Vec<AchievementDefinition>,
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::with_default_catalog()
    }
}

impl AchievementEngine {
    pub fn new(mut catalog: Vec<AchievementDefinition>) -> Self {
        catalog.sort_by_key(|d| d.sort_order);
        Self { catalog }
    }

    pub fn with_default_catalog() -> Self {
        Self::new(default_catalog())
    }

    pub fn catalog(&self) -> &[AchievementDefinition] {
        &self.catalog
    }

    /// Update the ledger from the given counters, unlocking every achievement
    /// whose target is reached.
    ///
    /// XP from each unlock is added to the running total before later
    /// definitions are checked, so XP milestones can chain in one pass.
    pub fn evaluate(
        &self,
        counters: &UserCounters,
        ledger: &mut AchievementLedger,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let mut counters = counters.clone();
        let mut evaluation = Evaluation::default();

        for definition in &self.catalog {
            let entry = ledger.entry(definition.code.clone()).or_default();
            if entry.unlocked {
                continue;
            }

            let value = counters.value_for(definition);
            let progress = u32::try_from(value).unwrap_or(u32::MAX);

            if value >= u64::from(definition.requirement_value) {
                entry.progress = entry.progress.max(progress);
                entry.unlocked = true;
                entry.unlocked_at = Some(now);

                counters.total_xp += u64::from(definition.xp_reward);
                evaluation.xp_awarded += u64::from(definition.xp_reward);
                evaluation.newly_unlocked.push(definition.clone());
                evaluation.changed.push(definition.code.clone());
            } else if progress > entry.progress {
                entry.progress = progress;
                evaluation.changed.push(definition.code.clone());
            }
        }

        // Drop placeholder entries that never received progress.
        ledger.retain(|_, p| p.unlocked || p.progress > 0);

        evaluation
    }

    /// Group the catalog into earned, in-progress and locked achievements.
    /// Hidden achievements are listed only once earned.
    pub fn board(&self, ledger: &AchievementLedger) -> AchievementBoard {
        let mut board = AchievementBoard::default();

        for definition in &self.catalog {
            let progress = ledger.get(&definition.code).cloned().unwrap_or_default();

            if progress.unlocked {
                board.total_xp_from_achievements += u64::from(definition.xp_reward);
                board.earned.push(BoardEntry::new(definition, &progress));
            } else if definition.is_hidden {
                continue;
            } else if progress.progress > 0 {
                board.in_progress.push(BoardEntry::new(definition, &progress));
            } else {
                board.locked.push(BoardEntry::new(definition, &progress));
            }
        }

        board.total_earned = board.earned.len();
        board
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardEntry {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub requirement_value: u32,
    pub xp_reward: u32,
    pub progress: u32,
    pub progress_percent: f64,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl BoardEntry {
    fn new(definition: &AchievementDefinition, progress: &AchievementProgress) -> Self {
        let progress_percent = if definition.requirement_value == 0 || progress.unlocked {
            100.0
        } else {
            let percent = f64::from(progress.progress) / f64::from(definition.requirement_value) * 100.0;
            (percent.min(100.0) * 10.0).round() / 10.0
        };

        Self {
            code: definition.code.clone(),
            title: definition.title.clone(),
            description: definition.description.clone(),
            icon: definition.icon.clone(),
            category: definition.category,
            requirement_value: definition.requirement_value,
            xp_reward: definition.xp_reward,
            progress: progress.progress,
            progress_percent,
            unlocked_at: progress.unlocked_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AchievementBoard {
    pub earned: Vec<BoardEntry>,
    pub in_progress: Vec<BoardEntry>,
    pub locked: Vec<BoardEntry>,
    pub total_earned: usize,
    pub total_xp_from_achievements: u64,
}
