//! Built-in achievement catalog.

use crate::types::{AchievementCategory, AchievementDefinition, RequirementType};

use AchievementCategory as C;
use RequirementType as R;

type Row = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    AchievementCategory,
    RequirementType,
    u32,
    u32,
    bool,
    i32,
);

// (code, title, description, icon, category, requirement, target, xp, hidden, sort)
const DEFINITIONS: &[Row] = &[
    ("first_word", "First Word", "Complete your first vocabulary review", "book", C::Vocabulary, R::First, 1, 50, false, 1),
    ("first_listen", "First Listen", "Complete your first listening exercise", "headphones", C::Listening, R::First, 1, 50, false, 2),
    ("first_speak", "First Transmission", "Submit your first speaking exercise", "microphone", C::Speaking, R::First, 1, 75, false, 3),
    ("vocab_10", "Word Collector", "Learn 10 vocabulary terms", "book-open", C::Vocabulary, R::VocabCount, 10, 100, false, 10),
    ("vocab_50", "Vocabulary Builder", "Learn 50 vocabulary terms", "books", C::Vocabulary, R::VocabCount, 50, 250, false, 11),
    ("vocab_100", "Word Master", "Learn 100 vocabulary terms", "trophy", C::Vocabulary, R::VocabCount, 100, 500, false, 12),
    ("vocab_250", "Lexicon Expert", "Learn 250 vocabulary terms", "book-closed", C::Vocabulary, R::VocabCount, 250, 1000, false, 13),
    ("listening_5", "Radio Rookie", "Complete 5 listening exercises", "radio", C::Listening, R::ListeningCount, 5, 100, false, 20),
    ("listening_25", "Radio Operator", "Complete 25 listening exercises", "headphones", C::Listening, R::ListeningCount, 25, 300, false, 21),
    ("listening_50", "Radio Professional", "Complete 50 listening exercises", "satellite-dish", C::Listening, R::ListeningCount, 50, 600, false, 22),
    ("speaking_5", "Voice Active", "Complete 5 speaking exercises", "mic", C::Speaking, R::SpeakingCount, 5, 150, false, 30),
    ("speaking_20", "Radio Talker", "Complete 20 speaking exercises", "mic-2", C::Speaking, R::SpeakingCount, 20, 400, false, 31),
    ("speaking_50", "Communications Expert", "Complete 50 speaking exercises", "plane", C::Speaking, R::SpeakingCount, 50, 800, false, 32),
    ("streak_3", "Getting Started", "Maintain a 3-day streak", "flame", C::Streak, R::Streak, 3, 75, false, 40),
    ("streak_7", "Week Warrior", "Maintain a 7-day streak", "flame", C::Streak, R::Streak, 7, 200, false, 41),
    ("streak_14", "Fortnight Flyer", "Maintain a 14-day streak", "flame", C::Streak, R::Streak, 14, 400, false, 42),
    ("streak_30", "Month Master", "Maintain a 30-day streak", "gem", C::Streak, R::Streak, 30, 750, false, 43),
    ("streak_60", "Dedicated Pilot", "Maintain a 60-day streak", "gem", C::Streak, R::Streak, 60, 1500, false, 44),
    ("streak_90", "Quarter Champion", "Maintain a 90-day streak", "crown", C::Streak, R::Streak, 90, 2500, false, 45),
    ("streak_365", "Year of Flight", "Maintain a 365-day streak", "trophy-gold", C::Streak, R::Streak, 365, 10000, true, 46),
    ("xp_1000", "First Thousand", "Earn 1,000 XP", "star", C::General, R::TotalXp, 1000, 100, false, 50),
    ("xp_5000", "Rising Star", "Earn 5,000 XP", "star-filled", C::General, R::TotalXp, 5000, 250, false, 51),
    ("xp_10000", "XP Elite", "Earn 10,000 XP", "sparkles", C::General, R::TotalXp, 10000, 500, false, 52),
    ("xp_50000", "XP Legend", "Earn 50,000 XP", "medal", C::General, R::TotalXp, 50000, 2000, true, 53),
];

/// The achievements every installation ships with, ordered by `sort_order`.
pub fn default_catalog() -> Vec<AchievementDefinition> {
    DEFINITIONS
        .iter()
        .map(
            |&(code, title, description, icon, category, requirement_type, requirement_value, xp_reward, is_hidden, sort_order)| {
                AchievementDefinition {
                    code: code.to_string(),
                    title: title.to_string(),
                    description: description.to_string(),
                    icon: icon.to_string(),
                    category,
                    requirement_type,
                    requirement_value,
                    xp_reward,
                    is_hidden,
                    sort_order,
                }
            },
        )
        .collect()
}
