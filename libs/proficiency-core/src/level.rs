//! Predicted ICAO language proficiency level.
//!
//! Vocabulary and listening percentages are mapped onto the 1-6 ICAO scale.
//! Speaking uses the weakest of the six ICAO criteria, since the official
//! rating is capped by the lowest criterion.

use serde::{Deserialize, Serialize};

pub const MIN_LEVEL: f64 = 1.0;
pub const MAX_LEVEL: f64 = 6.0;

/// Scores on the six ICAO rating criteria, each 1-6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcaoCriteria {
    pub pronunciation: f64,
    pub structure: f64,
    pub vocabulary: f64,
    pub fluency: f64,
    pub comprehension: f64,
    pub interaction: f64,
}

impl IcaoCriteria {
    fn scores(&self) -> [(&'static str, f64); 6] {
        [
            ("pronunciation", self.pronunciation),
            ("structure", self.structure),
            ("vocabulary", self.vocabulary),
            ("fluency", self.fluency),
            ("comprehension", self.comprehension),
            ("interaction", self.interaction),
        ]
    }

    /// Copy with every score clamped into the 1-6 range.
    pub fn clamped(&self) -> Self {
        let c = |v: f64| v.clamp(MIN_LEVEL, MAX_LEVEL);
        Self {
            pronunciation: c(self.pronunciation),
            structure: c(self.structure),
            vocabulary: c(self.vocabulary),
            fluency: c(self.fluency),
            comprehension: c(self.comprehension),
            interaction: c(self.interaction),
        }
    }

    pub fn average(&self) -> f64 {
        self.scores().iter().map(|(_, v)| v).sum::<f64>() / 6.0
    }

    pub fn minimum(&self) -> f64 {
        self.scores().iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min)
    }

    /// Name of the lowest-scoring criterion. Ties resolve to the first listed.
    pub fn weakest(&self) -> &'static str {
        let mut weakest = self.scores()[0];
        for entry in self.scores() {
            if entry.1 < weakest.1 {
                weakest = entry;
            }
        }
        weakest.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelWeights {
    pub vocabulary: f64,
    pub listening: f64,
    pub speaking: f64,
}

impl Default for LevelWeights {
    fn default() -> Self {
        Self {
            vocabulary: 0.25,
            listening: 0.25,
            speaking: 0.50,
        }
    }
}

/// Aggregates the prediction is computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelInputs {
    /// Share of learned vocabulary that is mastered, 0-100.
    pub vocabulary_mastery_percent: f64,
    /// Mean score of completed listening attempts, 0-100.
    pub listening_average_score: f64,
    /// Per-criterion averages over completed speaking submissions.
    pub speaking: Option<IcaoCriteria>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedLevel {
    pub level: f64,
    pub description: &'static str,
    pub progress_to_next_percent: f64,
}

fn percent_to_scale(percent: f64) -> f64 {
    MIN_LEVEL + percent.clamp(0.0, 100.0) / 100.0 * 5.0
}

pub fn predict_level(inputs: &LevelInputs, weights: &LevelWeights) -> PredictedLevel {
    let vocabulary = percent_to_scale(inputs.vocabulary_mastery_percent);
    let listening = percent_to_scale(inputs.listening_average_score);
    let speaking = match &inputs.speaking {
        Some(criteria) => criteria.clamped().minimum(),
        None => (vocabulary + listening) / 2.0,
    };

    let raw = vocabulary * weights.vocabulary + listening * weights.listening + speaking * weights.speaking;
    let level = (raw.clamp(MIN_LEVEL, MAX_LEVEL) * 10.0).round() / 10.0;

    PredictedLevel {
        level,
        description: level_description(level),
        progress_to_next_percent: ((level - level.floor()) * 100.0).round(),
    }
}

pub fn level_description(level: f64) -> &'static str {
    match level {
        l if l < 2.0 => "Pre-Elementary",
        l if l < 3.0 => "Elementary",
        l if l < 4.0 => "Pre-Operational",
        l if l < 5.0 => "Operational",
        l if l < 6.0 => "Extended",
        _ => "Expert",
    }
}
