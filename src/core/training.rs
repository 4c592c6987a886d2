/// Training progress: per-action repetition curves, resistance stages and variant unlocks.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::schema::character::CharacterRecord;

/// Progress at which an action counts as mastered and its variants unlock.
pub const MASTERY: u32 = 100;

/// Authored definition of a trainable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    #[serde(default = "default_max_progress")]
    pub max_progress: u32,
    /// Reinforcements needed to go from 0 to `max_progress`.
    pub training_needed: u32,
    #[serde(default)]
    pub base_resistance: u32,
    pub category: String,
    #[serde(default)]
    pub unlock_variants: Vec<String>,
}

fn default_max_progress() -> u32 {
    MASTERY
}

impl ActionDefinition {
    /// Progress gained per reinforcement (floor division).
    pub fn increment(&self) -> u32 {
        if self.training_needed == 0 {
            self.max_progress
        } else {
            self.max_progress / self.training_needed
        }
    }
}

/// The six resistance bands an action moves through as it is trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrainingStage {
    StrongResistance,
    Reluctant,
    Accepting,
    Adapted,
    Eager,
    Mastery,
}

impl TrainingStage {
    pub fn from_progress(progress: u32) -> Self {
        match progress {
            0..=19 => Self::StrongResistance,
            20..=39 => Self::Reluctant,
            40..=59 => Self::Accepting,
            60..=79 => Self::Adapted,
            80..=99 => Self::Eager,
            _ => Self::Mastery,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Self::StrongResistance => 0.5,
            Self::Reluctant => 0.7,
            Self::Accepting => 1.0,
            Self::Adapted => 1.3,
            Self::Eager => 1.5,
            Self::Mastery => 2.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongResistance => "strong resistance",
            Self::Reluctant => "reluctant",
            Self::Accepting => "accepting",
            Self::Adapted => "adapted",
            Self::Eager => "eager",
            Self::Mastery => "mastery",
        }
    }
}

/// Result of one reinforcement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub old: u32,
    pub new: u32,
    /// True only on the reinforcement that crossed into mastery.
    pub unlocked: bool,
    pub unlocked_variants: Vec<String>,
}

/// Table of trainable actions keyed by action name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingTable {
    pub actions: HashMap<String, ActionDefinition>,
}

impl TrainingTable {
    pub fn new(actions: HashMap<String, ActionDefinition>) -> Self {
        Self { actions }
    }

    pub fn get(&self, action: &str) -> Option<&ActionDefinition> {
        self.actions.get(action)
    }

    pub fn progress(&self, record: &CharacterRecord, action: &str) -> u32 {
        record.training_progress.get(action)
    }

    /// Reinforce an action once. Unconfigured actions leave the record untouched.
    pub fn add_progress(&self, record: &mut CharacterRecord, action: &str) -> ProgressUpdate {
        let Some(def) = self.actions.get(action) else {
            return ProgressUpdate::default();
        };

        let old = record.training_progress.get(action);
        let new = (old + def.increment()).min(def.max_progress).min(MASTERY);
        record.training_progress.set(action, new);

        let unlocked = old < MASTERY && new >= MASTERY;
        if unlocked {
            tracing::debug!(action, variants = ?def.unlock_variants, "training mastered");
        }

        ProgressUpdate {
            old,
            new,
            unlocked,
            unlocked_variants: if unlocked {
                def.unlock_variants.clone()
            } else {
                Vec::new()
            },
        }
    }

    /// Resistance stage for a configured action, `None` otherwise.
    pub fn stage(&self, record: &CharacterRecord, action: &str) -> Option<TrainingStage> {
        self.actions
            .contains_key(action)
            .then(|| TrainingStage::from_progress(self.progress(record, action)))
    }

    /// Effect multiplier and stage label; unconfigured actions are neutral.
    pub fn resistance_modifier(&self, record: &CharacterRecord, action: &str) -> (f64, &'static str) {
        match self.stage(record, action) {
            Some(stage) => (stage.multiplier(), stage.label()),
            None => (1.0, "normal"),
        }
    }

    /// Variants unlocked by every mastered action, in action-name order.
    pub fn unlocked_variants(&self, record: &CharacterRecord) -> Vec<String> {
        let mut mastered: Vec<(&String, &ActionDefinition)> = self
            .actions
            .iter()
            .filter(|(name, _)| record.training_progress.get(name) >= MASTERY)
            .collect();
        mastered.sort_by(|a, b| a.0.cmp(b.0));
        mastered
            .into_iter()
            .flat_map(|(_, def)| def.unlock_variants.iter().cloned())
            .collect()
    }

    /// Plain-text progress report grouped by category.
    pub fn summary(&self, record: &CharacterRecord) -> String {
        let mut by_category: Vec<(&str, &str, u32)> = self
            .actions
            .iter()
            .map(|(name, def)| (def.category.as_str(), name.as_str(), self.progress(record, name)))
            .collect();
        by_category.sort();

        let mut out = String::from("Training progress\n");
        let mut current_category = "";
        for (category, name, progress) in by_category {
            if category != current_category {
                out.push_str(&format!("[{}]\n", category));
                current_category = category;
            }
            let filled = (progress / 10) as usize;
            out.push_str(&format!(
                "  {:<14} {}{} {:>3}% ({})\n",
                name,
                "#".repeat(filled),
                "-".repeat(10 - filled),
                progress,
                TrainingStage::from_progress(progress).label()
            ));
        }
        out
    }
}
