/// Personality archetypes: starting attributes and gain multipliers.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::schema::character::{Attribute, CharacterRecord, Effects};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub starting_attributes: Effects,
    /// Scales positive gains per attribute; unlisted attributes use 1.0.
    #[serde(default)]
    pub gain_multipliers: BTreeMap<Attribute, f64>,
}

impl PersonalityDefinition {
    pub fn multiplier(&self, attr: Attribute) -> f64 {
        self.gain_multipliers.get(&attr).copied().unwrap_or(1.0)
    }

    /// Scale positive deltas by this personality's multipliers (truncating).
    pub fn apply(&self, effects: &Effects) -> Effects {
        effects
            .iter()
            .map(|(&attr, &value)| {
                let value = if value > 0 {
                    (value as f64 * self.multiplier(attr)) as i64
                } else {
                    value
                };
                (attr, value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalityTable {
    pub personalities: HashMap<String, PersonalityDefinition>,
}

impl PersonalityTable {
    pub fn get(&self, id: &str) -> Option<&PersonalityDefinition> {
        self.personalities.get(id)
    }

    /// A fresh record seeded with a personality's starting attributes.
    /// Unknown personalities start from an empty record.
    pub fn starting_record(&self, user_id: &str, chat_id: &str, personality: &str) -> CharacterRecord {
        let mut record = CharacterRecord::new(user_id, chat_id);
        match self.get(personality) {
            Some(def) => record.apply_effects(&def.starting_attributes),
            None => tracing::debug!(personality, "unknown personality, using empty record"),
        }
        record
    }
}
