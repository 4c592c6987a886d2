/// Dating activities: costed, gated non-combat activities with attribute effects.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::schema::character::{Attribute, CharacterRecord, Effects};
use crate::schema::condition::{Condition, ConditionSet};

/// Source of truth for a character's action points.
///
/// The host may track action points outside the record (regeneration,
/// daily resets), so activities only reach them through this seam.
pub trait ActionPointLedger {
    fn current(&self, record: &CharacterRecord) -> i64;
    fn consume(&self, record: &mut CharacterRecord, amount: i64);
}

/// Action points stored directly on the record's `action_points` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordActionPoints;

impl ActionPointLedger for RecordActionPoints {
    fn current(&self, record: &CharacterRecord) -> i64 {
        record.get(Attribute::ActionPoints)
    }

    fn consume(&self, record: &mut CharacterRecord, amount: i64) {
        record.add(Attribute::ActionPoints, -amount);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub ap_cost: i64,
    #[serde(default)]
    pub coin_cost: i64,
    /// Attribute gates; authored content uses `AtLeast` minimums.
    #[serde(default)]
    pub requirements: ConditionSet,
    pub effects: Effects,
    pub description: String,
    pub scene_text: String,
}

/// Why an activity cannot be done right now.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityRefusal {
    #[error("unknown activity: {0}")]
    UnknownActivity(String),
    #[error("not enough action points (needs {cost}, have {current})")]
    InsufficientActionPoints { cost: i64, current: i64 },
    #[error("not enough coins (needs {cost}, have {current})")]
    InsufficientCoins { cost: i64, current: i64 },
    #[error("{attribute} must be {condition} (currently {current})")]
    Locked {
        attribute: Attribute,
        condition: Condition,
        current: i64,
    },
}

/// What `execute` charged and what the caller still has to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOutcome {
    /// Raw deltas before any scene or personality modifiers.
    pub effects: Effects,
    pub ap_cost: i64,
    pub coin_cost: i64,
    pub scene_text: String,
}

/// Activity catalog in authored order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityCatalog {
    pub activities: Vec<ActivityDefinition>,
}

impl ActivityCatalog {
    pub fn new(activities: Vec<ActivityDefinition>) -> Self {
        Self { activities }
    }

    pub fn get(&self, id: &str) -> Option<&ActivityDefinition> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// Check affordability and unlocks, in that order; the first failure wins.
    pub fn can_do(
        &self,
        record: &CharacterRecord,
        id: &str,
        ledger: &dyn ActionPointLedger,
    ) -> Result<(), ActivityRefusal> {
        let activity = self
            .get(id)
            .ok_or_else(|| ActivityRefusal::UnknownActivity(id.to_string()))?;

        let current = ledger.current(record);
        if current < activity.ap_cost {
            return Err(ActivityRefusal::InsufficientActionPoints {
                cost: activity.ap_cost,
                current,
            });
        }

        let coins = record.get(Attribute::Coins);
        if coins < activity.coin_cost {
            return Err(ActivityRefusal::InsufficientCoins {
                cost: activity.coin_cost,
                current: coins,
            });
        }

        if let Some(unmet) = activity.requirements.first_unmet(record) {
            return Err(ActivityRefusal::Locked {
                attribute: unmet.attribute,
                condition: unmet.condition,
                current: unmet.current,
            });
        }

        Ok(())
    }

    /// Charge the activity's costs and hand back its effects.
    ///
    /// Does not re-check affordability: callers gate on `can_do` first, and an
    /// unaffordable activity will drive coins negative.
    pub fn execute(
        &self,
        record: &mut CharacterRecord,
        id: &str,
        ledger: &dyn ActionPointLedger,
    ) -> Result<ActivityOutcome, ActivityRefusal> {
        let activity = self
            .get(id)
            .ok_or_else(|| ActivityRefusal::UnknownActivity(id.to_string()))?;

        ledger.consume(record, activity.ap_cost);
        record.add(Attribute::Coins, -activity.coin_cost);
        tracing::debug!(
            activity = %activity.id,
            ap_cost = activity.ap_cost,
            coin_cost = activity.coin_cost,
            "activity executed"
        );

        Ok(ActivityOutcome {
            effects: activity.effects.clone(),
            ap_cost: activity.ap_cost,
            coin_cost: activity.coin_cost,
            scene_text: activity.scene_text.clone(),
        })
    }

    /// Activities grouped by category tag, authored order within each group.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&ActivityDefinition>> {
        let mut groups: BTreeMap<&str, Vec<&ActivityDefinition>> = BTreeMap::new();
        for activity in &self.activities {
            groups.entry(activity.category.as_str()).or_default().push(activity);
        }
        groups
    }

    /// Catalog listing with availability marks for one character.
    pub fn render_list(&self, record: &CharacterRecord, ledger: &dyn ActionPointLedger) -> String {
        let mut out = String::from("Dating activities\n");
        for (category, activities) in self.by_category() {
            out.push_str(&format!("[{}]\n", category));
            for activity in activities {
                let mark = match self.can_do(record, &activity.id, ledger) {
                    Ok(()) => "+".to_string(),
                    Err(reason) => format!("- {}", reason),
                };
                out.push_str(&format!(
                    "  {} ({}) {}AP {}c {}\n",
                    activity.name, activity.id, activity.ap_cost, activity.coin_cost, mark
                ));
            }
        }
        out
    }
}
