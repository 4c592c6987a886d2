/// Scenes: per-location modifiers applied to interaction effects.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::character::{Attribute, CharacterRecord, Effects};
use crate::schema::condition::{Condition, ConditionSet};

/// Scene every unknown id falls back to. It carries no modifiers.
pub const BASELINE_SCENE: &str = "bedroom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub shame_modifier: i64,
    #[serde(default = "default_multiplier")]
    pub effect_multiplier: f64,
    #[serde(default)]
    pub arousal_bonus: i64,
    #[serde(default)]
    pub requirements: ConditionSet,
    pub description: String,
    #[serde(default)]
    pub special_effect: String,
}

fn default_multiplier() -> f64 {
    1.0
}

impl SceneDefinition {
    pub fn baseline() -> Self {
        Self {
            id: BASELINE_SCENE.to_string(),
            name: "Private bedroom".to_string(),
            category: "private".to_string(),
            shame_modifier: 0,
            effect_multiplier: 1.0,
            arousal_bonus: 0,
            requirements: ConditionSet::new(),
            description: "A familiar, private space.".to_string(),
            special_effect: String::new(),
        }
    }
}

/// Why a scene cannot be used yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneLock {
    #[error("scene does not exist")]
    UnknownScene,
    #[error("{attribute} must be {condition} (currently {current})")]
    Requirement {
        attribute: Attribute,
        condition: Condition,
        current: i64,
    },
}

/// Scene table; always contains the baseline scene.
#[derive(Debug, Clone)]
pub struct SceneTable {
    scenes: Vec<SceneDefinition>,
}

impl Default for SceneTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SceneTable {
    pub fn new(mut scenes: Vec<SceneDefinition>) -> Self {
        if !scenes.iter().any(|s| s.id == BASELINE_SCENE) {
            scenes.insert(0, SceneDefinition::baseline());
        }
        Self { scenes }
    }

    pub fn scenes(&self) -> &[SceneDefinition] {
        &self.scenes
    }

    pub fn find(&self, id: &str) -> Option<&SceneDefinition> {
        self.scenes.iter().find(|s| s.id == id)
    }

    fn baseline(&self) -> &SceneDefinition {
        // `new` guarantees the baseline entry exists.
        self.find(BASELINE_SCENE).unwrap_or(&self.scenes[0])
    }

    /// Scene definition, or the baseline bedroom for unknown ids.
    pub fn get_scene_effect(&self, id: &str) -> &SceneDefinition {
        self.find(id).unwrap_or_else(|| self.baseline())
    }

    pub fn check_unlocked(&self, id: &str, record: &CharacterRecord) -> Result<(), SceneLock> {
        let scene = self.find(id).ok_or(SceneLock::UnknownScene)?;
        match scene.requirements.first_unmet(record) {
            None => Ok(()),
            Some(unmet) => Err(SceneLock::Requirement {
                attribute: unmet.attribute,
                condition: unmet.condition,
                current: unmet.current,
            }),
        }
    }

    /// Scenes the character can currently use, in table order.
    pub fn unlocked_scenes(&self, record: &CharacterRecord) -> Vec<&SceneDefinition> {
        self.scenes
            .iter()
            .filter(|s| s.requirements.is_satisfied(record))
            .collect()
    }

    /// Scale positive effects by the scene multiplier, then add the shame and
    /// arousal modifiers. Returns the modified effects and a hint for display.
    pub fn apply_effects(&self, base: &Effects, id: &str) -> (Effects, String) {
        let scene = self.get_scene_effect(id);

        let mut effects: Effects = base
            .iter()
            .map(|(&attr, &value)| {
                let scaled = if value > 0 {
                    (value as f64 * scene.effect_multiplier) as i64
                } else {
                    value
                };
                (attr, scaled)
            })
            .collect();

        if scene.shame_modifier != 0 {
            *effects.entry(Attribute::Shame).or_insert(0) += scene.shame_modifier;
        }
        if scene.arousal_bonus > 0 {
            *effects.entry(Attribute::Arousal).or_insert(0) += scene.arousal_bonus;
        }

        let hint = if scene.id == BASELINE_SCENE {
            String::new()
        } else {
            format!(
                "[Scene: {}]\n{}\nEffect: {}\nMultiplier: x{:.1}",
                scene.name, scene.description, scene.special_effect, scene.effect_multiplier
            )
        };

        (effects, hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn park() -> SceneDefinition {
        SceneDefinition {
            id: "park".to_string(),
            name: "Night park".to_string(),
            category: "outdoor".to_string(),
            shame_modifier: 10,
            effect_multiplier: 1.5,
            arousal_bonus: 0,
            requirements: ConditionSet::new()
                .with(Attribute::Corruption, Condition::AtLeast(30))
                .with(Attribute::Shame, Condition::Below(70)),
            description: "Lamplight and empty benches.".to_string(),
            special_effect: "thrill of being seen".to_string(),
        }
    }

    #[test]
    fn multiplier_skips_non_positive_entries() {
        let table = SceneTable::new(vec![park()]);
        let base = Effects::from([(Attribute::Affection, 10), (Attribute::Shame, -5)]);
        let (effects, hint) = table.apply_effects(&base, "park");
        assert_eq!(
            effects,
            Effects::from([(Attribute::Affection, 15), (Attribute::Shame, 5)])
        );
        assert!(!effects.contains_key(&Attribute::Arousal));
        assert!(hint.contains("Night park"));
        assert!(hint.contains("x1.5"));
    }

    #[test]
    fn multiplier_truncates() {
        let table = SceneTable::new(vec![park()]);
        let base = Effects::from([(Attribute::Intimacy, 3)]);
        let (effects, _) = table.apply_effects(&base, "park");
        assert_eq!(effects[&Attribute::Intimacy], 4);
        assert_eq!(effects[&Attribute::Shame], 10);
    }

    #[test]
    fn arousal_bonus_only_when_positive() {
        let mut hot_spring = park();
        hot_spring.id = "hot_spring".to_string();
        hot_spring.shame_modifier = 0;
        hot_spring.effect_multiplier = 1.0;
        hot_spring.arousal_bonus = 8;
        let table = SceneTable::new(vec![hot_spring]);

        let (effects, _) = table.apply_effects(&Effects::new(), "hot_spring");
        assert_eq!(effects, Effects::from([(Attribute::Arousal, 8)]));
    }

    #[test]
    fn unknown_scene_falls_back_to_baseline() {
        let table = SceneTable::new(vec![park()]);
        assert_eq!(table.get_scene_effect("moon").id, BASELINE_SCENE);

        let base = Effects::from([(Attribute::Affection, 10)]);
        let (effects, hint) = table.apply_effects(&base, "moon");
        assert_eq!(effects, base);
        assert!(hint.is_empty());
    }

    #[test]
    fn unlock_checks() {
        let table = SceneTable::new(vec![park()]);
        let record = CharacterRecord::new("u", "c").with(Attribute::Corruption, 10);

        assert_eq!(table.check_unlocked("moon", &record), Err(SceneLock::UnknownScene));
        assert_eq!(
            SceneLock::UnknownScene.to_string(),
            "scene does not exist"
        );
        assert!(table.check_unlocked(BASELINE_SCENE, &record).is_ok());

        let err = table.check_unlocked("park", &record).unwrap_err();
        assert_eq!(err.to_string(), "corruption must be at least 30 (currently 10)");

        let bold = record.clone().with(Attribute::Corruption, 40).with(Attribute::Shame, 70);
        let err = table.check_unlocked("park", &bold).unwrap_err();
        assert!(matches!(err, SceneLock::Requirement { attribute: Attribute::Shame, .. }));

        let ready = bold.with(Attribute::Shame, 20);
        assert!(table.check_unlocked("park", &ready).is_ok());
        assert_eq!(table.unlocked_scenes(&ready).len(), 2);
    }
}
