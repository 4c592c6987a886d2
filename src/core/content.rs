/// Authored content tables: embedded defaults, on-disk overrides and validation.
use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::core::dating::{ActivityCatalog, ActivityDefinition};
use crate::core::ending::{EndingRoute, EndingTable};
use crate::core::personality::PersonalityTable;
use crate::core::scenario::ScenarioTable;
use crate::core::scene::{SceneDefinition, SceneTable};
use crate::core::training::{TrainingTable, MASTERY};
use crate::schema::condition::{Condition, ConditionSet};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid content: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Embedded game data: compiled into the library
// ---------------------------------------------------------------------------
mod data {
    pub const TRAINING: &str = include_str!("../../game_data/training.ron");
    pub const ENDINGS: &str = include_str!("../../game_data/endings.ron");
    pub const SCENARIOS: &str = include_str!("../../game_data/scenarios.ron");
    pub const ACTIVITIES: &str = include_str!("../../game_data/activities.ron");
    pub const SCENES: &str = include_str!("../../game_data/scenes.ron");
    pub const PERSONALITIES: &str = include_str!("../../game_data/personalities.ron");
}

/// File names recognised by `GameContent::load_dir`.
pub const TABLE_FILES: [&str; 6] = [
    "training.ron",
    "endings.ron",
    "scenarios.ron",
    "activities.ron",
    "scenes.ron",
    "personalities.ron",
];

/// Every static rule table, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct GameContent {
    pub training: TrainingTable,
    pub endings: EndingTable,
    pub scenarios: ScenarioTable,
    pub activities: ActivityCatalog,
    pub scenes: SceneTable,
    pub personalities: PersonalityTable,
}

impl GameContent {
    /// The tables shipped with the crate.
    pub fn builtin() -> Result<Self, ContentError> {
        Ok(Self {
            training: parse_table(data::TRAINING)?,
            endings: parse_table(data::ENDINGS)?,
            scenarios: parse_table(data::SCENARIOS)?,
            activities: parse_table(data::ACTIVITIES)?,
            scenes: SceneTable::new(parse_table::<Vec<SceneDefinition>>(data::SCENES)?),
            personalities: parse_table(data::PERSONALITIES)?,
        })
    }

    /// Replace tables with any `TABLE_FILES` present in `dir`.
    /// Returns how many tables were replaced.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ContentError> {
        let mut replaced = 0;
        for file in TABLE_FILES {
            let path = dir.join(file);
            if !path.is_file() {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            match file {
                "training.ron" => self.training = parse_table(&contents)?,
                "endings.ron" => self.endings = parse_table(&contents)?,
                "scenarios.ron" => self.scenarios = parse_table(&contents)?,
                "activities.ron" => self.activities = parse_table(&contents)?,
                "scenes.ron" => {
                    self.scenes = SceneTable::new(parse_table::<Vec<SceneDefinition>>(&contents)?)
                }
                "personalities.ron" => self.personalities = parse_table(&contents)?,
                _ => continue,
            }
            tracing::info!(path = %path.display(), "loaded content table");
            replaced += 1;
        }
        Ok(replaced)
    }

    /// Authoring problems that would make rules misbehave.
    pub fn validate(&self) -> Vec<ContentIssue> {
        let mut issues = Vec::new();

        let mut actions: Vec<_> = self.training.actions.iter().collect();
        actions.sort_by(|a, b| a.0.cmp(b.0));
        for (name, def) in actions {
            if def.training_needed == 0 {
                issues.push(ContentIssue::error(format!(
                    "training '{}': training_needed must be positive",
                    name
                )));
            } else if def.increment() == 0 {
                issues.push(ContentIssue::error(format!(
                    "training '{}': training_needed {} exceeds max_progress {}, action never progresses",
                    name, def.training_needed, def.max_progress
                )));
            }
            if def.max_progress < MASTERY && !def.unlock_variants.is_empty() {
                issues.push(ContentIssue::warning(format!(
                    "training '{}': max_progress {} never reaches mastery, variants stay locked",
                    name, def.max_progress
                )));
            }
        }

        for route in [EndingRoute::Emotional, EndingRoute::Sexual] {
            let mut seen = FxHashSet::default();
            for ending in self.endings.route(route) {
                let context = format!("{} ending '{}'", route, ending.id);
                if !seen.insert(ending.id.as_str()) {
                    issues.push(ContentIssue::error(format!("{}: duplicate id", context)));
                }
                if ending.conditions.is_empty() {
                    issues.push(ContentIssue::warning(format!(
                        "{}: no conditions, always qualifies",
                        context
                    )));
                }
                check_conditions(&context, &ending.conditions, &mut issues);
            }
        }

        let mut seen = FxHashSet::default();
        for scenario in &self.scenarios.scenarios {
            let context = format!("scenario '{}'", scenario.id);
            if !seen.insert(scenario.id.as_str()) {
                issues.push(ContentIssue::error(format!("{}: duplicate id", context)));
            }
            if !(0.0..=1.0).contains(&scenario.probability) {
                issues.push(ContentIssue::error(format!(
                    "{}: probability {} outside [0, 1]",
                    context, scenario.probability
                )));
            }
            if let Some(window) = scenario.time_window {
                if window.start_hour > 23 || window.end_hour > 24 {
                    issues.push(ContentIssue::error(format!(
                        "{}: time window {}..{} is not a valid hour range",
                        context, window.start_hour, window.end_hour
                    )));
                }
            }
            check_conditions(&context, &scenario.conditions, &mut issues);
        }

        check_activities(&self.activities.activities, &mut issues);

        let mut seen = FxHashSet::default();
        for scene in self.scenes.scenes() {
            let context = format!("scene '{}'", scene.id);
            if !seen.insert(scene.id.as_str()) {
                issues.push(ContentIssue::error(format!("{}: duplicate id", context)));
            }
            if scene.effect_multiplier <= 0.0 {
                issues.push(ContentIssue::error(format!(
                    "{}: effect_multiplier must be positive",
                    context
                )));
            }
            check_conditions(&context, &scene.requirements, &mut issues);
        }

        issues
    }
}

fn check_activities(activities: &[ActivityDefinition], issues: &mut Vec<ContentIssue>) {
    let mut seen = FxHashSet::default();
    for activity in activities {
        let context = format!("activity '{}'", activity.id);
        if !seen.insert(activity.id.as_str()) {
            issues.push(ContentIssue::error(format!("{}: duplicate id", context)));
        }
        if activity.ap_cost < 0 || activity.coin_cost < 0 {
            issues.push(ContentIssue::error(format!("{}: negative cost", context)));
        }
        if activity.effects.is_empty() {
            issues.push(ContentIssue::warning(format!("{}: has no effects", context)));
        }
        check_conditions(&context, &activity.requirements, issues);
    }
}

fn check_conditions(context: &str, conditions: &ConditionSet, issues: &mut Vec<ContentIssue>) {
    for (attr, condition) in conditions.iter() {
        if let Condition::Between(min, max) = condition {
            if min > max {
                issues.push(ContentIssue::error(format!(
                    "{}: {} range {}..{} is empty",
                    context, attr, min, max
                )));
            }
        }
    }
}

/// Parse one table from RON.
pub fn parse_table<T: DeserializeOwned>(input: &str) -> Result<T, ContentError> {
    Ok(ron::from_str(input)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIssue {
    pub severity: Severity,
    pub message: String,
}

impl ContentIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "ERROR: {}", self.message),
            Severity::Warning => write!(f, "WARN: {}", self.message),
        }
    }
}
