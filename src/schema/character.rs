use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::content::ContentError;

/// A named integer trait on a character.
///
/// The serde names are the attribute strings persisted by the host, so
/// renaming a variant breaks existing save data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Affection,
    Intimacy,
    Trust,
    Corruption,
    Submission,
    Resistance,
    Shame,
    Desire,
    Arousal,
    Coins,
    ActionPoints,
    GameDay,
    InteractionCount,
    TotalArousalGained,
}

impl Attribute {
    pub const ALL: [Attribute; 14] = [
        Self::Affection,
        Self::Intimacy,
        Self::Trust,
        Self::Corruption,
        Self::Submission,
        Self::Resistance,
        Self::Shame,
        Self::Desire,
        Self::Arousal,
        Self::Coins,
        Self::ActionPoints,
        Self::GameDay,
        Self::InteractionCount,
        Self::TotalArousalGained,
    ];

    /// The persisted attribute name (e.g., "action_points").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Affection => "affection",
            Self::Intimacy => "intimacy",
            Self::Trust => "trust",
            Self::Corruption => "corruption",
            Self::Submission => "submission",
            Self::Resistance => "resistance",
            Self::Shame => "shame",
            Self::Desire => "desire",
            Self::Arousal => "arousal",
            Self::Coins => "coins",
            Self::ActionPoints => "action_points",
            Self::GameDay => "game_day",
            Self::InteractionCount => "interaction_count",
            Self::TotalArousalGained => "total_arousal_gained",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }

    /// True for the 0–100 personality traits; counters and balances are unbounded.
    pub fn is_percent(&self) -> bool {
        matches!(
            self,
            Self::Affection
                | Self::Intimacy
                | Self::Trust
                | Self::Corruption
                | Self::Submission
                | Self::Resistance
                | Self::Shame
                | Self::Desire
                | Self::Arousal
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute deltas produced by an evaluator, applied by the caller.
pub type Effects = BTreeMap<Attribute, i64>;

/// Per-action training percentages (0–100).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingProgress(BTreeMap<String, u32>);

impl TrainingProgress {
    pub fn get(&self, action: &str) -> u32 {
        self.0.get(action).copied().unwrap_or(0).min(100)
    }

    pub fn set(&mut self, action: &str, percent: u32) {
        self.0.insert(action.to_string(), percent.min(100));
    }

    pub fn contains(&self, action: &str) -> bool {
        self.0.contains_key(action)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode for the persistence layer, which stores the map as text.
    pub fn to_json(&self) -> Result<String, ContentError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Decode the persisted text form. Empty input is an empty map.
    pub fn from_json(input: &str) -> Result<Self, ContentError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: BTreeMap<String, i64> = serde_json::from_str(input)?;
        Ok(Self(
            raw.into_iter()
                .map(|(k, v)| (k, v.clamp(0, 100) as u32))
                .collect(),
        ))
    }
}

/// The mutable character aggregate every evaluator reads or updates.
///
/// Owned by the host; this crate never persists it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub user_id: String,
    pub chat_id: String,
    #[serde(default)]
    pub attributes: BTreeMap<Attribute, i64>,
    #[serde(default)]
    pub training_progress: TrainingProgress,
    /// Ids of once-only scenarios that already fired for this character.
    #[serde(default)]
    pub fired_scenarios: FxHashSet<String>,
    #[serde(default)]
    pub last_interaction: Option<DateTime<Utc>>,
}

impl CharacterRecord {
    pub fn new(user_id: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            chat_id: chat_id.into(),
            ..Self::default()
        }
    }

    /// Attribute value, 0 when never set.
    pub fn get(&self, attr: Attribute) -> i64 {
        self.attributes.get(&attr).copied().unwrap_or(0)
    }

    pub fn set(&mut self, attr: Attribute, value: i64) {
        self.attributes.insert(attr, value);
    }

    /// Add a raw delta with no clamping.
    pub fn add(&mut self, attr: Attribute, delta: i64) {
        *self.attributes.entry(attr).or_insert(0) += delta;
    }

    /// Apply evaluator output, keeping percent attributes within 0–100.
    pub fn apply_effects(&mut self, effects: &Effects) {
        for (&attr, &delta) in effects {
            let next = self.get(attr) + delta;
            let next = if attr.is_percent() {
                next.clamp(0, 100)
            } else {
                next
            };
            self.set(attr, next);
        }
    }

    /// Builder-style setter for tests and fixtures.
    pub fn with(mut self, attr: Attribute, value: i64) -> Self {
        self.set(attr, value);
        self
    }
}
