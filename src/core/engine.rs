/// The engine facade: loaded content plus the clock, RNG and transient stores.
///
/// Hosts build one engine per process and route every command through it.
/// Records stay owned by the host; the engine only reads and mutates them.
use chrono::{Duration, FixedOffset};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::core::clock::{Clock, SystemClock};
use crate::core::confirmation::{ConfirmationStore, DEFAULT_CONFIRMATION_TIMEOUT_SECS};
use crate::core::content::{ContentError, GameContent};
use crate::core::cooldown::{CooldownStore, DEFAULT_COOLDOWN_MAX_AGE_SECS};
use crate::core::dating::{
    ActionPointLedger, ActivityCatalog, ActivityOutcome, ActivityRefusal, RecordActionPoints,
};
use crate::core::ending::EndingTable;
use crate::core::personality::PersonalityTable;
use crate::core::scenario::{mark_fired, ScenarioTable, TriggeredScenario};
use crate::core::scene::{SceneDefinition, SceneTable};
use crate::core::training::TrainingTable;
use crate::schema::character::{CharacterRecord, Effects};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Config(String),
}

/// Tunables read from an `engine.ron` file or set in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub confirmation_timeout_secs: i64,
    pub cooldown_max_age_secs: i64,
    /// Offset used to read the local hour for scenario time windows.
    /// Defaults to UTC; hosts set their own offset to get local-time windows.
    pub utc_offset_hours: i32,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            cooldown_max_age_secs: DEFAULT_COOLDOWN_MAX_AGE_SECS,
            utc_offset_hours: 0,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    fn utc_offset(&self) -> Result<FixedOffset, EngineError> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            EngineError::Config(format!("utc_offset_hours {} out of range", self.utc_offset_hours))
        })
    }

    fn confirmation_timeout(&self) -> Result<Duration, EngineError> {
        positive_seconds("confirmation_timeout_secs", self.confirmation_timeout_secs)
    }

    fn cooldown_max_age(&self) -> Result<Duration, EngineError> {
        positive_seconds("cooldown_max_age_secs", self.cooldown_max_age_secs)
    }
}

fn positive_seconds(field: &str, secs: i64) -> Result<Duration, EngineError> {
    if secs <= 0 {
        return Err(EngineError::Config(format!("{} must be positive, got {}", field, secs)));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| EngineError::Config(format!("{} {} out of range", field, secs)))
}

/// Opaque payload carried by a pending confirmation.
pub type ConfirmationPayload = serde_json::Value;

pub struct RelationshipEngine {
    content: GameContent,
    config: EngineConfig,
    offset: FixedOffset,
    cooldown_max_age: Duration,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    ledger: Box<dyn ActionPointLedger + Send + Sync>,
    confirmations: ConfirmationStore<ConfirmationPayload>,
    cooldowns: CooldownStore,
}

/// Builder for constructing a `RelationshipEngine`.
pub struct RelationshipEngineBuilder {
    content_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    config: Option<EngineConfig>,
    seed: Option<u64>,
    clock: Option<Arc<dyn Clock>>,
    ledger: Option<Box<dyn ActionPointLedger + Send + Sync>>,
    /// Directly provided content (for testing without files).
    content: Option<GameContent>,
}

impl RelationshipEngine {
    pub fn builder() -> RelationshipEngineBuilder {
        RelationshipEngineBuilder {
            content_dir: None,
            config_path: None,
            config: None,
            seed: None,
            clock: None,
            ledger: None,
            content: None,
        }
    }

    pub fn content(&self) -> &GameContent {
        &self.content
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn training(&self) -> &TrainingTable {
        &self.content.training
    }

    pub fn endings(&self) -> &EndingTable {
        &self.content.endings
    }

    pub fn scenarios(&self) -> &ScenarioTable {
        &self.content.scenarios
    }

    pub fn activities(&self) -> &ActivityCatalog {
        &self.content.activities
    }

    pub fn scenes(&self) -> &SceneTable {
        &self.content.scenes
    }

    pub fn personalities(&self) -> &PersonalityTable {
        &self.content.personalities
    }

    pub fn confirmations(&self) -> &ConfirmationStore<ConfirmationPayload> {
        &self.confirmations
    }

    pub fn cooldowns(&self) -> &CooldownStore {
        &self.cooldowns
    }

    pub fn ledger(&self) -> &dyn ActionPointLedger {
        &*self.ledger
    }

    /// Roll this pass's random events and remember once-only ones on the record.
    pub fn roll_scenarios(&mut self, record: &mut CharacterRecord) -> Vec<TriggeredScenario> {
        let now = self.clock.now();
        let fired = self
            .content
            .scenarios
            .check_triggers(record, now, self.offset, &mut self.rng);
        mark_fired(record, &fired);
        fired
    }

    pub fn can_do_activity(&self, record: &CharacterRecord, id: &str) -> Result<(), ActivityRefusal> {
        self.content.activities.can_do(record, id, self.ledger())
    }

    /// Check, charge and scale an activity in one step.
    ///
    /// Returns the outcome with its effects already passed through the scene
    /// modifiers, plus the scene hint. The effects are not applied.
    pub fn do_activity(
        &self,
        record: &mut CharacterRecord,
        id: &str,
        scene_id: &str,
    ) -> Result<(ActivityOutcome, String), ActivityRefusal> {
        if let Err(refusal) = self.can_do_activity(record, id) {
            tracing::debug!(activity = id, %refusal, "activity refused");
            return Err(refusal);
        }
        let mut outcome = self.content.activities.execute(record, id, self.ledger())?;
        let (effects, hint) = self.content.scenes.apply_effects(&outcome.effects, scene_id);
        outcome.effects = effects;
        Ok((outcome, hint))
    }

    /// Scale an interaction by personality first, then by scene.
    pub fn interaction_effects(
        &self,
        base: &Effects,
        personality: Option<&str>,
        scene_id: &str,
    ) -> (Effects, String) {
        let base = match personality.and_then(|id| self.content.personalities.get(id)) {
            Some(def) => def.apply(base),
            None => base.clone(),
        };
        self.content.scenes.apply_effects(&base, scene_id)
    }

    pub fn scene(&self, id: &str) -> &SceneDefinition {
        self.content.scenes.get_scene_effect(id)
    }

    /// Purge expired confirmations and stale cooldowns.
    pub fn sweep(&self) -> (usize, usize) {
        let confirmations = self.confirmations.sweep_expired();
        let cooldowns = self.cooldowns.sweep_older_than(self.cooldown_max_age);
        (confirmations, cooldowns)
    }
}

impl RelationshipEngineBuilder {
    /// Directory whose table files override the embedded content.
    pub fn content_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.content_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides any seed from the config.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn ledger(mut self, ledger: Box<dyn ActionPointLedger + Send + Sync>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Provide content directly (for testing without files).
    pub fn with_content(mut self, content: GameContent) -> Self {
        self.content = Some(content);
        self
    }

    pub fn build(self) -> Result<RelationshipEngine, EngineError> {
        let mut config = match (self.config, &self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => EngineConfig::load_from_ron(path)?,
            (None, None) => EngineConfig::default(),
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        let offset = config.utc_offset()?;
        let confirmation_timeout = config.confirmation_timeout()?;
        let cooldown_max_age = config.cooldown_max_age()?;

        let mut content = match self.content {
            Some(content) => content,
            None => GameContent::builtin()?,
        };
        if let Some(ref dir) = self.content_dir {
            if dir.is_dir() {
                content.load_dir(dir)?;
            } else {
                tracing::warn!(dir = %dir.display(), "content directory not found, using built-in tables");
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let confirmations = ConfirmationStore::with_timeout(clock.clone(), confirmation_timeout);
        let cooldowns = CooldownStore::new(clock.clone());

        tracing::info!(
            actions = content.training.actions.len(),
            scenarios = content.scenarios.scenarios.len(),
            activities = content.activities.activities.len(),
            scenes = content.scenes.scenes().len(),
            "relationship engine ready"
        );

        Ok(RelationshipEngine {
            content,
            config,
            offset,
            cooldown_max_age,
            clock,
            rng,
            ledger: self.ledger.unwrap_or_else(|| Box::new(RecordActionPoints)),
            confirmations,
            cooldowns,
        })
    }
}
