/// Scenario engine: gated random narrative events.
///
/// A scenario fires when its attribute conditions, optional time window,
/// optional record predicate and probability draw all pass.
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::schema::character::{Attribute, CharacterRecord};
use crate::schema::condition::ConditionSet;

/// Hours of the local day during which a scenario may fire.
///
/// Half-open `[start_hour, end_hour)`; a window whose end is not after its
/// start wraps past midnight (22..6 covers late evening and early morning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeWindow {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Declarative predicates over the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordPredicate {
    /// At least `seconds` since the last recorded interaction.
    SinceLastInteraction { seconds: i64 },
    /// `attribute > other + margin`
    Exceeds {
        attribute: Attribute,
        other: Attribute,
        margin: i64,
    },
    /// Game day is a positive multiple of `days`.
    EveryNthDay { days: i64 },
}

impl RecordPredicate {
    pub fn holds(&self, record: &CharacterRecord, now: DateTime<Utc>) -> bool {
        match *self {
            Self::SinceLastInteraction { seconds } => record
                .last_interaction
                .is_some_and(|last| (now - last).num_seconds() >= seconds),
            Self::Exceeds {
                attribute,
                other,
                margin,
            } => record.get(attribute) > record.get(other) + margin,
            Self::EveryNthDay { days } => {
                let day = record.get(Attribute::GameDay);
                days > 0 && day > 0 && day % days == 0
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub conditions: ConditionSet,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
    #[serde(default)]
    pub predicate: Option<RecordPredicate>,
    /// Chance in [0, 1] that a qualifying scenario actually fires.
    pub probability: f64,
    #[serde(default)]
    pub trigger_once: bool,
    pub template: String,
}

/// A scenario that fired during one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredScenario {
    pub id: String,
    pub name: String,
    pub template: String,
    pub trigger_once: bool,
}

/// Scenario definitions in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioTable {
    pub scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioTable {
    pub fn new(scenarios: Vec<ScenarioDefinition>) -> Self {
        Self { scenarios }
    }

    /// Whether a scenario passes every deterministic gate.
    pub fn is_eligible(
        &self,
        def: &ScenarioDefinition,
        record: &CharacterRecord,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> bool {
        if def.trigger_once && record.fired_scenarios.contains(&def.id) {
            return false;
        }
        if !def.conditions.is_satisfied(record) {
            return false;
        }
        if let Some(window) = def.time_window {
            if !window.contains(now.with_timezone(&offset).hour()) {
                return false;
            }
        }
        def.predicate.map_or(true, |p| p.holds(record, now))
    }

    /// Every scenario that fires this pass, in declaration order.
    ///
    /// The probability draw happens only for scenarios that pass the other gates.
    pub fn check_triggers<R: Rng + ?Sized>(
        &self,
        record: &CharacterRecord,
        now: DateTime<Utc>,
        offset: FixedOffset,
        rng: &mut R,
    ) -> Vec<TriggeredScenario> {
        let mut fired = Vec::new();
        for def in &self.scenarios {
            if !self.is_eligible(def, record, now, offset) {
                continue;
            }
            if rng.gen::<f64>() >= def.probability {
                continue;
            }
            tracing::debug!(scenario = %def.id, user = %record.user_id, "scenario triggered");
            fired.push(TriggeredScenario {
                id: def.id.clone(),
                name: def.name.clone(),
                template: def.template.clone(),
                trigger_once: def.trigger_once,
            });
        }
        fired
    }
}

/// Remember once-only scenarios so they are skipped from now on.
pub fn mark_fired(record: &mut CharacterRecord, triggered: &[TriggeredScenario]) {
    for scenario in triggered.iter().filter(|s| s.trigger_once) {
        record.fired_scenarios.insert(scenario.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::condition::Condition;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scenario(id: &str, probability: f64) -> ScenarioDefinition {
        ScenarioDefinition {
            id: id.to_string(),
            name: id.to_string(),
            conditions: ConditionSet::new(),
            time_window: None,
            predicate: None,
            probability,
            trigger_once: false,
            template: format!("{} happens", id),
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn all_gates_must_pass() {
        let mut gated = scenario("gated", 1.0);
        gated.conditions = ConditionSet::new()
            .with(Attribute::Affection, Condition::AtLeast(50))
            .with(Attribute::Shame, Condition::Below(30));
        let table = ScenarioTable::new(vec![gated]);
        let mut rng = StdRng::seed_from_u64(7);

        let low = CharacterRecord::new("u", "c").with(Attribute::Affection, 40);
        assert!(table.check_triggers(&low, noon(), utc(), &mut rng).is_empty());

        let shy = CharacterRecord::new("u", "c")
            .with(Attribute::Affection, 60)
            .with(Attribute::Shame, 30);
        assert!(table.check_triggers(&shy, noon(), utc(), &mut rng).is_empty());

        let ready = CharacterRecord::new("u", "c")
            .with(Attribute::Affection, 60)
            .with(Attribute::Shame, 10);
        assert_eq!(table.check_triggers(&ready, noon(), utc(), &mut rng).len(), 1);
    }

    #[test]
    fn multiple_fire_in_declaration_order() {
        let table = ScenarioTable::new(vec![
            scenario("first", 1.0),
            scenario("never", 0.0),
            scenario("second", 1.0),
        ]);
        let record = CharacterRecord::new("u", "c");
        let mut rng = StdRng::seed_from_u64(1);
        let ids: Vec<String> = table
            .check_triggers(&record, noon(), utc(), &mut rng)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn probability_is_roughly_honored() {
        let table = ScenarioTable::new(vec![scenario("coin_flip", 0.5)]);
        let record = CharacterRecord::new("u", "c");
        let mut fired = 0;
        for seed in 0..1000 {
            let mut rng = StdRng::seed_from_u64(seed);
            fired += table.check_triggers(&record, noon(), utc(), &mut rng).len();
        }
        assert!(fired > 400 && fired < 600, "fired {}/1000", fired);
    }

    #[test]
    fn time_window_wraps_midnight() {
        let night = TimeWindow {
            start_hour: 22,
            end_hour: 6,
        };
        assert!(night.contains(23));
        assert!(night.contains(0));
        assert!(night.contains(5));
        assert!(!night.contains(6));
        assert!(!night.contains(12));

        let day = TimeWindow {
            start_hour: 9,
            end_hour: 17,
        };
        assert!(day.contains(9));
        assert!(!day.contains(17));
    }

    #[test]
    fn time_window_uses_configured_offset() {
        let mut late = scenario("late", 1.0);
        late.time_window = Some(TimeWindow {
            start_hour: 22,
            end_hour: 6,
        });
        let table = ScenarioTable::new(vec![late]);
        let record = CharacterRecord::new("u", "c");
        let mut rng = StdRng::seed_from_u64(3);

        // 12:00 UTC is 23:00 at UTC+11.
        let east = FixedOffset::east_opt(11 * 3600).unwrap();
        assert!(table.check_triggers(&record, noon(), utc(), &mut rng).is_empty());
        assert_eq!(table.check_triggers(&record, noon(), east, &mut rng).len(), 1);
    }

    #[test]
    fn record_predicates() {
        let mut record = CharacterRecord::new("u", "c")
            .with(Attribute::Desire, 70)
            .with(Attribute::Affection, 20)
            .with(Attribute::GameDay, 14);

        let absent = RecordPredicate::SinceLastInteraction { seconds: 3600 };
        assert!(!absent.holds(&record, noon()));
        record.last_interaction = Some(noon() - Duration::hours(2));
        assert!(absent.holds(&record, noon()));
        record.last_interaction = Some(noon() - Duration::minutes(5));
        assert!(!absent.holds(&record, noon()));

        let exceeds = RecordPredicate::Exceeds {
            attribute: Attribute::Desire,
            other: Attribute::Affection,
            margin: 40,
        };
        assert!(exceeds.holds(&record, noon()));

        assert!(RecordPredicate::EveryNthDay { days: 7 }.holds(&record, noon()));
        assert!(!RecordPredicate::EveryNthDay { days: 5 }.holds(&record, noon()));
        assert!(!RecordPredicate::EveryNthDay { days: 0 }.holds(&record, noon()));
    }

    #[test]
    fn trigger_once_is_honored_after_marking() {
        let mut once = scenario("confession", 1.0);
        once.trigger_once = true;
        let table = ScenarioTable::new(vec![once, scenario("weather", 1.0)]);
        let mut record = CharacterRecord::new("u", "c");
        let mut rng = StdRng::seed_from_u64(5);

        let first = table.check_triggers(&record, noon(), utc(), &mut rng);
        assert_eq!(first.len(), 2);
        mark_fired(&mut record, &first);
        assert!(record.fired_scenarios.contains("confession"));
        assert!(!record.fired_scenarios.contains("weather"));

        let second = table.check_triggers(&record, noon(), utc(), &mut rng);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, "weather");
    }
}
