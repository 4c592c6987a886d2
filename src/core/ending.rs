/// Dual endings: ranked emotional-route and sexual-route ending tables.
///
/// Each route is evaluated independently, so a character can qualify for one
/// ending from each table at the same time.
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

use crate::schema::character::{Attribute, CharacterRecord};
use crate::schema::condition::ConditionSet;

/// Which ending table to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndingRoute {
    Emotional,
    Sexual,
}

impl fmt::Display for EndingRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emotional => write!(f, "emotional"),
            Self::Sexual => write!(f, "sexual"),
        }
    }
}

/// An authored ending and the attribute conditions that unlock it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndingDefinition {
    pub id: String,
    pub name: String,
    pub tier: String,
    /// Higher wins when several endings qualify.
    pub priority: i32,
    pub conditions: ConditionSet,
    pub description: String,
}

/// Both ending tables, each in authored order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndingTable {
    pub emotional: Vec<EndingDefinition>,
    pub sexual: Vec<EndingDefinition>,
}

impl EndingTable {
    pub fn route(&self, route: EndingRoute) -> &[EndingDefinition] {
        match route {
            EndingRoute::Emotional => &self.emotional,
            EndingRoute::Sexual => &self.sexual,
        }
    }

    /// Every qualifying ending, highest priority first. Equal priorities keep
    /// their authored order.
    pub fn all_possible(&self, route: EndingRoute, record: &CharacterRecord) -> Vec<&EndingDefinition> {
        let mut matches: Vec<&EndingDefinition> = self
            .route(route)
            .iter()
            .filter(|def| def.conditions.is_satisfied(record))
            .collect();
        matches.sort_by_key(|def| Reverse(def.priority));
        matches
    }

    /// The highest-priority qualifying ending for a route.
    pub fn check(&self, route: EndingRoute, record: &CharacterRecord) -> Option<&EndingDefinition> {
        let best = self.all_possible(route, record).into_iter().next();
        if let Some(def) = best {
            tracing::debug!(%route, ending = %def.id, priority = def.priority, "ending reached");
        }
        best
    }

    pub fn check_emotion_ending(&self, record: &CharacterRecord) -> Option<&EndingDefinition> {
        self.check(EndingRoute::Emotional, record)
    }

    pub fn check_sexual_ending(&self, record: &CharacterRecord) -> Option<&EndingDefinition> {
        self.check(EndingRoute::Sexual, record)
    }

    pub fn all_possible_emotion_endings(&self, record: &CharacterRecord) -> Vec<&EndingDefinition> {
        self.all_possible(EndingRoute::Emotional, record)
    }

    pub fn all_possible_sexual_endings(&self, record: &CharacterRecord) -> Vec<&EndingDefinition> {
        self.all_possible(EndingRoute::Sexual, record)
    }
}

const FINAL_STATE: [Attribute; 6] = [
    Attribute::Affection,
    Attribute::Trust,
    Attribute::Intimacy,
    Attribute::Desire,
    Attribute::Corruption,
    Attribute::Submission,
];

/// Render the combined ending screen from both resolved endings and the final record.
pub fn render_dual_ending(
    emotional: Option<&EndingDefinition>,
    sexual: Option<&EndingDefinition>,
    record: &CharacterRecord,
) -> String {
    let mut out = String::from("=== Ending ===\n");
    for (route, ending) in [(EndingRoute::Emotional, emotional), (EndingRoute::Sexual, sexual)] {
        match ending {
            Some(def) => out.push_str(&format!(
                "[{} route] {} ({})\n{}\n",
                route, def.name, def.tier, def.description
            )),
            None => out.push_str(&format!("[{} route] no ending reached\n", route)),
        }
    }

    out.push_str("--- Final state ---\n");
    for attr in FINAL_STATE {
        out.push_str(&format!("{}: {}\n", attr, record.get(attr)));
    }
    out.push_str(&format!("days together: {}\n", record.get(Attribute::GameDay)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::condition::Condition;

    fn ending(id: &str, priority: i32, conditions: ConditionSet) -> EndingDefinition {
        EndingDefinition {
            id: id.to_string(),
            name: id.replace('_', " "),
            tier: "test".to_string(),
            priority,
            conditions,
            description: format!("{} description", id),
        }
    }

    fn table() -> EndingTable {
        EndingTable {
            emotional: vec![
                ending(
                    "friends",
                    10,
                    ConditionSet::new().with(Attribute::Affection, Condition::AtLeast(30)),
                ),
                ending(
                    "soulmates",
                    90,
                    ConditionSet::new()
                        .with(Attribute::Affection, Condition::AtLeast(90))
                        .with(Attribute::Trust, Condition::AtLeast(80)),
                ),
                ending(
                    "lovers",
                    50,
                    ConditionSet::new()
                        .with(Attribute::Affection, Condition::AtLeast(70))
                        .with(Attribute::Corruption, Condition::Between(0, 40)),
                ),
                ending(
                    "companions",
                    50,
                    ConditionSet::new().with(Attribute::Affection, Condition::AtLeast(60)),
                ),
            ],
            sexual: vec![ending(
                "awakened",
                40,
                ConditionSet::new().with(Attribute::Desire, Condition::AtLeast(60)),
            )],
        }
    }

    #[test]
    fn highest_priority_wins() {
        let record = CharacterRecord::new("u", "c")
            .with(Attribute::Affection, 95)
            .with(Attribute::Trust, 85);
        let best = table().check_emotion_ending(&record).map(|d| d.id.clone());
        assert_eq!(best.as_deref(), Some("soulmates"));
    }

    #[test]
    fn ties_keep_authored_order() {
        let record = CharacterRecord::new("u", "c").with(Attribute::Affection, 75);
        let table = table();
        let all: Vec<&str> = table
            .all_possible_emotion_endings(&record)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(all, vec!["lovers", "companions", "friends"]);
        assert_eq!(table.check_emotion_ending(&record).unwrap().id, "lovers");
    }

    #[test]
    fn range_upper_bound_excludes() {
        let record = CharacterRecord::new("u", "c")
            .with(Attribute::Affection, 75)
            .with(Attribute::Corruption, 41);
        assert_eq!(table().check_emotion_ending(&record).unwrap().id, "companions");
    }

    #[test]
    fn routes_are_independent() {
        let record = CharacterRecord::new("u", "c")
            .with(Attribute::Affection, 35)
            .with(Attribute::Desire, 70);
        let table = table();
        assert_eq!(table.check_emotion_ending(&record).unwrap().id, "friends");
        assert_eq!(table.check_sexual_ending(&record).unwrap().id, "awakened");
        assert!(table
            .check_sexual_ending(&CharacterRecord::new("u", "c"))
            .is_none());
    }

    #[test]
    fn dual_ending_screen() {
        let record = CharacterRecord::new("u", "c")
            .with(Attribute::Affection, 35)
            .with(Attribute::GameDay, 42);
        let table = table();
        let text = render_dual_ending(table.check_emotion_ending(&record), None, &record);
        assert!(text.contains("[emotional route] friends"));
        assert!(text.contains("[sexual route] no ending reached"));
        assert!(text.contains("affection: 35"));
        assert!(text.contains("days together: 42"));
    }
}
