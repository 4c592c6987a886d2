use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::character::{Attribute, CharacterRecord};

/// A single comparison against an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// `value >= n`
    AtLeast(i64),
    /// `value < n`
    Below(i64),
    /// `min <= value <= max`
    Between(i64, i64),
}

impl Condition {
    pub fn holds(&self, value: i64) -> bool {
        match *self {
            Self::AtLeast(min) => value >= min,
            Self::Below(max) => value < max,
            Self::Between(min, max) => value >= min && value <= max,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(min) => write!(f, "at least {}", min),
            Self::Below(max) => write!(f, "below {}", max),
            Self::Between(min, max) => write!(f, "between {} and {}", min, max),
        }
    }
}

/// The first condition a record failed, with the value it had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unmet {
    pub attribute: Attribute,
    pub condition: Condition,
    pub current: i64,
}

impl fmt::Display for Unmet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be {} (currently {})",
            self.attribute, self.condition, self.current
        )
    }
}

/// Attribute conditions ANDed together. Missing attributes read as 0.
///
/// Iteration follows `Attribute` declaration order, which fixes which
/// failure gets reported when several conditions fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(BTreeMap<Attribute, Condition>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: Attribute, condition: Condition) -> Self {
        self.0.insert(attribute, condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, Condition)> + '_ {
        self.0.iter().map(|(a, c)| (*a, *c))
    }

    pub fn first_unmet(&self, record: &CharacterRecord) -> Option<Unmet> {
        self.0.iter().find_map(|(&attribute, &condition)| {
            let current = record.get(attribute);
            (!condition.holds(current)).then_some(Unmet {
                attribute,
                condition,
                current,
            })
        })
    }

    pub fn is_satisfied(&self, record: &CharacterRecord) -> bool {
        self.first_unmet(record).is_none()
    }
}

impl FromIterator<(Attribute, Condition)> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = (Attribute, Condition)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
