/// Relationship tension: imbalance between affection and desire.
use std::fmt;

use crate::schema::character::{Attribute, CharacterRecord, Effects};

/// Margin by which one side must dominate the other to trigger a crisis.
pub const CRISIS_MARGIN: i64 = 40;
/// Gap at which low trust turns into a breakdown.
pub const BREAKDOWN_GAP: i64 = 50;
pub const BREAKDOWN_TRUST: i64 = 30;
/// Gap used by the balance suggestions.
pub const SUGGESTION_MARGIN: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TensionLevel {
    Harmonious,
    MildImbalance,
    NotableImbalance,
    SevereImbalance,
    Crisis,
}

impl TensionLevel {
    pub fn from_gap(gap: i64) -> Self {
        match gap {
            g if g < 20 => Self::Harmonious,
            g if g < 35 => Self::MildImbalance,
            g if g < 50 => Self::NotableImbalance,
            g if g < 70 => Self::SevereImbalance,
            _ => Self::Crisis,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Harmonious => "harmonious",
            Self::MildImbalance => "mild imbalance",
            Self::NotableImbalance => "notable imbalance",
            Self::SevereImbalance => "severe imbalance",
            Self::Crisis => "crisis",
        }
    }

    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Self::Harmonious | Self::MildImbalance => None,
            Self::NotableImbalance => {
                Some("Feelings and desire are drifting apart. Pay attention to the balance.")
            }
            Self::SevereImbalance => {
                Some("The relationship is badly lopsided. A crisis may be near.")
            }
            Self::Crisis => Some("The relationship is on the edge of breaking."),
        }
    }
}

impl fmt::Display for TensionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tension {
    pub gap: i64,
    pub level: TensionLevel,
    pub warning: Option<&'static str>,
}

pub fn calculate_tension(record: &CharacterRecord) -> Tension {
    let gap = (record.get(Attribute::Affection) - record.get(Attribute::Desire)).abs();
    let level = TensionLevel::from_gap(gap);
    Tension {
        gap,
        level,
        warning: level.warning(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrisisKind {
    LustOverLove,
    LoveOverLust,
    RelationshipBreakdown,
}

impl CrisisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LustOverLove => "lust_over_love",
            Self::LoveOverLust => "love_over_lust",
            Self::RelationshipBreakdown => "relationship_breakdown",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::LustOverLove => "Lust over love",
            Self::LoveOverLust => "Love over lust",
            Self::RelationshipBreakdown => "Relationship breakdown",
        }
    }

    pub fn narrative(&self) -> &'static str {
        match self {
            Self::LustOverLove => {
                "She pulls away. \"Is that all I am to you?\" The question hangs in the air."
            }
            Self::LoveOverLust => {
                "She hesitates, cheeks burning. \"I care about you... but I'm not ready for more.\""
            }
            Self::RelationshipBreakdown => {
                "Cold silence. Whatever held the two of you together is coming apart."
            }
        }
    }

    pub fn penalty(&self) -> Effects {
        match self {
            Self::LustOverLove => Effects::from([
                (Attribute::Affection, -15),
                (Attribute::Trust, -25),
                (Attribute::Resistance, 15),
            ]),
            Self::LoveOverLust => Effects::from([
                (Attribute::Affection, -10),
                (Attribute::Corruption, -10),
                (Attribute::Shame, 20),
            ]),
            Self::RelationshipBreakdown => Effects::from([
                (Attribute::Affection, -25),
                (Attribute::Trust, -30),
                (Attribute::Resistance, 30),
            ]),
        }
    }
}

/// A detected crisis. The caller decides whether to apply the penalty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrisisEvent {
    pub kind: CrisisKind,
    pub title: &'static str,
    pub narrative: &'static str,
    pub penalty: Effects,
}

impl CrisisEvent {
    fn new(kind: CrisisKind) -> Self {
        Self {
            kind,
            title: kind.title(),
            narrative: kind.narrative(),
            penalty: kind.penalty(),
        }
    }

    pub fn apply(&self, record: &mut CharacterRecord) {
        record.apply_effects(&self.penalty);
    }
}

/// First matching crisis wins; conditions are never combined.
pub fn check_crisis(record: &CharacterRecord) -> Option<CrisisEvent> {
    let affection = record.get(Attribute::Affection);
    let desire = record.get(Attribute::Desire);
    let trust = record.get(Attribute::Trust);
    let gap = (affection - desire).abs();

    let kind = if desire > affection + CRISIS_MARGIN {
        CrisisKind::LustOverLove
    } else if affection > desire + CRISIS_MARGIN {
        CrisisKind::LoveOverLust
    } else if trust < BREAKDOWN_TRUST && gap > BREAKDOWN_GAP {
        CrisisKind::RelationshipBreakdown
    } else {
        return None;
    };

    tracing::debug!(crisis = kind.as_str(), affection, desire, trust, "relationship crisis");
    Some(CrisisEvent::new(kind))
}

pub fn balance_suggestion(record: &CharacterRecord) -> &'static str {
    let affection = record.get(Attribute::Affection);
    let desire = record.get(Attribute::Desire);
    if desire > affection + SUGGESTION_MARGIN {
        "Slow down and spend time together without expectations: dates, talks, small gifts."
    } else if affection > desire + SUGGESTION_MARGIN {
        "The bond is strong. Gentle closeness could help the relationship grow."
    } else {
        "Feelings and desire are in balance. Keep it up."
    }
}
