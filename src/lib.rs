//! Relationship Engine: character-state evaluation for relationship simulation games.
//!
//! Maps a mutable character attribute record to derived outcomes: training
//! multipliers, scene modifiers, activity costs, relationship tension, random
//! narrative events and ending selection. All rule tables are authored data
//! loaded once; the host owns persistence and presentation.

pub mod core;
pub mod schema;
