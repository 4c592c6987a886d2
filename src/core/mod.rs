pub mod clock;
pub mod confirmation;
pub mod content;
pub mod cooldown;
pub mod dating;
pub mod engine;
pub mod ending;
pub mod personality;
pub mod scenario;
pub mod scene;
pub mod tension;
pub mod training;
