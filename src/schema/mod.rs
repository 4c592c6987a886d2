pub mod character;
pub mod condition;
