pub mod config;
pub mod streak;
