//! Utilities shared by the Watchhub crates.

pub mod logger;
pub mod time;
