//! Real-time watch-party coordination server library.
//!
//! Tracks authenticated WebSocket connections and user presence, keeps the
//! authoritative playback state of watch-party rooms, and fans out direct
//! chat and friend-request events to every connection of the users involved.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
