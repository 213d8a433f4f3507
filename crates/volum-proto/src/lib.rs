//! Shared types for volumtui: the player snapshot, the transport command
//! vocabulary, configuration and platform paths.

pub mod config;
pub mod platform;
pub mod protocol;
pub mod state;
