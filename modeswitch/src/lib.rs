#![deny(unused_must_use)]

//! Runtime game mode management for a live multiplayer game server.
//!
//! Players vote to switch mode and map, administrators force a switch,
//! and the switch itself runs as an ordered sequence of server commands
//! after a configurable delay, followed by a cooldown.

mod error;
pub use error::Error;

/// Configuration model, validation and loading.
pub mod config;

/// Interfaces of the host game server.
pub mod host;

/// Messages sent to players.
pub mod message;

/// Command table for base and per-mode commands.
pub mod commands;

/// Implementation of `ModeManager`.
pub mod process;

pub use config::{ConfigProvider, JsonFileConfig, ModeDefinition, ModeManagerConfig};
pub use host::{CommandRunner, GameServer, MapGroupProvisioner, NoMapGroups, Player};
pub use message::Message;
pub use process::{
    Host, ModeManager, PendingSwitchView, StateView, SwitchReason, Timer, TimerHandle,
    TokioTimer, VoteSession, VoterId,
};

use anyhow::{Context, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Map used when neither the mode nor the server knows which map to load.
pub const FALLBACK_MAP: &str = "de_dust2";

/// Case-insensitive comparison used for mode keys and map names.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
