use super::*;

/// A connected entity on the game server.
///
/// Handles are borrowed for the duration of one call.
/// Every use must be preceded by `is_valid`.
pub trait Player: Send + Sync {
    /// The handle still refers to a connected entity.
    fn is_valid(&self) -> bool;

    /// Broadcast or replay relay connection.
    fn is_relay(&self) -> bool;

    fn is_bot(&self) -> bool;

    /// Durable platform identifier. Zero means unknown.
    fn platform_id(&self) -> Option<u64>;

    /// Identifier of the current connection.
    fn session_id(&self) -> Option<i32>;

    fn has_permission(&self, flag: &str) -> bool;
}

/// Live server the mode manager runs on.
pub trait GameServer: Send + Sync + 'static {
    fn players(&self) -> Vec<Arc<dyn Player>>;

    /// Name of the map currently loaded.
    fn current_map(&self) -> Option<String>;

    /// Send a message to every connected player.
    fn broadcast(&self, message: &Message);
}

/// Executes server console commands.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    async fn run(&self, command_line: &str) -> Result<()>;
}

/// Prepares the end-of-match map vote for a mode.
pub trait MapGroupProvisioner: Send + Sync + 'static {
    /// Returns the name of the map group to select, if any.
    fn prepare(&self, config: &ModeManagerConfig, mode: &ModeDefinition) -> Option<String>;
}

/// Never provides a map group.
pub struct NoMapGroups;

impl MapGroupProvisioner for NoMapGroups {
    fn prepare(&self, _: &ModeManagerConfig, _: &ModeDefinition) -> Option<String> {
        None
    }
}
