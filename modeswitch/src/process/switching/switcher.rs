use super::*;

/// Applies a mode by running its command sequence on the server.
pub struct ModeSwitcher {
    runner: Arc<dyn CommandRunner>,
    // Two command sequences must never interleave.
    lock: tokio::sync::Mutex<()>,
}

impl ModeSwitcher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn run(&self, command_line: &str) -> Result<()> {
        let command_line = command_line.trim();
        if command_line.is_empty() {
            return Ok(());
        }
        debug!("run: {command_line}");
        self.runner
            .run(command_line)
            .await
            .with_context(|| format!("command failed: {command_line}"))
    }

    /// Run the whole sequence and return the map that was loaded.
    /// The first failing command aborts the rest. Nothing is rolled back.
    pub async fn try_switch_to(
        &self,
        mode: &ModeDefinition,
        config: &ModeManagerConfig,
        target_override: Option<&str>,
        map_group: Option<&str>,
        current_map: Option<&str>,
    ) -> Result<String> {
        let _g = self.lock.lock().await;

        self.run(&config.reset_command).await?;

        for plugin in &mode.plugins_to_unload {
            if plugin.trim().is_empty() {
                continue;
            }
            self.run(&format!("css_plugins unload \"{}\"", plugin.trim())).await?;
        }
        for plugin in &mode.plugins_to_load {
            if plugin.trim().is_empty() {
                continue;
            }
            self.run(&format!("css_plugins load \"{}\"", plugin.trim())).await?;
        }

        self.run(&mode.exec_command).await?;

        if config.apply_game_type_mode {
            if let Some(game_type) = mode.game_type {
                self.run(&format!("game_type {game_type}")).await?;
            }
            if let Some(game_mode) = mode.game_mode {
                self.run(&format!("game_mode {game_mode}")).await?;
            }
        }

        if config.end_match_map_vote_enabled {
            if let Some(group) = map_group.map(str::trim).filter(|g| !g.is_empty()) {
                self.run(&format!("mapgroup \"{group}\"")).await?;
            }
            self.run("mp_endmatch_votenextmap 1").await?;
            self.run("mp_match_end_changelevel 1").await?;
            self.run("mp_match_end_restart 0").await?;
        }

        let map = voting::target_map::resolve_target_map(mode, target_override, current_map);
        self.run(&format!("changelevel {map}")).await?;

        Ok(map)
    }
}
