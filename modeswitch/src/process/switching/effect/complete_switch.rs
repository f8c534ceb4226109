use super::*;

pub struct Effect<'a> {
    pub state: &'a mut RuntimeState,
    pub config: &'a ModeManagerConfig,
    pub server: &'a dyn GameServer,
}

impl Effect<'_> {
    /// Apply the outcome of a switch.
    /// Returns whether the initial mode was queued again for a retry.
    pub fn exec(self, pending: &PendingSwitch, result: Result<String>) -> bool {
        let mode = &pending.mode;
        match result {
            Ok(map) => {
                self.state.start_cooldown(self.config.switch_cooldown_seconds);
                self.state.active_mode_key = Some(mode.key.clone());
                if pending.reason.is_startup() {
                    self.state.mark_initial_mode_applied();
                }
                info!("mode {} applied on {map} ({})", mode.key, pending.reason);
                self.server.broadcast(&Message::ModeChanged {
                    mode: mode.display_name.clone(),
                    map,
                });
                false
            }
            Err(e) => {
                error!("failed to apply mode {}: {e:#}", mode.key);
                self.server.broadcast(&Message::ModeApplyFailed {
                    mode: mode.display_name.clone(),
                });
                !self.state.stopped
                    && pending.reason.is_startup()
                    && self.state.queue_initial_mode(Some(&mode.key), true)
            }
        }
    }
}
