use super::*;

/// Startup switches never run sooner than this.
const STARTUP_MIN_DELAY_SECS: i64 = 3;

pub struct Effect<'a> {
    pub state: &'a mut RuntimeState,
    pub config: &'a ModeManagerConfig,
    pub server: &'a dyn GameServer,
    pub timer: &'a dyn Timer,
    pub trigger: Trigger,
}

impl Effect<'_> {
    /// Replace any pending switch with a new one.
    ///
    /// Returns the ticket when the switch must run right away.
    /// The caller executes it after releasing the state.
    pub fn exec(
        self,
        mode: ModeDefinition,
        reason: SwitchReason,
        target_map: Option<String>,
    ) -> Option<u64> {
        cancel_switch::Effect {
            state: &mut *self.state,
        }
        .exec("new_schedule");

        let ticket = self.state.issue_ticket();
        let min_delay = if reason.is_startup() {
            STARTUP_MIN_DELAY_SECS
        } else {
            0
        };
        let delay = self.config.switch_delay_seconds.max(min_delay) as u64;

        let current_map = self.server.current_map();
        let map = voting::target_map::resolve_target_map(
            &mode,
            target_map.as_deref(),
            current_map.as_deref(),
        );

        let mut pending = PendingSwitch {
            mode,
            reason,
            target_map,
            ticket,
            timer: None,
        };

        if delay == 0 {
            self.server.broadcast(&Message::SwitchApprovedNow {
                mode: pending.mode.display_name.clone(),
                map,
            });
            self.state.pending = Some(pending);
            return Some(ticket);
        }

        let exec_reason = if reason.is_startup() {
            self.server.broadcast(&Message::InitialModeScheduled {
                mode: pending.mode.display_name.clone(),
                seconds: delay,
            });
            "startup_firstplayer_delay"
        } else {
            self.server.broadcast(&Message::SwitchApprovedIn {
                mode: pending.mode.display_name.clone(),
                map,
                seconds: delay,
            });
            "delay"
        };
        info!(
            "switch to {} scheduled in {delay}s ({reason})",
            pending.mode.key
        );

        let hdl = self.timer.schedule(
            Duration::from_secs(delay),
            self.trigger.fire(ticket, exec_reason),
        );
        pending.timer = Some(hdl);
        self.state.pending = Some(pending);
        None
    }
}
