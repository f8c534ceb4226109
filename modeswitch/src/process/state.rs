use super::*;

/// Why a switch was scheduled.
#[derive(Display, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchReason {
    #[display("vote")]
    Vote,
    #[display("console")]
    Console,
    #[display("admin_mode_command")]
    AdminModeCommand,
    #[display("startup_firstplayer")]
    StartupFirstPlayer,
}

impl SwitchReason {
    pub fn is_startup(&self) -> bool {
        matches!(self, SwitchReason::StartupFirstPlayer)
    }
}

/// A scheduled, not yet executed mode change.
pub struct PendingSwitch {
    pub mode: ModeDefinition,
    pub reason: SwitchReason,
    pub target_map: Option<String>,
    /// Identifies this schedule. A timer only executes the pending switch
    /// that carries the ticket it was armed with.
    pub ticket: u64,
    pub timer: Option<TimerHandle>,
}

impl PendingSwitch {
    pub fn kill_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.kill();
        }
    }
}

#[derive(Default, Debug)]
pub struct InitialMode {
    pub queued: bool,
    pub key: Option<String>,
    pub applied: bool,
}

#[derive(Default)]
pub struct Threads {
    pub vote_expiry: Option<ThreadHandle>,
    pub initial_mode: Option<ThreadHandle>,
}

/// Process-wide state of the mode manager.
/// Only the vote coordinator and the switch scheduler write to it.
#[derive(Default)]
pub struct RuntimeState {
    /// Unknown until the first successful switch unless seeded from config.
    pub active_mode_key: Option<String>,
    pub cooldown_until: Option<Instant>,
    pub pending: Option<PendingSwitch>,
    pub votes: VoteSessionStore,
    pub initial_mode: InitialMode,
    pub commands: CommandTable,
    pub threads: Threads,
    /// Set by `unload`. Nothing new is started while stopped.
    pub stopped: bool,
    last_ticket: u64,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue_ticket(&mut self) -> u64 {
        self.last_ticket += 1;
        self.last_ticket
    }

    pub fn is_mode_active(&self, mode: &ModeDefinition) -> bool {
        self.active_mode_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty() && eq_ignore_case(key, &mode.key))
    }

    pub fn seed_active_mode_from_config(&mut self, config: &ModeManagerConfig) {
        if self
            .active_mode_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
        {
            return;
        }
        let Some(key) = config.initial_mode_key.as_deref().map(str::trim) else {
            return;
        };
        if let Some(mode) = config.find_mode(key) {
            info!("seed active mode from config (key={})", mode.key);
            self.active_mode_key = Some(mode.key.clone());
        }
    }

    /// Returns whether the initial mode is now queued.
    pub fn queue_initial_mode(&mut self, key: Option<&str>, require_not_applied: bool) -> bool {
        let key = key.unwrap_or_default().trim();
        self.initial_mode.key = Some(key.to_owned());
        self.initial_mode.queued =
            (!require_not_applied || !self.initial_mode.applied) && !key.is_empty();
        self.initial_mode.queued
    }

    pub fn mark_initial_mode_applied(&mut self) {
        self.initial_mode.applied = true;
        self.initial_mode.queued = false;
    }

    pub fn start_cooldown(&mut self, seconds: i64) {
        let seconds = seconds.max(0) as u64;
        self.cooldown_until = Some(Instant::now() + Duration::from_secs(seconds));
    }

    pub fn reset_cooldown(&mut self) {
        self.cooldown_until = None;
    }

    /// Remaining cooldown, `None` if new votes are allowed.
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        let until = self.cooldown_until?;
        if now < until {
            Some(until - now)
        } else {
            None
        }
    }
}
