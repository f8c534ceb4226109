use super::*;

mod dispatch;
mod state;
mod switching;
mod thread;
mod timer;
mod voting;

pub use state::SwitchReason;
pub use timer::{Timer, TimerHandle, TokioTimer};
pub use voting::{VoteSession, VoterId};

use commands::{CommandTable, Route};
use state::{PendingSwitch, RuntimeState, Threads};
use std::sync::Weak;
use switching::effect::{cancel_switch, complete_switch, schedule_switch, take_pending};
use switching::ModeSwitcher;
use thread::ThreadHandle;
use timer::Trigger;
use tokio::time::Instant;
use voting::VoteSessionStore;

pub type Actor<T> = Arc<tokio::sync::RwLock<T>>;

/// Collaborators supplied by the game server.
pub struct Host {
    pub server: Arc<dyn GameServer>,
    pub runner: Arc<dyn CommandRunner>,
    pub config_provider: Arc<dyn ConfigProvider>,
    pub provisioner: Arc<dyn MapGroupProvisioner>,
    pub timer: Arc<dyn Timer>,
}

impl Host {
    /// Tokio timers and no map group provisioning.
    pub fn new(
        server: Arc<dyn GameServer>,
        runner: Arc<dyn CommandRunner>,
        config_provider: Arc<dyn ConfigProvider>,
    ) -> Self {
        Self {
            server,
            runner,
            config_provider,
            provisioner: Arc::new(NoMapGroups),
            timer: Arc::new(TokioTimer),
        }
    }

    pub fn with_provisioner(mut self, provisioner: Arc<dyn MapGroupProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }
}

/// Summary of the pending switch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSwitchView {
    pub mode_key: String,
    pub reason: SwitchReason,
    pub target_map: Option<String>,
}

/// Snapshot of the runtime state.
#[derive(Clone, Debug)]
pub struct StateView {
    pub active_mode_key: Option<String>,
    pub cooldown_remaining: Option<Duration>,
    pub pending: Option<PendingSwitchView>,
    /// Expired sessions are not shown.
    pub vote: Option<VoteSession>,
    pub initial_mode_queued: bool,
    pub initial_mode_applied: bool,
}

pub struct Inner {
    state: Actor<RuntimeState>,
    config: spin::RwLock<Arc<ModeManagerConfig>>,
    switcher: ModeSwitcher,
    host: Host,
}

impl Inner {
    /// The config in effect now.
    pub fn config(&self) -> Arc<ModeManagerConfig> {
        self.config.read().clone()
    }
}

#[derive(derive_more::Deref, Clone)]
pub struct ModeManager(pub(crate) Arc<Inner>);

impl ModeManager {
    pub fn new(mut config: ModeManagerConfig, host: Host) -> Result<Self> {
        config.validate()?;

        let mut state = RuntimeState::new();
        state.seed_active_mode_from_config(&config);

        let inner = Inner {
            state: Arc::new(tokio::sync::RwLock::new(state)),
            config: spin::RwLock::new(Arc::new(config)),
            switcher: ModeSwitcher::new(host.runner.clone()),
            host,
        };
        Ok(Self(Arc::new(inner)))
    }

    fn weak(&self) -> Weak<Inner> {
        Arc::downgrade(&self.0)
    }

    fn trigger(&self) -> Trigger {
        Trigger(self.weak())
    }

    /// Register commands and start the background loops.
    pub async fn start(&self) {
        let config = self.config();
        let mut state = self.state.write().await;
        state.stopped = false;

        if state.commands.register_base() {
            info!("base commands registered");
        }
        state.commands.rebuild(&config);

        state.threads.vote_expiry = Some(thread::vote_expiry::new(self.weak()));

        if config.apply_initial_mode_on_startup
            && state.queue_initial_mode(config.initial_mode_key.as_deref(), true)
        {
            info!(
                "initial mode queued (key={})",
                state.initial_mode.key.as_deref().unwrap_or_default()
            );
            state.threads.initial_mode = Some(thread::initial_mode::new(self.weak()));
        }
    }

    /// Drop everything in flight and stop the background loops.
    pub async fn unload(&self) {
        let mut state = self.state.write().await;
        state.commands.clear_dynamic();
        cancel_switch::Effect { state: &mut state }.exec("unload");
        state.votes.reset();
        state.initial_mode.queued = false;
        state.stopped = true;
        state.threads = Threads::default();
        info!("mode manager unloaded");
    }

    /// Load the config again through the `ConfigProvider`.
    ///
    /// Votes, the pending switch and the cooldown are reset and the mode
    /// commands are rebuilt even if the new config is rejected.
    pub async fn reload_config(&self) -> Result<()> {
        let loaded = self.host.config_provider.load().and_then(|mut config| {
            config.validate()?;
            Ok(config)
        });

        let mut state = self.state.write().await;
        let res = match loaded {
            Ok(config) => {
                let config = Arc::new(config);
                *self.config.write() = config.clone();
                info!("config reloaded ({} modes)", config.modes.len());

                if !state.stopped
                    && !state.initial_mode.applied
                    && config.apply_initial_mode_on_startup
                    && state.queue_initial_mode(config.initial_mode_key.as_deref(), false)
                {
                    state.threads.initial_mode = Some(thread::initial_mode::new(self.weak()));
                }
                Ok(())
            }
            Err(e) => {
                error!("config reload failed: {e:#}");
                Err(e)
            }
        };

        state.votes.reset();
        cancel_switch::Effect { state: &mut state }.exec("reload");
        state.reset_cooldown();
        state.commands.rebuild(&self.config());

        res
    }

    /// Vote for `mode`, or schedule it directly when `caller` is the console.
    pub async fn handle_vote_request(
        &self,
        caller: Option<&dyn Player>,
        mode: &ModeDefinition,
        requested_map: Option<&str>,
        explicit: bool,
        reply: &dyn Fn(Message),
    ) {
        let config = self.config();
        let immediate = {
            let mut state = self.state.write().await;
            let req = voting::effect::handle_vote_request::Effect {
                state: &mut state,
                config: &config,
                server: &*self.host.server,
            }
            .exec(caller, mode, requested_map, explicit, reply);

            req.and_then(|req| {
                self.schedule_locked(&mut state, &config, req.mode, req.reason, req.target_map)
            })
        };

        if let Some(ticket) = immediate {
            self.execute_switch_ticket("immediate", Some(ticket)).await;
        }
    }

    /// Cast a vote with an explicitly chosen map.
    pub async fn submit_vote(
        &self,
        caller: &dyn Player,
        mode_key: &str,
        map: &str,
        reply: &dyn Fn(Message),
    ) {
        let Some(mode) = self.config().find_mode(mode_key).cloned() else {
            reply(Message::ErrorModeNotFound {
                key: mode_key.trim().to_owned(),
            });
            return;
        };
        self.handle_vote_request(Some(caller), &mode, Some(map), true, reply)
            .await;
    }

    /// Switch to a mode without a vote.
    /// The caller must be the console or hold the root permission.
    pub async fn admin_set_mode(
        &self,
        caller: Option<&dyn Player>,
        mode_key: &str,
        map: Option<&str>,
        reply: &dyn Fn(Message),
    ) {
        if !dispatch::can_execute_root_action(caller) {
            reply(Message::NoPermission);
            return;
        }

        let config = self.config();
        let Some(mode) = config.find_mode(mode_key).cloned() else {
            reply(Message::ErrorModeNotFound {
                key: mode_key.trim().to_owned(),
            });
            return;
        };

        let map = map.map(str::trim).filter(|map| !map.is_empty());
        let explicit = map.is_some();
        let Some(target) = self.try_resolve_target_map_for_mode(&mode, map, explicit) else {
            reply(Message::VoteMapSelectionInvalid);
            if explicit {
                reply(Message::VoteMapSelectionAvailableMaps {
                    mode: mode.display_name.clone(),
                    maps: self.get_selectable_maps_for_mode(&mode).join(", "),
                });
            }
            return;
        };

        let immediate = {
            let mut state = self.state.write().await;
            if state.is_mode_active(&mode)
                && (!explicit || self.is_current_map_for_target(&target))
            {
                reply(Message::VoteAlreadyActiveMode {
                    mode: mode.display_name.clone(),
                });
                return;
            }

            info!("admin set mode {} on {target}", mode.key);
            reply(Message::VoteConsoleScheduled {
                mode: mode.display_name.clone(),
                map: target.clone(),
            });
            self.schedule_locked(
                &mut state,
                &config,
                mode,
                SwitchReason::AdminModeCommand,
                Some(target),
            )
        };

        if let Some(ticket) = immediate {
            self.execute_switch_ticket("immediate", Some(ticket)).await;
        }
    }

    /// Replace the pending switch with a new one.
    /// With no delay configured, the switch has run when this returns.
    pub async fn schedule_mode_switch(
        &self,
        mode: ModeDefinition,
        reason: SwitchReason,
        target_map: Option<String>,
    ) {
        let config = self.config();
        let immediate = {
            let mut state = self.state.write().await;
            self.schedule_locked(&mut state, &config, mode, reason, target_map)
        };
        if let Some(ticket) = immediate {
            self.execute_switch_ticket("immediate", Some(ticket)).await;
        }
    }

    fn schedule_locked(
        &self,
        state: &mut RuntimeState,
        config: &ModeManagerConfig,
        mode: ModeDefinition,
        reason: SwitchReason,
        target_map: Option<String>,
    ) -> Option<u64> {
        schedule_switch::Effect {
            state,
            config,
            server: &*self.host.server,
            timer: &*self.host.timer,
            trigger: self.trigger(),
        }
        .exec(mode, reason, target_map)
    }

    /// Idempotent. Returns whether a pending switch was canceled.
    pub async fn cancel_pending_switch(&self, why: &str) -> bool {
        let mut state = self.state.write().await;
        cancel_switch::Effect { state: &mut state }.exec(why)
    }

    /// Run the pending switch now, if there is one.
    /// Returns whether the switch succeeded.
    pub async fn execute_pending_switch(&self, exec_reason: &str) -> bool {
        self.execute_switch_ticket(exec_reason, None).await
    }

    pub(crate) async fn execute_switch_ticket(&self, exec_reason: &str, ticket: Option<u64>) -> bool {
        // The pending switch is detached before any command runs.
        // A racing cancel or a second timer finds nothing to execute.
        let pending = {
            let mut state = self.state.write().await;
            take_pending::Effect { state: &mut state }.exec(ticket)
        };
        let Some(pending) = pending else {
            return false;
        };

        let config = self.config();
        info!(
            "applying mode {} (reason={}, exec={exec_reason})",
            pending.mode.key, pending.reason
        );

        let map_group = if config.end_match_map_vote_enabled {
            self.host.provisioner.prepare(&config, &pending.mode)
        } else {
            None
        };
        let current_map = self.host.server.current_map();
        let result = self
            .switcher
            .try_switch_to(
                &pending.mode,
                &config,
                pending.target_map.as_deref(),
                map_group.as_deref(),
                current_map.as_deref(),
            )
            .await;
        let ok = result.is_ok();

        let mut state = self.state.write().await;
        let retry_initial_mode = complete_switch::Effect {
            state: &mut state,
            config: &config,
            server: &*self.host.server,
        }
        .exec(&pending, result);
        if retry_initial_mode && !state.stopped {
            warn!("initial mode {} failed, watching again", pending.mode.key);
            state.threads.initial_mode = Some(thread::initial_mode::new(self.weak()));
        }

        ok
    }

    pub fn get_selectable_maps_for_mode(&self, mode: &ModeDefinition) -> Vec<String> {
        let current_map = self.host.server.current_map();
        voting::target_map::get_selectable_maps(mode, current_map.as_deref())
    }

    pub fn try_resolve_target_map_for_mode(
        &self,
        mode: &ModeDefinition,
        requested_map: Option<&str>,
        explicit: bool,
    ) -> Option<String> {
        let current_map = self.host.server.current_map();
        voting::target_map::try_resolve_target(mode, requested_map, explicit, current_map.as_deref())
    }

    pub fn is_current_map_for_target(&self, map: &str) -> bool {
        let current_map = self.host.server.current_map();
        voting::target_map::is_current_map_for_target(map, current_map.as_deref())
    }

    /// Mode of the live vote session.
    /// A session whose mode is no longer configured is dropped.
    pub async fn try_get_active_vote_mode(&self) -> Option<ModeDefinition> {
        let config = self.config();
        let mut state = self.state.write().await;
        state
            .votes
            .cleanup_expired_if_needed(Instant::now(), &*self.host.server);

        let key = state.votes.current()?.mode_key.clone();
        match config.find_mode(&key) {
            Some(mode) => Some(mode.clone()),
            None => {
                warn!("vote for unknown mode {key} dropped");
                state.votes.clear();
                None
            }
        }
    }

    /// Tell a caller who already voted where the vote stands.
    /// Returns false if the caller has not voted in the live session.
    pub async fn try_reply_active_vote_status_for_voter(
        &self,
        caller: &dyn Player,
        reply: &dyn Fn(Message),
    ) -> bool {
        if !caller.is_valid() {
            return false;
        }

        let now = Instant::now();
        let mut state = self.state.write().await;
        state.votes.cleanup_expired_if_needed(now, &*self.host.server);

        let Some(vote) = state.votes.current() else {
            return false;
        };
        let Some(voter) = VoterId::resolve(caller) else {
            return false;
        };
        if !vote.voters.contains(&voter) {
            return false;
        }

        reply(Message::VoteStatusAlreadyVoted {
            mode: vote.mode_display_name.clone(),
            map: vote.target_map.clone(),
            votes: vote.voters.len(),
            required: vote.required_votes,
            missing: vote.missing_votes(),
            remaining: vote.remaining_secs(now),
        });
        true
    }

    pub async fn reset_votes(&self) {
        self.state.write().await.votes.reset();
    }

    pub async fn cleanup_expired_vote(&self) {
        let mut state = self.state.write().await;
        state
            .votes
            .cleanup_expired_if_needed(Instant::now(), &*self.host.server);
    }

    /// Names of every command currently registered.
    pub async fn command_names(&self) -> Vec<String> {
        self.state.read().await.commands.names()
    }

    pub async fn inspect(&self) -> StateView {
        let now = Instant::now();
        let state = self.state.read().await;
        StateView {
            active_mode_key: state.active_mode_key.clone(),
            cooldown_remaining: state.cooldown_remaining(now),
            pending: state.pending.as_ref().map(|pending| PendingSwitchView {
                mode_key: pending.mode.key.clone(),
                reason: pending.reason,
                target_map: pending.target_map.clone(),
            }),
            vote: state
                .votes
                .current()
                .filter(|vote| !vote.is_expired(now))
                .cloned(),
            initial_mode_queued: state.initial_mode.queued,
            initial_mode_applied: state.initial_mode.applied,
        }
    }
}
