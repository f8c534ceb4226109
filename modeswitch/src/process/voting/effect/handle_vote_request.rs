use super::*;

use register_vote::{Ballot, Status};

/// A switch the vote coordinator asks the scheduler for.
#[derive(Clone, Debug)]
pub struct SwitchRequest {
    pub mode: ModeDefinition,
    pub reason: SwitchReason,
    pub target_map: Option<String>,
}

pub struct Effect<'a> {
    pub state: &'a mut RuntimeState,
    pub config: &'a ModeManagerConfig,
    pub server: &'a dyn GameServer,
}

impl Effect<'_> {
    /// Process a vote for `mode`.
    /// `caller` is `None` for the console, which schedules without a vote.
    pub fn exec(
        self,
        caller: Option<&dyn Player>,
        mode: &ModeDefinition,
        requested_map: Option<&str>,
        explicit: bool,
        reply: &dyn Fn(Message),
    ) -> Option<SwitchRequest> {
        let current_map = self.server.current_map();
        let current_map = current_map.as_deref();

        if self.state.is_mode_active(mode) {
            let changes_map = explicit
                && target_map::try_resolve_target(mode, requested_map, true, current_map)
                    .is_some_and(|map| !target_map::is_current_map_for_target(&map, current_map));
            if !changes_map {
                reply(Message::VoteAlreadyActiveMode {
                    mode: mode.display_name.clone(),
                });
                return None;
            }
        }

        let Some(caller) = caller else {
            let Some(map) = target_map::try_resolve_target(mode, requested_map, explicit, current_map)
            else {
                reply(Message::VoteMapSelectionInvalid);
                return None;
            };
            info!("console requested {} on {map}", mode.key);
            reply(Message::VoteConsoleScheduled {
                mode: mode.display_name.clone(),
                map: map.clone(),
            });
            return Some(SwitchRequest {
                mode: mode.clone(),
                reason: SwitchReason::Console,
                target_map: Some(map),
            });
        };

        let now = Instant::now();
        let voter = self.check_voter(caller, now, reply)?;

        self.state.votes.cleanup_expired_if_needed(now, self.server);
        if let Some(vote) = self.state.votes.current() {
            if !vote.is_for(mode) {
                reply(another_mode_in_progress(vote, now));
                return None;
            }
        }

        let Some(map) = target_map::try_resolve_target(mode, requested_map, explicit, current_map)
        else {
            reply(Message::VoteMapSelectionInvalid);
            if explicit {
                reply(Message::VoteMapSelectionAvailableMaps {
                    mode: mode.display_name.clone(),
                    maps: target_map::get_selectable_maps(mode, current_map).join(", "),
                });
            }
            return None;
        };

        let eligible = eligibility::count_eligible(self.server);
        let min_players = self.config.vote_min_players.max(1) as usize;
        if eligible < min_players {
            reply(Message::VoteMinPlayers {
                required: min_players,
                current: eligible,
            });
            return None;
        }
        let required_votes = quorum::required_votes(eligible, self.config.vote_ratio);

        let duration = Duration::from_secs(self.config.vote_duration_seconds.max(0) as u64);
        let out = register_vote::Effect {
            store: &mut self.state.votes,
        }
        .exec(
            Ballot {
                mode,
                voter,
                target_map: map,
                explicit,
                required_votes,
                duration,
            },
            now,
        );

        let vote = out.vote;
        let remaining = vote.remaining_secs(now);
        match out.status {
            Status::Started => {
                info!(
                    "vote started for {} on {} ({}/{})",
                    vote.mode_key,
                    vote.target_map,
                    vote.voters.len(),
                    vote.required_votes
                );
                self.server.broadcast(&Message::VoteStarted {
                    mode: mode.display_name.clone(),
                    map: vote.target_map.clone(),
                    votes: vote.voters.len(),
                    required: vote.required_votes,
                    missing: vote.missing_votes(),
                    remaining,
                    alias: commands::to_safe_token(&mode.key),
                });
                reply(Message::VoteRegisteredSelf {
                    mode: mode.display_name.clone(),
                    map: vote.target_map.clone(),
                    missing: vote.missing_votes(),
                    remaining,
                });
            }
            Status::Registered => {
                self.server.broadcast(&Message::VoteRegistered {
                    mode: vote.mode_display_name.clone(),
                    map: vote.target_map.clone(),
                    votes: vote.voters.len(),
                    required: vote.required_votes,
                    missing: vote.missing_votes(),
                    remaining,
                });
            }
            Status::AlreadyVoted => {
                reply(Message::VoteAlreadyCast);
                return None;
            }
            Status::OtherModeInProgress => {
                reply(another_mode_in_progress(&vote, now));
                return None;
            }
        }

        if !vote.is_quorum_reached() {
            return None;
        }

        info!("vote for {} reached quorum", vote.mode_key);
        self.state.votes.clear();
        Some(SwitchRequest {
            mode: mode.clone(),
            reason: SwitchReason::Vote,
            target_map: Some(vote.target_map),
        })
    }

    /// Gates every player vote passes before touching the session.
    fn check_voter(&self, caller: &dyn Player, now: Instant, reply: &dyn Fn(Message)) -> Option<VoterId> {
        if !caller.is_valid() {
            reply(Message::ErrorInvalidPlayer);
            return None;
        }
        if let Some(pending) = &self.state.pending {
            reply(Message::VotePendingAlready {
                mode: pending.mode.display_name.clone(),
            });
            return None;
        }
        if let Some(remaining) = self.state.cooldown_remaining(now) {
            reply(Message::VoteCooldown {
                seconds: ceil_secs(remaining),
            });
            return None;
        }
        if !eligibility::is_eligible(caller) {
            reply(Message::VoteIneligible);
            return None;
        }
        let Some(voter) = VoterId::resolve(caller) else {
            reply(Message::VoteIdentityMissing);
            return None;
        };
        Some(voter)
    }
}

fn another_mode_in_progress(vote: &VoteSession, now: Instant) -> Message {
    Message::VoteAnotherModeInProgress {
        mode: vote.mode_display_name.clone(),
        map: vote.target_map.clone(),
        votes: vote.voters.len(),
        required: vote.required_votes,
        missing: vote.missing_votes(),
        remaining: vote.remaining_secs(now),
    }
}

fn ceil_secs(d: Duration) -> u64 {
    if d.subsec_nanos() > 0 {
        d.as_secs() + 1
    } else {
        d.as_secs()
    }
}
