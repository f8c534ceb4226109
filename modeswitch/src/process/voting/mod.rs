use super::*;

pub mod effect;
pub mod eligibility;
pub mod identity;
pub mod quorum;
pub mod target_map;

pub use identity::VoterId;

use std::collections::HashSet;

/// The single active vote.
#[derive(Clone, Debug)]
pub struct VoteSession {
    pub mode_key: String,
    pub mode_display_name: String,
    pub target_map: String,
    /// At least 1.
    pub required_votes: usize,
    pub expires_at: Instant,
    pub voters: HashSet<VoterId>,
}

impl VoteSession {
    pub fn is_for(&self, mode: &ModeDefinition) -> bool {
        eq_ignore_case(&self.mode_key, &mode.key)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn remaining_secs(&self, now: Instant) -> u64 {
        self.expires_at.saturating_duration_since(now).as_secs()
    }

    pub fn missing_votes(&self) -> usize {
        self.required_votes.saturating_sub(self.voters.len())
    }

    pub fn is_quorum_reached(&self) -> bool {
        self.voters.len() >= self.required_votes
    }
}

/// Holds zero or one vote session.
#[derive(Default, Debug)]
pub struct VoteSessionStore {
    current: Option<VoteSession>,
}

impl VoteSessionStore {
    pub fn current(&self) -> Option<&VoteSession> {
        self.current.as_ref()
    }

    pub fn set(&mut self, vote: VoteSession) {
        self.current = Some(vote);
    }

    pub fn clear(&mut self) -> Option<VoteSession> {
        self.current.take()
    }

    pub fn reset(&mut self) {
        if let Some(vote) = self.current.take() {
            info!("vote for {} reset", vote.mode_key);
        }
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut VoteSession> {
        self.current.as_mut()
    }

    /// Drop the session if it has expired and tell everyone.
    /// Must run before the session is read or written.
    pub fn cleanup_expired_if_needed(&mut self, now: Instant, server: &dyn GameServer) {
        let Some(vote) = &self.current else {
            return;
        };
        if !vote.is_expired(now) {
            return;
        }

        info!("vote for {} expired", vote.mode_key);
        server.broadcast(&Message::VoteExpired {
            mode: vote.mode_display_name.clone(),
            map: vote.target_map.clone(),
            votes: vote.voters.len(),
            required: vote.required_votes,
            missing: vote.missing_votes(),
        });
        self.current = None;
    }
}
