use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Started,
    Registered,
    AlreadyVoted,
    /// A vote for another mode is running. Nothing was changed.
    OtherModeInProgress,
}

pub struct Outcome {
    pub status: Status,
    /// The session after registration.
    pub vote: VoteSession,
}

pub struct Ballot<'a> {
    pub mode: &'a ModeDefinition,
    pub voter: VoterId,
    pub target_map: String,
    pub explicit: bool,
    pub required_votes: usize,
    pub duration: Duration,
}

pub struct Effect<'a> {
    pub store: &'a mut VoteSessionStore,
}

impl Effect<'_> {
    pub fn exec(self, ballot: Ballot<'_>, now: Instant) -> Outcome {
        let Some(vote) = self.store.current_mut() else {
            let mut voters = HashSet::new();
            voters.insert(ballot.voter);
            let vote = VoteSession {
                mode_key: ballot.mode.key.clone(),
                mode_display_name: ballot.mode.display_name.clone(),
                target_map: ballot.target_map,
                required_votes: ballot.required_votes.max(1),
                expires_at: now + ballot.duration,
                voters,
            };
            self.store.set(vote.clone());
            return Outcome {
                status: Status::Started,
                vote,
            };
        };

        let status = if !vote.is_for(ballot.mode) {
            Status::OtherModeInProgress
        } else if vote.voters.contains(&ballot.voter) {
            Status::AlreadyVoted
        } else {
            if ballot.explicit {
                vote.target_map = ballot.target_map;
            }
            vote.voters.insert(ballot.voter);
            Status::Registered
        };

        Outcome {
            status,
            vote: vote.clone(),
        }
    }
}
