use super::*;

/// A message for players or for the caller of a command.
/// The variant is the message key and the fields are its arguments.
/// `Display` renders the default English text.
#[derive(Display, Clone, Debug, PartialEq, Eq)]
pub enum Message {
    // Voting
    #[display("{mode} is already the active mode.")]
    VoteAlreadyActiveMode { mode: String },
    #[display("Switch to {mode} on {map} scheduled.")]
    VoteConsoleScheduled { mode: String, map: String },
    #[display("Invalid player.")]
    ErrorInvalidPlayer,
    #[display("A switch to {mode} is already pending.")]
    VotePendingAlready { mode: String },
    #[display("Mode voting is on cooldown for {seconds}s.")]
    VoteCooldown { seconds: u64 },
    #[display("Spectators and bots cannot vote.")]
    VoteIneligible,
    #[display("Could not identify you as a voter.")]
    VoteIdentityMissing,
    #[display("A mode vote needs at least {required} players ({current} connected).")]
    VoteMinPlayers { required: usize, current: usize },
    #[display("A vote for {mode} on {map} is in progress ({votes}/{required}, {missing} missing, {remaining}s left).")]
    VoteAnotherModeInProgress {
        mode: String,
        map: String,
        votes: usize,
        required: usize,
        missing: usize,
        remaining: u64,
    },
    #[display("Invalid map selection.")]
    VoteMapSelectionInvalid,
    #[display("Maps available for {mode}: {maps}")]
    VoteMapSelectionAvailableMaps { mode: String, maps: String },
    #[display("Vote started for {mode} on {map} ({votes}/{required}, {missing} missing, {remaining}s left). Type !{alias} to vote.")]
    VoteStarted {
        mode: String,
        map: String,
        votes: usize,
        required: usize,
        missing: usize,
        remaining: u64,
        alias: String,
    },
    #[display("You voted for {mode} on {map} ({missing} missing, {remaining}s left).")]
    VoteRegisteredSelf {
        mode: String,
        map: String,
        missing: usize,
        remaining: u64,
    },
    #[display("You already voted.")]
    VoteAlreadyCast,
    #[display("Vote for {mode} on {map}: {votes}/{required} ({missing} missing, {remaining}s left).")]
    VoteRegistered {
        mode: String,
        map: String,
        votes: usize,
        required: usize,
        missing: usize,
        remaining: u64,
    },
    #[display("Vote for {mode} on {map} expired ({votes}/{required}, {missing} missing).")]
    VoteExpired {
        mode: String,
        map: String,
        votes: usize,
        required: usize,
        missing: usize,
    },
    #[display("You voted for {mode} on {map}: {votes}/{required} ({missing} missing, {remaining}s left).")]
    VoteStatusAlreadyVoted {
        mode: String,
        map: String,
        votes: usize,
        required: usize,
        missing: usize,
        remaining: u64,
    },

    // Switching
    #[display("Switch to {mode} on {map} approved. Switching now.")]
    SwitchApprovedNow { mode: String, map: String },
    #[display("Switch to {mode} on {map} approved. Switching in {seconds}s.")]
    SwitchApprovedIn {
        mode: String,
        map: String,
        seconds: u64,
    },
    #[display("Initial mode {mode} will be applied in {seconds}s.")]
    InitialModeScheduled { mode: String, seconds: u64 },
    #[display("Mode changed to {mode} on {map}.")]
    ModeChanged { mode: String, map: String },
    #[display("Failed to apply {mode}.")]
    ModeApplyFailed { mode: String },

    // Commands
    #[display("Mode manager commands:")]
    HelpTitle,
    #[display("{usage} - {description}")]
    HelpLine {
        usage: &'static str,
        description: &'static str,
    },
    #[display("Modes: {modes}")]
    ModesList { modes: String },
    #[display("Type !<mode> to vote for a mode.")]
    ModesVoteHint,
    #[display("Usage: css_mode <key> [map]")]
    ErrorSetModeUsage,
    #[display("Mode not found: {key}")]
    ErrorModeNotFound { key: String },
    #[display("You do not have permission to do that.")]
    NoPermission,
    #[display("Config reloaded.")]
    ReloadConfigSuccess,
    #[display("Config reload failed: {error}")]
    ReloadFailed { error: String },
    #[display("Mode commands rebuilt.")]
    ReloadCommandsRebuilt,
}
