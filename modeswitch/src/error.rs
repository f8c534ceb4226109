use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("at least one mode must be configured")]
    ModesRequired,
    #[error("reset command must not be empty")]
    ResetCommandRequired,
    #[error("vote ratio must be in (0, 1] (ratio={0})")]
    VoteRatioOutOfRange(f64),
    #[error("vote min players must be at least 1 (min_players={0})")]
    VoteMinPlayersOutOfRange(i64),
    #[error("vote duration must be in [5, 300] seconds (duration={0})")]
    VoteDurationOutOfRange(i64),
    #[error("switch cooldown must be in [0, 600] seconds (cooldown={0})")]
    SwitchCooldownOutOfRange(i64),
    #[error("switch delay must be in [0, 600] seconds (delay={0})")]
    SwitchDelayOutOfRange(i64),
    #[error("mode key must not be empty")]
    ModeKeyRequired,
    #[error("mode key does not match its entry (entry={0}, key={1})")]
    ModeKeyMismatch(String, String),
    #[error("mode key is duplicated (key={0}, other={1})")]
    DuplicateModeKey(String, String),
    #[error("mode has no apply command (key={0})")]
    ExecCommandRequired(String),
    #[error("mode must not unload the mode manager itself (key={0}, module={1})")]
    SelfUnloadForbidden(String, String),
    #[error("default map is invalid (key={0}, map={1})")]
    DefaultMapInvalid(String, String),
    #[error("map pool entry is invalid (key={0}, map={1})")]
    MapPoolMapInvalid(String, String),
    #[error("game type must be in [0, 20] (key={0}, game_type={1})")]
    GameTypeInvalid(String, i64),
    #[error("game mode must be in [0, 20] (key={0}, game_mode={1})")]
    GameModeInvalid(String, i64),
    #[error("end-match map vote file must not be empty")]
    EndMatchMapVoteFileRequired,
    #[error("end-match map group prefix is invalid (prefix={0})")]
    MapGroupPrefixInvalid(String),
    #[error("generated command conflicts with a base command (key={0}, command={1})")]
    DynamicCommandConflictsBase(String, String),
    #[error("generated command collides with another mode (key={0}, other={1}, command={2})")]
    DynamicCommandCollision(String, String, String),
    #[error("mode not found (key={0})")]
    ModeNotFound(String),
}
