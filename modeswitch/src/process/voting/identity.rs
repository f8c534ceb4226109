use super::*;

/// Identity a vote is recorded under.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoterId(String);

impl VoterId {
    /// Prefer the durable platform id, fall back to the session id.
    pub fn resolve(player: &dyn Player) -> Option<Self> {
        if let Some(id) = player.platform_id().filter(|id| *id != 0) {
            return Some(Self(format!("platform:{id}")));
        }
        player.session_id().map(|id| Self(format!("session:{id}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VoterId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
