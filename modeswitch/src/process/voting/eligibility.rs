use super::*;

/// Relays and bots never count toward quorum.
/// A handle that is no longer valid is simply not eligible.
pub fn is_eligible(player: &dyn Player) -> bool {
    player.is_valid() && !player.is_relay() && !player.is_bot()
}

pub fn count_eligible(server: &dyn GameServer) -> usize {
    server
        .players()
        .iter()
        .filter(|p| is_eligible(p.as_ref()))
        .count()
}

pub fn has_any_eligible(server: &dyn GameServer) -> bool {
    server.players().iter().any(|p| is_eligible(p.as_ref()))
}
