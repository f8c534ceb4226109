use super::*;

pub struct Effect<'a> {
    pub state: &'a mut RuntimeState,
}

impl Effect<'_> {
    /// Detach the pending switch so it can be executed.
    /// With a ticket, only the switch scheduled under that ticket is taken.
    pub fn exec(self, ticket: Option<u64>) -> Option<PendingSwitch> {
        let pending = self.state.pending.as_ref()?;
        if let Some(ticket) = ticket {
            if pending.ticket != ticket {
                debug!(
                    "stale switch ticket {ticket} ignored (pending={})",
                    pending.ticket
                );
                return None;
            }
        }

        let mut pending = self.state.pending.take()?;
        pending.kill_timer();
        Some(pending)
    }
}
