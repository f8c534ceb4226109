use super::*;

pub struct Effect<'a> {
    pub state: &'a mut RuntimeState,
}

impl Effect<'_> {
    /// Idempotent. Returns whether a pending switch was canceled.
    pub fn exec(self, why: &str) -> bool {
        let Some(mut pending) = self.state.pending.take() else {
            return false;
        };
        pending.kill_timer();
        info!("pending switch to {} canceled ({why})", pending.mode.key);
        true
    }
}
