use super::*;

pub mod initial_mode;
pub mod vote_expiry;

use tokio::task::AbortHandle;

/// Wrapper around a `AbortHandle` that aborts it is dropped.
pub struct ThreadHandle(pub AbortHandle);
impl Drop for ThreadHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}
