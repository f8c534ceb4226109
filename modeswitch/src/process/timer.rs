use super::*;

use futures::future::BoxFuture;
use tokio::task::AbortHandle;

/// One-shot timers of the host's main loop.
pub trait Timer: Send + Sync + 'static {
    /// Run `callback` once after `delay`.
    fn schedule(&self, delay: Duration, callback: BoxFuture<'static, ()>) -> TimerHandle;
}

/// Handle to an armed timer.
/// Dropping the handle does not cancel the timer, `kill` does.
pub struct TimerHandle(AbortHandle);

impl TimerHandle {
    pub fn new(hdl: AbortHandle) -> Self {
        Self(hdl)
    }

    /// Idempotent. Killing a timer that already fired does nothing.
    pub fn kill(&self) {
        self.0.abort();
    }
}

/// Timers backed by `tokio::time`.
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn schedule(&self, delay: Duration, callback: BoxFuture<'static, ()>) -> TimerHandle {
        let fut = async move {
            tokio::time::sleep(delay).await;
            // Detach the callback so killing this timer can't interrupt it.
            tokio::spawn(callback);
        };
        let hdl = tokio::spawn(fut).abort_handle();
        TimerHandle::new(hdl)
    }
}

/// Fires the pending switch that a timer was armed for.
#[derive(Clone)]
pub struct Trigger(pub(super) Weak<Inner>);

impl Trigger {
    pub fn fire(&self, ticket: u64, exec_reason: &'static str) -> BoxFuture<'static, ()> {
        let inner = self.0.clone();
        Box::pin(async move {
            if let Some(inner) = inner.upgrade() {
                ModeManager(inner)
                    .execute_switch_ticket(exec_reason, Some(ticket))
                    .await;
            }
        })
    }
}
