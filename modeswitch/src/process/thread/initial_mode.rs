use super::*;

pub struct Thread {
    inner: Weak<Inner>,
}

impl Thread {
    /// Returns whether to keep watching.
    async fn run_once(&self) -> Result<bool> {
        let inner = self.inner.upgrade().context("mode manager is gone")?;
        let config = inner.config();
        let mut state = inner.state.write().await;

        if state.stopped
            || state.initial_mode.applied
            || !state.initial_mode.queued
            || state.pending.is_some()
        {
            return Ok(false);
        }

        // Wait for the first human player.
        if !voting::eligibility::has_any_eligible(&*inner.host.server) {
            return Ok(true);
        }

        let key = state.initial_mode.key.clone().unwrap_or_default();
        let key = key.trim();
        if key.is_empty() {
            state.initial_mode.queued = false;
            return Ok(false);
        }

        let Some(mode) = config.find_mode(key).cloned() else {
            state.initial_mode.queued = false;
            error!("initial mode key not found (key={key})");
            return Ok(false);
        };

        let trigger = Trigger(self.inner.clone());
        let immediate = switching::effect::schedule_switch::Effect {
            state: &mut state,
            config: &config,
            server: &*inner.host.server,
            timer: &*inner.host.timer,
            trigger: trigger.clone(),
        }
        .exec(mode, SwitchReason::StartupFirstPlayer, None);

        if let Some(ticket) = immediate {
            tokio::spawn(trigger.fire(ticket, "startup_firstplayer"));
        }

        Ok(false)
    }

    fn do_loop(self) -> ThreadHandle {
        let fut = async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                match self.run_once().await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        warn!("initial mode watcher stopped: {e:#}");
                        break;
                    }
                }
            }
        };
        let hdl = tokio::spawn(fut).abort_handle();
        ThreadHandle(hdl)
    }
}

pub fn new(inner: Weak<Inner>) -> ThreadHandle {
    Thread { inner }.do_loop()
}
