use super::*;

pub struct Thread {
    inner: Weak<Inner>,
}

impl Thread {
    async fn run_once(&self) -> Result<()> {
        let inner = self.inner.upgrade().context("mode manager is gone")?;
        let mut state = inner.state.write().await;
        state
            .votes
            .cleanup_expired_if_needed(Instant::now(), &*inner.host.server);
        Ok(())
    }

    fn do_loop(self) -> ThreadHandle {
        let fut = async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                self.run_once().await.ok();
            }
        };
        let hdl = tokio::spawn(fut).abort_handle();
        ThreadHandle(hdl)
    }
}

pub fn new(inner: Weak<Inner>) -> ThreadHandle {
    Thread { inner }.do_loop()
}
