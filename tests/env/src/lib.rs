use anyhow::{bail, Result};
use futures::future::BoxFuture;
use modeswitch::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::info;

static INIT: Once = Once::new();

pub struct FakePlayer {
    pub platform_id: Option<u64>,
    pub session_id: Option<i32>,
    pub bot: bool,
    pub relay: bool,
    pub admin: bool,
    valid: AtomicBool,
}
impl FakePlayer {
    pub fn human(id: u64) -> Self {
        Self {
            platform_id: Some(76561190000000000 + id),
            session_id: Some(id as i32),
            bot: false,
            relay: false,
            admin: false,
            valid: AtomicBool::new(true),
        }
    }

    pub fn bot(id: u64) -> Self {
        Self {
            platform_id: None,
            bot: true,
            ..Self::human(id)
        }
    }

    pub fn relay(id: u64) -> Self {
        Self {
            platform_id: None,
            relay: true,
            ..Self::human(id)
        }
    }

    pub fn admin(id: u64) -> Self {
        Self {
            admin: true,
            ..Self::human(id)
        }
    }

    /// A connection that reports neither a platform id nor a session id.
    pub fn anonymous(id: u64) -> Self {
        Self {
            platform_id: Some(0),
            session_id: None,
            ..Self::human(id)
        }
    }

    pub fn disconnect(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }
}
impl Player for FakePlayer {
    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }
    fn is_relay(&self) -> bool {
        self.relay
    }
    fn is_bot(&self) -> bool {
        self.bot
    }
    fn platform_id(&self) -> Option<u64> {
        self.platform_id
    }
    fn session_id(&self) -> Option<i32> {
        self.session_id
    }
    fn has_permission(&self, flag: &str) -> bool {
        self.admin && flag == "@css/root"
    }
}

pub struct FakeServer {
    players: spin::Mutex<Vec<Arc<FakePlayer>>>,
    current_map: spin::Mutex<Option<String>>,
    broadcasts: spin::Mutex<Vec<Message>>,
}
impl FakeServer {
    pub fn new(map: &str) -> Self {
        Self {
            players: spin::Mutex::new(vec![]),
            current_map: spin::Mutex::new(Some(map.to_owned())),
            broadcasts: spin::Mutex::new(vec![]),
        }
    }

    pub fn connect(&self, player: FakePlayer) -> Arc<FakePlayer> {
        let player = Arc::new(player);
        self.players.lock().push(player.clone());
        player
    }

    pub fn set_current_map(&self, map: &str) {
        *self.current_map.lock() = Some(map.to_owned());
    }

    /// Messages broadcast since the last call.
    pub fn take_broadcasts(&self) -> Vec<Message> {
        std::mem::take(&mut *self.broadcasts.lock())
    }
}
impl GameServer for FakeServer {
    fn players(&self) -> Vec<Arc<dyn Player>> {
        self.players
            .lock()
            .iter()
            .map(|p| p.clone() as Arc<dyn Player>)
            .collect()
    }

    fn current_map(&self) -> Option<String> {
        self.current_map.lock().clone()
    }

    fn broadcast(&self, message: &Message) {
        info!("broadcast: {message}");
        self.broadcasts.lock().push(message.clone());
    }
}

/// Records every command and loads the map on `changelevel`.
pub struct RecordingRunner {
    server: Arc<FakeServer>,
    lines: spin::Mutex<Vec<String>>,
    fail_on: spin::Mutex<Option<String>>,
    latency: spin::Mutex<Duration>,
}
impl RecordingRunner {
    pub fn new(server: Arc<FakeServer>) -> Self {
        Self {
            server,
            lines: spin::Mutex::new(vec![]),
            fail_on: spin::Mutex::new(None),
            latency: spin::Mutex::new(Duration::ZERO),
        }
    }

    /// Fail every command starting with `prefix`.
    pub fn fail_on(&self, prefix: Option<&str>) {
        *self.fail_on.lock() = prefix.map(str::to_owned);
    }

    /// Make every command take this long.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn changelevels(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| l.strip_prefix("changelevel ").map(str::to_owned))
            .collect()
    }

    pub fn count(&self, line: &str) -> usize {
        self.lines.lock().iter().filter(|l| *l == line).count()
    }
}
#[async_trait::async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command_line: &str) -> Result<()> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.lines.lock().push(command_line.to_owned());

        let fail_on = self.fail_on.lock().clone();
        if let Some(prefix) = fail_on {
            if command_line.starts_with(&prefix) {
                bail!("server rejected `{command_line}`");
            }
        }

        if let Some(map) = command_line.strip_prefix("changelevel ") {
            self.server.set_current_map(map);
        }
        Ok(())
    }
}

/// Serves whatever config the test put in.
pub struct StaticConfig {
    config: spin::Mutex<Option<ModeManagerConfig>>,
}
impl StaticConfig {
    pub fn new(config: ModeManagerConfig) -> Self {
        Self {
            config: spin::Mutex::new(Some(config)),
        }
    }

    pub fn set(&self, config: Option<ModeManagerConfig>) {
        *self.config.lock() = config;
    }
}
impl ConfigProvider for StaticConfig {
    fn load(&self) -> Result<ModeManagerConfig> {
        match self.config.lock().clone() {
            Some(config) => Ok(config),
            None => bail!("config file not found"),
        }
    }
}

/// Timers that only fire when the test says so.
#[derive(Default)]
pub struct ManualTimer {
    armed: spin::Mutex<Vec<(Duration, BoxFuture<'static, ()>)>>,
}
impl ManualTimer {
    pub fn n_armed(&self) -> usize {
        self.armed.lock().len()
    }

    /// Take the callbacks armed so far without running them.
    pub fn take(&self) -> Vec<BoxFuture<'static, ()>> {
        std::mem::take(&mut *self.armed.lock())
            .into_iter()
            .map(|(_, callback)| callback)
            .collect()
    }
}
impl Timer for ManualTimer {
    fn schedule(&self, delay: Duration, callback: BoxFuture<'static, ()>) -> TimerHandle {
        self.armed.lock().push((delay, callback));
        let hdl = tokio::spawn(futures::future::pending::<()>()).abort_handle();
        TimerHandle::new(hdl)
    }
}

pub fn mode(key: &str, display_name: &str, pool: &[&str]) -> ModeDefinition {
    let mut mode = ModeDefinition::new(key, format!("exec nmodemanager/{key}.cfg"));
    mode.display_name = display_name.to_owned();
    mode.map_pool = pool.iter().map(|s| s.to_string()).collect();
    mode
}

/// Three modes, 5s switch delay, 20s cooldown, no startup mode.
pub fn config() -> ModeManagerConfig {
    let mut retake = mode("retake", "Retake", &["de_inferno", "de_nuke"]);
    retake.default_map = Some("de_nuke".to_owned());

    let mut dm = mode("dm", "Deathmatch", &["de_dust2", "de_mirage", "de_dust2"]);
    dm.game_type = Some(1);
    dm.game_mode = Some(2);
    dm.plugins_to_unload = vec!["RetakesPlugin".to_owned()];
    dm.plugins_to_load = vec!["Deathmatch".to_owned()];

    let gungame = mode("gun-game", "Gun Game", &[]);

    let mut modes = BTreeMap::new();
    for m in [retake, dm, gungame] {
        modes.insert(m.key.clone(), m);
    }

    ModeManagerConfig {
        initial_mode_key: None,
        apply_initial_mode_on_startup: false,
        vote_ratio: 0.6,
        vote_min_players: 1,
        vote_duration_seconds: 60,
        switch_cooldown_seconds: 20,
        switch_delay_seconds: 5,
        modes,
        ..Default::default()
    }
}

pub struct Env {
    pub server: Arc<FakeServer>,
    pub runner: Arc<RecordingRunner>,
    pub config: Arc<StaticConfig>,
}
impl Env {
    pub fn new(config: ModeManagerConfig) -> Self {
        INIT.call_once(|| {
            let format = tracing_subscriber::fmt::format()
                .with_target(false)
                .compact();
            // The test harness may have installed a subscriber already.
            tracing_subscriber::fmt()
                .event_format(format)
                .with_test_writer()
                .try_init()
                .ok();
        });

        let server = Arc::new(FakeServer::new("de_dust2"));
        let runner = Arc::new(RecordingRunner::new(server.clone()));
        Self {
            server,
            runner,
            config: Arc::new(StaticConfig::new(config)),
        }
    }

    pub fn host(&self) -> Host {
        Host::new(self.server.clone(), self.runner.clone(), self.config.clone())
    }

    /// Connect `n` human players with ids starting at `first_id`.
    pub fn connect_humans(&self, first_id: u64, n: u64) -> Vec<Arc<FakePlayer>> {
        (first_id..first_id + n)
            .map(|id| self.server.connect(FakePlayer::human(id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test(tokio::test)]
    async fn runner_tracks_current_map() -> Result<()> {
        let env = Env::new(config());
        env.runner.run("changelevel de_nuke").await?;
        assert_eq!(env.server.current_map().as_deref(), Some("de_nuke"));

        env.runner.fail_on(Some("exec"));
        assert!(env.runner.run("exec dm.cfg").await.is_err());
        assert_eq!(env.runner.lines().len(), 2);
        Ok(())
    }

    #[test]
    fn fixture_config_is_valid() {
        let mut config = config();
        config.validate().unwrap();
    }

    #[test]
    fn bots_and_relays_are_flagged() {
        let server = FakeServer::new("de_dust2");
        server.connect(FakePlayer::bot(1));
        server.connect(FakePlayer::relay(2));
        let players = server.players();
        assert!(players.iter().all(|p| p.is_bot() || p.is_relay()));
    }
}
