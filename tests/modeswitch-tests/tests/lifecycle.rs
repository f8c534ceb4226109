use anyhow::Result;
use modeswitch_tests::*;
use std::time::Duration;
use test_log::test;

fn with_initial_mode(c: &mut ModeManagerConfig) {
    c.initial_mode_key = Some("retake".to_owned());
    c.apply_initial_mode_on_startup = true;
    c.switch_delay_seconds = 0;
}

#[test(tokio::test(start_paused = true))]
async fn initial_mode_waits_for_first_player() -> Result<()> {
    let s = Server::builder().config(with_initial_mode).build().await?;
    let view = s.manager.inspect().await;
    assert!(view.initial_mode_queued);
    assert!(!view.initial_mode_applied);

    wait(5).await;
    assert!(s.manager.inspect().await.pending.is_none());
    assert!(s.env.runner.lines().is_empty());

    // Bots don't wake the watcher.
    s.env.server.connect(FakePlayer::bot(1));
    wait(2).await;
    assert!(s.manager.inspect().await.pending.is_none());

    s.env.connect_humans(2, 1);
    wait(2).await;
    let view = s.manager.inspect().await;
    assert_eq!(
        view.pending,
        Some(PendingSwitchView {
            mode_key: "retake".to_owned(),
            reason: SwitchReason::StartupFirstPlayer,
            target_map: None,
        })
    );
    assert!(s.broadcasts().contains(&Message::InitialModeScheduled {
        mode: "Retake".to_owned(),
        seconds: 3,
    }));

    wait(4).await;
    let view = s.manager.inspect().await;
    assert!(view.initial_mode_applied);
    assert!(!view.initial_mode_queued);
    assert_eq!(view.active_mode_key.as_deref(), Some("retake"));
    assert_eq!(s.env.runner.changelevels(), vec!["de_nuke"]);

    // Applied once per load.
    wait(10).await;
    assert_eq!(s.env.runner.changelevels().len(), 1);
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn failed_initial_mode_is_retried() -> Result<()> {
    let s = Server::builder().config(with_initial_mode).build().await?;
    s.env.runner.fail_on(Some("exec nmodemanager/retake.cfg"));
    s.env.connect_humans(1, 1);

    wait(5).await;
    assert!(s.broadcasts().contains(&Message::ModeApplyFailed {
        mode: "Retake".to_owned(),
    }));
    let view = s.manager.inspect().await;
    assert!(!view.initial_mode_applied);
    assert!(view.initial_mode_queued);

    s.env.runner.fail_on(None);
    wait(6).await;
    let view = s.manager.inspect().await;
    assert!(view.initial_mode_applied);
    assert_eq!(s.env.runner.changelevels(), vec!["de_nuke"]);
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn unknown_initial_mode_is_dropped() -> Result<()> {
    let s = Server::builder()
        .config(|c| {
            with_initial_mode(c);
            c.initial_mode_key = Some("arena".to_owned());
        })
        .build()
        .await?;
    s.env.connect_humans(1, 1);

    wait(3).await;
    let view = s.manager.inspect().await;
    assert!(!view.initial_mode_queued);
    assert!(view.pending.is_none());
    assert!(view.active_mode_key.is_none());
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn reload_resets_runtime_state() -> Result<()> {
    let s = Server::new().await?;
    let p = s.env.connect_humans(1, 5);

    s.vote(&p[0], "dm", None).await;
    assert!(s.manager.inspect().await.vote.is_some());

    let mut config = config();
    config
        .modes
        .insert("arena".to_owned(), mode("arena", "Arena", &["am_grass"]));
    s.env.config.set(Some(config));

    let (found, r) = s.command(None, "css_nmm_reload").await;
    assert!(found);
    assert_eq!(
        r,
        vec![Message::ReloadConfigSuccess, Message::ReloadCommandsRebuilt]
    );
    assert!(s.manager.inspect().await.vote.is_none());
    assert!(s
        .manager
        .command_names()
        .await
        .contains(&"css_arena".to_owned()));

    let r = s.vote(&p[0], "arena", None).await;
    assert!(matches!(
        &r[..],
        [Message::VoteRegisteredSelf { map, .. }] if map == "am_grass"
    ));
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn failed_reload_still_resets() -> Result<()> {
    let s = Server::new().await?;
    let p = s.env.connect_humans(1, 1);

    s.vote(&p[0], "retake", None).await;
    wait(6).await;
    assert!(s.manager.inspect().await.cooldown_remaining.is_some());

    let replies = Replies::default();
    s.manager
        .handle_vote_request(None, &s.mode("dm"), None, false, &replies.sink())
        .await;
    assert!(s.manager.inspect().await.pending.is_some());

    s.env.config.set(None);
    let (_, r) = s.command(None, "css_nmm_reload").await;
    assert_eq!(
        r,
        vec![
            Message::ReloadFailed {
                error: "config file not found".to_owned(),
            },
            Message::ReloadCommandsRebuilt,
        ]
    );
    let view = s.manager.inspect().await;
    assert!(view.pending.is_none());
    assert!(view.cooldown_remaining.is_none());
    assert_eq!(s.manager.config().modes.len(), 3);

    // Rejected configs are never swapped in.
    let mut config = config();
    config.vote_ratio = 1.5;
    s.env.config.set(Some(config));
    assert!(s.manager.reload_config().await.is_err());
    assert_eq!(s.manager.config().vote_ratio, 0.6);

    // The canceled switch never runs.
    wait(10).await;
    assert_eq!(s.env.runner.changelevels(), vec!["de_nuke"]);
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn reload_needs_root_permission() -> Result<()> {
    let s = Server::new().await?;
    let player = s.env.server.connect(FakePlayer::human(1));
    let admin = s.env.server.connect(FakePlayer::admin(2));

    let (_, r) = s.command(Some(&*player), "css_nmm_reload").await;
    assert_eq!(r, vec![Message::NoPermission]);

    let (_, r) = s.command(Some(&*admin), "css_nmm_reload").await;
    assert_eq!(r[0], Message::ReloadConfigSuccess);
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn reload_queues_initial_mode_until_applied() -> Result<()> {
    let s = Server::new().await?;
    assert!(!s.manager.inspect().await.initial_mode_queued);

    let mut config = config();
    with_initial_mode(&mut config);
    s.env.config.set(Some(config));
    s.manager.reload_config().await?;
    assert!(s.manager.inspect().await.initial_mode_queued);

    s.env.connect_humans(1, 1);
    wait(6).await;
    assert!(s.manager.inspect().await.initial_mode_applied);

    s.manager.reload_config().await?;
    assert!(!s.manager.inspect().await.initial_mode_queued);
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn unload_drops_everything() -> Result<()> {
    let s = Server::new().await?;
    let p = s.env.connect_humans(1, 5);

    s.vote(&p[0], "dm", None).await;
    let replies = Replies::default();
    s.manager
        .handle_vote_request(None, &s.mode("retake"), None, false, &replies.sink())
        .await;

    s.manager.unload().await;
    let view = s.manager.inspect().await;
    assert!(view.pending.is_none());
    assert!(view.vote.is_none());

    let (found, _) = s.command(Some(&*p[0]), "css_dm").await;
    assert!(!found);
    assert_eq!(s.manager.command_names().await.len(), 5);

    wait(10).await;
    assert!(s.env.runner.lines().is_empty());
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn unload_during_failing_startup_switch_stays_unloaded() -> Result<()> {
    let s = Server::builder().config(with_initial_mode).build().await?;
    s.env.runner.fail_on(Some("exec nmodemanager/retake.cfg"));
    s.env.runner.set_latency(Duration::from_secs(2));
    s.env.connect_humans(1, 1);

    // The startup switch fires at 4s and fails at 8s.
    tokio::time::sleep(Duration::from_millis(4500)).await;
    s.manager.unload().await;

    wait(4).await;
    s.env.runner.fail_on(None);
    wait(20).await;

    assert_eq!(
        s.env.runner.lines(),
        vec!["exec nmodemanager/reset.cfg", "exec nmodemanager/retake.cfg"]
    );
    let view = s.manager.inspect().await;
    assert!(view.pending.is_none());
    assert!(!view.initial_mode_queued);
    assert!(!view.initial_mode_applied);
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn invalid_config_is_rejected_at_startup() {
    let env = Env::new(config());

    let mut bad = config();
    bad.modes.clear();
    assert!(ModeManager::new(bad, env.host()).is_err());

    let mut bad = config();
    bad.switch_delay_seconds = -1;
    let e = ModeManager::new(bad, env.host()).err().unwrap();
    assert!(e.to_string().contains("switch delay"));
}
