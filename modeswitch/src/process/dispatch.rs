use super::*;

const ROOT_PERMISSION: &str = "@css/root";

const HELP_LINES: [(&str, &str); 6] = [
    ("css_nmm", "show this help"),
    ("css_modes", "list the configured modes"),
    ("css_rtv", "show the running mode vote"),
    ("css_<mode> [map]", "vote for a mode"),
    ("css_mode <key> [map]", "switch mode right away (admin)"),
    ("css_nmm_reload", "reload the config (admin)"),
];

/// The console may do anything. A player needs the root permission.
pub fn can_execute_root_action(caller: Option<&dyn Player>) -> bool {
    match caller {
        None => true,
        Some(player) => player.is_valid() && player.has_permission(ROOT_PERMISSION),
    }
}

fn modes_list(config: &ModeManagerConfig) -> Message {
    Message::ModesList {
        modes: config.mode_keys().join(", "),
    }
}

fn non_empty_arg<'a>(args: &[&'a str], i: usize) -> Option<&'a str> {
    args.get(i).map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl ModeManager {
    /// Run a registered command.
    /// `caller` is `None` for the server console.
    /// Returns false if no command of that name is registered.
    pub async fn dispatch_command(
        &self,
        caller: Option<&dyn Player>,
        name: &str,
        args: &[&str],
        reply: &dyn Fn(Message),
    ) -> bool {
        let route = self.state.read().await.commands.route(name);
        let Some(route) = route else {
            return false;
        };
        debug!("dispatch {name} -> {route:?}");

        match route {
            Route::Help => self.cmd_help(reply),
            Route::Modes => self.cmd_modes(reply),
            Route::Rtv => self.cmd_rtv(caller, reply).await,
            Route::SetMode => self.cmd_set_mode(caller, args, reply).await,
            Route::Reload => self.cmd_reload(caller, reply).await,
            Route::Vote(key) => self.cmd_vote(caller, &key, args, reply).await,
        }
        true
    }

    fn cmd_help(&self, reply: &dyn Fn(Message)) {
        reply(Message::HelpTitle);
        for (usage, description) in HELP_LINES {
            reply(Message::HelpLine { usage, description });
        }
        reply(modes_list(&self.config()));
    }

    fn cmd_modes(&self, reply: &dyn Fn(Message)) {
        reply(modes_list(&self.config()));
        reply(Message::ModesVoteHint);
    }

    async fn cmd_rtv(&self, caller: Option<&dyn Player>, reply: &dyn Fn(Message)) {
        if let Some(player) = caller {
            if self
                .try_reply_active_vote_status_for_voter(player, reply)
                .await
            {
                return;
            }
        }

        if let Some(mode) = self.try_get_active_vote_mode().await {
            reply(Message::VoteMapSelectionAvailableMaps {
                mode: mode.display_name.clone(),
                maps: self.get_selectable_maps_for_mode(&mode).join(", "),
            });
            return;
        }

        self.cmd_modes(reply);
    }

    async fn cmd_set_mode(
        &self,
        caller: Option<&dyn Player>,
        args: &[&str],
        reply: &dyn Fn(Message),
    ) {
        let Some(key) = non_empty_arg(args, 0) else {
            reply(modes_list(&self.config()));
            reply(Message::ErrorSetModeUsage);
            return;
        };
        let map = non_empty_arg(args, 1);
        self.admin_set_mode(caller, key, map, reply).await;
    }

    async fn cmd_reload(&self, caller: Option<&dyn Player>, reply: &dyn Fn(Message)) {
        if !can_execute_root_action(caller) {
            reply(Message::NoPermission);
            return;
        }

        match self.reload_config().await {
            Ok(()) => reply(Message::ReloadConfigSuccess),
            Err(e) => reply(Message::ReloadFailed {
                error: format!("{e:#}"),
            }),
        }
        reply(Message::ReloadCommandsRebuilt);
    }

    async fn cmd_vote(
        &self,
        caller: Option<&dyn Player>,
        key: &str,
        args: &[&str],
        reply: &dyn Fn(Message),
    ) {
        let Some(mode) = self.config().find_mode(key).cloned() else {
            reply(Message::ErrorModeNotFound {
                key: key.to_owned(),
            });
            return;
        };
        let map = non_empty_arg(args, 0);
        self.handle_vote_request(caller, &mode, map, false, reply)
            .await;
    }
}
