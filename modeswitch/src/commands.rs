use super::*;

use std::collections::BTreeMap;

pub const CMD_HELP: &str = "css_nmm";
pub const CMD_MODES: &str = "css_modes";
pub const CMD_RTV: &str = "css_rtv";
pub const CMD_SET_MODE: &str = "css_mode";
pub const CMD_RELOAD: &str = "css_nmm_reload";

pub const BASE_COMMANDS: [&str; 5] = [CMD_HELP, CMD_MODES, CMD_RTV, CMD_SET_MODE, CMD_RELOAD];

/// Replace every character outside `[A-Za-z0-9_]` with `_`
/// and trim underscores from both ends.
pub fn to_safe_token(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let token = replaced.trim_matches('_');
    if token.is_empty() {
        "mode".to_owned()
    } else {
        token.to_owned()
    }
}

pub fn dynamic_command_name(mode_key: &str) -> String {
    format!("css_{}", to_safe_token(mode_key.trim()))
}

pub fn is_base_command(name: &str) -> bool {
    BASE_COMMANDS.iter().any(|c| eq_ignore_case(c, name))
}

/// Where a command invocation goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Help,
    Modes,
    Rtv,
    SetMode,
    Reload,
    /// Vote for the mode with this key.
    Vote(String),
}

/// Registered commands.
/// The per-mode commands are rebuilt from scratch on every config change.
#[derive(Default, Debug)]
pub struct CommandTable {
    base_registered: bool,
    dynamic: BTreeMap<String, String>,
}

impl CommandTable {
    pub fn register_base(&mut self) -> bool {
        if self.base_registered {
            return false;
        }
        self.base_registered = true;
        true
    }

    pub fn rebuild(&mut self, config: &ModeManagerConfig) {
        self.dynamic.clear();
        for key in config.modes.keys() {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            self.dynamic
                .insert(dynamic_command_name(key).to_ascii_lowercase(), key.to_owned());
        }
        info!("registered {} mode commands", self.dynamic.len());
    }

    pub fn clear_dynamic(&mut self) {
        self.dynamic.clear();
    }

    /// Names of all commands the host should expose.
    pub fn names(&self) -> Vec<String> {
        let mut out = vec![];
        if self.base_registered {
            out.extend(BASE_COMMANDS.iter().map(|s| s.to_string()));
        }
        out.extend(self.dynamic.keys().cloned());
        out
    }

    pub fn route(&self, name: &str) -> Option<Route> {
        let name = name.trim().to_ascii_lowercase();
        if self.base_registered {
            let route = match name.as_str() {
                CMD_HELP => Some(Route::Help),
                CMD_MODES => Some(Route::Modes),
                CMD_RTV => Some(Route::Rtv),
                CMD_SET_MODE => Some(Route::SetMode),
                CMD_RELOAD => Some(Route::Reload),
                _ => None,
            };
            if route.is_some() {
                return route;
            }
        }
        self.dynamic.get(&name).cloned().map(Route::Vote)
    }
}
