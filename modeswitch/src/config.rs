use super::*;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Module names under which the mode manager itself may be loaded.
const SELF_MODULE_ALIASES: [&str; 2] = ["nModeManager", "nModeManager.dll"];

/// A named bundle of server configuration that can be activated.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModeDefinition {
    pub key: String,
    pub display_name: String,
    /// Command that applies the mode, e.g. `exec retake.cfg`.
    pub exec_command: String,
    pub default_map: Option<String>,
    pub map_pool: Vec<String>,
    pub game_type: Option<i64>,
    pub game_mode: Option<i64>,
    pub plugins_to_unload: Vec<String>,
    pub plugins_to_load: Vec<String>,
}

impl ModeDefinition {
    pub fn new(key: impl Into<String>, exec_command: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            display_name: key.clone(),
            key,
            exec_command: exec_command.into(),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModeManagerConfig {
    /// Passed through to the host's message catalog.
    pub language: String,
    pub initial_mode_key: Option<String>,
    pub apply_initial_mode_on_startup: bool,
    pub reset_command: String,
    pub vote_ratio: f64,
    pub vote_min_players: i64,
    pub vote_duration_seconds: i64,
    pub switch_cooldown_seconds: i64,
    pub switch_delay_seconds: i64,
    pub apply_game_type_mode: bool,
    pub end_match_map_vote_enabled: bool,
    pub end_match_map_vote_file: String,
    pub end_match_map_vote_mapgroup_prefix: String,
    pub modes: BTreeMap<String, ModeDefinition>,
}

impl Default for ModeManagerConfig {
    fn default() -> Self {
        let mut modes = BTreeMap::new();
        let mut retake = ModeDefinition::new("retake", "exec nmodemanager/retake.cfg");
        retake.display_name = "Retake".to_owned();
        modes.insert("retake".to_owned(), retake);

        Self {
            language: "en".to_owned(),
            initial_mode_key: Some("retake".to_owned()),
            apply_initial_mode_on_startup: true,
            reset_command: "exec nmodemanager/reset.cfg".to_owned(),
            vote_ratio: 0.6,
            vote_min_players: 1,
            vote_duration_seconds: 120,
            switch_cooldown_seconds: 20,
            switch_delay_seconds: 5,
            apply_game_type_mode: true,
            end_match_map_vote_enabled: false,
            end_match_map_vote_file: "gamemodes_server.txt".to_owned(),
            end_match_map_vote_mapgroup_prefix: "mg_nmm_".to_owned(),
            modes,
        }
    }
}

impl ModeManagerConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s).context("failed to parse mode manager config")?;
        Ok(config)
    }

    /// Find a mode by key. Exact match first, then case-insensitive.
    pub fn find_mode(&self, key: &str) -> Option<&ModeDefinition> {
        let key = key.trim();
        if let Some(mode) = self.modes.get(key) {
            return Some(mode);
        }
        self.modes
            .iter()
            .find(|(k, _)| eq_ignore_case(k.trim(), key))
            .map(|(_, mode)| mode)
    }

    pub fn mode_keys(&self) -> Vec<String> {
        self.modes.keys().cloned().collect()
    }

    /// Normalize the config in place and reject it if any rule is violated.
    pub fn validate(&mut self) -> std::result::Result<(), Error> {
        if self.modes.is_empty() {
            return Err(Error::ModesRequired);
        }
        if self.reset_command.trim().is_empty() {
            return Err(Error::ResetCommandRequired);
        }
        if !(self.vote_ratio > 0.0 && self.vote_ratio <= 1.0) {
            return Err(Error::VoteRatioOutOfRange(self.vote_ratio));
        }
        if self.vote_min_players < 1 {
            return Err(Error::VoteMinPlayersOutOfRange(self.vote_min_players));
        }
        if !(5..=300).contains(&self.vote_duration_seconds) {
            return Err(Error::VoteDurationOutOfRange(self.vote_duration_seconds));
        }
        if !(0..=600).contains(&self.switch_cooldown_seconds) {
            return Err(Error::SwitchCooldownOutOfRange(self.switch_cooldown_seconds));
        }
        if !(0..=600).contains(&self.switch_delay_seconds) {
            return Err(Error::SwitchDelayOutOfRange(self.switch_delay_seconds));
        }

        self.validate_end_match_map_vote()?;

        let mut seen: HashMap<String, String> = HashMap::new();
        for (map_key, mode) in self.modes.iter_mut() {
            let map_key = map_key.trim();
            if map_key.is_empty() {
                return Err(Error::ModeKeyRequired);
            }
            if let Some(other) = seen.insert(map_key.to_ascii_lowercase(), map_key.to_owned()) {
                return Err(Error::DuplicateModeKey(map_key.to_owned(), other));
            }
            validate_mode(map_key, mode)?;
        }

        self.validate_dynamic_command_names()
    }

    fn validate_end_match_map_vote(&mut self) -> std::result::Result<(), Error> {
        if !self.end_match_map_vote_enabled {
            return Ok(());
        }

        self.end_match_map_vote_file = self
            .end_match_map_vote_file
            .trim()
            .trim_matches('"')
            .to_owned();
        if self.end_match_map_vote_file.is_empty() {
            return Err(Error::EndMatchMapVoteFileRequired);
        }

        self.end_match_map_vote_mapgroup_prefix =
            self.end_match_map_vote_mapgroup_prefix.trim().to_owned();
        let prefix = &self.end_match_map_vote_mapgroup_prefix;
        if prefix.is_empty() || is_invalid_token(prefix) {
            return Err(Error::MapGroupPrefixInvalid(prefix.clone()));
        }
        Ok(())
    }

    fn validate_dynamic_command_names(&self) -> std::result::Result<(), Error> {
        let mut generated: HashMap<String, String> = HashMap::new();
        for map_key in self.modes.keys() {
            let command = commands::dynamic_command_name(map_key);
            if commands::is_base_command(&command) {
                return Err(Error::DynamicCommandConflictsBase(map_key.clone(), command));
            }
            if let Some(other) = generated.insert(command.to_ascii_lowercase(), map_key.clone()) {
                return Err(Error::DynamicCommandCollision(
                    map_key.clone(),
                    other,
                    command,
                ));
            }
        }
        Ok(())
    }
}

fn validate_mode(map_key: &str, mode: &mut ModeDefinition) -> std::result::Result<(), Error> {
    let key = mode.key.trim();
    if !key.is_empty() && !eq_ignore_case(key, map_key) {
        return Err(Error::ModeKeyMismatch(map_key.to_owned(), key.to_owned()));
    }
    // Sessions and switches refer to modes by this key.
    mode.key = map_key.to_owned();
    if mode.display_name.trim().is_empty() {
        mode.display_name = mode.key.clone();
    }

    if mode.exec_command.trim().is_empty() {
        return Err(Error::ExecCommandRequired(map_key.to_owned()));
    }

    let unloads_self = mode.plugins_to_unload.iter().any(|name| {
        SELF_MODULE_ALIASES
            .iter()
            .any(|alias| eq_ignore_case(name.trim(), alias))
    });
    if unloads_self {
        return Err(Error::SelfUnloadForbidden(
            map_key.to_owned(),
            SELF_MODULE_ALIASES[0].to_owned(),
        ));
    }

    if let Some(default_map) = &mode.default_map {
        let map = default_map.trim();
        if is_invalid_token(map) {
            return Err(Error::DefaultMapInvalid(map_key.to_owned(), map.to_owned()));
        }
    }

    let mut pool = vec![];
    let mut seen = HashSet::new();
    for raw in &mode.map_pool {
        let map = raw.trim();
        if map.is_empty() {
            continue;
        }
        if is_invalid_token(map) {
            return Err(Error::MapPoolMapInvalid(map_key.to_owned(), map.to_owned()));
        }
        if seen.insert(map.to_ascii_lowercase()) {
            pool.push(map.to_owned());
        }
    }
    mode.map_pool = pool;

    if let Some(game_type) = mode.game_type {
        if !(0..=20).contains(&game_type) {
            return Err(Error::GameTypeInvalid(map_key.to_owned(), game_type));
        }
    }
    if let Some(game_mode) = mode.game_mode {
        if !(0..=20).contains(&game_mode) {
            return Err(Error::GameModeInvalid(map_key.to_owned(), game_mode));
        }
    }
    Ok(())
}

fn is_invalid_token(s: &str) -> bool {
    s.contains(' ') || s.contains('"')
}

/// Supplies the configuration, initially and on every reload.
pub trait ConfigProvider: Send + Sync + 'static {
    fn load(&self) -> Result<ModeManagerConfig>;
}

/// Reads the configuration from a JSON file.
pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigProvider for JsonFileConfig {
    fn load(&self) -> Result<ModeManagerConfig> {
        let s = std::fs::read_to_string(&self.path)
            .with_context(|| format!("config not found at {}", self.path.display()))?;
        ModeManagerConfig::from_json(&s)
    }
}
