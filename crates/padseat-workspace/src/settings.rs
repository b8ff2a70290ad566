use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use padseat_device::{Device, DEFAULT_DEADZONE};

use crate::parse::{parse_settings, render_settings};
use crate::store::write_atomic;
use crate::SettingsError;

pub const DEFAULT_MAX_PLAYERS: usize = 8;
pub const DEFAULT_MOVE_TOLERANCE: f32 = 2.0;

/// Name the settings UI writes when a player has no preference.
const NO_PREFERENCE_NAME: &str = "DEFAULT";

/// Saved device preference of one player slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerPreference {
    pub path: Option<String>,
    pub name: Option<String>,
    pub guid: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl PlayerPreference {
    /// Builds a preference, dropping empty strings and the `DEFAULT` name.
    pub fn new(path: Option<String>, name: Option<String>, guid: Option<String>) -> Self {
        Self {
            path: non_empty(path),
            name: non_empty(name).filter(|n| n != NO_PREFERENCE_NAME),
            guid: non_empty(guid),
        }
    }

    pub fn for_device(device: &Device) -> Self {
        Self::new(
            Some(device.sort_path()),
            Some(device.name.clone()),
            Some(device.guid.clone()),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.name.is_none() && self.guid.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSettings {
    pub max_players: usize,
    pub deadzone: i32,
    pub background_events: bool,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            deadzone: DEFAULT_DEADZONE,
            background_events: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GunSettings {
    /// Pointer displacement, in screen pixels, below which moves are dropped.
    pub move_tolerance: f32,
    pub mouse_fallback: bool,
    pub screen: ScreenSize,
}

impl Default for GunSettings {
    fn default() -> Self {
        Self {
            move_tolerance: DEFAULT_MOVE_TOLERANCE,
            mouse_fallback: false,
            screen: ScreenSize::default(),
        }
    }
}

/// User settings: player preferences and input tunables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Preferences keyed by 1-based player number.
    pub players: BTreeMap<usize, PlayerPreference>,
    pub input: InputSettings,
    pub gun: GunSettings,
}

impl Settings {
    /// Reads settings from disk. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(Self::default()),
            Ok(content) => parse_settings(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        write_atomic(path, &render_settings(self)?)?;
        Ok(())
    }

    /// One preference per player slot, empty where nothing is saved.
    pub fn preferences(&self) -> Vec<PlayerPreference> {
        (1..=self.input.max_players)
            .map(|player| self.players.get(&player).cloned().unwrap_or_default())
            .collect()
    }

    /// Stores (or clears, when empty) the preference of a 1-based player.
    pub fn set_preference(&mut self, player: usize, preference: PlayerPreference) {
        if preference.is_empty() {
            self.players.remove(&player);
        } else {
            self.players.insert(player, preference);
        }
    }
}
