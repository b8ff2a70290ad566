use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SettingsV1 {
    pub version: u8,
    #[serde(default)]
    pub players: BTreeMap<usize, PlayerV1>,
    #[serde(default)]
    pub input: InputV1,
    #[serde(default)]
    pub gun: GunV1,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlayerV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InputV1 {
    #[serde(default)]
    pub max_players: Option<usize>,
    #[serde(default)]
    pub deadzone: Option<i32>,
    #[serde(default)]
    pub background_events: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GunV1 {
    #[serde(default)]
    pub move_tolerance: Option<f32>,
    #[serde(default)]
    pub mouse_fallback: Option<bool>,
    #[serde(default)]
    pub screen: Option<ScreenV1>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScreenV1 {
    pub width: u32,
    pub height: u32,
}
