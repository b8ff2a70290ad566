use log::{error, warn};
use serde::Deserialize;

use padseat_device::{Input, InputKind, CEC_ID, KEYBOARD_ID};

use crate::mapping::Mapping;
use crate::record::{Record, RecordKind, StoreFile};
use crate::settings::{GunSettings, InputSettings, PlayerPreference, ScreenSize, Settings};
use crate::v1::{
    DeviceRecordV1, GunV1, InputRecordV1, InputV1, PlayerV1, RecordKindV1, ScreenV1, SettingsV1,
    StoreV1,
};
use crate::{SettingsError, StoreError};

const CURRENT_VERSION: u8 = 1;

/// A document with a version.
#[derive(Debug, Clone, Deserialize)]
struct Versioned {
    version: u8,
}

fn parse_version(input: &str) -> Result<u8, serde_yaml::Error> {
    let raw: Versioned = serde_yaml::from_str(input)?;
    Ok(raw.version)
}

fn record_from_v1(device: DeviceRecordV1) -> Record {
    let (kind, device_id) = match device.kind {
        RecordKindV1::Keyboard => (RecordKind::Keyboard, KEYBOARD_ID),
        RecordKindV1::Cec => (RecordKind::Cec, CEC_ID),
        RecordKindV1::Joystick => (RecordKind::Joystick, 0),
    };
    let mut mapping = Mapping::new();
    for input in device.inputs {
        let Ok(input_kind) = input.kind.parse::<InputKind>() else {
            error!(
                "Invalid input type \"{}\" for \"{}\" in \"{}\"",
                input.kind, input.name, device.name
            );
            continue;
        };
        if input.configured == Some(false) {
            warn!(
                "Input \"{}\" of \"{}\" is not configured, skipping",
                input.name, device.name
            );
            continue;
        }
        if input.value == 0 {
            warn!(
                "Input \"{}\" of \"{}\" has value 0, it will never be pressed",
                input.name, device.name
            );
        }
        mapping.map_input(
            &input.name,
            Input::new(device_id, input_kind, input.id, input.value, true),
        );
    }
    Record {
        kind,
        name: device.name,
        guid: device.guid,
        mapping,
    }
}

fn record_to_v1(record: &Record) -> DeviceRecordV1 {
    DeviceRecordV1 {
        kind: match record.kind {
            RecordKind::Keyboard => RecordKindV1::Keyboard,
            RecordKind::Cec => RecordKindV1::Cec,
            RecordKind::Joystick => RecordKindV1::Joystick,
        },
        name: record.name.clone(),
        guid: record.guid.clone(),
        inputs: record
            .mapping
            .iter()
            .filter(|(_, input)| input.configured)
            .map(|(name, input)| InputRecordV1 {
                name: name.to_string(),
                device: Some(input.device),
                kind: input.kind.as_str().to_string(),
                id: input.id,
                value: input.value,
                configured: Some(input.configured),
            })
            .collect(),
    }
}

/// Parse a yaml mapping store.
pub fn parse_store(input: &str) -> Result<StoreFile, StoreError> {
    let version = parse_version(input)?;
    match version {
        1 => {
            let store: StoreV1 = serde_yaml::from_str(input)?;
            Ok(StoreFile {
                on_finish: store.on_finish,
                records: store.devices.into_iter().map(record_from_v1).collect(),
            })
        }
        _ => Err(StoreError::UnsupportedVersion(version)),
    }
}

/// Render a mapping store as yaml.
pub fn render_store(store: &StoreFile) -> Result<String, StoreError> {
    let raw = StoreV1 {
        version: CURRENT_VERSION,
        on_finish: store.on_finish.clone(),
        devices: store.records.iter().map(record_to_v1).collect(),
    };
    Ok(serde_yaml::to_string(&raw)?)
}

/// Parse yaml settings.
pub fn parse_settings(input: &str) -> Result<Settings, SettingsError> {
    let version = parse_version(input)?;
    match version {
        1 => {
            let raw: SettingsV1 = serde_yaml::from_str(input)?;
            Ok(settings_from_v1(raw))
        }
        _ => Err(SettingsError::UnsupportedVersion(version)),
    }
}

fn settings_from_v1(raw: SettingsV1) -> Settings {
    let input_defaults = InputSettings::default();
    let gun_defaults = GunSettings::default();
    let players = raw
        .players
        .into_iter()
        .filter(|(player, _)| *player > 0)
        .map(|(player, p)| (player, PlayerPreference::new(p.path, p.name, p.guid)))
        .filter(|(_, p)| !p.is_empty())
        .collect();
    Settings {
        players,
        input: InputSettings {
            max_players: raw.input.max_players.unwrap_or(input_defaults.max_players),
            deadzone: raw.input.deadzone.unwrap_or(input_defaults.deadzone),
            background_events: raw
                .input
                .background_events
                .unwrap_or(input_defaults.background_events),
        },
        gun: GunSettings {
            move_tolerance: raw.gun.move_tolerance.unwrap_or(gun_defaults.move_tolerance),
            mouse_fallback: raw.gun.mouse_fallback.unwrap_or(gun_defaults.mouse_fallback),
            screen: raw
                .gun
                .screen
                .map(|s| ScreenSize {
                    width: s.width,
                    height: s.height,
                })
                .unwrap_or(gun_defaults.screen),
        },
    }
}

/// Render settings as yaml.
pub fn render_settings(settings: &Settings) -> Result<String, SettingsError> {
    let raw = SettingsV1 {
        version: CURRENT_VERSION,
        players: settings
            .players
            .iter()
            .map(|(player, p)| {
                (
                    *player,
                    PlayerV1 {
                        path: p.path.clone(),
                        name: p.name.clone(),
                        guid: p.guid.clone(),
                    },
                )
            })
            .collect(),
        input: InputV1 {
            max_players: Some(settings.input.max_players),
            deadzone: Some(settings.input.deadzone),
            background_events: Some(settings.input.background_events),
        },
        gun: GunV1 {
            move_tolerance: Some(settings.gun.move_tolerance),
            mouse_fallback: Some(settings.gun.mouse_fallback),
            screen: Some(ScreenV1 {
                width: settings.gun.screen.width,
                height: settings.gun.screen.height,
            }),
        },
    };
    Ok(serde_yaml::to_string(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE: &str = r#"
version: 1
on_finish:
  - "true"
devices:
  - type: keyboard
    name: Keyboard
    guid: "-1"
    inputs:
      - { name: a, type: key, id: 41, value: 1 }
  - type: joystick
    name: PadOne
    guid: "030000005e04"
    inputs:
      - { name: A, type: button, id: 1, value: 1 }
      - { name: joystick1up, type: axis, id: 1, value: -1 }
      - { name: up, type: hat, id: 0, value: 1 }
      - { name: l2, type: trigger, id: 4, value: 1 }
"#;

    #[test]
    fn parse_store_yaml_error_when_version_missing() {
        assert!(matches!(
            parse_store("devices: []\n"),
            Err(StoreError::Yaml(_))
        ));
    }

    #[test]
    fn parse_store_rejects_unknown_version() {
        assert!(matches!(
            parse_store("version: 7\n"),
            Err(StoreError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn parse_store_reads_records_and_skips_unknown_types() {
        let store = parse_store(STORE).expect("store should parse");
        assert_eq!(store.on_finish, vec!["true".to_string()]);
        assert_eq!(store.records.len(), 2);

        let keyboard = &store.records[0];
        assert_eq!(keyboard.kind, RecordKind::Keyboard);
        assert_eq!(
            keyboard.mapping.input_by_name("a").map(|i| i.device),
            Some(KEYBOARD_ID)
        );

        let pad = &store.records[1];
        assert_eq!(pad.mapping.len(), 3);
        assert!(pad.mapping.input_by_name("a").is_some());
        assert!(pad.mapping.input_by_name("l2").is_none());
    }

    #[test]
    fn rendered_store_parses_back() {
        let store = parse_store(STORE).expect("store should parse");
        let yaml = render_store(&store).expect("render");
        assert_eq!(parse_store(&yaml).expect("reparse"), store);
    }

    #[test]
    fn rendered_rows_carry_device_type_id_value_and_configured() {
        let mut mapping = Mapping::new();
        mapping.map_input("a", Input::new(7, InputKind::Button, 2, 1, true));
        let store = StoreFile {
            on_finish: Vec::new(),
            records: vec![Record {
                kind: RecordKind::Joystick,
                name: "PadOne".into(),
                guid: "030000005e04".into(),
                mapping,
            }],
        };
        let yaml = render_store(&store).expect("render");
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).expect("yaml");
        let row = &doc["devices"][0]["inputs"][0];
        assert_eq!(row["name"].as_str(), Some("a"));
        assert_eq!(row["device"].as_i64(), Some(7));
        assert_eq!(row["type"].as_str(), Some("button"));
        assert_eq!(row["id"].as_i64(), Some(2));
        assert_eq!(row["value"].as_i64(), Some(1));
        assert_eq!(row["configured"].as_bool(), Some(true));
    }

    #[test]
    fn unconfigured_rows_are_skipped() {
        let store = parse_store(
            "version: 1\ndevices:\n  - type: joystick\n    name: Pad\n    guid: \"01\"\n    inputs:\n      - { name: a, device: 3, type: button, id: 0, value: 1, configured: false }\n      - { name: b, type: button, id: 1, value: 1 }\n",
        )
        .expect("store should parse");
        let mapping = &store.records[0].mapping;
        assert!(mapping.input_by_name("a").is_none());
        assert_eq!(mapping.input_by_name("b").map(|i| i.configured), Some(true));
        // The stored device id is not trusted, records start detached.
        assert_eq!(mapping.input_by_name("b").map(|i| i.device), Some(0));
    }

    #[test]
    fn parse_settings_applies_defaults() {
        let settings = parse_settings("version: 1\nplayers:\n  1: { name: PadTwo }\n  2: { name: DEFAULT }\n")
            .expect("settings should parse");
        assert_eq!(settings.players.len(), 1);
        assert_eq!(settings.input, InputSettings::default());
        assert_eq!(settings.gun, GunSettings::default());
    }

    #[test]
    fn parse_settings_rejects_unknown_fields() {
        assert!(matches!(
            parse_settings("version: 1\ninput: { deadzone: 1, turbo: true }\n"),
            Err(SettingsError::Yaml(_))
        ));
    }
}
