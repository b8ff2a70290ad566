use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a live device.
///
/// Joysticks use the backend's session-stable instance id (0 and up),
/// the process-wide singletons use the reserved negative values below.
pub type DeviceId = i32;

pub const KEYBOARD_ID: DeviceId = -1;
pub const CEC_ID: DeviceId = -2;
pub const MOUSE_ID: DeviceId = -3;
pub const GUN_ID: DeviceId = -4;

pub const KEYBOARD_GUID: &str = "-1";
pub const CEC_GUID: &str = "-2";
pub const MOUSE_GUID: &str = "-3";
pub const GUN_GUID: &str = "-4";

pub const KEYBOARD_NAME: &str = "Keyboard";
pub const CEC_NAME: &str = "CEC";
pub const MOUSE_NAME: &str = "Mouse";
pub const GUN_NAME: &str = "Gun";

/// Battery level reported for wired devices or when the level is unknown.
pub const UNKNOWN_BATTERY: i8 = -1;

/// Hat direction bits, combinable for diagonals.
pub mod hat {
    pub const CENTERED: i32 = 0;
    pub const UP: i32 = 1;
    pub const RIGHT: i32 = 2;
    pub const DOWN: i32 = 4;
    pub const LEFT: i32 = 8;
}

/// Kind of a physical control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    Axis,
    Button,
    Hat,
    Key,
    CecButton,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Axis => "axis",
            InputKind::Button => "button",
            InputKind::Hat => "hat",
            InputKind::Key => "key",
            InputKind::CecButton => "cec-button",
        }
    }
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "axis" => Ok(InputKind::Axis),
            "button" => Ok(InputKind::Button),
            "hat" => Ok(InputKind::Hat),
            "key" => Ok(InputKind::Key),
            "cec-button" => Ok(InputKind::CecButton),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical control state.
///
/// Raw events coming off a device carry `configured: false`; bindings
/// stored in a mapping carry `configured: true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Input {
    pub device: DeviceId,
    pub kind: InputKind,
    pub id: i32,
    pub value: i32,
    pub configured: bool,
}

impl Input {
    pub fn new(device: DeviceId, kind: InputKind, id: i32, value: i32, configured: bool) -> Self {
        Self {
            device,
            kind,
            id,
            value,
            configured,
        }
    }

    /// Returns the same control marked as a stored binding.
    #[must_use]
    pub fn into_configured(self) -> Self {
        Self {
            configured: true,
            ..self
        }
    }

    /// Whether two inputs address the same physical control, ignoring value.
    pub fn same_control(&self, other: &Input) -> bool {
        self.device == other.device && self.kind == other.kind && self.id == other.id
    }

    /// Whether the control is in its active state (pressed, deflected or tilted).
    pub fn is_active(&self) -> bool {
        self.value != 0
    }
}

fn hat_name(value: i32) -> &'static str {
    match value {
        hat::UP => "up",
        hat::DOWN => "down",
        hat::LEFT => "left",
        hat::RIGHT => "right",
        _ => "neutral?",
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InputKind::Button => write!(f, "Button {}", self.id),
            InputKind::Axis => {
                let sign = if self.value > 0 { '+' } else { '-' };
                write!(f, "Axis {}{sign}", self.id)
            }
            InputKind::Hat => write!(f, "Hat {} {}", self.id, hat_name(self.value)),
            InputKind::Key => write!(f, "Key {}", self.id),
            InputKind::CecButton => write!(f, "CEC-Button {}", self.id),
        }
    }
}

/// Broad class of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Cec,
    Mouse,
    Gun,
    Joystick,
}

impl DeviceKind {
    pub fn of(id: DeviceId) -> Self {
        match id {
            KEYBOARD_ID => DeviceKind::Keyboard,
            CEC_ID => DeviceKind::Cec,
            MOUSE_ID => DeviceKind::Mouse,
            GUN_ID => DeviceKind::Gun,
            _ => DeviceKind::Joystick,
        }
    }
}

/// A distinct physical or virtual input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    /// Enumeration order at the time of the last rebuild. Only meaningful
    /// for reopening a handle; never use it to identify a device later.
    pub index: i32,
    pub name: String,
    pub guid: String,
    pub num_buttons: u32,
    pub num_hats: u32,
    pub num_axes: u32,
    /// Bus path as exposed by the OS, if any.
    pub path: Option<String>,
    pub battery_level: i8,
    pub is_wheel: bool,
}

impl Device {
    fn singleton(id: DeviceId, name: &str, guid: &str) -> Self {
        Self {
            id,
            index: id,
            name: name.to_string(),
            guid: guid.to_string(),
            num_buttons: 0,
            num_hats: 0,
            num_axes: 0,
            path: None,
            battery_level: UNKNOWN_BATTERY,
            is_wheel: false,
        }
    }

    pub fn keyboard() -> Self {
        Self::singleton(KEYBOARD_ID, KEYBOARD_NAME, KEYBOARD_GUID)
    }

    pub fn cec() -> Self {
        Self::singleton(CEC_ID, CEC_NAME, CEC_GUID)
    }

    pub fn mouse() -> Self {
        Self::singleton(MOUSE_ID, MOUSE_NAME, MOUSE_GUID)
    }

    pub fn gun() -> Self {
        Self::singleton(GUN_ID, GUN_NAME, GUN_GUID)
    }

    pub fn kind(&self) -> DeviceKind {
        DeviceKind::of(self.id)
    }

    pub fn is_joystick(&self) -> bool {
        self.kind() == DeviceKind::Joystick
    }

    /// Stable string used to order devices deterministically.
    ///
    /// Uses the normalized OS path when there is one, otherwise an
    /// `index@guid` composite.
    pub fn sort_path(&self) -> String {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => normalize_os_path(path),
            _ => format!("{:03}@{}", self.index, self.guid),
        }
    }
}

/// Strips the per-session instance prefix some USB paths carry.
///
/// `USB\VID_045E&PID_02FF&IG_00\01&00&0000B7234380ED7E` becomes
/// `USB\VID_045E&PID_02FF&IG_00\0000B7234380ED7E`.
pub fn normalize_os_path(path: &str) -> String {
    let is_usb = path
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("USB\\"));
    if !is_usb {
        return path.to_string();
    }
    let Some(last_sep) = path.rfind('\\') else {
        return path.to_string();
    };
    match path.rfind('&') {
        Some(last_amp) if last_amp > last_sep => {
            format!("{}{}", &path[..=last_sep], &path[last_amp + 1..])
        }
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(index: i32, guid: &str, path: Option<&str>) -> Device {
        Device {
            id: index,
            index,
            name: "Pad".into(),
            guid: guid.into(),
            num_buttons: 12,
            num_hats: 1,
            num_axes: 4,
            path: path.map(str::to_string),
            battery_level: UNKNOWN_BATTERY,
            is_wheel: false,
        }
    }

    #[test]
    fn input_renders_human_readable_names() {
        let b = Input::new(0, InputKind::Button, 3, 1, true);
        let a = Input::new(0, InputKind::Axis, 1, -1, true);
        let h = Input::new(0, InputKind::Hat, 0, hat::LEFT, true);
        let k = Input::new(KEYBOARD_ID, InputKind::Key, 40, 1, true);
        let c = Input::new(CEC_ID, InputKind::CecButton, 1, 1, true);
        assert_eq!(b.to_string(), "Button 3");
        assert_eq!(a.to_string(), "Axis 1-");
        assert_eq!(h.to_string(), "Hat 0 left");
        assert_eq!(k.to_string(), "Key 40");
        assert_eq!(c.to_string(), "CEC-Button 1");
    }

    #[test]
    fn input_kind_parses_persisted_names() {
        for kind in [
            InputKind::Axis,
            InputKind::Button,
            InputKind::Hat,
            InputKind::Key,
            InputKind::CecButton,
        ] {
            assert_eq!(kind.as_str().parse::<InputKind>(), Ok(kind));
        }
        assert!("wheel".parse::<InputKind>().is_err());
    }

    #[test]
    fn singletons_use_reserved_ids() {
        assert_eq!(Device::keyboard().kind(), DeviceKind::Keyboard);
        assert_eq!(Device::cec().guid, CEC_GUID);
        assert!(!Device::gun().is_joystick());
        assert!(pad(2, "03000000de28", None).is_joystick());
    }

    #[test]
    fn sort_path_falls_back_to_index_and_guid() {
        assert_eq!(pad(2, "03000000de28", None).sort_path(), "002@03000000de28");
        assert_eq!(pad(2, "03000000de28", Some("")).sort_path(), "002@03000000de28");
    }

    #[test]
    fn sort_path_strips_usb_instance_prefix() {
        let device = pad(
            0,
            "x",
            Some("USB\\VID_045E&PID_02FF&IG_00\\01&00&0000B7234380ED7E"),
        );
        assert_eq!(
            device.sort_path(),
            "USB\\VID_045E&PID_02FF&IG_00\\0000B7234380ED7E"
        );
    }

    #[test]
    fn sort_path_keeps_non_usb_paths() {
        let device = pad(0, "x", Some("/dev/input/event3"));
        assert_eq!(device.sort_path(), "/dev/input/event3");
        assert_eq!(normalize_os_path("usb\\a\\b"), "usb\\a\\b");
    }
}
