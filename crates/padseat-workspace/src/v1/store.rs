use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StoreV1 {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_finish: Vec<String>,
    #[serde(default)]
    pub devices: Vec<DeviceRecordV1>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RecordKindV1 {
    Keyboard,
    Cec,
    Joystick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DeviceRecordV1 {
    #[serde(rename = "type")]
    pub kind: RecordKindV1,
    pub name: String,
    pub guid: String,
    #[serde(default)]
    pub inputs: Vec<InputRecordV1>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InputRecordV1 {
    pub name: String,
    /// Device id the binding was captured from. Informational, the live
    /// id is reassigned on every load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<i32>,
    // Kept as a string so one unknown type does not reject the whole file.
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i32,
    pub value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configured: Option<bool>,
}
