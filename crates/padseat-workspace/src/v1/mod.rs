mod settings;
mod store;

pub(crate) use settings::{GunV1, InputV1, PlayerV1, ScreenV1, SettingsV1};
pub(crate) use store::{DeviceRecordV1, InputRecordV1, RecordKindV1, StoreV1};
