mod backend;
mod calibrator;
mod error;
#[cfg(any(test, feature = "fake"))]
mod fake;
#[cfg(feature = "sdl2-backend")]
mod sdl;
mod types;

pub use crate::backend::{JoystickBackend, JoystickInfo, RawEvent};
pub use crate::calibrator::{bucket, AxisCalibrator, DEFAULT_DEADZONE};
pub use crate::error::{Error, Result};
#[cfg(any(test, feature = "fake"))]
pub use crate::fake::{FakeBackend, FakeJoystick};
#[cfg(feature = "sdl2-backend")]
pub use crate::sdl::{SdlBackend, SdlOptions};
pub use crate::types::{
    hat, normalize_os_path, Device, DeviceId, DeviceKind, Input, InputKind, CEC_GUID, CEC_ID,
    CEC_NAME, GUN_GUID, GUN_ID, GUN_NAME, KEYBOARD_GUID, KEYBOARD_ID, KEYBOARD_NAME, MOUSE_GUID,
    MOUSE_ID, MOUSE_NAME, UNKNOWN_BATTERY,
};
