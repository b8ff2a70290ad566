use crate::error::Result;
use crate::types::{Device, DeviceId};

/// Everything the registry needs to know about a freshly opened joystick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoystickInfo {
    pub id: DeviceId,
    pub index: u32,
    pub name: String,
    pub guid: String,
    pub num_buttons: u32,
    pub num_hats: u32,
    pub num_axes: u32,
    pub path: Option<String>,
    pub battery_level: i8,
    pub is_wheel: bool,
    /// Controller database line for this joystick, when the backend knows one.
    pub controller_db: Option<String>,
}

impl JoystickInfo {
    pub fn to_device(&self) -> Device {
        Device {
            id: self.id,
            index: i32::try_from(self.index).unwrap_or(i32::MAX),
            name: self.name.clone(),
            guid: self.guid.clone(),
            num_buttons: self.num_buttons,
            num_hats: self.num_hats,
            num_axes: self.num_axes,
            path: self.path.clone(),
            battery_level: self.battery_level,
            is_wheel: self.is_wheel,
        }
    }
}

/// Raw OS event, before calibration and mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    /// A joystick appeared at the given enumeration index.
    DeviceAdded { index: u32 },
    /// The joystick with the given instance id went away.
    DeviceRemoved { id: DeviceId },
    Axis { id: DeviceId, axis: u32, value: i32 },
    Button { id: DeviceId, button: u32, pressed: bool },
    Hat { id: DeviceId, hat: u32, mask: i32 },
    Key { scancode: i32, pressed: bool, repeat: bool },
    Cec { code: i32, pressed: bool },
    MouseMotion { x: i32, y: i32 },
    MouseButton { button: u8, pressed: bool, x: i32, y: i32 },
    Quit,
}

/// Platform joystick layer.
///
/// One implementation per platform; everything above it only sees
/// [`JoystickInfo`] and [`RawEvent`].
pub trait JoystickBackend {
    /// Number of joysticks currently known to the OS.
    fn enumerate(&mut self) -> Result<u32>;

    /// Opens the joystick at an enumeration index.
    fn open(&mut self, index: u32) -> Result<JoystickInfo>;

    /// Closes one open joystick. Unknown ids are ignored.
    fn close(&mut self, id: DeviceId);

    /// Closes every open joystick handle.
    fn close_all(&mut self);

    /// Drains pending OS events into `out`.
    fn poll(&mut self, out: &mut Vec<RawEvent>);

    /// Human readable name of the joystick at an index, without opening it.
    fn name_for_index(&self, index: u32) -> Option<String>;

    /// Instance id the joystick at an index has or will have once opened.
    fn instance_id_for_index(&self, index: u32) -> Option<DeviceId>;

    /// Rest value the hardware reported for an axis of an open joystick.
    fn axis_rest(&self, id: DeviceId, axis: u32) -> Option<i32>;
}
