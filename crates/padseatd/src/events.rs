use padseat_device::{DeviceId, Input};
use padseat_workspace::Mapping;

/// Notification published to subscribers of an [`InputContext`](crate::InputContext).
#[derive(Debug, Clone, PartialEq)]
pub enum SeatEvent {
    /// A joystick appeared. `name` was captured before the rebuild.
    Connected { name: String },
    /// A joystick went away.
    Disconnected { name: String },
    /// The device set was rebuilt.
    DevicesChanged { devices: usize, configured: usize },
    /// Player slots were recomputed and differ from the previous table.
    PlayersChanged,
    /// A mapping was saved to the user store.
    ConfigChanged { name: String, guid: String },
    GunConnected { index: usize, name: String },
    GunDisconnected { index: usize, name: String },
}

impl SeatEvent {
    /// Short text for an on-screen notification, if the event deserves one.
    pub fn toast(&self) -> Option<String> {
        match self {
            SeatEvent::Connected { name } => Some(format!("{name} connected")),
            SeatEvent::Disconnected { name } => Some(format!("{name} disconnected")),
            SeatEvent::GunConnected { index, name } => {
                Some(format!("Gun {} connected: {name}", index + 1))
            }
            SeatEvent::GunDisconnected { index, name } => {
                Some(format!("Gun {} disconnected: {name}", index + 1))
            }
            _ => None,
        }
    }
}

/// One discrete transition of a single control.
#[derive(Debug, Clone, Copy)]
pub struct InputEvent<'a> {
    pub input: Input,
    /// Mapping of the originating device, `None` while unconfigured.
    pub mapping: Option<&'a Mapping>,
    /// Player slot the device currently holds.
    pub player: Option<usize>,
}

impl InputEvent<'_> {
    pub fn device(&self) -> DeviceId {
        self.input.device
    }

    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some_and(|m| !m.mapped_to(&self.input).is_empty())
    }

    /// Whether the event is the named logical action.
    pub fn is(&self, action: &str) -> bool {
        self.mapping.is_some_and(|m| m.is_mapped_to(action, &self.input))
    }
}

/// Receiver of routed input.
pub trait InputSink {
    fn input(&mut self, event: &InputEvent<'_>);

    /// A gun pointer moved by more than the tolerance.
    fn gun_moved(&mut self, _index: usize, _x: f32, _y: f32) {}
}

impl<F> InputSink for F
where
    F: FnMut(&InputEvent<'_>),
{
    fn input(&mut self, event: &InputEvent<'_>) {
        self(event);
    }
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct Discard;

impl InputSink for Discard {
    fn input(&mut self, _event: &InputEvent<'_>) {}
}
