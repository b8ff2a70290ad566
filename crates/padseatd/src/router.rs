use padseat_device::{Input, InputKind, JoystickBackend, RawEvent, CEC_ID, KEYBOARD_ID};

use crate::registry::DeviceRegistry;

/// Turns a raw control event into a discrete input.
///
/// Axis samples pass through the device's calibrator and only produce an
/// input on a bucket change. Key repeats and events of unknown devices are
/// dropped, as is everything that is not a control event.
pub fn route<B: JoystickBackend>(registry: &mut DeviceRegistry<B>, event: &RawEvent) -> Option<Input> {
    match *event {
        RawEvent::Axis { id, axis, value } => {
            let raw_id = i32::try_from(axis).ok()?;
            let bucket = registry.sample_axis(id, axis, value)?;
            Some(Input::new(id, InputKind::Axis, raw_id, i32::from(bucket), false))
        }
        RawEvent::Button { id, button, pressed } => {
            if !registry.contains(id) {
                return None;
            }
            let raw_id = i32::try_from(button).ok()?;
            Some(Input::new(id, InputKind::Button, raw_id, i32::from(pressed), false))
        }
        RawEvent::Hat { id, hat, mask } => {
            if !registry.contains(id) {
                return None;
            }
            let raw_id = i32::try_from(hat).ok()?;
            Some(Input::new(id, InputKind::Hat, raw_id, mask, false))
        }
        RawEvent::Key { repeat: true, .. } => None,
        RawEvent::Key { scancode, pressed, .. } => Some(Input::new(
            KEYBOARD_ID,
            InputKind::Key,
            scancode,
            i32::from(pressed),
            false,
        )),
        RawEvent::Cec { code, pressed } => Some(Input::new(
            CEC_ID,
            InputKind::CecButton,
            code,
            i32::from(pressed),
            false,
        )),
        _ => None,
    }
}
