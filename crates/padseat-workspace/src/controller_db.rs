use padseat_device::{DeviceId, Input, InputKind};

use crate::mapping::{action, Mapping};

/// SDL controller database name, our action name, default axis direction.
const SDL_TO_ACTION: &[(&str, &str, i32)] = &[
    ("a", action::B, 1),
    ("b", action::A, 1),
    ("x", action::Y, 1),
    ("y", action::X, 1),
    ("back", action::SELECT, 1),
    ("start", action::START, 1),
    ("guide", action::HOTKEY, 1),
    ("leftshoulder", action::PAGE_UP, 1),
    ("rightshoulder", action::PAGE_DOWN, 1),
    ("lefttrigger", action::L2, 1),
    ("righttrigger", action::R2, 1),
    ("leftstick", action::L3, 1),
    ("rightstick", action::R3, 1),
    ("dpup", action::UP, 1),
    ("dpdown", action::DOWN, 1),
    ("dpleft", action::LEFT, 1),
    ("dpright", action::RIGHT, 1),
    ("leftx", action::JOYSTICK1_LEFT, -1),
    ("lefty", action::JOYSTICK1_UP, -1),
    ("rightx", action::JOYSTICK2_LEFT, -1),
    ("righty", action::JOYSTICK2_UP, -1),
];

fn parse_binding(device: DeviceId, token: &str, default_sign: i32) -> Option<Input> {
    if !token.is_ascii() {
        return None;
    }
    let (half, rest) = if let Some(r) = token.strip_prefix('+') {
        (Some(1), r)
    } else if let Some(r) = token.strip_prefix('-') {
        (Some(-1), r)
    } else {
        (None, token)
    };
    let (inverted, rest) = match rest.strip_suffix('~') {
        Some(r) => (true, r),
        None => (false, rest),
    };
    let mut chars = rest.chars();
    let kind = chars.next()?;
    let body = chars.as_str();
    match kind {
        'b' => Some(Input::new(device, InputKind::Button, body.parse().ok()?, 1, true)),
        'h' => {
            let (hat, mask) = body.split_once('.')?;
            Some(Input::new(
                device,
                InputKind::Hat,
                hat.parse().ok()?,
                mask.parse().ok()?,
                true,
            ))
        }
        'a' => {
            let sign = half.unwrap_or(default_sign);
            let value = if inverted { -sign } else { sign };
            Some(Input::new(device, InputKind::Axis, body.parse().ok()?, value, true))
        }
        _ => None,
    }
}

/// Translates an SDL controller database line into a mapping.
///
/// Returns `None` when nothing in the line maps to a known action.
pub fn mapping_from_controller_db(line: &str, device: DeviceId) -> Option<Mapping> {
    let mut mapping = Mapping::new();
    for field in line.split(',').skip(2) {
        let Some((sdl_name, token)) = field.split_once(':') else {
            continue;
        };
        let Some(&(_, name, sign)) = SDL_TO_ACTION.iter().find(|(n, _, _)| *n == sdl_name) else {
            continue;
        };
        if let Some(input) = parse_binding(device, token.trim(), sign) {
            mapping.map_input(name, input);
        }
    }
    mapping.is_configured().then_some(mapping)
}
