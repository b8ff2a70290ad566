use std::collections::BTreeMap;

use padseat_device::{hat, DeviceId, Input, InputKind, KEYBOARD_ID};

/// Logical action names understood by consumers.
pub mod action {
    pub const A: &str = "a";
    pub const B: &str = "b";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const START: &str = "start";
    pub const SELECT: &str = "select";
    pub const UP: &str = "up";
    pub const DOWN: &str = "down";
    pub const LEFT: &str = "left";
    pub const RIGHT: &str = "right";
    pub const PAGE_UP: &str = "pageup";
    pub const PAGE_DOWN: &str = "pagedown";
    pub const JOYSTICK1_UP: &str = "joystick1up";
    pub const JOYSTICK1_LEFT: &str = "joystick1left";
    pub const JOYSTICK2_UP: &str = "joystick2up";
    pub const JOYSTICK2_LEFT: &str = "joystick2left";
    pub const L2: &str = "l2";
    pub const R2: &str = "r2";
    pub const L3: &str = "l3";
    pub const R3: &str = "r3";
    pub const HOTKEY: &str = "hotkey";

    /// Action that confirms in menus.
    pub const OK: &str = B;
    /// Action that goes back in menus.
    pub const BACK: &str = A;
}

/// SDL scancodes used by the built-in keyboard mapping.
pub mod scancode {
    pub const RIGHT: i32 = 79;
    pub const LEFT: i32 = 80;
    pub const DOWN: i32 = 81;
    pub const UP: i32 = 82;
    pub const RETURN: i32 = 40;
    pub const ESCAPE: i32 = 41;
    pub const LEFT_BRACKET: i32 = 47;
    pub const RIGHT_BRACKET: i32 = 48;
    pub const F1: i32 = 58;
    pub const F2: i32 = 59;
}

/// Key id persisted for an explicitly disabled hotkey. Scancode 0 is never
/// produced by a real key, so the marker is recognized on any device.
pub const NO_HOTKEY_KEY: i32 = 0;

/// Hotkey state of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    Bound(Input),
    Disabled,
    Unset,
}

/// Logical action to physical input bindings of one device.
///
/// Action names are case-insensitive and kept lower-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    bindings: BTreeMap<String, Input>,
}

fn matches(comp: &Input, input: &Input, reversed: bool) -> bool {
    if !comp.configured || comp.kind != input.kind || comp.id != input.id {
        return false;
    }
    match comp.kind {
        InputKind::Hat => input.value == 0 || input.value & comp.value != 0,
        InputKind::Axis => {
            let value = if reversed { -comp.value } else { comp.value };
            input.value == 0 || value == input.value
        }
        _ => true,
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in keyboard mapping used when no stored one is found.
    pub fn default_keyboard() -> Self {
        let mut mapping = Self::new();
        let key = |id| Input::new(KEYBOARD_ID, InputKind::Key, id, 1, true);
        mapping.map_input(action::UP, key(scancode::UP));
        mapping.map_input(action::DOWN, key(scancode::DOWN));
        mapping.map_input(action::LEFT, key(scancode::LEFT));
        mapping.map_input(action::RIGHT, key(scancode::RIGHT));
        mapping.map_input(action::OK, key(scancode::RETURN));
        mapping.map_input(action::BACK, key(scancode::ESCAPE));
        mapping.map_input(action::START, key(scancode::F1));
        mapping.map_input(action::SELECT, key(scancode::F2));
        mapping.map_input(action::PAGE_UP, key(scancode::RIGHT_BRACKET));
        mapping.map_input(action::PAGE_DOWN, key(scancode::LEFT_BRACKET));
        mapping
    }

    pub fn map_input(&mut self, name: &str, input: Input) {
        self.bindings
            .insert(name.to_lowercase(), input.into_configured());
    }

    pub fn unmap_input(&mut self, name: &str) -> Option<Input> {
        self.bindings.remove(&name.to_lowercase())
    }

    pub fn input_by_name(&self, name: &str) -> Option<&Input> {
        self.bindings.get(&name.to_lowercase())
    }

    /// Whether `input` is the control bound to `name`.
    ///
    /// A zero-valued hat or axis input matches any direction of the bound
    /// control, which is how releases are recognized.
    pub fn is_mapped_to(&self, name: &str, input: &Input) -> bool {
        self.input_by_name(name)
            .is_some_and(|comp| matches(comp, input, false))
    }

    /// Like [`Mapping::is_mapped_to`] with the bound axis direction flipped.
    pub fn is_mapped_to_reversed(&self, name: &str, input: &Input) -> bool {
        self.input_by_name(name)
            .is_some_and(|comp| matches(comp, input, true))
    }

    /// Direction check that also accepts the left analog stick.
    pub fn is_mapped_like(&self, name: &str, input: &Input) -> bool {
        match name.to_lowercase().as_str() {
            action::LEFT => {
                self.is_mapped_to(action::LEFT, input)
                    || self.is_mapped_to(action::JOYSTICK1_LEFT, input)
            }
            action::RIGHT => {
                self.is_mapped_to(action::RIGHT, input)
                    || self.is_mapped_to_reversed(action::JOYSTICK1_LEFT, input)
            }
            action::UP => {
                self.is_mapped_to(action::UP, input)
                    || self.is_mapped_to(action::JOYSTICK1_UP, input)
            }
            action::DOWN => {
                self.is_mapped_to(action::DOWN, input)
                    || self.is_mapped_to_reversed(action::JOYSTICK1_UP, input)
            }
            other => self.is_mapped_to(other, input),
        }
    }

    /// Every action the given input is bound to.
    pub fn mapped_to(&self, input: &Input) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(_, comp)| matches(comp, input, false))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_configured(&self) -> bool {
        !self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Input)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rebinds every input to another device id.
    #[must_use]
    pub fn with_device(mut self, device: DeviceId) -> Self {
        for input in self.bindings.values_mut() {
            input.device = device;
        }
        self
    }

    /// Compares bindings by action, kind, raw id and value, ignoring devices.
    pub fn same_bindings(&self, other: &Mapping) -> bool {
        self.bindings.len() == other.bindings.len()
            && self.bindings.iter().zip(&other.bindings).all(|((n1, a), (n2, b))| {
                n1 == n2 && a.kind == b.kind && a.id == b.id && a.value == b.value
            })
    }

    pub fn hotkey(&self) -> Hotkey {
        match self.input_by_name(action::HOTKEY) {
            Some(input) if input.kind == InputKind::Key && input.id == NO_HOTKEY_KEY => {
                Hotkey::Disabled
            }
            Some(input) => Hotkey::Bound(*input),
            None => Hotkey::Unset,
        }
    }

    /// Stores the "no hotkey" marker in place of a hotkey binding.
    pub fn disable_hotkey(&mut self) {
        self.map_input(
            action::HOTKEY,
            Input::new(KEYBOARD_ID, InputKind::Key, NO_HOTKEY_KEY, 1, true),
        );
    }

    /// Pairs of actions bound to the same physical input.
    ///
    /// The hotkey may share its input with another action and is never
    /// reported.
    pub fn conflicts(&self) -> Vec<(String, String, Input)> {
        let bound: Vec<(&String, &Input)> = self
            .bindings
            .iter()
            .filter(|(name, input)| name.as_str() != action::HOTKEY && input.configured)
            .collect();
        let mut out = Vec::new();
        for (i, (first, a)) in bound.iter().enumerate() {
            for (second, b) in &bound[i + 1..] {
                if a.kind == b.kind && a.id == b.id && same_direction(a, b) {
                    out.push(((*first).clone(), (*second).clone(), **a));
                }
            }
        }
        out
    }
}

fn same_direction(a: &Input, b: &Input) -> bool {
    match a.kind {
        InputKind::Hat => a.value & b.value != 0 || a.value == hat::CENTERED,
        InputKind::Axis => a.value == b.value,
        _ => true,
    }
}
