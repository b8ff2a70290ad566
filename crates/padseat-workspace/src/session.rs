use thiserror::Error;

use padseat_device::{DeviceId, Input};

use crate::mapping::{action, Hotkey, Mapping};

/// One step of the configuration walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub skippable: bool,
}

const fn step(name: &'static str, label: &'static str, skippable: bool) -> ActionSpec {
    ActionSpec {
        name,
        label,
        skippable,
    }
}

/// Actions asked for, in order, when configuring a device.
pub static CONFIG_ACTIONS: [ActionSpec; 21] = [
    step(action::A, "A", true),
    step(action::B, "B", true),
    step(action::X, "X", true),
    step(action::Y, "Y", true),
    step(action::START, "START", true),
    step(action::SELECT, "SELECT", true),
    step(action::UP, "D-PAD UP", false),
    step(action::DOWN, "D-PAD DOWN", false),
    step(action::LEFT, "D-PAD LEFT", false),
    step(action::RIGHT, "D-PAD RIGHT", false),
    step(action::PAGE_UP, "L1", true),
    step(action::PAGE_DOWN, "R1", true),
    step(action::JOYSTICK1_UP, "LEFT ANALOG UP", true),
    step(action::JOYSTICK1_LEFT, "LEFT ANALOG LEFT", true),
    step(action::JOYSTICK2_UP, "RIGHT ANALOG UP", true),
    step(action::JOYSTICK2_LEFT, "RIGHT ANALOG LEFT", true),
    step(action::L2, "L2", true),
    step(action::R2, "R2", true),
    step(action::L3, "L3", true),
    step(action::R3, "R3", true),
    step(action::HOTKEY, "HOTKEY", true),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("{input} is already taken by \"{by}\"")]
    AlreadyTaken { input: String, by: String },
    #[error("\"{0}\" cannot be skipped")]
    NotSkippable(&'static str),
    #[error("configuration is already complete")]
    Complete,
}

/// What to store when no hotkey was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyFallback {
    /// Reuse the select binding.
    UseSelect,
    /// Store the "no hotkey" marker.
    Disabled,
}

/// Interactive capture of a device mapping.
#[derive(Debug, Clone)]
pub struct ConfigSession {
    device: DeviceId,
    mapping: Mapping,
    cursor: usize,
}

impl ConfigSession {
    pub fn new(device: DeviceId) -> Self {
        Self {
            device,
            mapping: Mapping::new(),
            cursor: 0,
        }
    }

    /// Starts from an existing mapping so unchanged steps keep their inputs.
    pub fn reconfigure(device: DeviceId, mapping: Mapping) -> Self {
        Self {
            device,
            mapping,
            cursor: 0,
        }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn current(&self) -> Option<&'static ActionSpec> {
        CONFIG_ACTIONS.get(self.cursor)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= CONFIG_ACTIONS.len()
    }

    /// Offers a raw input for the current step.
    ///
    /// Inputs from other devices and releases are ignored and yield
    /// `Ok(None)`. An input already bound to another action is rejected,
    /// except for the hotkey step or when it is the step's own binding.
    pub fn offer(&mut self, input: Input) -> Result<Option<&'static str>, AssignError> {
        let Some(spec) = self.current() else {
            return Err(AssignError::Complete);
        };
        if input.device != self.device || !input.is_active() {
            return Ok(None);
        }
        if spec.name != action::HOTKEY && !self.mapping.is_mapped_to(spec.name, &input) {
            if let Some(by) = self.mapping.mapped_to(&input).into_iter().find(|n| *n != spec.name) {
                return Err(AssignError::AlreadyTaken {
                    input: input.to_string(),
                    by: by.to_string(),
                });
            }
        }
        self.mapping.map_input(spec.name, input);
        self.cursor += 1;
        Ok(Some(spec.name))
    }

    /// Leaves the current step unbound.
    pub fn skip(&mut self) -> Result<(), AssignError> {
        let Some(spec) = self.current() else {
            return Err(AssignError::Complete);
        };
        if !spec.skippable {
            return Err(AssignError::NotSkippable(spec.name));
        }
        self.mapping.unmap_input(spec.name);
        self.cursor += 1;
        Ok(())
    }

    /// Returns the captured mapping, filling in the hotkey if it is unset.
    pub fn finish(mut self, fallback: HotkeyFallback) -> Mapping {
        if self.mapping.hotkey() == Hotkey::Unset {
            match fallback {
                HotkeyFallback::UseSelect => {
                    if let Some(select) = self.mapping.input_by_name(action::SELECT).copied() {
                        self.mapping.map_input(action::HOTKEY, select);
                    }
                }
                HotkeyFallback::Disabled => self.mapping.disable_hotkey(),
            }
        }
        self.mapping
    }
}
