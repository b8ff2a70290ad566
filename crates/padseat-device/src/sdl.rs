use std::collections::BTreeMap;
use std::ffi::CStr;

use sdl2::event::Event;
use sdl2::joystick::{HatState, Joystick, PowerLevel};
use sdl2::mouse::MouseButton;
use sdl2::video::Window;
use sdl2::{sys, EventPump, GameControllerSubsystem, JoystickSubsystem, Sdl, VideoSubsystem};

use crate::backend::{JoystickBackend, JoystickInfo, RawEvent};
use crate::error::{Error, Result};
use crate::types::{hat, DeviceId};

/// Options applied before SDL opens any joystick.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdlOptions {
    /// Keep receiving joystick events while no window has focus.
    pub background_events: bool,
    /// Size of the input window. SDL reports keyboard and mouse events
    /// only to a focused window, so without one those devices stay silent.
    pub window: Option<(u32, u32)>,
}

const WINDOW_TITLE: &str = "padseat";

/// SDL2 joystick backend. Must live on the thread that polls it.
pub struct SdlBackend {
    _sdl: Sdl,
    joysticks: JoystickSubsystem,
    controllers: GameControllerSubsystem,
    pump: EventPump,
    open: BTreeMap<DeviceId, Joystick>,
    _window: Option<(VideoSubsystem, Window)>,
}

impl SdlBackend {
    pub fn new(options: SdlOptions) -> Result<Self> {
        if options.background_events {
            sdl2::hint::set("SDL_JOYSTICK_ALLOW_BACKGROUND_EVENTS", "1");
        }
        let sdl = sdl2::init().map_err(Error::BackendInit)?;
        let joysticks = sdl.joystick().map_err(Error::BackendInit)?;
        let controllers = sdl.game_controller().map_err(Error::BackendInit)?;
        let window = match options.window {
            Some((width, height)) => {
                let video = sdl.video().map_err(Error::BackendInit)?;
                let window = video
                    .window(WINDOW_TITLE, width, height)
                    .position_centered()
                    .build()
                    .map_err(|e| Error::BackendInit(e.to_string()))?;
                Some((video, window))
            }
            None => None,
        };
        let pump = sdl.event_pump().map_err(Error::BackendInit)?;
        joysticks.set_event_state(true);

        Ok(Self {
            _sdl: sdl,
            joysticks,
            controllers,
            pump,
            open: BTreeMap::new(),
            _window: window,
        })
    }

    fn controller_db_line(&self, index: u32, guid: sdl2::joystick::Guid) -> Option<String> {
        if !self.controllers.is_game_controller(index) {
            return None;
        }
        self.controllers.mapping_for_guid(guid).ok()
    }
}

/// Bus path of a joystick by enumeration index (SDL 2.24+).
#[allow(clippy::cast_possible_wrap)]
fn device_path(index: u32) -> Option<String> {
    // SAFETY: SDL returns null or a NUL-terminated string that stays valid
    // until the joystick list changes; it is copied out right away.
    let path = unsafe {
        let raw = sys::SDL_JoystickPathForIndex(index as i32);
        if raw.is_null() {
            return None;
        }
        CStr::from_ptr(raw).to_string_lossy().into_owned()
    };
    (!path.is_empty()).then_some(path)
}

fn battery_percent(level: PowerLevel) -> i8 {
    match level {
        PowerLevel::Empty => 5,
        PowerLevel::Low => 20,
        PowerLevel::Medium => 70,
        PowerLevel::Full => 100,
        _ => crate::types::UNKNOWN_BATTERY,
    }
}

fn hat_mask(state: HatState) -> i32 {
    match state {
        HatState::Centered => hat::CENTERED,
        HatState::Up => hat::UP,
        HatState::Right => hat::RIGHT,
        HatState::Down => hat::DOWN,
        HatState::Left => hat::LEFT,
        HatState::RightUp => hat::RIGHT | hat::UP,
        HatState::RightDown => hat::RIGHT | hat::DOWN,
        HatState::LeftUp => hat::LEFT | hat::UP,
        HatState::LeftDown => hat::LEFT | hat::DOWN,
    }
}

fn mouse_button_id(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Middle => 2,
        MouseButton::Right => 3,
        MouseButton::X1 => 4,
        MouseButton::X2 => 5,
        MouseButton::Unknown => 0,
    }
}

#[allow(clippy::cast_possible_wrap)]
fn translate(event: Event) -> Option<RawEvent> {
    Some(match event {
        Event::JoyDeviceAdded { which, .. } => RawEvent::DeviceAdded { index: which },
        Event::JoyDeviceRemoved { which, .. } => RawEvent::DeviceRemoved { id: which as DeviceId },
        Event::JoyAxisMotion {
            which,
            axis_idx,
            value,
            ..
        } => RawEvent::Axis {
            id: which as DeviceId,
            axis: u32::from(axis_idx),
            value: i32::from(value),
        },
        Event::JoyButtonDown {
            which, button_idx, ..
        } => RawEvent::Button {
            id: which as DeviceId,
            button: u32::from(button_idx),
            pressed: true,
        },
        Event::JoyButtonUp {
            which, button_idx, ..
        } => RawEvent::Button {
            id: which as DeviceId,
            button: u32::from(button_idx),
            pressed: false,
        },
        Event::JoyHatMotion {
            which,
            hat_idx,
            state,
            ..
        } => RawEvent::Hat {
            id: which as DeviceId,
            hat: u32::from(hat_idx),
            mask: hat_mask(state),
        },
        Event::KeyDown {
            scancode: Some(scancode),
            repeat,
            ..
        } => RawEvent::Key {
            scancode: scancode as i32,
            pressed: true,
            repeat,
        },
        Event::KeyUp {
            scancode: Some(scancode),
            repeat,
            ..
        } => RawEvent::Key {
            scancode: scancode as i32,
            pressed: false,
            repeat,
        },
        Event::MouseMotion { x, y, .. } => RawEvent::MouseMotion { x, y },
        Event::MouseButtonDown {
            mouse_btn, x, y, ..
        } => RawEvent::MouseButton {
            button: mouse_button_id(mouse_btn),
            pressed: true,
            x,
            y,
        },
        Event::MouseButtonUp {
            mouse_btn, x, y, ..
        } => RawEvent::MouseButton {
            button: mouse_button_id(mouse_btn),
            pressed: false,
            x,
            y,
        },
        Event::Quit { .. } => RawEvent::Quit,
        _ => return None,
    })
}

impl JoystickBackend for SdlBackend {
    fn enumerate(&mut self) -> Result<u32> {
        self.joysticks.num_joysticks().map_err(Error::Backend)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn open(&mut self, index: u32) -> Result<JoystickInfo> {
        let joystick = self.joysticks.open(index).map_err(|e| Error::OpenFailed {
            index,
            reason: e.to_string(),
        })?;
        let id = joystick.instance_id() as DeviceId;
        let guid = joystick.guid();
        // SAFETY: plain query by enumeration index, no pointers involved.
        let is_wheel = unsafe {
            sys::SDL_JoystickGetDeviceType(index as i32)
                == sys::SDL_JoystickType::SDL_JOYSTICK_TYPE_WHEEL
        };
        let info = JoystickInfo {
            id,
            index,
            name: joystick.name(),
            guid: guid.string(),
            num_buttons: joystick.num_buttons(),
            num_hats: joystick.num_hats(),
            num_axes: joystick.num_axes(),
            path: device_path(index),
            battery_level: joystick
                .power_level()
                .map(battery_percent)
                .unwrap_or(crate::types::UNKNOWN_BATTERY),
            is_wheel,
            controller_db: self.controller_db_line(index, guid),
        };
        self.open.insert(id, joystick);
        Ok(info)
    }

    fn close(&mut self, id: DeviceId) {
        self.open.remove(&id);
    }

    fn close_all(&mut self) {
        self.open.clear();
    }

    fn poll(&mut self, out: &mut Vec<RawEvent>) {
        out.extend(self.pump.poll_iter().filter_map(translate));
    }

    fn name_for_index(&self, index: u32) -> Option<String> {
        self.joysticks.name_for_index(index).ok()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn instance_id_for_index(&self, index: u32) -> Option<DeviceId> {
        // SAFETY: plain query by enumeration index, no pointers involved.
        let id = unsafe { sys::SDL_JoystickGetDeviceInstanceID(index as i32) };
        (id >= 0).then_some(id)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn axis_rest(&self, id: DeviceId, axis: u32) -> Option<i32> {
        if !self.open.contains_key(&id) {
            return None;
        }
        let mut state: i16 = 0;
        // SAFETY: the joystick is held open in `self.open`, so the pointer
        // returned for its instance id stays valid for the call.
        let ok = unsafe {
            let raw = sys::SDL_JoystickFromInstanceID(id);
            !raw.is_null()
                && sys::SDL_JoystickGetAxisInitialState(raw, axis as i32, &mut state)
                    == sys::SDL_bool::SDL_TRUE
        };
        ok.then_some(i32::from(state))
    }
}
