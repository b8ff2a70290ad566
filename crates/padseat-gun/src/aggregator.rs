use log::{info, warn};

use padseat_device::{Input, InputKind, GUN_ID, MOUSE_NAME};
use padseat_workspace::{action, GunSettings, Mapping};

use crate::buttons::{GunButton, GunButtons};
use crate::source::{GunDescriptor, GunHotplug, GunSource};

/// One logical gun.
#[derive(Debug, Clone)]
pub struct Gun {
    pub index: usize,
    pub name: String,
    pub devpath: String,
    pub need_borders: bool,
    /// Position in screen pixels.
    pub x: f32,
    pub y: f32,
    pub buttons: GunButtons,
    is_mouse: bool,
    last_sent: Option<(f32, f32)>,
}

impl Gun {
    fn new(index: usize, descriptor: GunDescriptor, is_mouse: bool) -> Self {
        Self {
            index,
            name: descriptor.name.trim().to_string(),
            devpath: descriptor.devpath,
            need_borders: descriptor.need_borders,
            x: 0.0,
            y: 0.0,
            buttons: GunButtons::empty(),
            is_mouse,
            last_sent: None,
        }
    }

    pub fn is_mouse(&self) -> bool {
        self.is_mouse
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GunEvent {
    Connected { index: usize, name: String },
    Disconnected { index: usize, name: String },
    Moved { index: usize, x: f32, y: f32 },
    /// A gun button changed state, as an input of the gun aggregate device.
    Button { index: usize, input: Input },
}

const MOUSE_DEVPATH: &str = "mouse";

/// Built-in mapping of the gun aggregate device.
pub fn gun_mapping() -> Mapping {
    let mut mapping = Mapping::new();
    let button = |b: GunButton| Input::new(GUN_ID, InputKind::Button, b.id(), 1, true);
    mapping.map_input(action::OK, button(GunButton::Trigger));
    mapping.map_input(action::BACK, button(GunButton::Secondary));
    mapping.map_input(action::START, button(GunButton::Start));
    mapping.map_input(action::SELECT, button(GunButton::Select));
    mapping.map_input(action::UP, button(GunButton::Up));
    mapping.map_input(action::DOWN, button(GunButton::Down));
    mapping.map_input(action::LEFT, button(GunButton::Left));
    mapping.map_input(action::RIGHT, button(GunButton::Right));
    mapping
}

#[derive(Debug, Default)]
struct MouseState {
    x: i32,
    y: i32,
    buttons: GunButtons,
}

/// Pointer-class pseudo device over absolute-position hardware.
///
/// Polled once per frame from the input loop; it owns no thread.
pub struct GunAggregator<S: GunSource> {
    source: S,
    settings: GunSettings,
    guns: Vec<Gun>,
    mouse: MouseState,
    mapping: Mapping,
    hotplug: Vec<GunHotplug>,
}

impl<S: GunSource> GunAggregator<S> {
    pub fn new(source: S, settings: GunSettings) -> Self {
        Self {
            source,
            settings,
            guns: Vec::new(),
            mouse: MouseState::default(),
            mapping: gun_mapping(),
            hotplug: Vec::new(),
        }
    }

    /// Opens every gun already present.
    pub fn init(&mut self, out: &mut Vec<GunEvent>) {
        for descriptor in self.source.scan() {
            self.add(descriptor, out);
        }
        self.sync_mouse(out);
    }

    pub fn guns(&self) -> &[Gun] {
        &self.guns
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Whether any gun wants screen borders drawn for tracking.
    pub fn needs_borders(&self) -> bool {
        self.guns.iter().any(|g| g.need_borders)
    }

    pub fn apply_settings(&mut self, settings: GunSettings, out: &mut Vec<GunEvent>) {
        self.settings = settings;
        self.sync_mouse(out);
    }

    /// Last known mouse position, used by the mouse fallback gun.
    pub fn feed_mouse_motion(&mut self, x: i32, y: i32) {
        self.mouse.x = x;
        self.mouse.y = y;
    }

    pub fn feed_mouse_button(&mut self, button: u8, pressed: bool) {
        let mapped = match button {
            1 => GunButton::Trigger,
            2 => GunButton::Start,
            3 => GunButton::Secondary,
            _ => return,
        };
        self.mouse.buttons.set(mapped.into(), pressed);
    }

    fn has_real_guns(&self) -> bool {
        self.guns.iter().any(|g| !g.is_mouse)
    }

    fn sync_mouse(&mut self, out: &mut Vec<GunEvent>) {
        let want = self.settings.mouse_fallback && !self.has_real_guns();
        let has = self.guns.iter().any(|g| g.is_mouse);
        if want && !has {
            let descriptor = GunDescriptor {
                devpath: MOUSE_DEVPATH.to_string(),
                name: MOUSE_NAME.to_string(),
                need_borders: false,
            };
            let gun = Gun::new(self.guns.len(), descriptor, true);
            out.push(GunEvent::Connected {
                index: gun.index,
                name: gun.name.clone(),
            });
            self.guns.push(gun);
        } else if !want && has {
            self.remove_where(|g| g.is_mouse, out);
        }
    }

    fn add(&mut self, descriptor: GunDescriptor, out: &mut Vec<GunEvent>) {
        if self.guns.iter().any(|g| g.devpath == descriptor.devpath) {
            return;
        }
        if let Err(e) = self.source.open(&descriptor) {
            warn!("Unable to open gun {}: {e}", descriptor.devpath);
            return;
        }
        self.remove_where(|g| g.is_mouse, out);
        let gun = Gun::new(self.guns.len(), descriptor, false);
        info!("Gun {} connected: {} ({})", gun.index, gun.name, gun.devpath);
        out.push(GunEvent::Connected {
            index: gun.index,
            name: gun.name.clone(),
        });
        self.guns.push(gun);
    }

    fn remove_where(&mut self, pred: impl Fn(&Gun) -> bool, out: &mut Vec<GunEvent>) {
        let mut kept = Vec::with_capacity(self.guns.len());
        for gun in self.guns.drain(..) {
            if pred(&gun) {
                if !gun.is_mouse {
                    self.source.close(&gun.devpath);
                }
                info!("Gun {} disconnected: {}", gun.index, gun.name);
                out.push(GunEvent::Disconnected {
                    index: gun.index,
                    name: gun.name,
                });
            } else {
                kept.push(gun);
            }
        }
        for (index, gun) in kept.iter_mut().enumerate() {
            gun.index = index;
        }
        self.guns = kept;
    }

    /// Drains hotplug notifications and reads every gun once.
    pub fn update(&mut self, out: &mut Vec<GunEvent>) {
        let mut hotplug = std::mem::take(&mut self.hotplug);
        self.source.drain_hotplug(&mut hotplug);
        for event in hotplug.drain(..) {
            match event {
                GunHotplug::Added(descriptor) => self.add(descriptor, out),
                GunHotplug::Removed { devpath } => {
                    self.remove_where(|g| !g.is_mouse && g.devpath == devpath, out);
                }
            }
        }
        self.hotplug = hotplug;
        self.sync_mouse(out);

        #[allow(clippy::cast_precision_loss)]
        let (width, height) = (
            self.settings.screen.width as f32,
            self.settings.screen.height as f32,
        );
        let tolerance = self.settings.move_tolerance;
        for gun in &mut self.guns {
            let (x, y, buttons) = if gun.is_mouse {
                #[allow(clippy::cast_precision_loss)]
                let pos = (self.mouse.x as f32, self.mouse.y as f32);
                (pos.0, pos.1, self.mouse.buttons)
            } else {
                let Some(sample) = self.source.read(&gun.devpath) else {
                    continue;
                };
                (
                    sample.x.normalized() * width,
                    sample.y.normalized() * height,
                    sample.buttons,
                )
            };

            for (button, pressed) in buttons.changes(gun.buttons) {
                out.push(GunEvent::Button {
                    index: gun.index,
                    input: Input::new(GUN_ID, InputKind::Button, button.id(), i32::from(pressed), false),
                });
            }
            gun.buttons = buttons;
            gun.x = x;
            gun.y = y;

            let moved = gun.last_sent.map_or(true, |(lx, ly)| {
                (x - lx).hypot(y - ly) > tolerance
            });
            if moved {
                gun.last_sent = Some((x, y));
                out.push(GunEvent::Moved {
                    index: gun.index,
                    x,
                    y,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};

    use padseat_workspace::ScreenSize;

    use super::*;
    use crate::error::GunError;
    use crate::source::{AbsRange, GunSample};

    #[derive(Default)]
    struct FakeSource {
        present: Vec<GunDescriptor>,
        pending: VecDeque<GunHotplug>,
        samples: BTreeMap<String, GunSample>,
        open: Vec<String>,
        refuse: Vec<String>,
    }

    impl GunSource for FakeSource {
        fn scan(&mut self) -> Vec<GunDescriptor> {
            self.present.clone()
        }

        fn drain_hotplug(&mut self, out: &mut Vec<GunHotplug>) {
            out.extend(self.pending.drain(..));
        }

        fn open(&mut self, gun: &GunDescriptor) -> Result<(), GunError> {
            if self.refuse.contains(&gun.devpath) {
                return Err(GunError::NotAGun(gun.devpath.clone()));
            }
            self.open.push(gun.devpath.clone());
            Ok(())
        }

        fn close(&mut self, devpath: &str) {
            self.open.retain(|p| p != devpath);
        }

        fn read(&mut self, devpath: &str) -> Option<GunSample> {
            self.samples.get(devpath).copied()
        }
    }

    fn descriptor(path: &str, name: &str, borders: bool) -> GunDescriptor {
        GunDescriptor {
            devpath: path.into(),
            name: name.into(),
            need_borders: borders,
        }
    }

    fn sample(x: i32, y: i32, buttons: GunButtons) -> GunSample {
        GunSample {
            x: AbsRange {
                value: x,
                min: 0,
                max: 1024,
            },
            y: AbsRange {
                value: y,
                min: 0,
                max: 1024,
            },
            buttons,
        }
    }

    fn settings() -> GunSettings {
        GunSettings {
            move_tolerance: 2.0,
            mouse_fallback: false,
            screen: ScreenSize {
                width: 1024,
                height: 512,
            },
        }
    }

    fn aggregator(source: FakeSource) -> (GunAggregator<FakeSource>, Vec<GunEvent>) {
        let mut agg = GunAggregator::new(source, settings());
        let mut out = Vec::new();
        agg.init(&mut out);
        (agg, out)
    }

    #[test]
    fn init_opens_present_guns_with_trimmed_names() {
        let source = FakeSource {
            present: vec![descriptor("/dev/input/event5", "  Sinden Gun  ", true)],
            ..Default::default()
        };
        let (agg, out) = aggregator(source);
        assert_eq!(
            out,
            vec![GunEvent::Connected {
                index: 0,
                name: "Sinden Gun".into()
            }]
        );
        assert!(agg.needs_borders());
        assert_eq!(agg.source().open, vec!["/dev/input/event5".to_string()]);
    }

    #[test]
    fn refused_gun_is_skipped() {
        let source = FakeSource {
            present: vec![descriptor("/dev/input/event5", "Pad", false)],
            refuse: vec!["/dev/input/event5".into()],
            ..Default::default()
        };
        let (agg, out) = aggregator(source);
        assert!(out.is_empty());
        assert!(agg.guns().is_empty());
    }

    #[test]
    fn removal_renumbers_remaining_guns() {
        let source = FakeSource {
            present: vec![
                descriptor("/dev/input/event5", "One", false),
                descriptor("/dev/input/event6", "Two", false),
            ],
            ..Default::default()
        };
        let (mut agg, _) = aggregator(source);
        agg.source_mut().pending.push_back(GunHotplug::Removed {
            devpath: "/dev/input/event5".into(),
        });
        let mut out = Vec::new();
        agg.update(&mut out);
        assert_eq!(
            out,
            vec![GunEvent::Disconnected {
                index: 0,
                name: "One".into()
            }]
        );
        assert_eq!(agg.guns()[0].index, 0);
        assert_eq!(agg.guns()[0].name, "Two");
        assert!(agg.source().open.iter().all(|p| p != "/dev/input/event5"));
    }

    #[test]
    fn position_is_scaled_to_screen_and_jitter_is_dropped() {
        let source = FakeSource {
            present: vec![descriptor("/dev/input/event5", "One", false)],
            ..Default::default()
        };
        let (mut agg, _) = aggregator(source);
        let path = "/dev/input/event5".to_string();

        agg.source_mut().samples.insert(path.clone(), sample(512, 512, GunButtons::empty()));
        let mut out = Vec::new();
        agg.update(&mut out);
        assert_eq!(out, vec![GunEvent::Moved { index: 0, x: 512.0, y: 256.0 }]);

        agg.source_mut().samples.insert(path.clone(), sample(513, 513, GunButtons::empty()));
        out.clear();
        agg.update(&mut out);
        assert!(out.is_empty());

        agg.source_mut().samples.insert(path, sample(522, 512, GunButtons::empty()));
        out.clear();
        agg.update(&mut out);
        assert_eq!(out, vec![GunEvent::Moved { index: 0, x: 522.0, y: 256.0 }]);
    }

    #[test]
    fn calibration_buttons_become_mapped_inputs() {
        let source = FakeSource {
            present: vec![descriptor("/dev/input/event5", "One", false)],
            ..Default::default()
        };
        let (mut agg, _) = aggregator(source);
        let path = "/dev/input/event5".to_string();
        let pressed: GunButtons = [GunButton::Up, GunButton::Trigger].into_iter().collect();
        agg.source_mut().samples.insert(path.clone(), sample(0, 0, pressed));

        let mut out = Vec::new();
        agg.update(&mut out);
        let inputs: Vec<Input> = out
            .iter()
            .filter_map(|e| match e {
                GunEvent::Button { input, .. } => Some(*input),
                _ => None,
            })
            .collect();
        assert_eq!(inputs.len(), 2);
        assert!(agg.mapping().is_mapped_to(action::OK, &inputs[0]));
        assert!(agg.mapping().is_mapped_to(action::UP, &inputs[1]));

        agg.source_mut().samples.insert(path, sample(0, 0, GunButtons::empty()));
        out.clear();
        agg.update(&mut out);
        assert!(out
            .iter()
            .all(|e| matches!(e, GunEvent::Button { input, .. } if input.value == 0)));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn mouse_fallback_only_without_real_guns() {
        let (mut agg, _) = aggregator(FakeSource::default());
        let mut out = Vec::new();
        let mut with_mouse = settings();
        with_mouse.mouse_fallback = true;
        agg.apply_settings(with_mouse, &mut out);
        assert_eq!(
            out,
            vec![GunEvent::Connected {
                index: 0,
                name: "Mouse".into()
            }]
        );

        agg.feed_mouse_motion(100, 50);
        agg.feed_mouse_button(1, true);
        out.clear();
        agg.update(&mut out);
        assert!(out.contains(&GunEvent::Moved { index: 0, x: 100.0, y: 50.0 }));
        assert!(out.iter().any(|e| matches!(e, GunEvent::Button { input, .. } if input.value == 1)));

        agg.source_mut().pending.push_back(GunHotplug::Added(descriptor(
            "/dev/input/event9",
            "Real",
            false,
        )));
        out.clear();
        agg.update(&mut out);
        assert_eq!(
            out[..2],
            [
                GunEvent::Disconnected {
                    index: 0,
                    name: "Mouse".into()
                },
                GunEvent::Connected {
                    index: 0,
                    name: "Real".into()
                },
            ]
        );
        assert_eq!(agg.guns().len(), 1);
        assert!(!agg.guns()[0].is_mouse());
        assert_eq!(agg.guns()[0].index, 0);
    }
}
