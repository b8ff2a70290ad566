use crate::buttons::GunButtons;
use crate::error::GunError;

/// Absolute axis reading with its reported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsRange {
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

impl AbsRange {
    /// Position within the range, clamped to `0.0..=1.0`.
    #[allow(clippy::cast_precision_loss)]
    pub fn normalized(&self) -> f32 {
        if self.max <= self.min {
            return 0.0;
        }
        let span = (i64::from(self.max) - i64::from(self.min)) as f32;
        let pos = (i64::from(self.value) - i64::from(self.min)) as f32;
        (pos / span).clamp(0.0, 1.0)
    }
}

/// One reading of a gun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GunSample {
    pub x: AbsRange,
    pub y: AbsRange,
    pub buttons: GunButtons,
}

/// A gun-class device announced by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GunDescriptor {
    pub devpath: String,
    pub name: String,
    pub need_borders: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GunHotplug {
    Added(GunDescriptor),
    Removed { devpath: String },
}

/// Platform access to absolute-pointer hardware.
pub trait GunSource {
    /// Guns present right now.
    fn scan(&mut self) -> Vec<GunDescriptor>;

    /// Drains pending add/remove notifications.
    fn drain_hotplug(&mut self, out: &mut Vec<GunHotplug>);

    fn open(&mut self, gun: &GunDescriptor) -> Result<(), GunError>;

    fn close(&mut self, devpath: &str);

    /// Current state of an open gun, `None` if it cannot be read.
    fn read(&mut self, devpath: &str) -> Option<GunSample>;
}

impl<S: GunSource + ?Sized> GunSource for Box<S> {
    fn scan(&mut self) -> Vec<GunDescriptor> {
        (**self).scan()
    }

    fn drain_hotplug(&mut self, out: &mut Vec<GunHotplug>) {
        (**self).drain_hotplug(out);
    }

    fn open(&mut self, gun: &GunDescriptor) -> Result<(), GunError> {
        (**self).open(gun)
    }

    fn close(&mut self, devpath: &str) {
        (**self).close(devpath);
    }

    fn read(&mut self, devpath: &str) -> Option<GunSample> {
        (**self).read(devpath)
    }
}

/// Source for platforms without gun support.
#[derive(Debug, Default)]
pub struct NoGuns;

impl GunSource for NoGuns {
    fn scan(&mut self) -> Vec<GunDescriptor> {
        Vec::new()
    }

    fn drain_hotplug(&mut self, _out: &mut Vec<GunHotplug>) {}

    fn open(&mut self, gun: &GunDescriptor) -> Result<(), GunError> {
        Err(GunError::Unsupported(gun.devpath.clone()))
    }

    fn close(&mut self, _devpath: &str) {}

    fn read(&mut self, _devpath: &str) -> Option<GunSample> {
        None
    }
}
