use smallvec::SmallVec;

/// Raw axis distance from rest ignored when producing digital transitions.
pub const DEFAULT_DEADZONE: i32 = 23000;

#[derive(Debug, Clone, Copy, Default)]
struct AxisState {
    rest: Option<i32>,
    bucket: i8,
}

/// Classifies a distance from rest into `-1`, `0` or `1`.
#[inline]
pub fn bucket(delta: i32, deadzone: i32) -> i8 {
    if delta.abs() <= deadzone {
        0
    } else if delta > 0 {
        1
    } else {
        -1
    }
}

/// Turns continuous axis samples into three-state switches.
///
/// Each axis is measured against its rest value, which is either seeded
/// from the backend or taken from the first sample seen. A sample yields
/// a value only when its bucket differs from the previous one.
#[derive(Debug, Clone)]
pub struct AxisCalibrator {
    deadzone: i32,
    axes: SmallVec<[AxisState; 8]>,
}

impl AxisCalibrator {
    pub fn new(num_axes: usize, deadzone: i32) -> Self {
        let mut axes = SmallVec::new();
        axes.resize(num_axes, AxisState::default());
        Self {
            deadzone: deadzone.abs(),
            axes,
        }
    }

    pub fn deadzone(&self) -> i32 {
        self.deadzone
    }

    pub fn num_axes(&self) -> usize {
        self.axes.len()
    }

    fn state_mut(&mut self, axis: usize) -> &mut AxisState {
        if axis >= self.axes.len() {
            self.axes.resize(axis + 1, AxisState::default());
        }
        &mut self.axes[axis]
    }

    /// Records the rest value reported by the hardware for an axis.
    pub fn seed_rest(&mut self, axis: usize, rest: i32) {
        let state = self.state_mut(axis);
        state.rest = Some(rest);
        state.bucket = 0;
    }

    pub fn rest(&self, axis: usize) -> Option<i32> {
        self.axes.get(axis).and_then(|s| s.rest)
    }

    /// Current bucket of an axis.
    pub fn bucket_of(&self, axis: usize) -> i8 {
        self.axes.get(axis).map_or(0, |s| s.bucket)
    }

    /// Feeds one raw sample and returns the new bucket if it changed.
    pub fn sample(&mut self, axis: usize, raw: i32) -> Option<i8> {
        let deadzone = self.deadzone;
        let state = self.state_mut(axis);
        let Some(rest) = state.rest else {
            state.rest = Some(raw);
            state.bucket = 0;
            return None;
        };
        let next = bucket(raw - rest, deadzone);
        if next == state.bucket {
            return None;
        }
        state.bucket = next;
        Some(next)
    }

    /// Forgets every rest value and bucket.
    pub fn reset(&mut self) {
        for state in &mut self.axes {
            *state = AxisState::default();
        }
    }
}
