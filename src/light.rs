use crate::math::Point2d;
use serde::{Deserialize, Serialize};

/// The classifier's colour label for a single traffic light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightColor {
    Red,
    Yellow,
    Green,
    Unknown,
}

/// One entry of the periodic traffic-light signal.
///
/// Entries are indexed 1:1 with the stop lines in the static
/// configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightObservation {
    /// The stop line the vehicle should halt before, in the world frame.
    pub stop_line: Point2d,
    /// The raw colour label for this light.
    pub color: LightColor,
}

/// Debounces a stream of raw colour labels for one light.
///
/// A new colour is committed only once it has been observed for
/// `threshold` consecutive cycles; until then the previously committed
/// colour is reported. The switch happens on exactly the threshold-th
/// observation, which is also the first cycle the new colour is emitted.
#[derive(Clone, Debug)]
pub struct LightDebouncer {
    threshold: u32,
    committed: LightColor,
    /// The most recent raw colour and how many consecutive cycles it has
    /// been seen.
    tracked: LightColor,
    count: u32,
}

impl LightDebouncer {
    /// Creates a debouncer committed to `Unknown`.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            committed: LightColor::Unknown,
            tracked: LightColor::Unknown,
            count: 0,
        }
    }

    /// Feeds one raw observation and returns the committed colour.
    pub fn observe(&mut self, raw: LightColor) -> LightColor {
        if raw == self.tracked {
            self.count = self.count.saturating_add(1);
        } else {
            self.tracked = raw;
            self.count = 1;
        }
        if self.count >= self.threshold {
            self.committed = self.tracked;
        }
        self.committed
    }

    /// The currently committed colour.
    pub fn committed(&self) -> LightColor {
        self.committed
    }
}
