//! Daily snapshot window

use chrono::Timelike;

/// A daily window starting at the top of `hour` and lasting `minutes`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    hour: u32,
    minutes: u32,
}

impl ScheduleWindow {
    pub fn new(hour: u32, minutes: u32) -> Self {
        Self { hour, minutes }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Whether `time` falls inside the window
    pub fn contains<T: Timelike>(&self, time: &T) -> bool {
        time.hour() == self.hour && time.minute() < self.minutes
    }
}

impl Default for ScheduleWindow {
    fn default() -> Self {
        Self::new(2, 5)
    }
}
