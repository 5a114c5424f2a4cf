use std::thread;
use std::time::Duration;

use crate::util::constants as setting;

/// How long the simulated car takes to move between floors and to cycle its doors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    pub floor_travel: Duration,
    pub door_cycle: Duration,
}

impl Timings {
    pub fn new(floor_travel_ms: u64, door_cycle_ms: u64) -> Timings {
        Timings {
            floor_travel: Duration::from_millis(floor_travel_ms),
            door_cycle: Duration::from_millis(door_cycle_ms),
        }
    }

    /// No simulated delays at all.
    pub fn instant() -> Timings {
        Timings::new(0, 0)
    }

    pub fn travel(&self) {
        sleep_for(self.floor_travel);
    }

    pub fn cycle_doors(&self) {
        sleep_for(self.door_cycle);
    }
}

impl Default for Timings {
    fn default() -> Timings {
        Timings::new(setting::FLOOR_TRAVEL_TIME_MS, setting::DOOR_CYCLE_TIME_MS)
    }
}

fn sleep_for(duration: Duration) {
    if duration > Duration::from_millis(0) {
        thread::sleep(duration);
    }
}
