pub const BUILDING_ID: &str = "building1";
pub const ELEVATOR_IDS: [&str; 3] = ["E1", "E2", "E3"];

pub const MIN_FLOOR: i32 = 1;
pub const MAX_FLOOR: i32 = 10;

pub const FLOOR_TRAVEL_TIME_MS: u64 = 3000;
pub const DOOR_CYCLE_TIME_MS: u64 = 5000;

pub const DEMO_PASSENGERS: usize = 100;
pub const DEMO_REQUEST_INTERVAL_MS: u64 = 100;
pub const DEMO_ARRIVAL_POLL_MS: u64 = 3000;
