pub mod timing;

pub use timing::{door_cycle, floor_delta, plan, travel_duration, MovePlan};
pub use timing::{BASE_TRAVEL_PER_FLOOR, DOOR_CLOSE_DURATION, DOOR_DWELL, DOOR_OPEN_DURATION};
