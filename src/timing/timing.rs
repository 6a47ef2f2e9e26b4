/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::time::Duration;

/***************************************/
/*             Constants               */
/***************************************/
/// Visual travel time per floor of distance.
pub const BASE_TRAVEL_PER_FLOOR: Duration = Duration::from_millis(2000);
/// Time for the door panels to slide open once the lift has arrived.
pub const DOOR_OPEN_DURATION: Duration = Duration::from_millis(2500);
/// How long the doors stay fully open before closing again.
pub const DOOR_DWELL: Duration = Duration::from_millis(2000);
/// Time for the door panels to slide shut.
pub const DOOR_CLOSE_DURATION: Duration = Duration::from_millis(2500);

/***************************************/
/*       Public data structures        */
/***************************************/
/**
 * Door animation schedule for one movement, relative to dispatch time.
 *
 * The doors stay closed during travel, start opening when travel ends and
 * run a full open/dwell/close cycle regardless of travel direction or
 * distance. A lift arriving at its own floor still runs the cycle.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorSequence {
    pub open_after: Duration,
    pub open_duration: Duration,
    pub dwell: Duration,
    pub close_duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub travel: Duration,
    pub doors: DoorSequence,
}

impl MovePlan {
    /// Time from dispatch until the lift counts as idle again: travel plus
    /// the full door cycle.
    pub fn settle_duration(&self) -> Duration {
        self.travel + door_cycle()
    }
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn floor_delta(from_floor: u8, to_floor: u8) -> u8 {
    from_floor.abs_diff(to_floor)
}

pub fn travel_duration(floor_delta: u8) -> Duration {
    BASE_TRAVEL_PER_FLOOR * u32::from(floor_delta)
}

pub fn door_cycle() -> Duration {
    DOOR_OPEN_DURATION + DOOR_DWELL + DOOR_CLOSE_DURATION
}

pub fn plan(floor_delta: u8) -> MovePlan {
    let travel = travel_duration(floor_delta);
    MovePlan {
        travel,
        doors: DoorSequence {
            open_after: travel,
            open_duration: DOOR_OPEN_DURATION,
            dwell: DOOR_DWELL,
            close_duration: DOOR_CLOSE_DURATION,
        },
    }
}
