/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;

/***************************************/
/*       Public data structures        */
/***************************************/
/// Server-assigned lift identity. Stable across session fetches.
pub type LiftId = String;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Lift {
    #[serde(rename = "_id")]
    pub id: LiftId,
    #[serde(rename = "currentFloor")]
    pub current_floor: u8,
}

/**
 * Snapshot of one simulation session as reported by the server.
 *
 * Replaced wholesale whenever a session response arrives, never patched
 * incrementally. `current_floor` on each lift is the last settled floor;
 * the live animated position is owned by that lift's controller.
 *
 * # Fields
 * - `id`:          Server-assigned session identity.
 * - `floors`:      Number of floors in the simulation.
 * - `lifts`:       Lifts in the session, ids unique within it.
 * - `client_id`:   Identity assigned by the server at the channel handshake.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: String,
    pub floors: u8,
    pub lifts: Vec<Lift>,
    #[serde(rename = "clientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Session {
    pub fn lift(&self, lift_id: &str) -> Option<&Lift> {
        self.lifts.iter().find(|lift| lift.id == lift_id)
    }

    pub fn lift_mut(&mut self, lift_id: &str) -> Option<&mut Lift> {
        self.lifts.iter_mut().find(|lift| lift.id == lift_id)
    }
}

/// Where a movement instruction came from. Diagnostics only; both origins
/// take the identical reconciliation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Direct,
    Pushed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovementInstruction {
    pub lift_id: LiftId,
    pub from_floor: u8,
    pub to_floor: u8,
    pub origin: Origin,
}
