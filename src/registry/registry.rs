/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::debug;
use std::collections::HashMap;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::LiftId;
use crate::timing::MovePlan;

/***************************************/
/*       Public data structures        */
/***************************************/
/// One authoritative animation instruction for a single lift view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveCommand {
    pub from_floor: u8,
    pub to_floor: u8,
    pub plan: MovePlan,
}

/// Capability that drives one lift's visual movement. Handed out by the
/// view when it mounts; dropping the receiving end invalidates it.
pub type ControllerHandle = cbc::Sender<DriveCommand>;

/**
 * Late-bound lookup between lift identity and the controller that can
 * animate that lift.
 *
 * Entries are keyed by lift id, never by list position, so reordering the
 * session's lift list cannot corrupt bindings. Registration is
 * last-write-wins to support view remounts. Resolution of an absent id is
 * not an error here; the reconciler decides what a missing controller
 * means.
 */
pub struct LiftRegistry {
    controllers: HashMap<LiftId, ControllerHandle>,
}

impl LiftRegistry {
    pub fn new() -> LiftRegistry {
        LiftRegistry {
            controllers: HashMap::new(),
        }
    }

    pub fn register(&mut self, lift_id: LiftId, handle: ControllerHandle) {
        if self.controllers.insert(lift_id.clone(), handle).is_some() {
            debug!("controller for lift {} re-registered", lift_id);
        }
    }

    pub fn resolve(&self, lift_id: &str) -> Option<&ControllerHandle> {
        self.controllers.get(lift_id)
    }

    pub fn remove(&mut self, lift_id: &str) {
        self.controllers.remove(lift_id);
    }

    /// Drops every handle. Used when the session is replaced wholesale and
    /// the views are about to re-mount.
    pub fn clear(&mut self) {
        self.controllers.clear();
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl Default for LiftRegistry {
    fn default() -> Self {
        LiftRegistry::new()
    }
}
