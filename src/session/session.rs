/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::collections::HashSet;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::error::LiftError;
use crate::shared::{Lift, MovementInstruction, Origin, Session};

/***************************************/
/*       Public data structures        */
/***************************************/
/// Result of a movement request: the lift the server chose and the floor it
/// was sent to.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MovementOutcome {
    pub lift: Lift,
    #[serde(rename = "requestedFloor")]
    pub requested_floor: u8,
}

/// Request/response surface of the remote simulation service. Implemented
/// over HTTP in production and stubbed in tests.
pub trait SessionApi: Send {
    fn create_session(&self, floors: u8, lifts: u8) -> Result<Session, LiftError>;
    fn fetch_session(&self, session_id: &str) -> Result<Session, LiftError>;
    fn create_request(
        &self,
        session_id: &str,
        client_id: Option<&str>,
        floor: u8,
    ) -> Result<MovementOutcome, LiftError>;
}

/**
 * Holds the current simulation snapshot and the calls that replace it.
 *
 * Every session response replaces the snapshot atomically and wholesale.
 * Replacing it conceptually invalidates all registered lift controllers;
 * the reconciler clears the registry and lets the views re-mount.
 */
pub struct SessionStore {
    api: Box<dyn SessionApi>,
    session: Option<Session>,
}

impl SessionStore {
    pub fn new(api: Box<dyn SessionApi>) -> SessionStore {
        SessionStore { api, session: None }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.id.as_str())
    }

    pub fn create_session(&mut self, floors: u8, lifts: u8) -> Result<&Session, LiftError> {
        if floors == 0 || lifts == 0 {
            return Err(LiftError::Validation(format!(
                "floors and lifts must be positive, got {} and {}",
                floors, lifts
            )));
        }
        let session = self.api.create_session(floors, lifts)?;
        self.install(session)
    }

    pub fn fetch_session(&mut self, session_id: &str) -> Result<&Session, LiftError> {
        if session_id.is_empty() {
            return Err(LiftError::Validation("empty session id".to_string()));
        }
        let session = self.api.fetch_session(session_id)?;
        self.install(session)
    }

    /// Asks the server to move a lift to `floor`. The server picks the lift;
    /// the response becomes a direct movement instruction.
    pub fn request_floor(&mut self, floor: u8) -> Result<MovementInstruction, LiftError> {
        let session = self.session.as_ref().ok_or(LiftError::NoSession)?;
        if floor >= session.floors {
            return Err(LiftError::Validation(format!(
                "floor {} out of range, session has {} floors",
                floor, session.floors
            )));
        }
        let outcome =
            self.api
                .create_request(&session.id, session.client_id.as_deref(), floor)?;
        Ok(MovementInstruction {
            lift_id: outcome.lift.id,
            from_floor: outcome.lift.current_floor,
            to_floor: outcome.requested_floor,
            origin: Origin::Direct,
        })
    }

    /// Builds a pushed instruction from a `lift_moved` event, using the
    /// lift's last-known settled floor as the starting point. Returns `None`
    /// when the lift is not part of the current session.
    pub fn push_instruction(
        &self,
        lift_id: &str,
        floor_requested: u8,
    ) -> Option<MovementInstruction> {
        let session = self.session.as_ref()?;
        let lift = session.lift(lift_id)?;
        Some(MovementInstruction {
            lift_id: lift.id.clone(),
            from_floor: lift.current_floor,
            to_floor: floor_requested,
            origin: Origin::Pushed,
        })
    }

    pub fn set_client_id(&mut self, client_id: String) {
        if let Some(session) = self.session.as_mut() {
            session.client_id = Some(client_id);
        }
    }

    /// Marks the lift's floor as settled once its full travel and door cycle
    /// has elapsed.
    pub fn settle(&mut self, lift_id: &str, floor: u8) {
        if let Some(session) = self.session.as_mut() {
            if let Some(lift) = session.lift_mut(lift_id) {
                lift.current_floor = floor;
            }
        }
    }

    fn install(&mut self, session: Session) -> Result<&Session, LiftError> {
        let mut seen = HashSet::new();
        for lift in &session.lifts {
            if !seen.insert(lift.id.as_str()) {
                return Err(LiftError::Validation(format!(
                    "duplicate lift id {} in session {}",
                    lift.id, session.id
                )));
            }
        }
        Ok(&*self.session.insert(session))
    }
}
