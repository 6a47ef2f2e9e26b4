/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::mem;
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::registry::{ControllerHandle, DriveCommand, LiftRegistry};
use crate::session::SessionStore;
use crate::shared::{LiftId, MovementInstruction, Session};
use crate::socket::{SocketEvent, SocketManager};
use crate::timing;

/***************************************/
/*               Enums                 */
/***************************************/
/// User-triggered intents from the input plumbing.
pub enum UiIntent {
    CreateSession { floors: u8, lifts: u8 },
    LoadSession { session_id: String },
    RequestFloor { floor: u8 },
}

enum Event {
    Intent(UiIntent),
    Register((LiftId, ControllerHandle)),
    Socket(SocketEvent),
    Tick,
    Terminate,
}

/***************************************/
/*       Public data structures        */
/***************************************/
/// Deadline timer armed at dispatch time. Re-dispatching the same lift
/// overwrites the entry, so the superseded deadline simply never fires.
struct PendingSettle {
    to_floor: u8,
    deadline: Instant,
}

/**
 * Funnels movement instructions from both origins into one dispatch path
 * and owns every piece of mutable client state.
 *
 * Direct request results and pushed socket events enter `reconcile` alike;
 * one lift has one visual truth regardless of who triggered its movement.
 * All state mutation happens on this loop. Overlapping instructions for the
 * same lift are resolved last-instruction-wins; there is deliberately no
 * per-lift queue.
 *
 * # Fields
 * - `store`:             Session snapshot plus the service API.
 * - `registry`:          Lift id to controller handle bindings.
 * - `socket`:            Push channel lifecycle, rebound on session change.
 * - `pending`:           Armed settle deadlines, keyed by lift id.
 * - `deferred`:          Instructions whose controller was not mounted yet;
 *                        retried on the next tick, then dropped.
 * - `intent_rx`:         Receives user intents.
 * - `register_rx`:       Receives mount-time controller registrations.
 * - `socket_event_rx`:   Receives classified push channel traffic.
 * - `session_tx`:        Broadcasts installed session snapshots to the views.
 * - `terminate_rx`:      Receives the shutdown signal.
 */
pub struct Reconciler {
    store: SessionStore,
    registry: LiftRegistry,
    socket: SocketManager,
    tick: Duration,

    pending: HashMap<LiftId, PendingSettle>,
    deferred: Vec<MovementInstruction>,

    intent_rx: cbc::Receiver<UiIntent>,
    register_rx: cbc::Receiver<(LiftId, ControllerHandle)>,
    socket_event_rx: cbc::Receiver<SocketEvent>,
    session_tx: cbc::Sender<Session>,
    terminate_rx: cbc::Receiver<()>,
}

impl Reconciler {
    pub fn new(
        store: SessionStore,
        socket: SocketManager,
        tick: Duration,
        intent_rx: cbc::Receiver<UiIntent>,
        register_rx: cbc::Receiver<(LiftId, ControllerHandle)>,
        socket_event_rx: cbc::Receiver<SocketEvent>,
        session_tx: cbc::Sender<Session>,
        terminate_rx: cbc::Receiver<()>,
    ) -> Reconciler {
        Reconciler {
            store,
            registry: LiftRegistry::new(),
            socket,
            tick,
            pending: HashMap::new(),
            deferred: Vec::new(),
            intent_rx,
            register_rx,
            socket_event_rx,
            session_tx,
            terminate_rx,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn run(&mut self) {
        // Main loop
        loop {
            let event = self.wait_for_event();
            if let Event::Terminate = event {
                info!("reconciler terminated");
                self.socket.teardown();
                break;
            }
            self.handle_event(event);
        }
    }

    fn wait_for_event(&self) -> Event {
        cbc::select! {
            recv(self.intent_rx) -> intent => {
                match intent {
                    Ok(intent) => Event::Intent(intent),
                    // Input plumbing is gone; nothing left to drive us
                    Err(_) => Event::Terminate,
                }
            },

            recv(self.register_rx) -> registration => {
                match registration {
                    Ok(registration) => Event::Register(registration),
                    Err(_) => Event::Terminate,
                }
            },

            recv(self.socket_event_rx) -> socket_event => {
                match socket_event {
                    Ok(event) => Event::Socket(event),
                    Err(_) => Event::Terminate,
                }
            },

            recv(self.terminate_rx) -> _ => Event::Terminate,

            default(self.tick) => Event::Tick,
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Intent(UiIntent::CreateSession { floors, lifts }) => {
                let created = self
                    .store
                    .create_session(floors, lifts)
                    .map(|session| session.clone());
                match created {
                    Ok(session) => self.install_session(session),
                    Err(e) => error!("could not create session: {}", e),
                }
            }

            Event::Intent(UiIntent::LoadSession { session_id }) => {
                let fetched = self
                    .store
                    .fetch_session(&session_id)
                    .map(|session| session.clone());
                match fetched {
                    Ok(session) => self.install_session(session),
                    Err(e) => error!("could not load session {}: {}", session_id, e),
                }
            }

            Event::Intent(UiIntent::RequestFloor { floor }) => {
                match self.store.request_floor(floor) {
                    Ok(instruction) => {
                        info!(
                            "server assigned lift {} for floor {}",
                            instruction.lift_id, instruction.to_floor
                        );
                        self.reconcile(instruction);
                    }
                    Err(e) => error!("floor request failed: {}", e),
                }
            }

            Event::Register((lift_id, handle)) => self.register(lift_id, handle),

            Event::Socket(socket_event) => self.handle_socket_event(socket_event),

            Event::Tick => self.poll(Instant::now()),

            // Handled in run before dispatching here
            Event::Terminate => {}
        }
    }

    /// Installs a freshly replaced session: every previous controller
    /// binding and armed timer belongs to a snapshot that no longer exists.
    fn install_session(&mut self, session: Session) {
        info!(
            "session {} installed: {} lifts over {} floors",
            session.id,
            session.lifts.len(),
            session.floors
        );
        self.registry.clear();
        self.pending.clear();
        self.deferred.clear();
        self.socket.bind(&session.id);
        let _ = self.session_tx.send(session);
    }

    pub fn register(&mut self, lift_id: LiftId, handle: ControllerHandle) {
        debug!("controller mounted for lift {}", lift_id);
        self.registry.register(lift_id, handle);
    }

    pub fn handle_socket_event(&mut self, socket_event: SocketEvent) {
        match socket_event {
            SocketEvent::Opened => {
                info!(
                    "push channel open for session {}",
                    self.socket.session_id().unwrap_or("<unbound>")
                );
            }

            SocketEvent::ClientInfo { client_id } => {
                info!("server assigned client id {}", client_id);
                self.store.set_client_id(client_id);
            }

            SocketEvent::LiftMoved {
                lift_id,
                floor_requested,
            } => match self.store.push_instruction(&lift_id, floor_requested) {
                Some(instruction) => self.reconcile(instruction),
                None => warn!(
                    "pushed movement for lift {} outside the current session",
                    lift_id
                ),
            },

            SocketEvent::Closed => {
                // No reconnect until the session id changes again
                warn!("push channel closed; pushed movements are suspended");
            }
        }
    }

    /**
     * Single reconciliation entry point for both origins.
     *
     * A controller can be transiently absent while its view mounts; the
     * instruction is deferred for one scheduling tick before being reported
     * missing and dropped. Other lifts are never affected.
     */
    pub fn reconcile(&mut self, instruction: MovementInstruction) {
        match self.registry.resolve(&instruction.lift_id) {
            Some(handle) => {
                let handle = handle.clone();
                self.dispatch(&handle, instruction);
            }
            None => {
                debug!(
                    "no controller for lift {} yet, retrying next tick",
                    instruction.lift_id
                );
                self.deferred.push(instruction);
            }
        }
    }

    /// Advances the timer source: settles expired moves and gives deferred
    /// instructions their one retry. Called from the loop each tick.
    pub fn poll(&mut self, now: Instant) {
        self.settle_expired(now);
        self.retry_deferred();
    }

    fn dispatch(&mut self, handle: &ControllerHandle, instruction: MovementInstruction) {
        let plan = timing::plan(timing::floor_delta(
            instruction.from_floor,
            instruction.to_floor,
        ));
        let command = DriveCommand {
            from_floor: instruction.from_floor,
            to_floor: instruction.to_floor,
            plan,
        };

        if handle.send(command).is_err() {
            warn!(
                "controller missing for lift {}: view unmounted, {:?} instruction dropped",
                instruction.lift_id, instruction.origin
            );
            self.registry.remove(&instruction.lift_id);
            self.pending.remove(&instruction.lift_id);
            return;
        }

        debug!(
            "lift {} driven from floor {} to {} ({:?}), settles in {:?}",
            instruction.lift_id,
            instruction.from_floor,
            instruction.to_floor,
            instruction.origin,
            plan.settle_duration()
        );

        // Last instruction wins: overwriting re-arms the deadline
        self.pending.insert(
            instruction.lift_id,
            PendingSettle {
                to_floor: instruction.to_floor,
                deadline: Instant::now() + plan.settle_duration(),
            },
        );
    }

    fn settle_expired(&mut self, now: Instant) {
        let expired: Vec<LiftId> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(lift_id, _)| lift_id.clone())
            .collect();

        for lift_id in expired {
            if let Some(pending) = self.pending.remove(&lift_id) {
                self.store.settle(&lift_id, pending.to_floor);
                info!("lift {} settled at floor {}", lift_id, pending.to_floor);
            }
        }
    }

    fn retry_deferred(&mut self) {
        for instruction in mem::take(&mut self.deferred) {
            match self.registry.resolve(&instruction.lift_id) {
                Some(handle) => {
                    let handle = handle.clone();
                    self.dispatch(&handle, instruction);
                }
                None => warn!(
                    "controller missing for lift {}, {:?} instruction dropped",
                    instruction.lift_id, instruction.origin
                ),
            }
        }
    }
}
