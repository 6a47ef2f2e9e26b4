/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, info};
use std::thread::Builder;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::registry::{ControllerHandle, DriveCommand};
use crate::shared::{Lift, LiftId, Session};

/***************************************/
/*       Public data structures        */
/***************************************/
/**
 * Presentation stand-in for the lift bank.
 *
 * For every installed session snapshot the supervisor mounts one view
 * thread per lift and hands its controller handle to the reconciler, the
 * same way a visual component would register on mount. Views of a replaced
 * session exit on their own once the registry drops their handles.
 */
pub struct ViewSupervisor {
    session_rx: cbc::Receiver<Session>,
    register_tx: cbc::Sender<(LiftId, ControllerHandle)>,
}

impl ViewSupervisor {
    pub fn new(
        session_rx: cbc::Receiver<Session>,
        register_tx: cbc::Sender<(LiftId, ControllerHandle)>,
    ) -> ViewSupervisor {
        ViewSupervisor {
            session_rx,
            register_tx,
        }
    }

    pub fn run(self) {
        while let Ok(session) = self.session_rx.recv() {
            for lift in session.lifts {
                let (handle, command_rx) = cbc::unbounded::<DriveCommand>();
                let view = LiftView::new(lift.clone(), command_rx);

                let view_thread = Builder::new().name(format!("lift_view_{}", lift.id));
                if let Err(e) = view_thread.spawn(move || view.run()) {
                    error!("failed to mount view for lift {}: {}", lift.id, e);
                    continue;
                }
                if self.register_tx.send((lift.id, handle)).is_err() {
                    return;
                }
            }
        }
    }
}

/// One lift's visual component, reduced to log output. Consumes drive
/// commands until its handle is dropped.
pub struct LiftView {
    lift: Lift,
    command_rx: cbc::Receiver<DriveCommand>,
}

impl LiftView {
    pub fn new(lift: Lift, command_rx: cbc::Receiver<DriveCommand>) -> LiftView {
        LiftView { lift, command_rx }
    }

    pub fn run(self) {
        info!(
            "lift {} mounted at floor {}",
            self.lift.id, self.lift.current_floor
        );
        while let Ok(command) = self.command_rx.recv() {
            info!(
                "lift {}: floor {} -> {} over {:?}",
                self.lift.id, command.from_floor, command.to_floor, command.plan.travel
            );
            info!(
                "lift {}: doors open at +{:?} for {:?}, shut again {:?} later",
                self.lift.id,
                command.plan.doors.open_after,
                command.plan.doors.open_duration + command.plan.doors.dwell,
                command.plan.doors.close_duration
            );
        }
        debug!("lift {} unmounted", self.lift.id);
    }
}
