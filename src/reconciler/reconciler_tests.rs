/*
 * Unit tests for reconciler module
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_direct_instruction_drives_controller
 * - test_settle_waits_for_full_duration
 * - test_missing_controller_drops_after_one_tick
 * - test_pushed_event_for_unknown_lift_leaves_others_alone
 * - test_last_instruction_wins_on_overlap
 * - test_client_info_merges_identity
 * - test_unmounted_view_detected_on_dispatch
 *
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod reconciler_tests {
    use crate::config::ServerConfig;
    use crate::error::LiftError;
    use crate::reconciler::{Reconciler, UiIntent};
    use crate::registry::DriveCommand;
    use crate::session::{MovementOutcome, SessionApi, SessionStore};
    use crate::shared::{Lift, MovementInstruction, Origin, Session};
    use crate::socket::{SocketEvent, SocketManager};
    use crate::timing;
    use crossbeam_channel::unbounded;
    use std::time::{Duration, Instant};

    struct StubApi {
        session: Session,
    }

    impl SessionApi for StubApi {
        fn create_session(&self, _floors: u8, _lifts: u8) -> Result<Session, LiftError> {
            Ok(self.session.clone())
        }

        fn fetch_session(&self, session_id: &str) -> Result<Session, LiftError> {
            Err(LiftError::NotFound(session_id.to_string()))
        }

        fn create_request(
            &self,
            _session_id: &str,
            _client_id: Option<&str>,
            floor: u8,
        ) -> Result<MovementOutcome, LiftError> {
            Ok(MovementOutcome {
                lift: self.session.lifts[0].clone(),
                requested_floor: floor,
            })
        }
    }

    fn nine_floor_session() -> Session {
        Session {
            id: "session-1".to_string(),
            floors: 9,
            lifts: vec![
                Lift {
                    id: "lift-a".to_string(),
                    current_floor: 1,
                },
                Lift {
                    id: "lift-b".to_string(),
                    current_floor: 2,
                },
            ],
            client_id: None,
        }
    }

    fn setup() -> Reconciler {
        // Arrange a reconciler with a stubbed service and an unbound socket
        let mut store = SessionStore::new(Box::new(StubApi {
            session: nine_floor_session(),
        }));
        store.create_session(9, 2).unwrap();

        let config = ServerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            socket_url: "ws://127.0.0.1:9".to_string(),
        };
        let (socket_event_tx, socket_event_rx) = unbounded();
        let socket = SocketManager::new(&config, socket_event_tx);

        let (_intent_tx, intent_rx) = unbounded::<UiIntent>();
        let (_register_tx, register_rx) = unbounded();
        let (session_tx, _session_rx) = unbounded();
        let (_terminate_tx, terminate_rx) = unbounded::<()>();

        Reconciler::new(
            store,
            socket,
            Duration::from_millis(100),
            intent_rx,
            register_rx,
            socket_event_rx,
            session_tx,
            terminate_rx,
        )
    }

    fn direct(lift_id: &str, from_floor: u8, to_floor: u8) -> MovementInstruction {
        MovementInstruction {
            lift_id: lift_id.to_string(),
            from_floor,
            to_floor,
            origin: Origin::Direct,
        }
    }

    #[test]
    fn test_direct_instruction_drives_controller() {
        // Arrange
        let mut reconciler = setup();
        let (handle, view_rx) = unbounded::<DriveCommand>();
        reconciler.register("lift-a".to_string(), handle);

        // Act: lift-a at floor 1 requested to floor 5
        reconciler.reconcile(direct("lift-a", 1, 5));

        // Assert
        let command = view_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(command.from_floor, 1);
        assert_eq!(command.to_floor, 5);
        assert_eq!(command.plan.travel, timing::BASE_TRAVEL_PER_FLOOR * 4);
    }

    #[test]
    fn test_settle_waits_for_full_duration() {
        // Arrange
        let mut reconciler = setup();
        let (handle, _view_rx) = unbounded::<DriveCommand>();
        reconciler.register("lift-a".to_string(), handle);
        let dispatched_at = Instant::now();
        reconciler.reconcile(direct("lift-a", 1, 5));

        // Act / Assert: not settled right after dispatch
        reconciler.poll(Instant::now());
        let session = reconciler.store().session().unwrap();
        assert_eq!(session.lift("lift-a").unwrap().current_floor, 1);

        // Act / Assert: settled once travel plus the door cycle has elapsed
        let settle = timing::plan(4).settle_duration();
        reconciler.poll(dispatched_at + settle + Duration::from_secs(1));
        let session = reconciler.store().session().unwrap();
        assert_eq!(session.lift("lift-a").unwrap().current_floor, 5);
    }

    #[test]
    fn test_missing_controller_drops_after_one_tick() {
        // Arrange: lift-a never mounts a controller
        let mut reconciler = setup();

        // Act: deferred on the first tick, reported and dropped on the next
        reconciler.reconcile(direct("lift-a", 1, 5));
        reconciler.poll(Instant::now());
        reconciler.poll(Instant::now() + Duration::from_secs(3600));

        // Assert: nothing ever settles, the session is untouched
        let session = reconciler.store().session().unwrap();
        assert_eq!(session.lift("lift-a").unwrap().current_floor, 1);
        assert_eq!(session.lift("lift-b").unwrap().current_floor, 2);
    }

    #[test]
    fn test_pushed_event_for_unknown_lift_leaves_others_alone() {
        // Arrange
        let mut reconciler = setup();
        let (handle, view_rx) = unbounded::<DriveCommand>();
        reconciler.register("lift-b".to_string(), handle);

        // Act: the pushed lift id is not part of the session
        reconciler.handle_socket_event(SocketEvent::LiftMoved {
            lift_id: "lift-x".to_string(),
            floor_requested: 4,
        });
        reconciler.handle_socket_event(SocketEvent::LiftMoved {
            lift_id: "lift-b".to_string(),
            floor_requested: 6,
        });

        // Assert: lift-b still receives its own pushed movement
        let command = view_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(command.from_floor, 2);
        assert_eq!(command.to_floor, 6);
    }

    #[test]
    fn test_last_instruction_wins_on_overlap() {
        // Purpose: direct request to floor 3, then a pushed retarget to
        // floor 7 before lift-b settles; final resting floor is 7

        // Arrange
        let mut reconciler = setup();
        let (handle, view_rx) = unbounded::<DriveCommand>();
        reconciler.register("lift-b".to_string(), handle);
        let dispatched_at = Instant::now();

        // Act
        reconciler.reconcile(direct("lift-b", 2, 3));
        reconciler.handle_socket_event(SocketEvent::LiftMoved {
            lift_id: "lift-b".to_string(),
            floor_requested: 7,
        });

        // Assert: the controller was re-driven, no exception raised
        assert_eq!(view_rx.recv_timeout(Duration::from_secs(1)).unwrap().to_floor, 3);
        assert_eq!(view_rx.recv_timeout(Duration::from_secs(1)).unwrap().to_floor, 7);

        // Assert: only the superseding deadline fires
        let longest = timing::plan(5).settle_duration();
        reconciler.poll(dispatched_at + longest + Duration::from_secs(1));
        let session = reconciler.store().session().unwrap();
        assert_eq!(session.lift("lift-b").unwrap().current_floor, 7);
    }

    #[test]
    fn test_client_info_merges_identity() {
        let mut reconciler = setup();

        reconciler.handle_socket_event(SocketEvent::ClientInfo {
            client_id: "client-42".to_string(),
        });

        let session = reconciler.store().session().unwrap();
        assert_eq!(session.client_id.as_deref(), Some("client-42"));
    }

    #[test]
    fn test_unmounted_view_detected_on_dispatch() {
        // Arrange: the view side of the handle is already gone
        let mut reconciler = setup();
        let (handle, view_rx) = unbounded::<DriveCommand>();
        drop(view_rx);
        reconciler.register("lift-a".to_string(), handle);

        // Act: dropped without panicking, nothing settles later
        reconciler.reconcile(direct("lift-a", 1, 5));
        reconciler.poll(Instant::now() + Duration::from_secs(3600));

        // Assert
        let session = reconciler.store().session().unwrap();
        assert_eq!(session.lift("lift-a").unwrap().current_floor, 1);
    }
}
