/* 3rd party libraries */
use clap::{Arg, Command};
use crossbeam_channel as cbc;
use env_logger::Env;
// `error` is expanded by the unwrap_or_exit! call sites below.
use log::{error, info, warn};
use std::io::BufRead;
use std::thread::Builder;
use std::time::Duration;

/* Custom libraries */
use reconciler::{Reconciler, UiIntent};
use registry::ControllerHandle;
use session::{HttpSessionApi, SessionStore};
use shared::{LiftId, Session};
use socket::{SocketEvent, SocketManager};
use view::ViewSupervisor;

/* Modules */
mod config;
mod error;
mod reconciler;
mod registry;
mod session;
mod shared;
mod socket;
mod timing;
mod view;

const USAGE: &str = "commands: new <floors> <lifts> | join <session_id> | floor <n> | quit";

/* Main */
fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = Command::new("liftsim")
        .about("Client for the remote lift simulation service")
        .arg(
            Arg::new("config")
                .long("config")
                .takes_value(true)
                .default_value("config.toml")
                .help("Path to the configuration file"),
        )
        .get_matches();
    let config_path = matches.value_of("config").unwrap_or("config.toml");

    // Load the configuration
    let config = unwrap_or_exit!(config::load_config(config_path));

    // Initialize channels
    let (intent_tx, intent_rx) = cbc::unbounded::<UiIntent>();
    let (register_tx, register_rx) = cbc::unbounded::<(LiftId, ControllerHandle)>();
    let (socket_event_tx, socket_event_rx) = cbc::unbounded::<SocketEvent>();
    let (session_tx, session_rx) = cbc::unbounded::<Session>();
    let (terminate_tx, terminate_rx) = cbc::unbounded::<()>();

    // Start the view supervisor
    let supervisor = ViewSupervisor::new(session_rx, register_tx);
    let supervisor_thread = Builder::new().name("view_supervisor".into());
    unwrap_or_exit!(supervisor_thread.spawn(move || supervisor.run()));

    // Start the input plumbing
    let input_thread = Builder::new().name("input".into());
    unwrap_or_exit!(input_thread.spawn(move || read_intents(&intent_tx, &terminate_tx)));

    // Run the reconciler on this thread
    let store = SessionStore::new(Box::new(HttpSessionApi::new(&config.server)));
    let socket = SocketManager::new(&config.server, socket_event_tx);
    let mut reconciler = Reconciler::new(
        store,
        socket,
        Duration::from_millis(config.client.tick_ms),
        intent_rx,
        register_rx,
        socket_event_rx,
        session_tx,
        terminate_rx,
    );
    reconciler.run();
}

/// Stand-in for the form inputs and floor buttons: one command per line on
/// stdin.
fn read_intents(intent_tx: &cbc::Sender<UiIntent>, terminate_tx: &cbc::Sender<()>) {
    info!("{}", USAGE);
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        let intent = match parts.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["new", floors, lifts] => match (floors.parse::<u8>(), lifts.parse::<u8>()) {
                (Ok(floors), Ok(lifts)) => Some(UiIntent::CreateSession { floors, lifts }),
                _ => None,
            },
            ["join", session_id] => Some(UiIntent::LoadSession {
                session_id: (*session_id).to_string(),
            }),
            ["floor", floor] => match floor.parse::<u8>() {
                Ok(floor) => Some(UiIntent::RequestFloor { floor }),
                Err(_) => None,
            },
            _ => None,
        };

        match intent {
            Some(intent) => {
                if intent_tx.send(intent).is_err() {
                    return;
                }
            }
            None => warn!("{}", USAGE),
        }
    }
    let _ = terminate_tx.send(());
}
