pub mod registry;

pub use registry::{ControllerHandle, DriveCommand, LiftRegistry};
