pub mod macros;
pub mod structs;

pub use structs::{Lift, LiftId, MovementInstruction, Origin, Session};
