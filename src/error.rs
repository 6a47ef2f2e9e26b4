/***************************************/
/*        3rd party libraries          */
/***************************************/
use thiserror::Error;

/***************************************/
/*       Public data structures        */
/***************************************/
/**
 * Error taxonomy for the lift simulation client.
 *
 * No variant is fatal to the whole client; each failure degrades only the
 * affected session or lift. A missing lift controller is deliberately not
 * represented here: the reconciler logs it and drops the instruction.
 */
#[derive(Debug, Error)]
pub enum LiftError {
    #[error("invalid session parameters: {0}")]
    Validation(String),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("no active session")]
    NoSession,

    #[error("push channel failure: {0}")]
    Channel(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to load configuration: {0}")]
    Config(String),
}
