pub mod http;
pub mod session;

pub use http::HttpSessionApi;
pub use session::{MovementOutcome, SessionApi, SessionStore};
