/***************************************/
/*        3rd party libraries          */
/***************************************/
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::ServerConfig;
use crate::error::LiftError;
use crate::session::session::{MovementOutcome, SessionApi};
use crate::shared::Session;

/***************************************/
/*       Public data structures        */
/***************************************/
/// HTTP implementation of the session API against the remote simulation
/// service.
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpSessionApi {
    pub fn new(config: &ServerConfig) -> HttpSessionApi {
        HttpSessionApi {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Pulls the server's `{"error": ...}` message out of a failed response,
/// falling back to the status line.
fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>() {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}

fn check(response: Response, not_found_hint: &str) -> Result<Response, LiftError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(LiftError::NotFound(not_found_hint.to_string())),
        StatusCode::BAD_REQUEST => Err(LiftError::Validation(error_message(response))),
        _ => match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) => Err(LiftError::Transport(e)),
        },
    }
}

impl SessionApi for HttpSessionApi {
    fn create_session(&self, floors: u8, lifts: u8) -> Result<Session, LiftError> {
        let response = self
            .client
            .post(self.url("/session"))
            .json(&json!({ "floors": floors, "lifts": lifts }))
            .send()?;
        Ok(check(response, "new session")?.json::<Session>()?)
    }

    fn fetch_session(&self, session_id: &str) -> Result<Session, LiftError> {
        let response = self
            .client
            .get(self.url(&format!("/session/{}", session_id)))
            .send()?;
        Ok(check(response, session_id)?.json::<Session>()?)
    }

    fn create_request(
        &self,
        session_id: &str,
        client_id: Option<&str>,
        floor: u8,
    ) -> Result<MovementOutcome, LiftError> {
        let response = self
            .client
            .post(self.url(&format!("/session/{}/request", session_id)))
            .json(&json!({ "floor": floor, "clientId": client_id }))
            .send()?;
        Ok(check(response, session_id)?.json::<MovementOutcome>()?)
    }
}
