/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::error::LiftError;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
    pub base_url: String,
    pub socket_url: String,
}

#[derive(Deserialize, Clone)]
pub struct ClientConfig {
    pub tick_ms: u64,
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &str) -> Result<Config, LiftError> {
    let config_str =
        fs::read_to_string(path).map_err(|e| LiftError::Config(format!("{}: {}", path, e)))?;
    toml::from_str(&config_str).map_err(|e| LiftError::Config(format!("{}: {}", path, e)))
}
