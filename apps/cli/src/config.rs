//! Runtime configuration resolved from flags and environment.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use housekeeping_client::{HousekeepingClient, SocketChannel};

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_SOCKET_URL: &str = "http://localhost:4000";
const APP_DIR: &str = "motel-housekeeping";
const TOKEN_FILE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub socket_url: String,
    pub token_file: PathBuf,
}

/// `<config dir>/motel-housekeeping/token`
pub fn default_token_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(TOKEN_FILE))
}

impl Config {
    pub fn new(api_url: &str, socket_url: &str, token_file: Option<PathBuf>) -> Result<Self> {
        let token_file = token_file.or_else(default_token_file).ok_or_else(|| {
            anyhow!("Could not determine a config directory; set HOUSEKEEPING_TOKEN_FILE")
        })?;
        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            socket_url: socket_url.trim().trim_end_matches('/').to_string(),
            token_file,
        })
    }

    pub fn client(&self, token: Option<String>) -> Result<HousekeepingClient> {
        let client = HousekeepingClient::new(&self.api_url)?;
        Ok(match token {
            Some(token) => client.with_token(token),
            None => client,
        })
    }

    pub fn channel(&self, token: &str) -> SocketChannel {
        SocketChannel::new(&self.socket_url).with_token(token)
    }
}
