use std::net::{AddrParseError, SocketAddr};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "server.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Defaults, then `server.toml` if present, then `PREDICT_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(DEFAULT_CONFIG_FILE)
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 5000)?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("PREDICT"))
            .build()?;

        cfg.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
