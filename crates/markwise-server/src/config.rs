use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use eyre::{WrapErr, bail};
use markwise_classroom::ResubmissionPolicy;

pub const DEFAULT_STORAGE_DIR: &str = "./markwise-data";
pub const DEFAULT_LOCALE: &str = "en-US";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:10000";
pub const DEFAULT_STORAGE_RETRIES: u32 = 3;

/// Runtime configuration, read from `MARKWISE_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub channel_token: String,
    pub admin_id: Option<String>,
    pub storage_dir: PathBuf,
    pub locale: String,
    pub bind_addr: SocketAddr,
    pub resubmission: ResubmissionPolicy,
    pub storage_retries: u32,
}

impl ServerConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let get = |key: &str| {
            let value = lookup(key)?;
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        let Some(channel_token) = get("MARKWISE_CHANNEL_TOKEN") else {
            bail!("MARKWISE_CHANNEL_TOKEN must be set");
        };

        let bind_addr = get("MARKWISE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .wrap_err_with(|| format!("invalid MARKWISE_BIND_ADDR: {bind_addr}"))?;

        let resubmission = match get("MARKWISE_RESUBMISSION") {
            Some(value) => value
                .parse::<ResubmissionPolicy>()
                .map_err(|e| eyre::eyre!("MARKWISE_RESUBMISSION: {e}"))?,
            None => ResubmissionPolicy::default(),
        };

        let storage_retries = match get("MARKWISE_STORAGE_RETRIES") {
            Some(value) => {
                let n: u32 = value
                    .parse()
                    .wrap_err_with(|| format!("invalid MARKWISE_STORAGE_RETRIES: {value}"))?;
                if n == 0 {
                    bail!("MARKWISE_STORAGE_RETRIES must be at least 1");
                }
                n
            }
            None => DEFAULT_STORAGE_RETRIES,
        };

        let storage_dir = get("MARKWISE_STORAGE_DIR")
            .unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string());

        Ok(Self {
            channel_token,
            admin_id: get("MARKWISE_ADMIN_ID"),
            storage_dir: PathBuf::from(storage_dir),
            locale: get("MARKWISE_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            bind_addr,
            resubmission,
            storage_retries,
        })
    }
}
