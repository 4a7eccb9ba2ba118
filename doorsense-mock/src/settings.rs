use std::error::Error;
use std::path::PathBuf;
use std::{env, io};

use doorsense_embedded::{NodeAddress, NodeConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hardware {
    /// Value set on the DIP switches
    pub address: u8,
    pub mac: [u8; 6],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub run_for_ms: u64,
    /// Mean time between door movements
    pub door_toggle_ms: u64,
    /// Contact chatter after each movement
    pub bounce_ms: u64,
    pub tx_failure_rate: f64,
    pub update_session_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controller {
    pub ssid: String,
    pub password: String,
    pub provision_after_ms: u64,
    pub trigger_after_ms: u64,
    pub corrupt_checksum: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub node: NodeConfig,
    pub hardware: Hardware,
    pub simulation: Simulation,
    pub controller: Controller,
    pub storage: Storage,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::from_toml(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))
    }

    pub fn from_toml(source: &str) -> Result<Self, Box<dyn Error>> {
        let mut settings: Settings = toml::from_str(source)?;
        settings.node.validate()?;
        NodeAddress::new(settings.hardware.address)?;

        if !(0.0..=1.0).contains(&settings.simulation.tx_failure_rate) {
            return Err("tx_failure_rate must be within 0.0..=1.0".into());
        }

        settings.storage.path = Self::normalize_path(&settings.storage.path)?
            .to_string_lossy()
            .to_string();

        Ok(settings)
    }

    fn normalize_path(path: &str) -> io::Result<PathBuf> {
        let path_buf = PathBuf::from(path);

        Ok(if path_buf.is_absolute() {
            path_buf
        } else {
            env::current_dir()?.as_path().join(&path_buf)
        })
    }
}
