#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod address;
pub mod broadcast;
pub mod bus;
pub mod config;
pub mod error;
pub mod node;
pub mod protocol;
pub mod provisioning;
pub mod storage;
pub mod switch;
pub mod update;

pub use address::*;
pub use broadcast::StatusBroadcaster;
pub use bus::*;
pub use config::NodeConfig;
pub use error::*;
pub use node::{NodeMode, SensorNode};
pub use provisioning::{CredentialSession, SessionEvent};
pub use storage::*;
pub use switch::*;
pub use update::*;
