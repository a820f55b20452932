#![no_std]

#[cfg(test)]
extern crate std;

mod config;
mod connection;
mod consts;
mod probe;
mod state;
mod store;
mod watchdog;

pub use config::{BackendUrl, Config, ConfigError};
pub use connection::*;
pub use consts::*;
pub use probe::HttpHealthProbe;
pub use state::WaypointState;
pub use store::{FixStore, StoreTimeout};
pub use watchdog::{HealthProbe, ProbeError, Reachability, Watchdog};
