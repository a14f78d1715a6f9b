//! fleetgate
//!
//! Configuration, logging bootstrap and the canonical admission chain for the
//! fleet RPC service. The building blocks live in the `fleetgate-*` crates.

pub mod config;
pub mod gate;
pub mod telemetry;

pub use config::{ConfigError, GateConfig};
pub use gate::{fleet_device_id_registry, AdmissionGate};
