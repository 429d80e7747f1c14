//! rollcall-core — shared types for the rollcall workspace.
//!
//! Holds the component identity (`ComponentKey`), the heartbeat payload
//! (`RunningUnit`), the daemon configuration and the error types shared by
//! the other crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{MAX_DURATION, RollcallConfig, parse_duration};
pub use error::{ConfigError, ConfigResult, UnitError};
pub use types::*;
