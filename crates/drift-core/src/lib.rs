//! drift-core — shared domain model for Driftboard.
//!
//! Holds the static environment/service registry, URL building rules,
//! the normalized commit model, and the TOML configuration loader.
//!
//! The registry is loaded once at startup and immutable for the life of
//! the process; only which environment is "baseline" changes at runtime.

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::DashboardConfig;
pub use error::{CoreError, CoreResult};
pub use registry::{EnvironmentDescriptor, Registry, ServiceDescriptor, FRONTEND_SERVICE};
pub use types::*;
