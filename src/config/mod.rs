//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → semantic validation
//!     → GatewayConfig (validated, immutable)
//!     → CLI flags override individual fields
//! ```
//!
//! All fields have defaults so a config file is optional.

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
