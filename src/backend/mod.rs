//! Backend REST integration subsystem.
//!
//! # Data Flow
//! ```text
//! RPC adapter call
//!     → client.rs (the one stateful façade each request flows through)
//!     → routes.rs (typed resource paths)
//!     → reqwest (bounded timeout, no silent retries)
//!     → codec (response reshaping)
//!
//! Writes additionally go through:
//!     keystore (address → key) → transaction.rs (build, RLP, sign) → submit
//!
//! Filter polls additionally go through:
//!     filters.rs (per-filter cursor, serialized per id)
//! ```

pub mod client;
pub mod filters;
pub mod routes;
pub mod transaction;
pub mod types;

pub use client::BackendClient;
pub use filters::FilterTable;
pub use routes::Routes;
pub use transaction::{Transaction, TxBuilder};
pub use types::{BackendError, BackendResult, EthTransaction};
