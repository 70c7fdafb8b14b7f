//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP POST / (JSON-RPC 2.0, single or batch)
//!     → server.rs (Axum setup, CORS, body parse)
//!     → rpc::map_requests (method dispatch)
//!     → JSON response (Access-Control-Allow-Origin: *)
//! ```

pub mod server;

pub use server::HttpServer;
