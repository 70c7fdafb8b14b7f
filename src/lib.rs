//! Ethereum JSON-RPC gateway backed by a RESTful blockchain node.
//!
//! # Architecture Overview
//!
//! ```text
//!   Wallet / tool (Ethereum JSON-RPC 2.0)
//!        │
//!        ▼
//!   ┌─────────┐    ┌─────────┐    ┌───────────────┐    ┌───────────────┐
//!   │  http   │───▶│   rpc   │───▶│    backend    │───▶│  backend node │
//!   │ server  │    │ adapter │    │ client/filters│    │  (REST API)   │
//!   └─────────┘    └────┬────┘    └───┬───────┬───┘    └───────────────┘
//!                       │             │       │
//!                       ▼             ▼       ▼
//!                  ┌─────────┐  ┌──────────┐ ┌──────────┐
//!                  │  codec  │  │ keystore │ │ tx build │
//!                  │ (pure)  │  │  vault   │ │ + sign   │
//!                  └─────────┘  └──────────┘ └──────────┘
//! ```
//!
//! The `rpc` adapter translates each Ethereum method into one or more REST
//! calls through the injected `BackendClient`; `codec` holds the pure shape
//! conversions, `keystore` the signing keys, and `backend::filters` the
//! block-filter polling cursors.

pub mod backend;
pub mod codec;
pub mod config;
pub mod http;
pub mod keystore;
pub mod observability;
pub mod rpc;

pub use backend::BackendClient;
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use keystore::KeyVault;
