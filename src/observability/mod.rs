//! Observability subsystem.
//!
//! Structured logging only; every backend-facing failure is logged with the
//! method and target resource, never with key material or passcodes.

pub mod logging;
