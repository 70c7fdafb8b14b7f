//! Lossless conversion between the two chains' wire shapes.
//!
//! # Data Flow
//! ```text
//! Ethereum JSON-RPC params
//!     → quantity.rs (hex quantities, byte data, revisions)
//!     → topics.rs (topic filter → backend topic sets)
//!     → gas.rs (intrinsic gas for estimation)
//!
//! Backend REST responses
//!     → convert.rs (block/receipt/tx/log reshaping)
//!     → Ethereum JSON-RPC results
//! ```
//!
//! Everything in this module is a pure function; no I/O, no state.

pub mod convert;
pub mod gas;
pub mod quantity;
pub mod topics;

pub use quantity::{
    decode_hex, decode_quantity, encode_bytes, encode_quantity, pad_storage_key, CodecError,
    CodecResult, Revision,
};
