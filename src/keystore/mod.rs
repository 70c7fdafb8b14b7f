//! Signing-key management.
//!
//! # Data Flow
//! ```text
//! keystore file (JSON) + passcode
//!     → cipher.rs (KDF, AES-128-CTR, MAC check)
//!     → vault.rs (address derivation, address → key map)
//!     → shared read-only with every request handler
//! ```
//!
//! # Security Constraints
//! - Private keys and passcodes are never logged
//! - The account map is immutable after startup; no locking needed
//! - The built-in development key set is insecure and loads only when no
//!   keystore is configured

pub mod cipher;
pub mod vault;

pub use cipher::{decrypt_keystore, encrypt_keystore, Kdf, KeystoreError, KeystoreFile};
pub use vault::KeyVault;
