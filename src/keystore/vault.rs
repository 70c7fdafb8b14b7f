//! Address → signing-key resolution.

use std::collections::HashMap;
use std::path::Path;

use alloy::primitives::{keccak256, Address};
use secp256k1::{SecretKey, SECP256K1};

use crate::keystore::cipher::{decrypt_keystore, KeystoreError, KeystoreFile};

/// Fixed development keys, matching the backend's well-known solo accounts.
///
/// Insecure by construction; loaded only when no keystore is configured.
const DEV_PRIVATE_KEYS: [&str; 10] = [
    "99f0500549792796c14fed62011a51081dc5b5e68fe8bd8a13b86be829c4fd36",
    "7b067f53d350f1cf20ec13df416b7b73e88a1dc7331bc904b92108b1e76a08b1",
    "f4a1a17039216f535d42ec23732c79943ffb45a089fbb78a14daad0dae93e991",
    "35b5cc144faca7d7f220fca7ad3420090861d5231d80eb23e1013426847371c4",
    "10c851d8d6c6ed9e6f625742063f292f4cf57c2dbeea8099fa3aca53ef90aef1",
    "2dd2c5b5d65913214783a6bd5679d8c6ef29ca9f2e2eae98b4add061d0b85ea0",
    "e1b72a1761ae189c10ec3783dd124b902ffd8c6b93cd9ff443d5490ce70047ff",
    "35cbc5ac0c3a2de0eb4f230ced958fd6a6c19ed36b5d2b1803a9f11978f96072",
    "b639c258292096306d2f60bc1a8da9bc434ad37f15cd44ee9a2526685f592220",
    "9d68178cdc934178cca0a0051f40ed46be153cf23cb1805b59cc612c0ad2bbe0",
];

/// Read-only map from address to signing key, fixed for the process lifetime.
#[derive(Clone)]
pub struct KeyVault {
    accounts: HashMap<Address, SecretKey>,
}

/// Derive the address of a private key: keccak256 of the uncompressed public
/// key (sans the 0x04 tag), last 20 bytes.
pub fn address_of(secret: &SecretKey) -> Address {
    let public = secret.public_key(SECP256K1).serialize_uncompressed();
    Address::from_slice(&keccak256(&public[1..])[12..])
}

fn parse_secret(bytes: &[u8]) -> Result<SecretKey, KeystoreError> {
    SecretKey::from_slice(bytes).map_err(|_| KeystoreError::InvalidKey)
}

impl KeyVault {
    /// Load the fixed development key set.
    pub fn development() -> Result<Self, KeystoreError> {
        let mut accounts = HashMap::with_capacity(DEV_PRIVATE_KEYS.len());
        for key_hex in DEV_PRIVATE_KEYS {
            let bytes = hex::decode(key_hex)
                .map_err(|e| KeystoreError::Malformed(format!("dev key hex: {e}")))?;
            let secret = parse_secret(&bytes)?;
            accounts.insert(address_of(&secret), secret);
        }
        tracing::warn!(
            accounts = accounts.len(),
            "Loaded built-in development keys; insecure, do not use in production"
        );
        Ok(Self { accounts })
    }

    /// Load a single account from an encrypted keystore file.
    pub fn from_keystore(path: &Path, passcode: &str) -> Result<Self, KeystoreError> {
        let contents = std::fs::read_to_string(path)?;
        let file: KeystoreFile = serde_json::from_str(&contents)?;
        let key_bytes = decrypt_keystore(&file, passcode)?;
        let secret = parse_secret(&key_bytes)?;
        let address = address_of(&secret);
        tracing::info!(address = %format!("{address:#x}"), "Keystore account loaded");
        Ok(Self {
            accounts: HashMap::from([(address, secret)]),
        })
    }

    /// All loaded addresses.
    pub fn accounts(&self) -> Vec<Address> {
        self.accounts.keys().copied().collect()
    }

    /// Resolve an address to its signing key.
    pub fn private_key(&self, address: &Address) -> Result<&SecretKey, KeystoreError> {
        self.accounts
            .get(address)
            .ok_or_else(|| KeystoreError::UnknownAccount(format!("{address:#x}")))
    }
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Addresses only; keys must never leak through Debug output.
        f.debug_struct("KeyVault")
            .field("accounts", &self.accounts.keys())
            .finish()
    }
}
