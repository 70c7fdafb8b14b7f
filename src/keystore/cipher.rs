//! Encrypted keystore primitives: key derivation, cipher, MAC.
//!
//! Interoperates with the standard encrypted-keystore format used by
//! Ethereum-family wallets: a `crypto` (or `Crypto`) envelope naming a KDF
//! (`pbkdf2` with HMAC-SHA256, or `scrypt`), an `aes-128-ctr` ciphertext,
//! and a keccak256(macKey ‖ ciphertext) MAC. The supported algorithm set is
//! closed; unknown names are hard errors, never silent no-ops.

use aes::cipher::{KeyIvInit, StreamCipher};
use alloy::primitives::keccak256;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::Sha256;
use thiserror::Error;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

/// Errors raised while loading or decrypting a keystore.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// The keystore names a KDF this gateway does not implement.
    #[error("unsupported key-derivation function: {0}")]
    UnsupportedKdf(String),

    /// The keystore names a cipher this gateway does not implement.
    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    /// The derived key is shorter than the 32 bytes the format requires.
    #[error("derived key too short: {0} bytes")]
    ShortDerivedKey(usize),

    /// The MAC check failed; the passcode is incorrect.
    #[error("MAC mismatch, passcode incorrect")]
    MacMismatch,

    /// The decrypted bytes are not a usable secp256k1 private key.
    #[error("invalid private key")]
    InvalidKey,

    /// No key is loaded for the requested address.
    #[error("no key loaded for address {0}")]
    UnknownAccount(String),

    /// Structurally invalid keystore contents or parameters.
    #[error("malformed keystore: {0}")]
    Malformed(String),

    #[error("keystore file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("keystore JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// A parsed keystore file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreFile {
    #[serde(alias = "Crypto")]
    pub crypto: CryptoSection,
    #[serde(default = "default_version")]
    pub version: u64,
}

fn default_version() -> u64 {
    3
}

/// The `crypto` envelope of a keystore file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoSection {
    pub kdf: String,
    pub kdfparams: Value,
    pub cipher: String,
    pub cipherparams: CipherParams,
    pub ciphertext: String,
    pub mac: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
}

/// The closed set of supported key-derivation functions.
#[derive(Debug, Clone)]
pub enum Kdf {
    /// PBKDF2 with HMAC-SHA256.
    Pbkdf2 {
        c: u32,
        dklen: usize,
        salt: Vec<u8>,
    },
    /// scrypt with the standard cost parameters.
    Scrypt {
        n: u64,
        r: u32,
        p: u32,
        dklen: usize,
        salt: Vec<u8>,
    },
}

#[derive(Deserialize)]
struct Pbkdf2Params {
    c: u32,
    dklen: usize,
    salt: String,
    #[serde(default)]
    prf: Option<String>,
}

#[derive(Deserialize)]
struct ScryptParams {
    n: u64,
    r: u32,
    p: u32,
    dklen: usize,
    salt: String,
}

fn hex_field(value: &str, what: &str) -> Result<Vec<u8>, KeystoreError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| KeystoreError::Malformed(format!("bad {what} hex: {e}")))
}

impl Kdf {
    /// Resolve a keystore's KDF name and parameter object.
    pub fn from_record(name: &str, params: &Value) -> Result<Self, KeystoreError> {
        match name {
            "pbkdf2" => {
                let params: Pbkdf2Params = serde_json::from_value(params.clone())
                    .map_err(|e| KeystoreError::Malformed(format!("pbkdf2 params: {e}")))?;
                if let Some(prf) = &params.prf {
                    if prf != "hmac-sha256" {
                        return Err(KeystoreError::UnsupportedKdf(format!("pbkdf2 prf {prf}")));
                    }
                }
                Ok(Kdf::Pbkdf2 {
                    c: params.c,
                    dklen: params.dklen,
                    salt: hex_field(&params.salt, "salt")?,
                })
            }
            "scrypt" => {
                let params: ScryptParams = serde_json::from_value(params.clone())
                    .map_err(|e| KeystoreError::Malformed(format!("scrypt params: {e}")))?;
                Ok(Kdf::Scrypt {
                    n: params.n,
                    r: params.r,
                    p: params.p,
                    dklen: params.dklen,
                    salt: hex_field(&params.salt, "salt")?,
                })
            }
            other => Err(KeystoreError::UnsupportedKdf(other.to_string())),
        }
    }

    /// Derive the symmetric key material from a passcode.
    pub fn derive(&self, passcode: &str) -> Result<Vec<u8>, KeystoreError> {
        match self {
            Kdf::Pbkdf2 { c, dklen, salt } => {
                let mut derived = vec![0u8; *dklen];
                pbkdf2::pbkdf2_hmac::<Sha256>(passcode.as_bytes(), salt, *c, &mut derived);
                Ok(derived)
            }
            Kdf::Scrypt {
                n,
                r,
                p,
                dklen,
                salt,
            } => {
                if !n.is_power_of_two() || *n < 2 {
                    return Err(KeystoreError::Malformed(format!(
                        "scrypt n must be a power of two, got {n}"
                    )));
                }
                let log_n = n.trailing_zeros() as u8;
                let params = scrypt::Params::new(log_n, *r, *p, *dklen)
                    .map_err(|e| KeystoreError::Malformed(format!("scrypt params: {e}")))?;
                let mut derived = vec![0u8; *dklen];
                scrypt::scrypt(passcode.as_bytes(), salt, &params, &mut derived)
                    .map_err(|e| KeystoreError::Malformed(format!("scrypt: {e}")))?;
                Ok(derived)
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Kdf::Pbkdf2 { .. } => "pbkdf2",
            Kdf::Scrypt { .. } => "scrypt",
        }
    }

    fn params_json(&self) -> Value {
        match self {
            Kdf::Pbkdf2 { c, dklen, salt } => json!({
                "prf": "hmac-sha256",
                "c": c,
                "dklen": dklen,
                "salt": hex::encode(salt),
            }),
            Kdf::Scrypt {
                n,
                r,
                p,
                dklen,
                salt,
            } => json!({
                "n": n,
                "r": r,
                "p": p,
                "dklen": dklen,
                "salt": hex::encode(salt),
            }),
        }
    }
}

/// The only supported cipher name.
const CIPHER_AES_128_CTR: &str = "aes-128-ctr";

fn aes_ctr_apply(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, KeystoreError> {
    let mut cipher = Aes128Ctr::new_from_slices(key, iv)
        .map_err(|_| KeystoreError::Malformed("bad AES key or iv length".into()))?;
    let mut buffer = data.to_vec();
    cipher.apply_keystream(&mut buffer);
    Ok(buffer)
}

/// Decrypt a keystore file, returning the private key bytes.
///
/// The derived key splits into a 16-byte encryption key and a 16-byte MAC
/// key; the stored MAC must equal keccak256(macKey ‖ ciphertext) or the
/// passcode is wrong and no key is returned.
pub fn decrypt_keystore(file: &KeystoreFile, passcode: &str) -> Result<Vec<u8>, KeystoreError> {
    let crypto = &file.crypto;
    if crypto.cipher != CIPHER_AES_128_CTR {
        return Err(KeystoreError::UnsupportedCipher(crypto.cipher.clone()));
    }
    let kdf = Kdf::from_record(&crypto.kdf, &crypto.kdfparams)?;
    let derived = kdf.derive(passcode)?;
    if derived.len() < 32 {
        return Err(KeystoreError::ShortDerivedKey(derived.len()));
    }

    let ciphertext = hex_field(&crypto.ciphertext, "ciphertext")?;
    let stored_mac = hex_field(&crypto.mac, "mac")?;
    let mut mac_input = derived[16..32].to_vec();
    mac_input.extend_from_slice(&ciphertext);
    if keccak256(&mac_input).as_slice() != stored_mac.as_slice() {
        return Err(KeystoreError::MacMismatch);
    }

    let iv = hex_field(&crypto.cipherparams.iv, "iv")?;
    aes_ctr_apply(&derived[..16], &iv, &ciphertext)
}

/// Encrypt a private key into the keystore format.
///
/// The inverse of [`decrypt_keystore`]; used by tests and tooling.
pub fn encrypt_keystore(
    private_key: &[u8],
    passcode: &str,
    kdf: &Kdf,
    iv: [u8; 16],
) -> Result<KeystoreFile, KeystoreError> {
    let derived = kdf.derive(passcode)?;
    if derived.len() < 32 {
        return Err(KeystoreError::ShortDerivedKey(derived.len()));
    }
    let ciphertext = aes_ctr_apply(&derived[..16], &iv, private_key)?;
    let mut mac_input = derived[16..32].to_vec();
    mac_input.extend_from_slice(&ciphertext);
    let mac = keccak256(&mac_input);

    Ok(KeystoreFile {
        crypto: CryptoSection {
            kdf: kdf.name().to_string(),
            kdfparams: kdf.params_json(),
            cipher: CIPHER_AES_128_CTR.to_string(),
            cipherparams: CipherParams {
                iv: hex::encode(iv),
            },
            ciphertext: hex::encode(ciphertext),
            mac: hex::encode(mac),
        },
        version: 3,
    })
}

/// A fresh scrypt KDF with a random salt and test-friendly cost parameters
/// scaled down from the wallet defaults.
pub fn random_scrypt(n: u64) -> Kdf {
    Kdf::Scrypt {
        n,
        r: 1,
        p: 8,
        dklen: 32,
        salt: rand::random::<[u8; 16]>().to_vec(),
    }
}
