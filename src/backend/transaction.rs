//! Backend-native transaction construction and signing.
//!
//! # Responsibilities
//! - Build a single-clause wire transaction from an Ethereum-shaped payload
//! - Serialize it with the backend's canonical RLP field order
//! - Hash the unsigned encoding with blake2b-256 and produce a 65-byte
//!   recoverable secp256k1 signature
//!
//! Replay protection is chainTag + blockRef + expiration; there is no
//! account nonce in this wire format.

use alloy::primitives::{Bytes, U256};
use alloy_rlp::RlpEncodable;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use secp256k1::{Message, SecretKey, SECP256K1};

use crate::backend::types::{BackendError, BackendResult, EthTransaction};
use crate::codec::decode_hex;

type Blake2b256 = Blake2b<U32>;

/// Validity window in blocks. Effectively "no practical expiry"; a policy
/// choice carried over from the reference gateway, not a protocol rule.
pub const EXPIRATION_WINDOW: u32 = u32::MAX;

/// Gas limit applied when the request does not specify one.
pub const DEFAULT_GAS: u64 = 3_000_000;

/// One transfer/invocation unit inside a transaction.
///
/// `to` is empty for contract creation.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable)]
pub struct Clause {
    pub to: Bytes,
    pub value: U256,
    pub data: Bytes,
}

/// A backend wire transaction, signed or not.
///
/// Constructed fresh per send and serialized once after signing.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub chain_tag: u8,
    pub block_ref: u64,
    pub expiration: u32,
    pub clauses: Vec<Clause>,
    pub gas_price_coef: u8,
    pub gas: u64,
    pub depends_on: Bytes,
    pub nonce: u64,
    signature: Option<Bytes>,
}

/// RLP body without the signature; the signing hash covers exactly this.
#[derive(RlpEncodable)]
struct UnsignedBody {
    chain_tag: u8,
    block_ref: u64,
    expiration: u32,
    clauses: Vec<Clause>,
    gas_price_coef: u8,
    gas: u64,
    depends_on: Bytes,
    nonce: u64,
    reserved: Vec<Bytes>,
}

/// RLP body with the signature appended as the final field.
#[derive(RlpEncodable)]
struct SignedBody {
    chain_tag: u8,
    block_ref: u64,
    expiration: u32,
    clauses: Vec<Clause>,
    gas_price_coef: u8,
    gas: u64,
    depends_on: Bytes,
    nonce: u64,
    reserved: Vec<Bytes>,
    signature: Bytes,
}

impl Transaction {
    fn unsigned_body(&self) -> UnsignedBody {
        UnsignedBody {
            chain_tag: self.chain_tag,
            block_ref: self.block_ref,
            expiration: self.expiration,
            clauses: self.clauses.clone(),
            gas_price_coef: self.gas_price_coef,
            gas: self.gas,
            depends_on: self.depends_on.clone(),
            nonce: self.nonce,
            reserved: Vec::new(),
        }
    }

    /// blake2b-256 over the unsigned RLP encoding.
    pub fn signing_hash(&self) -> [u8; 32] {
        let encoded = alloy_rlp::encode(self.unsigned_body());
        let mut hasher = Blake2b256::new();
        hasher.update(&encoded);
        hasher.finalize().into()
    }

    /// Sign the content hash, overriding any existing signature.
    ///
    /// The signature is `r ‖ s ‖ recoveryId`, 65 bytes.
    pub fn sign(&mut self, key: &SecretKey) {
        let message = Message::from_digest(self.signing_hash());
        let recoverable = SECP256K1.sign_ecdsa_recoverable(&message, key);
        let (recovery_id, compact) = recoverable.serialize_compact();
        let mut signature = [0u8; 65];
        signature[..64].copy_from_slice(&compact);
        signature[64] = i32::from(recovery_id) as u8;
        self.signature = Some(Bytes::copy_from_slice(&signature));
    }

    /// The canonical RLP encoding: signed when a signature is present.
    pub fn encoded(&self) -> Vec<u8> {
        match &self.signature {
            Some(signature) => {
                let body = SignedBody {
                    chain_tag: self.chain_tag,
                    block_ref: self.block_ref,
                    expiration: self.expiration,
                    clauses: self.clauses.clone(),
                    gas_price_coef: self.gas_price_coef,
                    gas: self.gas,
                    depends_on: self.depends_on.clone(),
                    nonce: self.nonce,
                    reserved: Vec::new(),
                    signature: signature.clone(),
                };
                alloy_rlp::encode(body)
            }
            None => alloy_rlp::encode(self.unsigned_body()),
        }
    }

    /// The submittable payload as `0x`-prefixed hex.
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encoded()))
    }

    pub fn signature(&self) -> Option<&Bytes> {
        self.signature.as_ref()
    }
}

/// Builds wire transactions bound to resolved chain parameters.
#[derive(Debug, Clone, Copy)]
pub struct TxBuilder {
    chain_tag: u8,
    block_ref: u64,
}

impl TxBuilder {
    pub fn new(chain_tag: u8, block_ref: u64) -> Self {
        Self {
            chain_tag,
            block_ref,
        }
    }

    /// Derive chain-binding fields from the genesis and best block ids:
    /// chainTag is the genesis id's low byte, blockRef the best id's high
    /// four bytes.
    pub fn from_block_ids(genesis_id: &str, best_id: &str) -> BackendResult<Self> {
        let genesis = genesis_id.strip_prefix("0x").unwrap_or(genesis_id);
        let chain_tag = genesis
            .len()
            .checked_sub(2)
            .and_then(|start| u8::from_str_radix(&genesis[start..], 16).ok())
            .ok_or_else(|| {
                BackendError::Schema(format!("genesis block id unusable: {genesis_id}"))
            })?;

        let best = best_id.strip_prefix("0x").unwrap_or(best_id);
        let block_ref = best
            .get(..8)
            .and_then(|prefix| u64::from_str_radix(prefix, 16).ok())
            .ok_or_else(|| BackendError::Schema(format!("best block id unusable: {best_id}")))?;

        Ok(Self::new(chain_tag, block_ref))
    }

    /// Build the unsigned wire transaction: exactly one clause, defaults for
    /// everything the Ethereum payload does not carry.
    pub fn build(&self, tx: &EthTransaction) -> BackendResult<Transaction> {
        let to = match &tx.to {
            Some(address) => Bytes::from(decode_hex(address)?),
            None => Bytes::new(),
        };
        let clause = Clause {
            to,
            value: tx.value()?,
            data: Bytes::from(tx.data_bytes()?),
        };
        Ok(Transaction {
            chain_tag: self.chain_tag,
            block_ref: self.block_ref,
            expiration: EXPIRATION_WINDOW,
            clauses: vec![clause],
            gas_price_coef: 0,
            gas: tx.gas_limit()?.unwrap_or(DEFAULT_GAS),
            depends_on: Bytes::new(),
            nonce: 0,
            signature: None,
        })
    }

    /// Build and sign in one step.
    pub fn build_signed(
        &self,
        tx: &EthTransaction,
        key: &SecretKey,
    ) -> BackendResult<Transaction> {
        let mut transaction = self.build(tx)?;
        transaction.sign(key);
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::vault::address_of;
    use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
    use serde_json::json;

    fn sample_eth_tx() -> EthTransaction {
        serde_json::from_value(json!({
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "to": "0x0000000000000000000000000000000000000001",
            "value": "0x64",
            "data": "0x00ff",
        }))
        .unwrap()
    }

    fn sample_key() -> SecretKey {
        SecretKey::from_slice(&[0x42; 32]).unwrap()
    }

    #[test]
    fn chain_binding_fields_come_from_block_ids() {
        let genesis = "0x00000000851caf3cfdb6e899cf5958bfb1ac3413d346d43539627e6be7ec1b4a";
        let best = "0x000000b1fc3c5a2f1b2c9e5f0000000000000000000000000000000000000000";
        let builder = TxBuilder::from_block_ids(genesis, best).unwrap();
        let tx = builder.build(&sample_eth_tx()).unwrap();
        assert_eq!(tx.chain_tag, 0x4a);
        assert_eq!(tx.block_ref, 0x000000b1);
    }

    #[test]
    fn defaults_match_the_wire_protocol() {
        let tx = TxBuilder::new(0x4a, 0xb1).build(&sample_eth_tx()).unwrap();
        assert_eq!(tx.expiration, u32::MAX);
        assert_eq!(tx.gas_price_coef, 0);
        assert_eq!(tx.gas, DEFAULT_GAS);
        assert_eq!(tx.nonce, 0);
        assert!(tx.depends_on.is_empty());
        assert_eq!(tx.clauses.len(), 1);
        assert_eq!(tx.clauses[0].value, U256::from(100u64));
        assert_eq!(tx.clauses[0].data.as_ref(), &[0x00, 0xff]);
    }

    #[test]
    fn contract_creation_has_an_empty_clause_target() {
        let eth_tx: EthTransaction =
            serde_json::from_value(json!({"data": "0x6001", "value": "0x0"})).unwrap();
        let tx = TxBuilder::new(0x4a, 0xb1).build(&eth_tx).unwrap();
        assert!(tx.clauses[0].to.is_empty());
    }

    #[test]
    fn signing_is_deterministic() {
        let builder = TxBuilder::new(0x4a, 0xb1);
        let key = sample_key();
        let a = builder.build_signed(&sample_eth_tx(), &key).unwrap();
        let b = builder.build_signed(&sample_eth_tx(), &key).unwrap();
        assert_eq!(a.signing_hash(), b.signing_hash());
        assert_eq!(a.encoded(), b.encoded());
    }

    #[test]
    fn signature_is_65_bytes_and_recovers_the_signer() {
        let key = sample_key();
        let tx = TxBuilder::new(0x4a, 0xb1)
            .build_signed(&sample_eth_tx(), &key)
            .unwrap();
        let signature = tx.signature().unwrap();
        assert_eq!(signature.len(), 65);

        let recovery_id = RecoveryId::try_from(i32::from(signature[64])).unwrap();
        let recoverable =
            RecoverableSignature::from_compact(&signature[..64], recovery_id).unwrap();
        let message = Message::from_digest(tx.signing_hash());
        let public = SECP256K1.recover_ecdsa(&message, &recoverable).unwrap();
        let recovered = alloy::primitives::Address::from_slice(
            &alloy::primitives::keccak256(&public.serialize_uncompressed()[1..])[12..],
        );
        assert_eq!(recovered, address_of(&key));
    }

    #[test]
    fn signed_encoding_is_a_longer_rlp_list() {
        let builder = TxBuilder::new(0x4a, 0xb1);
        let unsigned = builder.build(&sample_eth_tx()).unwrap();
        let signed = builder
            .build_signed(&sample_eth_tx(), &sample_key())
            .unwrap();
        let unsigned_rlp = unsigned.encoded();
        let signed_rlp = signed.encoded();
        assert!(unsigned_rlp[0] >= 0xc0, "encoding must be an RLP list");
        assert!(signed_rlp.len() > unsigned_rlp.len() + 64);
        assert!(signed.raw_hex().starts_with("0x"));
    }

    #[test]
    fn signing_hash_covers_every_unsigned_field() {
        let base = TxBuilder::new(0x4a, 0xb1).build(&sample_eth_tx()).unwrap();
        let mut changed = base.clone();
        changed.gas += 1;
        assert_ne!(base.signing_hash(), changed.signing_hash());
        let mut changed = base.clone();
        changed.block_ref += 1;
        assert_ne!(base.signing_hash(), changed.signing_hash());
    }
}
