//! Intrinsic gas computation for Ethereum-shaped transactions.
//!
//! The backend prices a transaction as a base cost plus a per-clause cost
//! plus a per-byte cost for call data. The constants mirror the backend
//! protocol and must match it exactly for gas estimation to be correct.

/// Base cost of any transaction.
pub const TX_GAS: u64 = 5_000;
/// Additional cost per clause targeting an existing account.
pub const CLAUSE_GAS: u64 = 21_000 - TX_GAS;
/// Additional cost per contract-creation clause.
pub const CLAUSE_GAS_CONTRACT_CREATION: u64 = 53_000 - TX_GAS;
/// Cost per zero byte of call data.
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Cost per non-zero byte of call data.
pub const TX_DATA_NON_ZERO_GAS: u64 = 68;

/// Gas cost of the call data alone.
fn data_gas(data: &[u8]) -> u64 {
    data.iter()
        .map(|byte| {
            if *byte == 0 {
                TX_DATA_ZERO_GAS
            } else {
                TX_DATA_NON_ZERO_GAS
            }
        })
        .sum()
}

/// Intrinsic gas of a single-clause transaction.
///
/// `creates_contract` is true when the transaction has no `to` address.
pub fn intrinsic_gas(creates_contract: bool, data: &[u8]) -> u64 {
    let clause_gas = if creates_contract {
        CLAUSE_GAS_CONTRACT_CREATION
    } else {
        CLAUSE_GAS
    };
    TX_GAS + clause_gas + data_gas(data)
}
