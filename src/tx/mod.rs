pub mod codec;

use rust_decimal::Decimal;

use crate::error::CodecError;
use crate::wallet::Wallet;

/// Disallow rippling through this line
pub const TF_SET_NO_RIPPLE: u32 = 0x0002_0000;
/// Clear any freeze on this line
pub const TF_CLEAR_FREEZE: u32 = 0x0020_0000;

/// A TrustSet transaction, fully populated and ready to serialize
#[derive(Debug, Clone)]
pub struct TrustSet {
    pub account: String,
    pub flags: u32,
    pub sequence: u32,
    pub fee_drops: u64,
    pub last_ledger_sequence: u32,
    pub limit_currency: String,
    pub limit_issuer: String,
    pub limit_value: Decimal,
    pub quality_in: u32,
    pub quality_out: u32,
}

/// Hex blob plus the hash the network will know the transaction by
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub blob: String,
    pub hash: String,
}

/// Serialize, sign and re-serialize a TrustSet with the wallet's key
pub fn sign_trust_set(tx: &TrustSet, wallet: &Wallet) -> Result<SignedTransaction, CodecError> {
    let payload = codec::signing_payload(tx, wallet.public_key())?;
    let signature = wallet.sign(&payload);
    let blob = codec::serialize(tx, wallet.public_key(), Some(&signature))?;
    let hash = codec::transaction_hash(&blob);
    Ok(SignedTransaction {
        blob: hex::encode_upper(&blob),
        hash,
    })
}
