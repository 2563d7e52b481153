use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::WalletError;

/// Version prefix of an ed25519 seed ("sEd...")
const SEED_ED25519_PREFIX: [u8; 3] = [0x01, 0xE1, 0x4B];
/// Version byte of a classic secp256k1 family seed
const FAMILY_SEED_VERSION: u8 = 0x21;
/// Version byte of a classic account address ("r...")
const ACCOUNT_ID_VERSION: u8 = 0x00;

const SEED_ENTROPY_LEN: usize = 16;

/// Decode a seed into its 16 bytes of entropy. Only ed25519 seeds are
/// accepted; classic family seeds decode to a recognized version and are
/// rejected explicitly.
pub fn decode_seed(seed: &str) -> Result<[u8; SEED_ENTROPY_LEN], WalletError> {
    if !seed.starts_with('s') {
        return Err(WalletError::BadSeedPrefix);
    }
    let raw = bs58::decode(seed)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check(None)
        .into_vec()
        .map_err(|e| WalletError::InvalidSeed(e.to_string()))?;

    if raw.len() == SEED_ED25519_PREFIX.len() + SEED_ENTROPY_LEN
        && raw[..SEED_ED25519_PREFIX.len()] == SEED_ED25519_PREFIX
    {
        let mut entropy = [0u8; SEED_ENTROPY_LEN];
        entropy.copy_from_slice(&raw[SEED_ED25519_PREFIX.len()..]);
        return Ok(entropy);
    }
    if raw.len() == 1 + SEED_ENTROPY_LEN && raw[0] == FAMILY_SEED_VERSION {
        return Err(WalletError::UnsupportedAlgorithm(
            "secp256k1 family seed".to_string(),
        ));
    }
    Err(WalletError::InvalidSeed("unrecognized version".to_string()))
}

/// 20-byte account id: RIPEMD-160 over SHA-256 of the public key
pub fn account_id(public_key: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(public_key);
    let ripe = Ripemd160::digest(sha);
    let mut id = [0u8; 20];
    id.copy_from_slice(&ripe);
    id
}

/// Classic address for a 33-byte public key
pub fn classic_address(public_key: &[u8]) -> String {
    let id = account_id(public_key);
    let mut payload = Vec::with_capacity(21);
    payload.push(ACCOUNT_ID_VERSION);
    payload.extend_from_slice(&id);
    encode_base58check(&payload)
}

/// Decode a classic address back to its account id
pub fn decode_classic_address(address: &str) -> Result<[u8; 20], WalletError> {
    let raw = bs58::decode(address)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check(None)
        .into_vec()
        .map_err(|e| WalletError::InvalidSeed(e.to_string()))?;
    if raw.len() != 21 || raw[0] != ACCOUNT_ID_VERSION {
        return Err(WalletError::InvalidSeed(
            "not a classic address".to_string(),
        ));
    }
    let mut id = [0u8; 20];
    id.copy_from_slice(&raw[1..]);
    Ok(id)
}

pub(crate) fn encode_base58check(payload: &[u8]) -> String {
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check()
        .into_string()
}
