pub mod address;

use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha512};

use crate::error::WalletError;

/// XRPL public keys carry a one-byte algorithm prefix; 0xED marks ed25519
const ED25519_PUBLIC_KEY_PREFIX: u8 = 0xED;

/// Signing identity derived from a seed
pub struct Wallet {
    signing_key: SigningKey,
    public_key: [u8; 33],
    address: String,
}

impl Wallet {
    /// Derive the ed25519 keypair and classic address from a seed. The
    /// secret scalar is the first half of SHA-512 over the seed entropy.
    pub fn from_seed(seed: &str) -> Result<Self, WalletError> {
        let entropy = address::decode_seed(seed)?;
        let digest = Sha512::digest(entropy);
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&digest[..32]);

        let signing_key = SigningKey::from_bytes(&secret);
        let verifying = signing_key.verifying_key().to_bytes();
        let mut public_key = [0u8; 33];
        public_key[0] = ED25519_PUBLIC_KEY_PREFIX;
        public_key[1..].copy_from_slice(&verifying);

        let address = address::classic_address(&public_key);
        Ok(Self {
            signing_key,
            public_key,
            address,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    pub fn sign(&self, payload: &[u8]) -> [u8; 64] {
        self.signing_key.sign(payload).to_bytes()
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never expose key material
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish()
    }
}
