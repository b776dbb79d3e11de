// Account keys - whoever holds the signing key controls the account

use crate::identity::AccountId;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

const KEY_LENGTH: usize = 32;

#[derive(Error, Debug)]
pub enum KeypairError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid key bytes: {0}")]
    InvalidBytes(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

fn to_key_array(bytes: &[u8]) -> Result<[u8; KEY_LENGTH], KeypairError> {
    bytes.try_into().map_err(|_| KeypairError::InvalidLength {
        expected: KEY_LENGTH,
        got: bytes.len(),
    })
}

/// Ed25519 public key of an account holder
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        self.0.as_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let array = to_key_array(bytes)?;
        let verifying_key = VerifyingKey::from_bytes(&array)
            .map_err(|e| KeypairError::InvalidBytes(e.to_string()))?;
        Ok(Self(verifying_key))
    }

    /// The ledger identity owned by this key
    pub fn account_id(&self) -> AccountId {
        AccountId::from_public_key(self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// Ed25519 keypair controlling one ledger account
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Shorthand for `public_key().account_id()`
    pub fn account_id(&self) -> AccountId {
        self.public_key().account_id()
    }

    /// Secret key bytes, the only thing needed to restore the keypair
    pub fn to_bytes(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let array = to_key_array(bytes)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&array),
        })
    }

    /// Export the secret key as hex (for backup)
    pub fn to_secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn from_secret_hex(hex_str: &str) -> Result<Self, KeypairError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|e| KeypairError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Debug for Keypair {
    // Never print the secret half.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("account", &self.account_id())
            .finish()
    }
}
