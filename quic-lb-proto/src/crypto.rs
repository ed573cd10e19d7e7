//! Block cipher primitive consumed by the connection ID transforms
//!
//! Both the single-block layout and every round of the four-pass layout reduce to one
//! encryption or decryption of a 16-byte block under the config's key. [`BlockCipher`] is that
//! primitive; an AES-128 implementation is provided when the `aes` feature is enabled.

use crate::BLOCK_SIZE;

/// 1. Cryptography interface based on the RustCrypto `aes` crate
#[cfg(feature = "aes")]
pub(crate) mod aes;

/// 1. A keyed block cipher operating on [`BLOCK_SIZE`] byte blocks
pub trait BlockCipher: Send + Sync {
    /// Encrypt `block` in place
    fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) -> Result<(), CryptoError>;
    /// Decrypt `block` in place
    fn decrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) -> Result<(), CryptoError>;
}

/// 2. Generic crypto errors
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("cryptographic operation failed")]
pub struct CryptoError;
