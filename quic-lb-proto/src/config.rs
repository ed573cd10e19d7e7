use std::{fmt, ops::RangeInclusive, sync::Arc};

use thiserror::Error;
use tinyvec::ArrayVec;
use tracing::trace;

use crate::{
    crypto::{BlockCipher, CryptoError},
    BLOCK_SIZE, MAX_NONCE_LEN, MAX_PLAINTEXT_LEN, MAX_SERVER_ID_LEN, MIN_NONCE_LEN,
    MIN_SERVER_ID_LEN, NUM_CONFIGS, NUM_CRYPTO_PASSES,
};

/// Output of a full transform: `plaintext_len` bytes of a connection ID after its first byte
pub type Payload = ArrayVec<[u8; MAX_PLAINTEXT_LEN]>;

/// Byte of a four-pass block holding the plaintext length
const LENGTH_OFFSET: usize = BLOCK_SIZE - 2;
/// Byte of a four-pass block holding the pass index
const INDEX_OFFSET: usize = BLOCK_SIZE - 1;

/// One fleet-wide layout for interpreting connection IDs
///
/// A config fixes how many bytes after the first one carry the server ID, how many carry the
/// nonce, and whether the two are protected by a keyed transform. Configs are immutable; rotate
/// by deleting one from the [`Decoder`](crate::Decoder) and adding its replacement.
#[derive(Clone)]
pub struct RoutingConfig {
    /// 1. Codepoint in the top bits of the first connection ID byte
    config_id: u8,
    /// 2.
    server_id_len: u8,
    /// 3.
    nonce_len: u8,
    /// 4. `None` for plaintext connection IDs
    cipher: Option<Arc<dyn BlockCipher>>,
}

impl RoutingConfig {
    /// 1. Create an encrypted config keyed with a 16-byte AES-128 key
    #[cfg(feature = "aes")]
    pub fn new(
        config_id: u8,
        server_id_len: u8,
        nonce_len: u8,
        key: &[u8],
    ) -> Result<Self, ConfigError> {
        if key.len() != BLOCK_SIZE {
            return Err(ConfigError::InvalidKeyLength(key.len()));
        }
        let cipher = crate::crypto::aes::aes128(key).map_err(|_| ConfigError::InvalidKey)?;
        Self::with_cipher(config_id, server_id_len, nonce_len, Arc::new(cipher))
    }

    /// 2. Create an encrypted config around an arbitrary block cipher
    pub fn with_cipher(
        config_id: u8,
        server_id_len: u8,
        nonce_len: u8,
        cipher: Arc<dyn BlockCipher>,
    ) -> Result<Self, ConfigError> {
        validate(config_id, server_id_len, nonce_len)?;
        Ok(Self {
            config_id,
            server_id_len,
            nonce_len,
            cipher: Some(cipher),
        })
    }

    /// 3. Create a config whose connection IDs carry the server ID in the clear
    pub fn plaintext(config_id: u8, server_id_len: u8, nonce_len: u8) -> Result<Self, ConfigError> {
        validate(config_id, server_id_len, nonce_len)?;
        Ok(Self {
            config_id,
            server_id_len,
            nonce_len,
            cipher: None,
        })
    }

    /// 4.
    pub fn config_id(&self) -> u8 {
        self.config_id
    }

    /// 5.
    pub fn server_id_len(&self) -> usize {
        self.server_id_len as usize
    }

    /// 6.
    pub fn nonce_len(&self) -> usize {
        self.nonce_len as usize
    }

    /// 7. Length of the server ID and nonce together
    pub fn plaintext_len(&self) -> usize {
        self.server_id_len() + self.nonce_len()
    }

    /// 8. Length of a whole connection ID, first byte included
    pub fn total_len(&self) -> usize {
        self.plaintext_len() + 1
    }

    /// 9. Whether connection IDs under this config are protected by a keyed transform
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// 10. Whether the plaintext fills exactly one cipher block
    pub fn is_single_block(&self) -> bool {
        self.plaintext_len() == BLOCK_SIZE
    }

    /// 11. Passes a decoder must reverse to recover the server ID
    pub fn pass_schedule(&self) -> PassSchedule {
        PassSchedule::for_lengths(self.server_id_len(), self.nonce_len())
    }

    /// Encrypt one block; only meaningful for single-block configs
    pub fn block_encrypt(&self, plaintext: &[u8]) -> Result<[u8; BLOCK_SIZE], CryptoError> {
        let mut block = self.one_block(plaintext)?;
        self.cipher()?.encrypt_block(&mut block)?;
        Ok(block)
    }

    /// Decrypt one block; only meaningful for single-block configs
    pub fn block_decrypt(&self, ciphertext: &[u8]) -> Result<[u8; BLOCK_SIZE], CryptoError> {
        let mut block = self.one_block(ciphertext)?;
        self.cipher()?.decrypt_block(&mut block)?;
        Ok(block)
    }

    fn one_block(&self, input: &[u8]) -> Result<[u8; BLOCK_SIZE], CryptoError> {
        if !self.is_single_block() {
            return Err(CryptoError);
        }
        input.try_into().map_err(|_| CryptoError)
    }

    fn cipher(&self) -> Result<&dyn BlockCipher, CryptoError> {
        self.cipher.as_deref().ok_or(CryptoError)
    }

    /// Split `input` into the two halves the four-pass transform works on
    ///
    /// `input` must be exactly `plaintext_len` bytes.
    pub fn four_pass_halves(&self, input: &[u8]) -> Result<Halves, CryptoError> {
        let len = self.plaintext_len();
        if input.len() != len {
            return Err(CryptoError);
        }
        let half_len = len.div_ceil(2);
        let odd = len % 2 == 1;
        let mut halves = Halves {
            left: [0; BLOCK_SIZE],
            right: [0; BLOCK_SIZE],
            half_len,
            odd,
        };
        halves.left[LENGTH_OFFSET] = len as u8;
        halves.right[LENGTH_OFFSET] = len as u8;
        halves.left[..half_len].copy_from_slice(&input[..half_len]);
        halves.right[..half_len].copy_from_slice(&input[len / 2..]);
        if odd {
            // The middle byte is shared: high nibble left, low nibble right
            halves.left[half_len - 1] &= 0xf0;
            halves.right[0] &= 0x0f;
        }
        Ok(halves)
    }

    /// Apply pass `index` of the four-pass transform
    ///
    /// Odd passes encrypt the left half and mix it into the right one; even passes go the other
    /// way. Each pass undoes itself, so decryption runs the same passes in reverse order.
    pub fn encryption_pass(&self, mut halves: Halves, index: u8) -> Result<Halves, CryptoError> {
        let cipher = self.cipher()?;
        let half_len = halves.half_len;
        if index % 2 == 0 {
            let mut block = halves.right;
            block[INDEX_OFFSET] = index;
            cipher.encrypt_block(&mut block)?;
            xor(&mut halves.left[..half_len], &block[..half_len]);
            if halves.odd {
                halves.left[half_len - 1] &= 0xf0;
            }
        } else {
            let mut block = halves.left;
            block[INDEX_OFFSET] = index;
            cipher.encrypt_block(&mut block)?;
            xor(&mut halves.right[..half_len], &block[..half_len]);
            if halves.odd {
                halves.right[0] &= 0x0f;
            }
        }
        Ok(halves)
    }

    /// Run the full forward transform over `plaintext` (server ID followed by nonce)
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Payload, CryptoError> {
        if plaintext.len() != self.plaintext_len() {
            return Err(CryptoError);
        }
        if !self.is_encrypted() {
            return Ok(payload(plaintext));
        }
        if self.is_single_block() {
            return Ok(payload(&self.block_encrypt(plaintext)?));
        }
        let mut halves = self.four_pass_halves(plaintext)?;
        for index in 1..=NUM_CRYPTO_PASSES {
            halves = self.encryption_pass(halves, index)?;
        }
        Ok(halves.join())
    }

    /// Reverse [`encrypt`](Self::encrypt), restoring both the server ID and the nonce
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Payload, CryptoError> {
        if ciphertext.len() != self.plaintext_len() {
            return Err(CryptoError);
        }
        if !self.is_encrypted() {
            return Ok(payload(ciphertext));
        }
        if self.is_single_block() {
            return Ok(payload(&self.block_decrypt(ciphertext)?));
        }
        self.reverse_passes(ciphertext, PassSchedule::Full)
    }

    /// Reverse the four-pass transform as far as `schedule` goes
    pub(crate) fn reverse_passes(
        &self,
        ciphertext: &[u8],
        schedule: PassSchedule,
    ) -> Result<Payload, CryptoError> {
        let mut halves = self.four_pass_halves(ciphertext)?;
        for index in schedule.decrypt_passes() {
            halves = self.encryption_pass(halves, index)?;
        }
        trace!(
            config_id = self.config_id,
            ?schedule,
            "reversed four-pass transform"
        );
        Ok(halves.join())
    }
}

impl fmt::Debug for RoutingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingConfig")
            .field("config_id", &self.config_id)
            .field("server_id_len", &self.server_id_len)
            .field("nonce_len", &self.nonce_len)
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

fn validate(config_id: u8, server_id_len: u8, nonce_len: u8) -> Result<(), ConfigError> {
    if config_id as usize >= NUM_CONFIGS {
        return Err(ConfigError::InvalidConfigId(config_id));
    }
    if !(MIN_SERVER_ID_LEN..=MAX_SERVER_ID_LEN).contains(&(server_id_len as usize)) {
        return Err(ConfigError::InvalidServerIdLength(server_id_len));
    }
    if !(MIN_NONCE_LEN..=MAX_NONCE_LEN).contains(&(nonce_len as usize)) {
        return Err(ConfigError::InvalidNonceLength(nonce_len));
    }
    if server_id_len as usize + nonce_len as usize > MAX_PLAINTEXT_LEN {
        return Err(ConfigError::PlaintextTooLong {
            server_id_len,
            nonce_len,
        });
    }
    Ok(())
}

fn payload(bytes: &[u8]) -> Payload {
    let mut out = Payload::new();
    out.extend_from_slice(bytes);
    out
}

fn xor(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// State of the four-pass transform between passes
///
/// `left` and `right` are full cipher blocks: the first `half_len` bytes hold one half of the
/// connection ID payload, byte 14 the payload length and byte 15 the index of the pass the block
/// is next fed to. For odd payload lengths the middle byte is split between the halves by nibble.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Halves {
    left: [u8; BLOCK_SIZE],
    right: [u8; BLOCK_SIZE],
    half_len: usize,
    odd: bool,
}

impl Halves {
    /// Reassemble the payload from both halves
    pub fn join(&self) -> Payload {
        let half_len = self.half_len;
        let mut out = payload(&self.left[..half_len]);
        if self.odd {
            out[half_len - 1] |= self.right[0];
            out.extend_from_slice(&self.right[1..half_len]);
        } else {
            out.extend_from_slice(&self.right[..half_len]);
        }
        out
    }
}

/// Which passes of the four-pass transform a decoder reverses
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PassSchedule {
    /// Passes 4 down to 1; the server ID reaches into the right half
    Full,
    /// Passes 4 down to 2; the server ID sits entirely in the left half, which pass 2 restores
    ServerIdOnly,
}

impl PassSchedule {
    /// 1.
    pub fn for_lengths(server_id_len: usize, nonce_len: usize) -> Self {
        if server_id_len > nonce_len {
            Self::Full
        } else {
            Self::ServerIdOnly
        }
    }

    /// 2. Pass indices in the order a decoder applies them
    pub fn decrypt_passes(self) -> std::iter::Rev<RangeInclusive<u8>> {
        let last = match self {
            Self::Full => 1,
            Self::ServerIdOnly => 2,
        };
        (last..=NUM_CRYPTO_PASSES).rev()
    }
}

/// Reasons a [`RoutingConfig`] could not be built
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum ConfigError {
    /// 1. The config ID does not name a decoder slot
    #[error("invalid config ID {0}")]
    InvalidConfigId(u8),
    /// 2.
    #[error("invalid server ID length {0}")]
    InvalidServerIdLength(u8),
    /// 3.
    #[error("invalid nonce length {0}")]
    InvalidNonceLength(u8),
    /// 4. Server ID and nonce do not fit in a connection ID
    #[error("server ID length {server_id_len} plus nonce length {nonce_len} is too long")]
    PlaintextTooLong {
        /// Requested server ID length
        server_id_len: u8,
        /// Requested nonce length
        nonce_len: u8,
    },
    /// 5.
    #[error("invalid key length {0}")]
    InvalidKeyLength(usize),
    /// 6. The cipher rejected the key
    #[error("key rejected by the block cipher")]
    InvalidKey,
}
