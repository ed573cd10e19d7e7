use thiserror::Error;
use tracing::{debug, error, trace};

use crate::{
    config::RoutingConfig,
    crypto::CryptoError,
    server_id::{InvalidServerIdLength, ServerId},
    stats::Counters,
    DecoderStats, CONNECTION_ID_LENGTH_BITS, NUM_CONFIGS,
};

/// Recovers server IDs from connection IDs issued under a small set of configs
///
/// The decoder owns one slot per config ID. Decoding only reads the table, so a `&Decoder` may be
/// shared between threads; installing or removing configs takes `&mut self` and is therefore
/// serialized against decodes by the borrow checker.
#[derive(Debug, Default)]
pub struct Decoder {
    /// 1. Indexed by config ID
    configs: [Option<RoutingConfig>; NUM_CONFIGS],
    /// 2.
    stats: Counters,
}

impl Decoder {
    /// 1. Create a decoder with no configs installed
    pub fn new() -> Self {
        Self::default()
    }

    /// 2. Install `config` in the slot named by its config ID
    ///
    /// Returns `false`, leaving the table untouched, if that slot is already occupied. A config
    /// must be deleted before it can be replaced.
    pub fn add_config(&mut self, config: RoutingConfig) -> bool {
        let slot = &mut self.configs[config.config_id() as usize];
        if slot.is_some() {
            debug!(config_id = config.config_id(), "config slot already in use");
            return false;
        }
        debug!(?config, "adding config");
        *slot = Some(config);
        true
    }

    /// 3. Remove the config installed under `config_id`, if any
    ///
    /// An out-of-range `config_id` is a caller bug; it is reported and otherwise ignored.
    pub fn delete_config(&mut self, config_id: u8) {
        let Some(slot) = self.configs.get_mut(config_id as usize) else {
            error!(config_id, "decoder deleting config with invalid config_id");
            return;
        };
        debug!(config_id, "deleting config");
        *slot = None;
    }

    /// 4. The config installed under `config_id`
    pub fn config(&self, config_id: u8) -> Option<&RoutingConfig> {
        self.configs.get(config_id as usize)?.as_ref()
    }

    /// 5. Extract the server ID from `connection_id`
    ///
    /// Any connection ID that cannot be decoded, for whatever reason, yields an empty
    /// [`ServerId`]. The reason is only visible through [`Decoder::stats`] and `trace` level logs.
    pub fn get_server_id(&self, connection_id: &[u8]) -> ServerId {
        let outcome = self.decode(connection_id);
        self.stats.record(&outcome);
        outcome.unwrap_or_else(|reason| {
            trace!(%reason, "no server ID in connection ID");
            ServerId::empty()
        })
    }

    fn decode(&self, connection_id: &[u8]) -> Result<ServerId, DecodeError> {
        let &first = connection_id
            .first()
            .ok_or(DecodeError::EmptyConnectionId)?;
        let config_id =
            Self::config_id_from_first_byte(first).ok_or(DecodeError::UnknownConfigId(first))?;
        let config = self
            .config(config_id)
            .ok_or(DecodeError::MissingConfig(config_id))?;
        if connection_id.len() < config.total_len() {
            return Err(DecodeError::ConnectionIdTooShort {
                len: connection_id.len(),
                required: config.total_len(),
            });
        }

        // The first byte is fully consumed; the payload follows
        let data = &connection_id[1..config.total_len()];
        let server_id_len = config.server_id_len();
        if !config.is_encrypted() {
            return Ok(ServerId::new(&data[..server_id_len])?);
        }
        if config.is_single_block() {
            let plaintext = config.block_decrypt(data)?;
            return Ok(ServerId::new(&plaintext[..server_id_len])?);
        }
        // Pass 1 only restores the right half, which holds no server ID bytes when the server ID
        // is no longer than the nonce
        let plaintext = config.reverse_passes(data, config.pass_schedule())?;
        Ok(ServerId::new(&plaintext[..server_id_len])?)
    }

    /// 6. Config ID a connection ID claims, if it is a valid slot
    pub fn config_id(connection_id: &[u8]) -> Option<u8> {
        Self::config_id_from_first_byte(*connection_id.first()?)
    }

    /// 7. Config ID encoded in the first byte of a connection ID, if it is a valid slot
    pub fn config_id_from_first_byte(first_byte: u8) -> Option<u8> {
        let codepoint = first_byte >> CONNECTION_ID_LENGTH_BITS;
        ((codepoint as usize) < NUM_CONFIGS).then_some(codepoint)
    }

    /// 8. Counters of decode outcomes so far
    pub fn stats(&self) -> DecoderStats {
        self.stats.snapshot()
    }
}

/// Why a connection ID did not yield a server ID
///
/// Never returned to callers of [`Decoder::get_server_id`]; only logged and counted.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub(crate) enum DecodeError {
    /// 1.
    #[error("empty connection ID")]
    EmptyConnectionId,
    /// 2. First byte carries a reserved codepoint
    #[error("reserved config codepoint in first byte {0:#04x}")]
    UnknownConfigId(u8),
    /// 3.
    #[error("no config installed for config ID {0}")]
    MissingConfig(u8),
    /// 4.
    #[error("connection ID of {len} bytes is shorter than the {required} its config requires")]
    ConnectionIdTooShort {
        /// Length of the connection ID
        len: usize,
        /// Length the config requires
        required: usize,
    },
    /// 5.
    #[error("decryption failed")]
    Crypto(#[from] CryptoError),
    /// 6. Unreachable while config validation keeps server ID lengths in range; counted as a
    /// crypto failure
    #[error(transparent)]
    InvalidServerId(#[from] InvalidServerIdLength),
}
