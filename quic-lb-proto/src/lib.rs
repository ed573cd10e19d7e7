//! Stateless recovery of server identities from QUIC-LB connection IDs
//!
//! A backend in a load-balanced fleet embeds its server ID, optionally encrypted, in every
//! connection ID it issues. A router holding the fleet's [`RoutingConfig`]s can then hand any
//! inbound connection ID to a [`Decoder`] and learn which backend owns the connection without
//! keeping per-connection state.
//!
//! This crate performs no I/O whatsoever.
#![warn(missing_docs)]


// 1. wire representation of connection IDs
mod shared;
pub use crate::shared::ConnectionId;

// 2. the value a successful decode yields
mod server_id;
pub use crate::server_id::{InvalidServerIdLength, ServerId};

/// 3. block cipher seam used by the transforms
pub mod crypto;
pub use crate::crypto::{BlockCipher, CryptoError};

/// 4. layout and keyed transform of a single config
mod config;
pub use crate::config::{ConfigError, Halves, PassSchedule, Payload, RoutingConfig};

/// 5. the config table and the decode path
mod decoder;
pub use crate::decoder::Decoder;

/// 6.
mod stats;
pub use crate::stats::DecoderStats;

/// 1. Maximum length of a QUIC connection ID
pub const MAX_CID_SIZE: usize = 20;
/// 2. Number of config slots a decoder holds
///
/// Codepoints at or above this value are reserved and never map to a config.
pub const NUM_CONFIGS: usize = 3;
/// 3. Bits of the first connection ID byte that carry the config ID
pub const CONFIG_ID_BITS: u8 = 2;
/// 4. Bits of the first connection ID byte left to the length self-encoding
pub const CONNECTION_ID_LENGTH_BITS: u8 = 8 - CONFIG_ID_BITS;
/// 5. Width of a cipher block, and of the key
pub const BLOCK_SIZE: usize = 16;
/// 6. Number of passes in the four-pass transform
pub const NUM_CRYPTO_PASSES: u8 = 4;
/// 7.
pub const MIN_SERVER_ID_LEN: usize = 1;
/// 8.
pub const MAX_SERVER_ID_LEN: usize = 15;
/// 9.
pub const MIN_NONCE_LEN: usize = 4;
/// 10.
pub const MAX_NONCE_LEN: usize = 16;
/// 11. Longest server ID and nonce that still fits behind the first byte
pub const MAX_PLAINTEXT_LEN: usize = MAX_CID_SIZE - 1;
