use std::sync::atomic::{AtomicU64, Ordering};

use crate::decoder::DecodeError;

/// 1. Outcomes of [`Decoder::get_server_id`](crate::Decoder::get_server_id) calls
///
/// Callers only ever see an empty [`ServerId`](crate::ServerId) when decoding fails; these
/// counters are where the reason ends up.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub struct DecoderStats {
    /// 1. Connection IDs that yielded a server ID
    pub decoded: u64,
    /// 2.
    pub empty_connection_id: u64,
    /// 3. First byte carried a reserved config codepoint
    pub unknown_config_id: u64,
    /// 4. No config installed for the codepoint
    pub missing_config: u64,
    /// 5. Shorter than the matching config requires
    pub too_short: u64,
    /// 6. The keyed transform failed or produced no usable server ID
    pub crypto_failure: u64,
}

/// 2. Shared counters behind [`DecoderStats`]
///
/// Updated with relaxed atomics so that concurrent decodes through `&Decoder` stay lock-free.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    decoded: AtomicU64,
    empty_connection_id: AtomicU64,
    unknown_config_id: AtomicU64,
    missing_config: AtomicU64,
    too_short: AtomicU64,
    crypto_failure: AtomicU64,
}

impl Counters {
    /// 1.
    pub(crate) fn record<T>(&self, outcome: &Result<T, DecodeError>) {
        let counter = match outcome {
            Ok(_) => &self.decoded,
            Err(DecodeError::EmptyConnectionId) => &self.empty_connection_id,
            Err(DecodeError::UnknownConfigId(_)) => &self.unknown_config_id,
            Err(DecodeError::MissingConfig(_)) => &self.missing_config,
            Err(DecodeError::ConnectionIdTooShort { .. }) => &self.too_short,
            Err(DecodeError::Crypto(_) | DecodeError::InvalidServerId(_)) => &self.crypto_failure,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 2.
    pub(crate) fn snapshot(&self) -> DecoderStats {
        DecoderStats {
            decoded: self.decoded.load(Ordering::Relaxed),
            empty_connection_id: self.empty_connection_id.load(Ordering::Relaxed),
            unknown_config_id: self.unknown_config_id.load(Ordering::Relaxed),
            missing_config: self.missing_config.load(Ordering::Relaxed),
            too_short: self.too_short.load(Ordering::Relaxed),
            crypto_failure: self.crypto_failure.load(Ordering::Relaxed),
        }
    }
}
