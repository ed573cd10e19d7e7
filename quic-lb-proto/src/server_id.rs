use std::{fmt, ops};

use thiserror::Error;
use tinyvec::ArrayVec;

use crate::{MAX_SERVER_ID_LEN, MIN_SERVER_ID_LEN};

/// Identity of a backend server, as embedded in its connection IDs
///
/// The empty value is what [`Decoder::get_server_id`](crate::Decoder::get_server_id) returns
/// when a connection ID could not be decoded. It never identifies a server.
#[derive(Default, Clone, Eq, PartialEq, Hash)]
pub struct ServerId(ArrayVec<[u8; MAX_SERVER_ID_LEN]>);

impl ServerId {
    /// Create a server ID from its raw bytes
    ///
    /// Fails unless `bytes` is between [`MIN_SERVER_ID_LEN`] and [`MAX_SERVER_ID_LEN`] long.
    pub fn new(bytes: &[u8]) -> Result<Self, InvalidServerIdLength> {
        if !(MIN_SERVER_ID_LEN..=MAX_SERVER_ID_LEN).contains(&bytes.len()) {
            return Err(InvalidServerIdLength(bytes.len()));
        }
        let mut data = ArrayVec::new();
        data.extend_from_slice(bytes);
        Ok(Self(data))
    }

    /// The "no identity" value
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is a real server ID rather than the failure value
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl ops::Deref for ServerId {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerId({self})")
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Error returned when constructing a [`ServerId`] of unsupported length
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
#[error("server ID length {0} is outside 1..=15")]
pub struct InvalidServerIdLength(pub usize);
