use std::{fmt, ops};

use bytes::Buf;

use crate::MAX_CID_SIZE;

/// Protocol-level identifier for a connection.
///
/// This is the opaque form a router pulls out of a datagram; the [`Decoder`](crate::Decoder)
/// interprets it.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ConnectionId {
    /// length of CID
    len: u8,
    /// CID in byte array
    bytes: [u8; MAX_CID_SIZE],
}

impl ConnectionId {
    /// Construct cid from byte array
    ///
    /// # Panics
    ///
    /// If `bytes` is longer than [`MAX_CID_SIZE`].
    pub fn new(bytes: &[u8]) -> Self {
        assert!(
            bytes.len() <= MAX_CID_SIZE,
            "connection ID longer than {MAX_CID_SIZE} bytes"
        );
        let mut res = Self {
            len: bytes.len() as u8,
            bytes: [0; MAX_CID_SIZE],
        };
        res.bytes[..bytes.len()].copy_from_slice(bytes);
        res
    }

    /// Constructs cid by reading `len` bytes from a `Buf`
    ///
    /// Callers need to assure that `buf.remaining() >= len`
    ///
    /// # Panics
    ///
    /// If `len` is greater than [`MAX_CID_SIZE`].
    pub fn from_buf(buf: &mut (impl Buf + ?Sized), len: usize) -> Self {
        assert!(
            len <= MAX_CID_SIZE,
            "connection ID longer than {MAX_CID_SIZE} bytes"
        );
        let mut res = Self {
            len: len as u8,
            bytes: [0; MAX_CID_SIZE],
        };
        buf.copy_to_slice(&mut res.bytes[..len]);
        res
    }
}

impl ops::Deref for ConnectionId {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.bytes[0..self.len as usize]
    }
}

impl ops::DerefMut for ConnectionId {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[0..self.len as usize]
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.bytes[0..self.len as usize].fmt(f)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
