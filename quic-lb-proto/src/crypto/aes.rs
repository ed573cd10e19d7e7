use aes::{
    cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, InvalidLength, KeyInit},
    Aes128,
};

use crate::{
    crypto::{BlockCipher, CryptoError},
    BLOCK_SIZE,
};

/// Build an AES-128 cipher from a raw key
pub(crate) fn aes128(key: &[u8]) -> Result<Aes128, CryptoError> {
    Ok(Aes128::new_from_slice(key)?)
}

impl BlockCipher for Aes128 {
    fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) -> Result<(), CryptoError> {
        BlockEncrypt::encrypt_block(self, GenericArray::from_mut_slice(block));
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) -> Result<(), CryptoError> {
        BlockDecrypt::decrypt_block(self, GenericArray::from_mut_slice(block));
        Ok(())
    }
}

impl From<InvalidLength> for CryptoError {
    fn from(_: InvalidLength) -> Self {
        Self
    }
}
