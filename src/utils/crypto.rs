//! Symmetric cipher helpers matching .NET's `RijndaelManaged`/`AesManaged` defaults.
//!
//! Both managed classes default to CBC mode with PKCS7 padding and a 128-bit block; the key
//! size selects AES-128, AES-192 or AES-256. Payloads protected with either class therefore
//! round-trip through [`aes_cbc_encrypt`] and [`aes_cbc_decrypt`].
//!
//! # Examples
//!
//! ```rust
//! use dotscope_reactor::utils::crypto::{aes_cbc_decrypt, aes_cbc_encrypt};
//!
//! let key = [0x11u8; 32];
//! let iv = [0x22u8; 16];
//!
//! let ciphertext = aes_cbc_encrypt(&key, &iv, b"resource bytes")?;
//! assert_eq!(ciphertext.len(), 16);
//! assert_eq!(aes_cbc_decrypt(&key, &iv, &ciphertext)?, b"resource bytes");
//! # Ok::<(), dotscope_reactor::Error>(())
//! ```

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};

use crate::{Error, Result};

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes128CbcDec = Decryptor<Aes128>;
type Aes192CbcEnc = Encryptor<Aes192>;
type Aes192CbcDec = Decryptor<Aes192>;
type Aes256CbcEnc = Encryptor<Aes256>;
type Aes256CbcDec = Decryptor<Aes256>;

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// Encrypts `data` with AES-CBC and PKCS7 padding.
///
/// The output is always a whole number of blocks and at least one block long: an input that
/// is already block aligned gets a full padding block appended.
///
/// # Arguments
///
/// * `key` - 16, 24 or 32 byte key
/// * `iv` - 16 byte initialization vector
/// * `data` - The plaintext
///
/// # Errors
/// Returns [`crate::Error::Crypto`] for unsupported key or IV lengths.
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    match key.len() {
        16 => encrypt_with::<Aes128CbcEnc>(key, iv, data),
        24 => encrypt_with::<Aes192CbcEnc>(key, iv, data),
        32 => encrypt_with::<Aes256CbcEnc>(key, iv, data),
        other => Err(Error::Crypto(format!("unsupported AES key length {other}"))),
    }
}

/// Decrypts AES-CBC ciphertext and strips its PKCS7 padding.
///
/// # Arguments
///
/// * `key` - 16, 24 or 32 byte key
/// * `iv` - 16 byte initialization vector
/// * `data` - The ciphertext, a non-empty multiple of the block size
///
/// # Errors
/// Returns [`crate::Error::Crypto`] for unsupported key or IV lengths, for ciphertext that is
/// not block aligned, and when the decrypted padding is invalid (wrong key, IV or data).
pub fn aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() || data.len() % AES_BLOCK_SIZE != 0 {
        return Err(Error::Crypto(format!(
            "ciphertext length {} is not a positive multiple of {AES_BLOCK_SIZE}",
            data.len()
        )));
    }

    match key.len() {
        16 => decrypt_with::<Aes128CbcDec>(key, iv, data),
        24 => decrypt_with::<Aes192CbcDec>(key, iv, data),
        32 => decrypt_with::<Aes256CbcDec>(key, iv, data),
        other => Err(Error::Crypto(format!("unsupported AES key length {other}"))),
    }
}

fn encrypt_with<E: BlockEncryptMut + KeyIvInit>(
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>> {
    let cipher = E::new_from_slices(key, iv)
        .map_err(|_| Error::Crypto(format!("invalid IV length {}", iv.len())))?;

    let padded_len = (data.len() / AES_BLOCK_SIZE + 1) * AES_BLOCK_SIZE;
    let mut buf = vec![0u8; padded_len];
    buf[..data.len()].copy_from_slice(data);

    let result = cipher
        .encrypt_padded_mut::<Pkcs7>(&mut buf, data.len())
        .map_err(|_| Error::Crypto("padding buffer too small".to_string()))?;
    Ok(result.to_vec())
}

fn decrypt_with<D: BlockDecryptMut + KeyIvInit>(
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>> {
    let cipher = D::new_from_slices(key, iv)
        .map_err(|_| Error::Crypto(format!("invalid IV length {}", iv.len())))?;

    let mut buf = data.to_vec();
    let result = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| Error::Crypto("invalid PKCS7 padding".to_string()))?;
    Ok(result.to_vec())
}
