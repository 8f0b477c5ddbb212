//! Secure randomness for salts and nonces.

use crate::error::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Fill `buf` from the operating system CSPRNG.
///
/// Fails with [`Error::EntropyUnavailable`] instead of falling back to a
/// weaker generator.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::EntropyUnavailable(e.to_string()))
}

/// Allocate `len` random bytes.
pub fn random_vec(len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    fill_random(&mut buf)?;
    Ok(buf)
}
