//! Compile-time table of shipped cipher versions.

use crate::cipher::{AesGcmV2, CipherVersion, VersionId, XChaCha20Poly1305V1};
use crate::error::{Error, Result};
use std::fmt;

/// Every cipher version this build can open, oldest first.
static SHIPPED: [&dyn CipherVersion; 2] = [&XChaCha20Poly1305V1, &AesGcmV2];

/// Maps version identifiers to their implementations.
///
/// The newest registered version seals new data; every registered version
/// can unseal.
#[derive(Clone, Copy)]
pub struct CipherRegistry {
    ciphers: &'static [&'static dyn CipherVersion],
    current: &'static dyn CipherVersion,
}

impl CipherRegistry {
    /// Registry of every version shipped in this build.
    pub fn shipped() -> Self {
        Self {
            ciphers: &SHIPPED,
            current: SHIPPED[SHIPPED.len() - 1],
        }
    }

    /// Registry over a restricted set, e.g. with a retired version removed.
    pub fn new(ciphers: &'static [&'static dyn CipherVersion]) -> Result<Self> {
        let mut ids: Vec<VersionId> = ciphers.iter().map(|c| c.identifier()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::Configuration(
                "duplicate cipher version in registry".to_string(),
            ));
        }

        let current = ciphers
            .iter()
            .copied()
            .max_by_key(|c| c.identifier())
            .ok_or_else(|| Error::Configuration("cipher registry is empty".to_string()))?;

        Ok(Self { ciphers, current })
    }

    /// Implementation used for all new seals.
    pub fn current(&self) -> &'static dyn CipherVersion {
        self.current
    }

    /// Implementation matching a stamped version.
    pub fn resolve(&self, id: VersionId) -> Result<&'static dyn CipherVersion> {
        self.ciphers
            .iter()
            .copied()
            .find(|c| c.identifier() == id)
            .ok_or(Error::UnsupportedVersion(id))
    }

    /// Registered identifiers, ascending.
    pub fn versions(&self) -> Vec<VersionId> {
        let mut ids: Vec<VersionId> = self.ciphers.iter().map(|c| c.identifier()).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for CipherRegistry {
    fn default() -> Self {
        Self::shipped()
    }
}

impl fmt::Debug for CipherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherRegistry")
            .field("versions", &self.versions())
            .field("current", &self.current.identifier())
            .finish()
    }
}
