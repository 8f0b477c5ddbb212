//! Seal and unseal secrets under a passphrase.

use crate::cipher::VersionId;
use crate::config::VaultConfig;
use crate::crypto::KeyDerivation;
use crate::envelope::SealedEnvelope;
use crate::error::{Error, Result};
use crate::registry::CipherRegistry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Where an envelope stands relative to the newest cipher version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    /// Version stamped on the envelope.
    pub version: VersionId,
    /// Version new seals would use.
    pub latest: VersionId,
    /// True when the envelope was sealed under an older version.
    pub migration_required: bool,
}

/// Stateless sealing front end.
///
/// Holds only the KDF costs for new seals and the cipher registry, so a
/// single `Vault` can be shared across threads.
#[derive(Debug, Clone)]
pub struct Vault {
    config: VaultConfig,
    registry: CipherRegistry,
}

impl Vault {
    /// Create a vault over the shipped cipher versions.
    pub fn new(config: VaultConfig) -> Result<Self> {
        Self::with_registry(config, CipherRegistry::shipped())
    }

    /// Create a vault over a custom registry.
    pub fn with_registry(config: VaultConfig, registry: CipherRegistry) -> Result<Self> {
        config.validate().map_err(Error::Configuration)?;
        if config.is_below_recommended() {
            warn!(
                memory_cost = config.memory_cost,
                time_cost = config.time_cost,
                "KDF costs below recommended production values"
            );
        }
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn registry(&self) -> &CipherRegistry {
        &self.registry
    }

    /// Seal `secret` under `passphrase` with the current cipher version.
    pub fn seal(&self, secret: &str, passphrase: &str) -> Result<SealedEnvelope> {
        let cipher = self.registry.current();
        let kdf = KeyDerivation::new(&self.config)?;
        let keys = kdf.derive_keys(passphrase)?;

        let envelope = cipher.encrypt(secret, &keys)?;
        debug!(
            version = %envelope.version,
            memory_cost = envelope.kdf.memory_cost,
            time_cost = envelope.kdf.time_cost,
            "sealed secret"
        );
        Ok(envelope)
    }

    /// Unseal an envelope with `passphrase`.
    ///
    /// The envelope is never rewritten; see [`migrate`](Self::migrate).
    pub fn unseal(&self, envelope: &SealedEnvelope, passphrase: &str) -> Result<Zeroizing<String>> {
        // Resolve first so unsupported data fails without paying for the KDF.
        let cipher = self.registry.resolve(envelope.version)?;
        let keys = KeyDerivation::from_params(envelope.kdf.clone()).derive_keys(passphrase)?;

        let plaintext = cipher.decrypt(envelope, &keys)?;
        debug!(version = %envelope.version, "unsealed secret");
        Ok(plaintext)
    }

    /// Check a passphrase against an envelope, discarding the plaintext.
    pub fn verify(&self, envelope: &SealedEnvelope, passphrase: &str) -> Result<()> {
        self.unseal(envelope, passphrase).map(drop)
    }

    /// Compare an envelope's version with the current one.
    pub fn migration_status(&self, envelope: &SealedEnvelope) -> MigrationStatus {
        let latest = self.registry.current().identifier();
        MigrationStatus {
            version: envelope.version,
            latest,
            migration_required: envelope.version < latest,
        }
    }

    /// Re-seal an envelope under the current version.
    ///
    /// Produces a new envelope with a fresh salt and nonce; the caller
    /// replaces the stored copy.
    pub fn migrate(&self, envelope: &SealedEnvelope, passphrase: &str) -> Result<SealedEnvelope> {
        let secret = self.unseal(envelope, passphrase)?;
        let migrated = self.seal(&secret, passphrase)?;
        debug!(
            from = %envelope.version,
            to = %migrated.version,
            "migrated envelope"
        );
        Ok(migrated)
    }

    /// Re-seal an envelope under a new passphrase.
    pub fn rekey(
        &self,
        envelope: &SealedEnvelope,
        old_passphrase: &str,
        new_passphrase: &str,
    ) -> Result<SealedEnvelope> {
        if new_passphrase.is_empty() {
            return Err(Error::WeakSecret);
        }
        let secret = self.unseal(envelope, old_passphrase)?;
        let rekeyed = self.seal(&secret, new_passphrase)?;
        debug!(version = %rekeyed.version, "re-keyed envelope");
        Ok(rekeyed)
    }
}

impl Default for Vault {
    fn default() -> Self {
        Self {
            config: VaultConfig::default(),
            registry: CipherRegistry::shipped(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{AesGcmV2, CipherVersion, XChaCha20Poly1305V1};

    static ONLY_V1: [&dyn CipherVersion; 1] = [&XChaCha20Poly1305V1];
    static ONLY_V2: [&dyn CipherVersion; 1] = [&AesGcmV2];

    fn test_vault() -> Vault {
        Vault::new(VaultConfig::new(8, 1, 1)).unwrap()
    }

    #[test]
    fn test_seal_unseal_roundtrip() {
        let vault = test_vault();
        let envelope = vault.seal("seed words", "passphrase").unwrap();

        assert_eq!(envelope.version, VersionId::V2);
        assert_eq!(vault.unseal(&envelope, "passphrase").unwrap().as_str(), "seed words");
    }

    #[test]
    fn test_seal_stamps_kdf_config() {
        let vault = Vault::new(VaultConfig::new(16, 2, 1)).unwrap();
        let envelope = vault.seal("seed", "passphrase").unwrap();

        assert_eq!(envelope.kdf.memory_cost, 16);
        assert_eq!(envelope.kdf.time_cost, 2);
        assert_eq!(envelope.kdf.parallelism, 1);
    }

    #[test]
    fn test_wrong_passphrase() {
        let vault = test_vault();
        let envelope = vault.seal("seed", "right").unwrap();

        let err = vault.unseal(&envelope, "wrong").unwrap_err();
        assert!(err.is_authentication_failure());
    }

    #[test]
    fn test_empty_passphrase_is_weak() {
        let vault = test_vault();
        assert!(matches!(vault.seal("seed", ""), Err(Error::WeakSecret)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            Vault::new(VaultConfig::new(8, 0, 1)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_unsupported_version_before_kdf() {
        let vault = test_vault();
        let mut envelope = vault.seal("seed", "passphrase").unwrap();
        envelope.version = VersionId::new(9);
        // Would fail derivation if the KDF ran first.
        envelope.kdf.salt.clear();

        assert!(matches!(
            vault.unseal(&envelope, "passphrase"),
            Err(Error::UnsupportedVersion(v)) if v.get() == 9
        ));
    }

    #[test]
    fn test_migration_from_legacy() {
        let config = VaultConfig::new(8, 1, 1);
        let legacy = Vault::with_registry(config.clone(), CipherRegistry::new(&ONLY_V1).unwrap())
            .unwrap();
        let vault = Vault::new(config).unwrap();

        let old = legacy.seal("seed", "passphrase").unwrap();
        assert_eq!(old.version, VersionId::V1);
        assert!(vault.migration_status(&old).migration_required);

        let migrated = vault.migrate(&old, "passphrase").unwrap();
        assert_eq!(migrated.version, VersionId::V2);
        assert_ne!(migrated.kdf.salt, old.kdf.salt);
        assert!(!vault.migration_status(&migrated).migration_required);
        assert_eq!(vault.unseal(&migrated, "passphrase").unwrap().as_str(), "seed");
    }

    #[test]
    fn test_unseal_does_not_migrate() {
        let config = VaultConfig::new(8, 1, 1);
        let legacy = Vault::with_registry(config.clone(), CipherRegistry::new(&ONLY_V1).unwrap())
            .unwrap();
        let vault = Vault::new(config).unwrap();

        let old = legacy.seal("seed", "passphrase").unwrap();
        let before = old.clone();
        vault.unseal(&old, "passphrase").unwrap();

        assert_eq!(old, before);
    }

    #[test]
    fn test_rekey() {
        let vault = test_vault();
        let envelope = vault.seal("seed", "old").unwrap();
        let rekeyed = vault.rekey(&envelope, "old", "new").unwrap();

        assert_eq!(vault.unseal(&rekeyed, "new").unwrap().as_str(), "seed");
        assert!(vault.unseal(&rekeyed, "old").unwrap_err().is_authentication_failure());
        assert!(matches!(
            vault.rekey(&envelope, "old", ""),
            Err(Error::WeakSecret)
        ));
        assert!(vault.rekey(&envelope, "bad", "new").is_err());
    }

    #[test]
    fn test_verify() {
        let vault = test_vault();
        let envelope = vault.seal("seed", "passphrase").unwrap();

        assert!(vault.verify(&envelope, "passphrase").is_ok());
        assert!(vault.verify(&envelope, "nope").is_err());
    }

    #[test]
    fn test_registry_without_version_cannot_unseal_it() {
        let config = VaultConfig::new(8, 1, 1);
        let legacy = Vault::with_registry(config.clone(), CipherRegistry::new(&ONLY_V1).unwrap())
            .unwrap();
        let modern = Vault::with_registry(config, CipherRegistry::new(&ONLY_V2).unwrap()).unwrap();

        let old = legacy.seal("seed", "passphrase").unwrap();
        assert!(matches!(
            modern.unseal(&old, "passphrase"),
            Err(Error::UnsupportedVersion(VersionId::V1))
        ));
    }
}
