//! Caller-facing secure environment contract.

use std::collections::BTreeMap;

use async_trait::async_trait;
use secure_env_crypto::{CanonicalPublicKey, CanonicalSignature};

use crate::error::SecureEnvError;

/// A provider of isolated P-256 signing keys.
///
/// Implemented by [`KeyLifecycleManager`](crate::KeyLifecycleManager) over a
/// hardware backend, by the software fallback, and by
/// [`CapabilitySelector`](crate::CapabilitySelector), which routes to
/// whichever of those is active. Keys move `Absent -> Present` on generation
/// and back on deletion; every other transition fails.
#[async_trait]
pub trait SecureEnvironment: Send + Sync {
    /// Create a key pair for `key_id`.
    ///
    /// Fails with `KeyAlreadyExists` if a key with this id is live.
    async fn generate_keypair(
        &self,
        key_id: &str,
        biometrics_backed: bool,
    ) -> Result<(), SecureEnvError>;

    /// Export the public key of `key_id` as a 33-byte compressed point.
    async fn get_public_bytes_for_key_id(
        &self,
        key_id: &str,
    ) -> Result<CanonicalPublicKey, SecureEnvError>;

    /// Sign `message` with `key_id`, producing a 64-byte `r || s` signature.
    ///
    /// `biometrics_backed` must match how the key was generated; when set, the
    /// user is authenticated before the key is used.
    async fn sign(
        &self,
        key_id: &str,
        message: &[u8],
        biometrics_backed: bool,
    ) -> Result<CanonicalSignature, SecureEnvError>;

    /// Delete `key_id`.
    async fn delete_key(&self, key_id: &str) -> Result<(), SecureEnvError>;

    /// Generate several keys, then export their public keys.
    ///
    /// Keys are generated in order and the first failure aborts the batch;
    /// keys generated before it are left in place.
    async fn batch_generate_keypairs(
        &self,
        key_ids: &[&str],
        biometrics_backed: bool,
    ) -> Result<BTreeMap<String, CanonicalPublicKey>, SecureEnvError> {
        for key_id in key_ids {
            self.generate_keypair(key_id, biometrics_backed).await?;
        }

        let mut public_keys = BTreeMap::new();
        for key_id in key_ids {
            let public_key = self.get_public_bytes_for_key_id(key_id).await?;
            public_keys.insert((*key_id).to_string(), public_key);
        }
        Ok(public_keys)
    }

    /// Generate a key pair and return its public key.
    async fn generate_and_export(
        &self,
        key_id: &str,
        biometrics_backed: bool,
    ) -> Result<CanonicalPublicKey, SecureEnvError> {
        self.generate_keypair(key_id, biometrics_backed).await?;
        self.get_public_bytes_for_key_id(key_id).await
    }
}
