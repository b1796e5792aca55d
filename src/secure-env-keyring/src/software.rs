//! Software-only secure environment.
//!
//! WARNING: This implementation provides NO hardware binding.
//!
//! Use only for:
//! - Devices whose hardware does not qualify, as the selector's fallback
//! - Development and testing
//! - CI environments

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand_core::OsRng;
use secure_env_crypto::{
    canonicalize_public_key, canonicalize_signature, CanonicalPublicKey, CanonicalSignature,
};
use tracing::{info, warn};

use crate::error::{ErrorKind, SecureEnvError};
use crate::provider::SecureEnvironment;

/// In-memory ECDSA P-256 key store.
///
/// # Security Warning
///
/// Keys live in process memory without hardware protection and are lost on
/// drop. Biometric binding is accepted but not enforced.
///
/// Outputs pass through the same codec as hardware keys, so canonical forms
/// are identical.
pub struct SoftwareSecureEnvironment {
    keys: RwLock<HashMap<String, SigningKey>>,
}

impl SoftwareSecureEnvironment {
    /// Create an empty software key store.
    pub fn new() -> Self {
        warn!("SoftwareSecureEnvironment: NO HARDWARE BINDING, keys are held in memory");
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SoftwareSecureEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned(key_id: &str) -> SecureEnvError {
    SecureEnvError::new(ErrorKind::Unknown, key_id, "Lock poisoned")
}

#[async_trait]
impl SecureEnvironment for SoftwareSecureEnvironment {
    async fn generate_keypair(
        &self,
        key_id: &str,
        biometrics_backed: bool,
    ) -> Result<(), SecureEnvError> {
        if biometrics_backed {
            warn!(key_id = %key_id, "Biometric binding is not enforced for software keys");
        }

        let mut keys = self.keys.write().map_err(|_| lock_poisoned(key_id))?;
        if keys.contains_key(key_id) {
            return Err(SecureEnvError::key_already_exists(key_id));
        }
        keys.insert(key_id.to_string(), SigningKey::random(&mut OsRng));

        info!(key_id = %key_id, "Software key generated");
        Ok(())
    }

    async fn get_public_bytes_for_key_id(
        &self,
        key_id: &str,
    ) -> Result<CanonicalPublicKey, SecureEnvError> {
        let point = {
            let keys = self.keys.read().map_err(|_| lock_poisoned(key_id))?;
            let key = keys
                .get(key_id)
                .ok_or_else(|| SecureEnvError::key_not_found(key_id))?;
            key.verifying_key().to_encoded_point(false)
        };

        canonicalize_public_key(point.as_bytes()).map_err(|e| SecureEnvError::from_codec(key_id, &e))
    }

    async fn sign(
        &self,
        key_id: &str,
        message: &[u8],
        _biometrics_backed: bool,
    ) -> Result<CanonicalSignature, SecureEnvError> {
        let signature: Signature = {
            let keys = self.keys.read().map_err(|_| lock_poisoned(key_id))?;
            let key = keys
                .get(key_id)
                .ok_or_else(|| SecureEnvError::key_not_found(key_id))?;
            // P-256 hashes with SHA-256 internally
            key.sign(message)
        };

        canonicalize_signature(signature.to_der().as_bytes())
            .map_err(|e| SecureEnvError::from_codec(key_id, &e))
    }

    async fn delete_key(&self, key_id: &str) -> Result<(), SecureEnvError> {
        let mut keys = self.keys.write().map_err(|_| lock_poisoned(key_id))?;
        keys.remove(key_id)
            .ok_or_else(|| SecureEnvError::key_not_found(key_id))?;

        info!(key_id = %key_id, "Software key deleted");
        Ok(())
    }
}
