//! Hardware backend trait.
//!
//! This module defines the [`HardwareBackend`] trait that every platform
//! keystore adapter provides. Backends speak the platform's own encodings
//! (DER SPKI or raw EC points, DER signatures) and report failures as opaque
//! [`NativeError`]s; normalization happens above them in
//! [`KeyLifecycleManager`](crate::KeyLifecycleManager).
//!
//! ## Security Properties
//!
//! - Private keys never leave the hardware boundary
//! - Signing is performed entirely within secure hardware
//! - Biometrics-bound keys are only usable with an [`AuthToken`]
//!
//! ## Existence Checks
//!
//! Some keystores can be asked whether a key exists. Others (the Secure
//! Enclave through a keychain query) can only discover it by trying an
//! operation. The default [`HardwareBackend::has_key`] covers the second
//! case through [`infer_has_key`].

use async_trait::async_trait;

use crate::biometrics::AuthToken;
use crate::error::{ErrorKind, NativeError};

/// Per-platform collaborator owning the native keystore.
///
/// ## Example
///
/// ```rust,ignore
/// use secure_env_keyring::{HardwareBackend, NativeError};
///
/// async fn rotate(backend: &dyn HardwareBackend, key_id: &str) -> Result<(), NativeError> {
///     if backend.has_key(key_id).await? {
///         backend.delete(key_id).await?;
///     }
///     backend.generate(key_id, false).await
/// }
/// ```
#[async_trait]
pub trait HardwareBackend: Send + Sync {
    /// Whether the device has a hardware keystore at all.
    ///
    /// Checked before every lifecycle operation.
    fn hardware_available(&self) -> bool {
        true
    }

    /// Security level reported by the platform probe.
    ///
    /// Compared against
    /// [`SecureEnvConfig::min_security_level`](crate::SecureEnvConfig) by the
    /// capability selector.
    fn security_level(&self) -> u32;

    /// Create a P-256 key pair inside the hardware boundary.
    ///
    /// When `biometrics_backed` is set the key must require biometric
    /// authentication per use and be invalidated on enrollment changes.
    async fn generate(&self, key_id: &str, biometrics_backed: bool) -> Result<(), NativeError>;

    /// Export the public key in the platform's native encoding.
    async fn public_key_bytes(&self, key_id: &str) -> Result<Vec<u8>, NativeError>;

    /// Sign `message` (hashed with SHA-256 by the hardware) and return a DER
    /// ECDSA-Sig-Value.
    async fn sign(
        &self,
        key_id: &str,
        message: &[u8],
        auth: Option<&AuthToken>,
    ) -> Result<Vec<u8>, NativeError>;

    /// Remove the key.
    async fn delete(&self, key_id: &str) -> Result<(), NativeError>;

    /// Check whether a key exists.
    ///
    /// Defaults to [`infer_has_key`]. Keystores with an explicit existence
    /// query should override this.
    async fn has_key(&self, key_id: &str) -> Result<bool, NativeError> {
        infer_has_key(self, key_id).await
    }
}

/// Infer key existence by attempting a public key export.
///
/// A failure classified as [`ErrorKind::KeyNotFound`] means the key is absent;
/// any other failure is passed through.
pub async fn infer_has_key<B>(backend: &B, key_id: &str) -> Result<bool, NativeError>
where
    B: HardwareBackend + ?Sized,
{
    match backend.public_key_bytes(key_id).await {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == ErrorKind::KeyNotFound => Ok(false),
        Err(err) => Err(err),
    }
}
