//! Key lifecycle manager.
//!
//! Wraps a [`HardwareBackend`] with the existence guards, biometric
//! authentication and normalization shared by every platform:
//!
//! - every operation first requires a hardware keystore
//! - `generate` refuses ids that already exist, the others refuse ids that don't
//! - native public keys and signatures go through the canonical codec
//! - native failures go through the error taxonomy exactly once
//!
//! No retries happen here.

use std::sync::Arc;

use async_trait::async_trait;
use secure_env_crypto::{
    canonicalize_public_key, canonicalize_signature, CanonicalPublicKey, CanonicalSignature,
};
use tracing::{debug, info};

use crate::backend::HardwareBackend;
use crate::biometrics::{AuthOutcome, AuthRequest, AuthToken, BiometricAuthenticator};
use crate::config::SecureEnvConfig;
use crate::error::{ErrorKind, SecureEnvError};
use crate::provider::SecureEnvironment;
use crate::selector::CapabilityProbe;

/// Diagnostic reported when a key is still present after deletion.
const KEY_STILL_PRESENT: &str = "KeyStillPresent";

/// [`SecureEnvironment`] backed by a platform keystore.
pub struct KeyLifecycleManager<B> {
    backend: B,
    authenticator: Option<Arc<dyn BiometricAuthenticator>>,
    config: SecureEnvConfig,
}

impl<B: HardwareBackend> KeyLifecycleManager<B> {
    /// Create a manager with the default configuration and no biometric
    /// authenticator.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SecureEnvConfig::default())
    }

    /// Create a manager with an explicit configuration.
    pub fn with_config(backend: B, config: SecureEnvConfig) -> Self {
        Self {
            backend,
            authenticator: None,
            config,
        }
    }

    /// Attach the collaborator that runs biometric prompts.
    ///
    /// Without one, signing with a biometrics-bound key fails.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn BiometricAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The active configuration.
    pub fn config(&self) -> &SecureEnvConfig {
        &self.config
    }

    fn ensure_hardware(&self, key_id: &str) -> Result<(), SecureEnvError> {
        if self.backend.hardware_available() {
            return Ok(());
        }
        debug!(key_id = %key_id, "No hardware key store available");
        Err(SecureEnvError::new(
            ErrorKind::NoHardwareSupport,
            key_id,
            "NoHardwareKeyStore",
        ))
    }

    async fn key_exists(&self, key_id: &str) -> Result<bool, SecureEnvError> {
        self.backend
            .has_key(key_id)
            .await
            .map_err(|e| SecureEnvError::from_native(key_id, &e))
    }

    async fn ensure_exists(&self, key_id: &str) -> Result<(), SecureEnvError> {
        if self.key_exists(key_id).await? {
            Ok(())
        } else {
            debug!(key_id = %key_id, "Key not found");
            Err(SecureEnvError::key_not_found(key_id))
        }
    }

    async fn authenticate(&self, key_id: &str) -> Result<AuthToken, SecureEnvError> {
        let failed = |reason: String| {
            SecureEnvError::new(ErrorKind::BiometricAuthenticationFailed, key_id, reason)
        };

        let Some(authenticator) = &self.authenticator else {
            return Err(failed("no biometric authenticator configured".into()));
        };

        let request = AuthRequest {
            key_id: key_id.to_string(),
            prompt: self.config.prompt.clone(),
        };

        match authenticator.authenticate(request).await {
            AuthOutcome::Authenticated(token) => {
                debug!(key_id = %key_id, "Biometric authentication succeeded");
                Ok(token)
            },
            AuthOutcome::Failed(reason) => Err(failed(reason)),
            AuthOutcome::Cancelled => Err(failed("authentication cancelled".into())),
        }
    }
}

#[async_trait]
impl<B: HardwareBackend> SecureEnvironment for KeyLifecycleManager<B> {
    async fn generate_keypair(
        &self,
        key_id: &str,
        biometrics_backed: bool,
    ) -> Result<(), SecureEnvError> {
        self.ensure_hardware(key_id)?;

        if self.key_exists(key_id).await? {
            debug!(key_id = %key_id, "Refusing to overwrite existing key");
            return Err(SecureEnvError::key_already_exists(key_id));
        }

        self.backend
            .generate(key_id, biometrics_backed)
            .await
            .map_err(|e| {
                SecureEnvError::from_native_or(key_id, &e, ErrorKind::CouldNotGenerateKeyPair)
            })?;

        info!(key_id = %key_id, biometrics_backed, "Hardware key generated");
        Ok(())
    }

    async fn get_public_bytes_for_key_id(
        &self,
        key_id: &str,
    ) -> Result<CanonicalPublicKey, SecureEnvError> {
        self.ensure_hardware(key_id)?;
        self.ensure_exists(key_id).await?;

        let raw = self
            .backend
            .public_key_bytes(key_id)
            .await
            .map_err(|e| SecureEnvError::from_native(key_id, &e))?;

        canonicalize_public_key(&raw).map_err(|e| SecureEnvError::from_codec(key_id, &e))
    }

    async fn sign(
        &self,
        key_id: &str,
        message: &[u8],
        biometrics_backed: bool,
    ) -> Result<CanonicalSignature, SecureEnvError> {
        self.ensure_hardware(key_id)?;
        self.ensure_exists(key_id).await?;

        let token = if biometrics_backed {
            Some(self.authenticate(key_id).await?)
        } else {
            None
        };

        let der = self
            .backend
            .sign(key_id, message, token.as_ref())
            .await
            .map_err(|e| SecureEnvError::from_native(key_id, &e))?;

        let signature =
            canonicalize_signature(&der).map_err(|e| SecureEnvError::from_codec(key_id, &e))?;

        debug!(key_id = %key_id, message_len = message.len(), "Signed with hardware key");
        Ok(signature)
    }

    async fn delete_key(&self, key_id: &str) -> Result<(), SecureEnvError> {
        self.ensure_hardware(key_id)?;
        self.ensure_exists(key_id).await?;

        self.backend
            .delete(key_id)
            .await
            .map_err(|e| SecureEnvError::from_native(key_id, &e))?;

        if self.config.verify_deletion && self.key_exists(key_id).await? {
            return Err(SecureEnvError::new(
                ErrorKind::Unknown,
                key_id,
                KEY_STILL_PRESENT,
            ));
        }

        info!(key_id = %key_id, "Hardware key deleted");
        Ok(())
    }
}

impl<B: HardwareBackend> CapabilityProbe for KeyLifecycleManager<B> {
    fn security_level(&self) -> u32 {
        if self.backend.hardware_available() {
            self.backend.security_level()
        } else {
            0
        }
    }
}
