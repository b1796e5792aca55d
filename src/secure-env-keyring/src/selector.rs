//! Capability detection and provider selection.
//!
//! The [`CapabilitySelector`] decides once per process lifetime whether the
//! local hardware qualifies, and routes every operation either to the
//! hardware provider or to a registered fallback.
//!
//! ## Caching
//!
//! The first call to [`CapabilitySelector::is_supported`] probes the hardware
//! and memoizes the answer. Concurrent first callers are serialized on the
//! write lock so the probe runs once. The memo only changes through
//! [`CapabilitySelector::force_fallback`].

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use secure_env_crypto::{CanonicalPublicKey, CanonicalSignature};
use tracing::{debug, info, warn};

use crate::backend::HardwareBackend;
use crate::config::DEFAULT_MIN_SECURITY_LEVEL;
use crate::error::{ErrorKind, SecureEnvError};
use crate::lifecycle::KeyLifecycleManager;
use crate::provider::SecureEnvironment;

/// Source of the hardware security level.
pub trait CapabilityProbe: Send + Sync {
    /// Current security level; `0` when there is no qualifying hardware.
    fn security_level(&self) -> u32;
}

/// Chooses between the hardware provider and a fallback.
pub struct CapabilitySelector {
    probe: Arc<dyn CapabilityProbe>,
    hardware: Arc<dyn SecureEnvironment>,
    min_security_level: u32,
    supported: RwLock<Option<bool>>,
    fallback: RwLock<Option<Arc<dyn SecureEnvironment>>>,
}

impl CapabilitySelector {
    /// Create a selector from a probe and the hardware provider it vouches for.
    pub fn new(probe: Arc<dyn CapabilityProbe>, hardware: Arc<dyn SecureEnvironment>) -> Self {
        Self {
            probe,
            hardware,
            min_security_level: DEFAULT_MIN_SECURITY_LEVEL,
            supported: RwLock::new(None),
            fallback: RwLock::new(None),
        }
    }

    /// Create a selector whose probe and hardware provider are the same
    /// lifecycle manager. The manager's configured minimum level applies.
    pub fn for_hardware<B>(manager: KeyLifecycleManager<B>) -> Self
    where
        B: HardwareBackend + 'static,
    {
        let min_security_level = manager.config().min_security_level;
        let manager = Arc::new(manager);
        Self::new(manager.clone(), manager).min_security_level(min_security_level)
    }

    /// Set the minimum security level the probe must report.
    #[must_use]
    pub fn min_security_level(mut self, level: u32) -> Self {
        self.min_security_level = level;
        self
    }

    /// Whether the hardware provider is used. Probes once, then memoizes.
    pub fn is_supported(&self) -> bool {
        if let Some(supported) = *read(&self.supported) {
            return supported;
        }

        let mut memo = write(&self.supported);
        if let Some(supported) = *memo {
            return supported;
        }

        let supported = self.is_local_supported();
        if !supported {
            warn!(
                min_security_level = self.min_security_level,
                "Local secure environment does not qualify"
            );
        }
        *memo = Some(supported);
        supported
    }

    /// Probe the hardware directly, bypassing the memo.
    pub fn is_local_supported(&self) -> bool {
        let level = self.probe.security_level();
        let supported = level >= self.min_security_level;
        debug!(
            level,
            min_security_level = self.min_security_level,
            supported,
            "Probed local secure environment"
        );
        supported
    }

    /// Register the provider used when the hardware does not qualify.
    pub fn set_fallback(&self, provider: Arc<dyn SecureEnvironment>) {
        *write(&self.fallback) = Some(provider);
        info!("Fallback secure environment registered");
    }

    /// Whether a fallback provider is registered.
    pub fn has_fallback(&self) -> bool {
        read(&self.fallback).is_some()
    }

    /// Override the memoized decision.
    pub fn force_fallback(&self, use_fallback: bool) {
        *write(&self.supported) = Some(!use_fallback);
        info!(use_fallback, "Secure environment selection overridden");
    }

    /// The provider operations are routed to.
    ///
    /// # Errors
    ///
    /// `NoFallbackConfigured` if the hardware does not qualify and no fallback
    /// is registered.
    pub fn active_provider(&self) -> Result<Arc<dyn SecureEnvironment>, SecureEnvError> {
        self.resolve("")
    }

    fn resolve(&self, key_id: &str) -> Result<Arc<dyn SecureEnvironment>, SecureEnvError> {
        if self.is_supported() {
            return Ok(Arc::clone(&self.hardware));
        }

        match read(&self.fallback).as_ref() {
            Some(fallback) => {
                debug!(key_id = %key_id, "Routing to fallback secure environment");
                Ok(Arc::clone(fallback))
            },
            None => Err(SecureEnvError::new(
                ErrorKind::NoFallbackConfigured,
                key_id,
                "no fallback provider registered",
            )),
        }
    }
}

#[async_trait]
impl SecureEnvironment for CapabilitySelector {
    async fn generate_keypair(
        &self,
        key_id: &str,
        biometrics_backed: bool,
    ) -> Result<(), SecureEnvError> {
        let provider = self.resolve(key_id)?;
        provider.generate_keypair(key_id, biometrics_backed).await
    }

    async fn get_public_bytes_for_key_id(
        &self,
        key_id: &str,
    ) -> Result<CanonicalPublicKey, SecureEnvError> {
        let provider = self.resolve(key_id)?;
        provider.get_public_bytes_for_key_id(key_id).await
    }

    async fn sign(
        &self,
        key_id: &str,
        message: &[u8],
        biometrics_backed: bool,
    ) -> Result<CanonicalSignature, SecureEnvError> {
        let provider = self.resolve(key_id)?;
        provider.sign(key_id, message, biometrics_backed).await
    }

    async fn delete_key(&self, key_id: &str) -> Result<(), SecureEnvError> {
        let provider = self.resolve(key_id)?;
        provider.delete_key(key_id).await
    }
}

// The guarded values are a flag and a pointer, both valid after a panic.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
