//! # secure-env-keyring
//!
//! Hardware-isolated P-256 signing keys behind one platform-independent
//! contract.
//!
//! Platform keystores disagree on nearly everything: public keys come out as
//! DER SubjectPublicKeyInfo or as raw EC points, signatures as DER, and
//! failures as free-form strings. This crate puts a single
//! [`SecureEnvironment`] contract on top of them:
//!
//! - [`KeyLifecycleManager`] wraps a per-platform [`HardwareBackend`] with
//!   existence guards, biometric authentication and canonical encodings
//! - [`CapabilitySelector`] probes the hardware once and routes to it, or to a
//!   registered fallback such as [`SoftwareSecureEnvironment`]
//! - [`SecureEnvError`] classifies every native failure into a closed
//!   [`ErrorKind`] set
//!
//! ## Platform Support
//!
//! | Platform | Public key | Existence check | Security level |
//! |----------|------------|-----------------|----------------|
//! | Android | DER SPKI | explicit | StrongBox/KeyMint feature version |
//! | iOS | raw EC point | inferred | Secure Enclave availability |
//! | Fallback | raw EC point | explicit | n/a |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use secure_env_keyring::{
//!     CapabilitySelector, HardwareBackend, KeyLifecycleManager, SecureEnvError,
//!     SecureEnvironment, SoftwareSecureEnvironment,
//! };
//!
//! async fn example(backend: impl HardwareBackend + 'static) -> Result<(), SecureEnvError> {
//!     let selector = CapabilitySelector::for_hardware(KeyLifecycleManager::new(backend));
//!     selector.set_fallback(Arc::new(SoftwareSecureEnvironment::new()));
//!
//!     let public_key = selector.generate_and_export("device-key", false).await?;
//!     let signature = selector.sign("device-key", b"payload", false).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::missing_panics_doc)] // Panic documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

mod backend;
mod biometrics;
mod config;
mod error;
mod lifecycle;
mod provider;
mod selector;

#[cfg(feature = "software")]
mod software;

pub use backend::{infer_has_key, HardwareBackend};
pub use biometrics::{
    AuthOutcome, AuthRequest, AuthToken, BiometricAuthenticator, ChannelAuthenticator, PendingAuth,
};
pub use config::{BiometricPrompt, SecureEnvConfig, DEFAULT_MIN_SECURITY_LEVEL};
pub use error::{ErrorKind, NativeError, SecureEnvError};
pub use lifecycle::KeyLifecycleManager;
pub use provider::SecureEnvironment;
pub use selector::{CapabilityProbe, CapabilitySelector};

#[cfg(feature = "software")]
pub use software::SoftwareSecureEnvironment;

pub use secure_env_crypto::{CanonicalPublicKey, CanonicalSignature};
