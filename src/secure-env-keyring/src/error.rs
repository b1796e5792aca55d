//! Error taxonomy for secure environment operations.
//!
//! Native keystores report failures as opaque strings or codes. Everything is
//! funneled into one [`SecureEnvError`] carrying a closed [`ErrorKind`], the
//! offending key id and the verbatim native diagnostic.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use secure_env_crypto::CodecError;

/// Closed set of failure kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Device lacks the required secure hardware feature.
    NoHardwareSupport,
    /// Operation required an existing key that is absent.
    KeyNotFound,
    /// Key generation was invoked for an id that already has a live key.
    KeyAlreadyExists,
    /// Hardware rejected key creation.
    CouldNotGenerateKeyPair,
    /// A native public key could not be parsed into canonical form.
    InvalidKeyEncoding,
    /// A native signature could not be parsed into canonical form.
    InvalidSignatureEncoding,
    /// User cancelled or failed a required biometric check.
    BiometricAuthenticationFailed,
    /// Hardware unsupported and no fallback provider registered.
    NoFallbackConfigured,
    /// The native key store could not be queried.
    KeychainQueryFailed,
    /// The native signing call failed.
    CouldNotCreateSignature,
    /// Authentication succeeded but yielded no usable signing object.
    NoSignatureOnCryptoObject,
    /// A UI-bound call was made off the platform's required thread.
    NotExecutedFromMainThread,
    /// Unrecognized native diagnostic.
    Unknown,
}

/// Recognized native markers, in priority order. First match wins.
const NATIVE_MARKERS: &[(&str, ErrorKind)] = &[
    ("KeychainQueryError", ErrorKind::KeychainQueryFailed),
    ("KeyNotFound", ErrorKind::KeyNotFound),
    ("NoKeyWithIdFound", ErrorKind::KeyNotFound),
    ("KeyAlreadyExists", ErrorKind::KeyAlreadyExists),
    ("CouldNotConvertIntoPublicKey", ErrorKind::InvalidKeyEncoding),
    ("CouldNotConvertSignatureToRaw", ErrorKind::InvalidSignatureEncoding),
    ("CouldNotCreateSignature", ErrorKind::CouldNotCreateSignature),
    ("BiometricAuthenticationFailed", ErrorKind::BiometricAuthenticationFailed),
    ("NoHardwareKeyStore", ErrorKind::NoHardwareSupport),
    ("NoSignatureOnCryptoObject", ErrorKind::NoSignatureOnCryptoObject),
    ("NotExecutedFromMainThread", ErrorKind::NotExecutedFromMainThread),
    ("CouldNotGenerateKeyPair", ErrorKind::CouldNotGenerateKeyPair),
];

impl ErrorKind {
    /// Classify a native diagnostic by its markers.
    ///
    /// Never fails: unrecognized text maps to [`ErrorKind::Unknown`].
    #[must_use]
    pub fn classify(diagnostic: &str) -> Self {
        NATIVE_MARKERS
            .iter()
            .find(|(marker, _)| diagnostic.contains(marker))
            .map_or(Self::Unknown, |(_, kind)| *kind)
    }

    fn describe(self, key_id: &str, native: &str) -> String {
        match self {
            Self::NoHardwareSupport => format!("No support for the hardware key store: {native}"),
            Self::KeyNotFound => format!("Key {key_id} not found: {native}"),
            Self::KeyAlreadyExists => format!("Key {key_id} already exists: {native}"),
            Self::CouldNotGenerateKeyPair => format!("Could not generate the key pair: {native}"),
            Self::InvalidKeyEncoding => {
                format!("Could not convert key {key_id} into public key: {native}")
            },
            Self::InvalidSignatureEncoding => {
                format!("Could not convert the signature into its raw format: {native}")
            },
            Self::BiometricAuthenticationFailed => {
                format!("Biometric authentication failed for key {key_id}: {native}")
            },
            Self::NoFallbackConfigured => format!(
                "Could not use local secure environment and no fallback secure environment \
                 is set: {native}"
            ),
            Self::KeychainQueryFailed => {
                format!("Error while querying for key {key_id}: {native}")
            },
            Self::CouldNotCreateSignature => format!(
                "An error occurred while creating a signature with key {key_id}: {native}"
            ),
            Self::NoSignatureOnCryptoObject => {
                format!("No signature on the crypto object: {native}")
            },
            Self::NotExecutedFromMainThread => {
                format!("Function must be executed from the main thread: {native}")
            },
            Self::Unknown => format!("Unable to determine error: {native}"),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Opaque failure signal returned by a native hardware collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    code: Option<i64>,
    message: String,
}

impl NativeError {
    /// Create a native error from its diagnostic text.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Create a native error carrying a platform error code.
    #[must_use]
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Platform error code, if one was reported.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        self.code
    }

    /// Diagnostic text as reported by the platform.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Classify this signal against the known markers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::classify(&self.message)
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "code: {code}, msg: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for NativeError {}

/// Structured failure of a secure environment operation.
///
/// Created once at the translation boundary and never mutated. Serializes to
/// `{ "kind", "message", "keyId", "nativeError" }`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct SecureEnvError {
    kind: ErrorKind,
    message: String,
    key_id: String,
    #[serde(rename = "nativeError")]
    native: String,
}

impl SecureEnvError {
    /// Create an error of an explicit kind.
    #[must_use]
    pub fn new(kind: ErrorKind, key_id: impl Into<String>, native: impl Into<String>) -> Self {
        let key_id = key_id.into();
        let native = native.into();
        Self {
            kind,
            message: kind.describe(&key_id, &native),
            key_id,
            native,
        }
    }

    /// Translate a native failure, classifying it by marker.
    #[must_use]
    pub fn from_native(key_id: impl Into<String>, native: &NativeError) -> Self {
        Self::new(native.kind(), key_id, native.to_string())
    }

    /// Translate a native failure, substituting `fallback` when no marker
    /// matches.
    #[must_use]
    pub fn from_native_or(
        key_id: impl Into<String>,
        native: &NativeError,
        fallback: ErrorKind,
    ) -> Self {
        let kind = match native.kind() {
            ErrorKind::Unknown => fallback,
            kind => kind,
        };
        Self::new(kind, key_id, native.to_string())
    }

    /// Translate a codec failure for the given key.
    #[must_use]
    pub fn from_codec(key_id: impl Into<String>, err: &CodecError) -> Self {
        let kind = match err {
            CodecError::InvalidKeyEncoding { .. } => ErrorKind::InvalidKeyEncoding,
            CodecError::InvalidSignatureEncoding { .. } => ErrorKind::InvalidSignatureEncoding,
        };
        Self::new(kind, key_id, err.reason())
    }

    /// Create a key-not-found error.
    #[must_use]
    pub fn key_not_found(key_id: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyNotFound, key_id, "KeyNotFound")
    }

    /// Create a key-already-exists error.
    #[must_use]
    pub fn key_already_exists(key_id: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyAlreadyExists, key_id, "KeyAlreadyExists")
    }

    /// The failure kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The key id the failing operation was invoked with.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The verbatim native diagnostic.
    #[must_use]
    pub fn native(&self) -> &str {
        &self.native
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
