//! Codec error types.

use thiserror::Error;

/// Errors raised while converting native key or signature encodings into
/// their canonical forms.
///
/// Both variants indicate a mismatch between what a provider emitted and what
/// the codec understands. They never describe a caller input error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Public key bytes could not be turned into a compressed P-256 point.
    #[error("Invalid key encoding: {reason}")]
    InvalidKeyEncoding {
        /// Reason the key could not be decoded.
        reason: String,
    },

    /// Signature bytes could not be turned into a fixed-size `r || s` value.
    #[error("Invalid signature encoding: {reason}")]
    InvalidSignatureEncoding {
        /// Reason the signature could not be decoded.
        reason: String,
    },
}

impl CodecError {
    /// Create an invalid key encoding error.
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKeyEncoding {
            reason: reason.into(),
        }
    }

    /// Create an invalid signature encoding error.
    #[must_use]
    pub fn invalid_signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignatureEncoding {
            reason: reason.into(),
        }
    }

    /// The human-readable reason, without the variant prefix.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidKeyEncoding { reason } | Self::InvalidSignatureEncoding { reason } => {
                reason
            },
        }
    }
}
