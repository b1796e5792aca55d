//! # secure-env-crypto
//!
//! Canonical encodings for hardware-backed P-256 signing keys.
//!
//! Hardware keystores hand out public keys and signatures in their own native
//! shapes. This crate collapses them into one form:
//!
//! - **Public keys**: 33-byte SEC1-compressed points ([`CanonicalPublicKey`])
//! - **Signatures**: 64-byte `r || s` ([`CanonicalSignature`])
//!
//! ```rust,ignore
//! use secure_env_crypto::{canonicalize_public_key, canonicalize_signature};
//!
//! let public_key = canonicalize_public_key(&spki_der)?;
//! assert_eq!(public_key.as_bytes().len(), 33);
//!
//! let signature = canonicalize_signature(&ecdsa_sig_value_der)?;
//! assert_eq!(signature.as_bytes().len(), 64);
//! ```
//!
//! No elliptic-curve arithmetic happens here; compression only reads the
//! parity of Y from the encoding.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod codec;
mod error;
mod types;

pub use codec::{canonicalize_public_key, canonicalize_signature, decanonicalize_signature};
pub use error::CodecError;
pub use types::{
    CanonicalPublicKey, CanonicalSignature, COMPRESSED_POINT_LEN, PREFIX_EVEN_Y, PREFIX_ODD_Y,
    PREFIX_UNCOMPRESSED, SCALAR_LEN, SIGNATURE_LEN, UNCOMPRESSED_POINT_LEN,
};
