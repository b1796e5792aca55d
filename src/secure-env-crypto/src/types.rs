//! Canonical value types.
//!
//! Every provider, hardware or software, hands public keys and signatures to
//! callers in exactly these two shapes. Construction always validates, so a
//! value of either type upholds its length and prefix invariants.

use std::fmt;

use crate::error::CodecError;

/// Length of a SEC1-compressed P-256 point.
pub const COMPRESSED_POINT_LEN: usize = 33;

/// Length of a SEC1-uncompressed P-256 point (`0x04 || X || Y`).
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Length of a single P-256 scalar or coordinate.
pub const SCALAR_LEN: usize = 32;

/// Length of a fixed-size `r || s` signature.
pub const SIGNATURE_LEN: usize = 2 * SCALAR_LEN;

/// Prefix of a compressed point whose Y coordinate is even.
pub const PREFIX_EVEN_Y: u8 = 0x02;

/// Prefix of a compressed point whose Y coordinate is odd.
pub const PREFIX_ODD_Y: u8 = 0x03;

/// Prefix of an uncompressed point.
pub const PREFIX_UNCOMPRESSED: u8 = 0x04;

/// A 33-byte SEC1-compressed P-256 public key.
///
/// Layout: one parity byte (`0x02` for even Y, `0x03` for odd Y) followed by
/// the 32-byte big-endian X coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalPublicKey([u8; COMPRESSED_POINT_LEN]);

impl CanonicalPublicKey {
    /// Build a compressed key from an X coordinate and the parity of Y.
    #[must_use]
    pub fn from_x_and_parity(x: &[u8; SCALAR_LEN], y_is_odd: bool) -> Self {
        let mut bytes = [0u8; COMPRESSED_POINT_LEN];
        bytes[0] = if y_is_odd { PREFIX_ODD_Y } else { PREFIX_EVEN_Y };
        bytes[1..].copy_from_slice(x);
        Self(bytes)
    }

    /// Borrow the 33 encoded bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; COMPRESSED_POINT_LEN] {
        &self.0
    }

    /// Copy the encoded bytes into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// The parity prefix byte.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.0[0]
    }

    /// Whether the Y coordinate of the point is odd.
    #[must_use]
    pub const fn y_is_odd(&self) -> bool {
        self.0[0] == PREFIX_ODD_Y
    }

    /// The X coordinate.
    #[must_use]
    pub fn x(&self) -> &[u8] {
        &self.0[1..]
    }
}

impl TryFrom<&[u8]> for CanonicalPublicKey {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; COMPRESSED_POINT_LEN] = bytes.try_into().map_err(|_| {
            CodecError::invalid_key(format!(
                "compressed key must be {} bytes, got {}",
                COMPRESSED_POINT_LEN,
                bytes.len()
            ))
        })?;

        match array[0] {
            PREFIX_EVEN_Y | PREFIX_ODD_Y => Ok(Self(array)),
            other => Err(CodecError::invalid_key(format!(
                "invalid compressed key prefix 0x{other:02x}"
            ))),
        }
    }
}

impl AsRef<[u8]> for CanonicalPublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<CanonicalPublicKey> for Vec<u8> {
    fn from(key: CanonicalPublicKey) -> Self {
        key.0.to_vec()
    }
}

impl fmt::Debug for CanonicalPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalPublicKey(")?;
        write_hex(f, &self.0)?;
        write!(f, ")")
    }
}

/// A 64-byte ECDSA P-256 signature: `r || s`, each a 32-byte big-endian
/// unsigned integer with no sign padding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalSignature([u8; SIGNATURE_LEN]);

impl CanonicalSignature {
    /// Join two 32-byte scalars.
    #[must_use]
    pub fn from_scalars(r: &[u8; SCALAR_LEN], s: &[u8; SCALAR_LEN]) -> Self {
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..SCALAR_LEN].copy_from_slice(r);
        bytes[SCALAR_LEN..].copy_from_slice(s);
        Self(bytes)
    }

    /// Borrow the 64 encoded bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Copy the encoded bytes into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// The `r` component.
    #[must_use]
    pub fn r(&self) -> &[u8] {
        &self.0[..SCALAR_LEN]
    }

    /// The `s` component.
    #[must_use]
    pub fn s(&self) -> &[u8] {
        &self.0[SCALAR_LEN..]
    }
}

impl TryFrom<&[u8]> for CanonicalSignature {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            CodecError::invalid_signature(format!(
                "fixed-size signature must be {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl AsRef<[u8]> for CanonicalSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<CanonicalSignature> for Vec<u8> {
    fn from(sig: CanonicalSignature) -> Self {
        sig.0.to_vec()
    }
}

impl fmt::Debug for CanonicalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalSignature(")?;
        write_hex(f, &self.0)?;
        write!(f, ")")
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}
