//! Conversion between native and canonical wire forms.
//!
//! Hardware keystores disagree on how they hand out key material:
//!
//! | Source | Public key | Signature |
//! |--------|------------|-----------|
//! | Android Keystore | DER SubjectPublicKeyInfo | DER ECDSA-Sig-Value |
//! | Secure Enclave | raw uncompressed point (65 bytes) | DER ECDSA-Sig-Value |
//!
//! Everything leaving this module is a [`CanonicalPublicKey`] (33 bytes) or a
//! [`CanonicalSignature`] (64 bytes). The functions are pure and total: any
//! input either converts losslessly or yields a [`CodecError`].

use der::asn1::UintRef;
use der::{Decode, Encode, Sequence};
use spki::SubjectPublicKeyInfoRef;

use crate::error::CodecError;
use crate::types::{
    CanonicalPublicKey, CanonicalSignature, COMPRESSED_POINT_LEN, PREFIX_UNCOMPRESSED, SCALAR_LEN,
    UNCOMPRESSED_POINT_LEN,
};

/// ASN.1 `ECDSA-Sig-Value ::= SEQUENCE { r INTEGER, s INTEGER }` (RFC 3279).
///
/// `UintRef` strips the `0x00` sign-disambiguation byte on decode and adds it
/// back on encode when the high bit of the value is set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Sequence)]
struct EcdsaSigValue<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

/// Convert a native public key encoding into a compressed P-256 point.
///
/// Accepted inputs:
/// - DER SubjectPublicKeyInfo (anything longer than 65 bytes), unwrapped to
///   the embedded point first
/// - raw uncompressed point `0x04 || X || Y`
/// - already-compressed point `0x02/0x03 || X`
///
/// # Errors
///
/// Returns [`CodecError::InvalidKeyEncoding`] for malformed SPKI, a wrong
/// point prefix, or any other length.
pub fn canonicalize_public_key(raw: &[u8]) -> Result<CanonicalPublicKey, CodecError> {
    let point = if raw.len() > UNCOMPRESSED_POINT_LEN {
        extract_spki_point(raw)?
    } else {
        raw
    };

    match point.len() {
        UNCOMPRESSED_POINT_LEN => compress_point(point),
        COMPRESSED_POINT_LEN => CanonicalPublicKey::try_from(point),
        other => Err(CodecError::invalid_key(format!(
            "after attempting key compression, the key has an invalid length: \
             expected {COMPRESSED_POINT_LEN}, received {other}"
        ))),
    }
}

/// Convert a DER ECDSA-Sig-Value into a fixed-size `r || s` signature.
///
/// # Errors
///
/// Returns [`CodecError::InvalidSignatureEncoding`] if the DER is malformed,
/// has trailing bytes, encodes a negative integer, or a component carries more
/// than 32 significant bytes.
pub fn canonicalize_signature(der_bytes: &[u8]) -> Result<CanonicalSignature, CodecError> {
    let value = EcdsaSigValue::from_der(der_bytes)
        .map_err(|e| CodecError::invalid_signature(format!("failed to parse ECDSA-Sig-Value: {e}")))?;

    let r = left_pad_scalar("r", value.r.as_bytes())?;
    let s = left_pad_scalar("s", value.s.as_bytes())?;

    Ok(CanonicalSignature::from_scalars(&r, &s))
}

/// Re-encode a fixed-size signature as a minimal DER ECDSA-Sig-Value.
///
/// # Errors
///
/// Returns [`CodecError::InvalidSignatureEncoding`] if the DER writer fails.
pub fn decanonicalize_signature(signature: &CanonicalSignature) -> Result<Vec<u8>, CodecError> {
    let value = EcdsaSigValue {
        r: UintRef::new(signature.r())
            .map_err(|e| CodecError::invalid_signature(format!("invalid r: {e}")))?,
        s: UintRef::new(signature.s())
            .map_err(|e| CodecError::invalid_signature(format!("invalid s: {e}")))?,
    };

    value
        .to_der()
        .map_err(|e| CodecError::invalid_signature(format!("failed to encode ECDSA-Sig-Value: {e}")))
}

fn extract_spki_point(der_bytes: &[u8]) -> Result<&[u8], CodecError> {
    let spki = SubjectPublicKeyInfoRef::try_from(der_bytes)
        .map_err(|e| CodecError::invalid_key(format!("failed to parse SPKI: {e}")))?;

    spki.subject_public_key
        .as_bytes()
        .ok_or_else(|| CodecError::invalid_key("SPKI public key bit string has unused bits"))
}

fn compress_point(point: &[u8]) -> Result<CanonicalPublicKey, CodecError> {
    if point[0] != PREFIX_UNCOMPRESSED {
        return Err(CodecError::invalid_key(format!(
            "invalid uncompressed key prefix 0x{:02x}",
            point[0]
        )));
    }

    let mut x = [0u8; SCALAR_LEN];
    x.copy_from_slice(&point[1..=SCALAR_LEN]);
    let y_is_odd = point[UNCOMPRESSED_POINT_LEN - 1] & 1 == 1;

    Ok(CanonicalPublicKey::from_x_and_parity(&x, y_is_odd))
}

fn left_pad_scalar(name: &str, value: &[u8]) -> Result<[u8; SCALAR_LEN], CodecError> {
    if value.len() > SCALAR_LEN {
        return Err(CodecError::invalid_signature(format!(
            "{name} has {} significant bytes, at most {SCALAR_LEN} allowed",
            value.len()
        )));
    }

    let mut out = [0u8; SCALAR_LEN];
    out[SCALAR_LEN - value.len()..].copy_from_slice(value);
    Ok(out)
}
