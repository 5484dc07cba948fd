//! Canonical CBOR encoding of token claims.
//!
//! RFC 8949 Core Deterministic Encoding, restricted to what claims need:
//! - Map with integer keys (0..=7, single-byte encodings, emitted sorted)
//! - Integers use the smallest valid encoding
//! - Text strings with definite lengths
//! - No floats, no indefinite lengths
//!
//! The signature covers these bytes, so the encoding must be identical
//! for identical claims on every host that mints or verifies a token.

use ciborium::value::Value;

use crate::claims::QrClaims;
use crate::error::TokenError;
use crate::types::{BusinessId, RedemptionId};

/// Domain-separation prefix for the signed message.
///
/// Keeps a QR-token signature from being valid in any other context
/// that happens to sign CBOR with the same key.
pub const SIGN_DOMAIN: &[u8] = b"punchcard-qr.v0";

/// Claims field keys (integer keys for compact encoding).
mod keys {
    pub const VERSION: u64 = 0;
    pub const ISSUER: u64 = 1;
    pub const AUDIENCE: u64 = 2;
    pub const BUSINESS_ID: u64 = 3;
    pub const STAMPS_VALUE: u64 = 4;
    pub const REDEMPTION_ID: u64 = 5;
    pub const ISSUED_AT: u64 = 6;
    pub const EXPIRES_AT: u64 = 7;
}

/// Encode claims to canonical CBOR bytes.
pub fn canonical_claims_bytes(claims: &QrClaims) -> Vec<u8> {
    let mut buf = Vec::with_capacity(96);

    // Map header: 8 entries. Keys 0..=7 encode as single ascending
    // bytes, so emitting them in field order is already canonical.
    encode_uint(&mut buf, 5, 8);

    encode_uint(&mut buf, 0, keys::VERSION);
    encode_uint(&mut buf, 0, claims.version as u64);

    encode_uint(&mut buf, 0, keys::ISSUER);
    encode_text(&mut buf, &claims.issuer);

    encode_uint(&mut buf, 0, keys::AUDIENCE);
    encode_text(&mut buf, &claims.audience);

    encode_uint(&mut buf, 0, keys::BUSINESS_ID);
    encode_text(&mut buf, claims.business_id.as_str());

    encode_uint(&mut buf, 0, keys::STAMPS_VALUE);
    encode_uint(&mut buf, 0, claims.stamps_value as u64);

    encode_uint(&mut buf, 0, keys::REDEMPTION_ID);
    encode_text(&mut buf, claims.redemption_id.as_str());

    encode_uint(&mut buf, 0, keys::ISSUED_AT);
    encode_int(&mut buf, claims.issued_at);

    encode_uint(&mut buf, 0, keys::EXPIRES_AT);
    encode_int(&mut buf, claims.expires_at);

    buf
}

/// Construct the signed message: `SIGN_DOMAIN || canonical claims`.
pub fn signed_message(claims_bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SIGN_DOMAIN.len() + claims_bytes.len());
    buf.extend_from_slice(SIGN_DOMAIN);
    buf.extend_from_slice(claims_bytes);
    buf
}

/// Encode a signed 64-bit integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Decode claims from canonical CBOR bytes.
pub fn claims_from_canonical(bytes: &[u8]) -> Result<QrClaims, TokenError> {
    let cursor = std::io::Cursor::new(bytes);
    let value: Value = ciborium::from_reader(cursor)
        .map_err(|e| TokenError::Malformed(format!("claims decode: {}", e)))?;

    let map = match &value {
        Value::Map(m) => m,
        _ => return Err(TokenError::Malformed("expected claims map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
            .map(|(_, v)| v)
    };

    let get_int = |key: u64, name: &str| -> Result<i64, TokenError> {
        match get(key) {
            Some(Value::Integer(i)) => i64::try_from(i128::from(*i))
                .map_err(|_| TokenError::Malformed(format!("{} out of range", name))),
            _ => Err(TokenError::Malformed(format!("missing {}", name))),
        }
    };

    let get_text = |key: u64, name: &str| -> Result<String, TokenError> {
        match get(key) {
            Some(Value::Text(s)) => Ok(s.clone()),
            _ => Err(TokenError::Malformed(format!("missing {}", name))),
        }
    };

    let version = get_int(keys::VERSION, "version")?;
    let version =
        u8::try_from(version).map_err(|_| TokenError::Malformed("invalid version".into()))?;

    let stamps_value = get_int(keys::STAMPS_VALUE, "stamps_value")?;
    let stamps_value = u8::try_from(stamps_value)
        .map_err(|_| TokenError::Malformed("invalid stamps_value".into()))?;

    Ok(QrClaims {
        version,
        issuer: get_text(keys::ISSUER, "issuer")?,
        audience: get_text(keys::AUDIENCE, "audience")?,
        business_id: BusinessId::new(get_text(keys::BUSINESS_ID, "business_id")?),
        stamps_value,
        redemption_id: RedemptionId::new(get_text(keys::REDEMPTION_ID, "redemption_id")?),
        issued_at: get_int(keys::ISSUED_AT, "issued_at")?,
        expires_at: get_int(keys::EXPIRES_AT, "expires_at")?,
    })
}
