//! Decoding of storage keys as delivered by storage event notifications.
//!
//! Event keys encode spaces as `+` and percent-escape everything else, so a
//! literal plus sign arrives as `%2B`. Pluses are turned into spaces first and
//! only then is the key percent-decoded; the other order would turn `%2B`
//! into a space.

use percent_encoding::percent_decode_str;

use crate::error::{Result, UnpackError};

/// Decode an escaped event key into the canonical object key.
pub fn decode(raw_key: &str) -> Result<String> {
    let spaced = raw_key.replace('+', " ");

    if let Some(position) = malformed_escape(&spaced) {
        return Err(UnpackError::Decode {
            key: raw_key.to_string(),
            reason: format!("malformed percent escape at byte {position}"),
        });
    }

    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| UnpackError::Decode {
            key: raw_key.to_string(),
            reason: format!("escapes do not decode to UTF-8: {e}"),
        })
}

/// Byte offset of the first `%` not followed by two hex digits.
fn malformed_escape(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'%')
        .map(|(i, _)| i)
        .find(|&i| {
            !matches!(
                (bytes.get(i + 1), bytes.get(i + 2)),
                (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
        })
}
