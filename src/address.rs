// EVM address validation + EIP-55 checksum encoding.
use sha3::{Digest, Keccak256};

use crate::error::SentinelError;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Syntactic validity: 0x-prefixed, 40 hex chars. Mixed-case input must also
/// carry a correct EIP-55 checksum; uniform-case input is accepted as-is.
pub fn is_address(s: &str) -> bool {
    let hex_part = match s.strip_prefix("0x") {
        Some(h) => h,
        None => return false,
    };
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        checksum_encode(&hex_part.to_ascii_lowercase()) == s
    } else {
        true
    }
}

pub fn is_zero_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(h) => h.len() == 40 && h.chars().all(|c| c == '0'),
        None => false,
    }
}

/// Normalize a syntactically valid address to its EIP-55 checksummed form.
pub fn to_checksum(s: &str) -> Result<String, SentinelError> {
    if !is_address(s) {
        return Err(SentinelError::InvalidAddress(s.to_string()));
    }
    let lower = s[2..].to_ascii_lowercase();
    Ok(checksum_encode(&lower))
}

fn checksum_encode(lower_hex: &str) -> String {
    let digest = Keccak256::digest(lower_hex.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower_hex.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            digest[i / 2] >> 4
        } else {
            digest[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference vector from the EIP-55 spec.
    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn accepts_lowercase_and_checksummed() {
        assert!(is_address(&CHECKSUMMED.to_ascii_lowercase()));
        assert!(is_address(CHECKSUMMED));
        assert!(is_address(ZERO_ADDRESS));
    }

    #[test]
    fn rejects_bad_syntax() {
        assert!(!is_address(""));
        assert!(!is_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")); // no prefix
        assert!(!is_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeA")); // short
        assert!(!is_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAedff")); // long
        assert!(!is_address("0xzzAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")); // non-hex
        assert!(!is_address("not-found"));
    }

    #[test]
    fn rejects_wrong_checksum() {
        // Flip the case of one letter.
        assert!(!is_address("0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
    }

    #[test]
    fn checksum_normalizes_lowercase() {
        let got = to_checksum(&CHECKSUMMED.to_ascii_lowercase()).unwrap();
        assert_eq!(got, CHECKSUMMED);
    }

    #[test]
    fn zero_address_detected() {
        assert!(is_zero_address(ZERO_ADDRESS));
        assert!(!is_zero_address(CHECKSUMMED));
    }
}
