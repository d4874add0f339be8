// Minimal ABI codec for the handful of registry read methods. Covers exactly
// the argument and return shapes those methods use; not a general codec.
use sha3::{Digest, Keccak256};

use crate::address;
use crate::error::SentinelError;

const WORD: usize = 32;

/// First four bytes of the Keccak-256 of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Hex calldata string for `eth_call`: selector followed by encoded args.
pub fn call_data(signature: &str, args: &[u8]) -> String {
    let mut data = Vec::with_capacity(4 + args.len());
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(args);
    format!("0x{}", hex::encode(data))
}

fn word_u64(n: u64) -> [u8; WORD] {
    let mut w = [0u8; WORD];
    w[WORD - 8..].copy_from_slice(&n.to_be_bytes());
    w
}

fn padded(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    let rem = out.len() % WORD;
    if rem != 0 {
        out.extend(std::iter::repeat(0u8).take(WORD - rem));
    }
    out
}

/// Single `string` argument.
pub fn encode_string(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&word_u64(WORD as u64)); // offset to data
    out.extend_from_slice(&word_u64(s.len() as u64));
    out.extend_from_slice(&padded(s.as_bytes()));
    out
}

/// Single `string[]` argument.
pub fn encode_string_array(items: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&word_u64(WORD as u64)); // offset to array
    out.extend_from_slice(&word_u64(items.len() as u64));
    // Element offsets are relative to the start of the element area.
    let mut offset = items.len() * WORD;
    let mut tail = Vec::new();
    for s in items {
        out.extend_from_slice(&word_u64(offset as u64));
        let body = padded(s.as_bytes());
        offset += WORD + body.len();
        tail.extend_from_slice(&word_u64(s.len() as u64));
        tail.extend_from_slice(&body);
    }
    out.extend_from_slice(&tail);
    out
}

/// Single `address[]` argument.
pub fn encode_address_array(items: &[&str]) -> Result<Vec<u8>, SentinelError> {
    let mut out = Vec::new();
    out.extend_from_slice(&word_u64(WORD as u64));
    out.extend_from_slice(&word_u64(items.len() as u64));
    for a in items {
        let hex_part = a
            .strip_prefix("0x")
            .ok_or_else(|| SentinelError::InvalidAddress(a.to_string()))?;
        let bytes =
            hex::decode(hex_part).map_err(|_| SentinelError::InvalidAddress(a.to_string()))?;
        if bytes.len() != 20 {
            return Err(SentinelError::InvalidAddress(a.to_string()));
        }
        let mut w = [0u8; WORD];
        w[12..].copy_from_slice(&bytes);
        out.extend_from_slice(&w);
    }
    Ok(out)
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn word(&self, offset: usize) -> Result<&'a [u8], SentinelError> {
        self.data
            .get(offset..offset + WORD)
            .ok_or_else(|| SentinelError::Decode(format!("return data truncated at {}", offset)))
    }

    /// uint256 word that must fit in u64.
    fn uint_at(&self, offset: usize) -> Result<u64, SentinelError> {
        let w = self.word(offset)?;
        if w[..WORD - 8].iter().any(|&b| b != 0) {
            return Err(SentinelError::Decode("uint256 exceeds u64".to_string()));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&w[WORD - 8..]);
        Ok(u64::from_be_bytes(buf))
    }

    /// Offset word, bounds-checked against the buffer.
    fn offset_at(&self, offset: usize) -> Result<usize, SentinelError> {
        let v = self.uint_at(offset)? as usize;
        if v > self.data.len() {
            return Err(SentinelError::Decode(format!("offset {} out of range", v)));
        }
        Ok(v)
    }

    fn len_at(&self, offset: usize) -> Result<usize, SentinelError> {
        let v = self.uint_at(offset)? as usize;
        if v > self.data.len() {
            return Err(SentinelError::Decode(format!("length {} out of range", v)));
        }
        Ok(v)
    }

    fn string_at(&self, offset: usize) -> Result<String, SentinelError> {
        let len = self.len_at(offset)?;
        let bytes = self
            .data
            .get(offset + WORD..offset + WORD + len)
            .ok_or_else(|| SentinelError::Decode("string data truncated".to_string()))?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// `uint256` return.
pub fn decode_uint(data: &[u8]) -> Result<u64, SentinelError> {
    Reader { data }.uint_at(0)
}

/// `uint256[]` return.
pub fn decode_uint_array(data: &[u8]) -> Result<Vec<u64>, SentinelError> {
    let r = Reader { data };
    let off = r.offset_at(0)?;
    let len = r.len_at(off)?;
    (0..len).map(|i| r.uint_at(off + WORD * (i + 1))).collect()
}

/// `address[]` return, checksummed.
pub fn decode_address_array(data: &[u8]) -> Result<Vec<String>, SentinelError> {
    let r = Reader { data };
    let off = r.offset_at(0)?;
    let len = r.len_at(off)?;
    (0..len)
        .map(|i| {
            let w = r.word(off + WORD * (i + 1))?;
            address::to_checksum(&format!("0x{}", hex::encode(&w[12..])))
        })
        .collect()
}

/// `string[][]` return (the shape of `getPeerId`).
pub fn decode_string_matrix(data: &[u8]) -> Result<Vec<Vec<String>>, SentinelError> {
    let r = Reader { data };
    let outer_off = r.offset_at(0)?;
    let outer_len = r.len_at(outer_off)?;
    let outer_base = outer_off + WORD;
    let mut matrix = Vec::with_capacity(outer_len);
    for i in 0..outer_len {
        let inner_off = outer_base + r.offset_at(outer_base + WORD * i)?;
        let inner_len = r.len_at(inner_off)?;
        let inner_base = inner_off + WORD;
        let mut row = Vec::with_capacity(inner_len);
        for j in 0..inner_len {
            let s_off = inner_base + r.offset_at(inner_base + WORD * j)?;
            row.push(r.string_at(s_off)?);
        }
        matrix.push(row);
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(n: u64) -> Vec<u8> {
        word_u64(n).to_vec()
    }

    #[test]
    fn selector_matches_known_vector() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn string_array_layout() {
        let enc = encode_string_array(&["peer"]);
        let mut expect = Vec::new();
        expect.extend(w(0x20)); // arg offset
        expect.extend(w(1)); // array length
        expect.extend(w(0x20)); // element offset
        expect.extend(w(4)); // string length
        let mut body = b"peer".to_vec();
        body.resize(32, 0);
        expect.extend(body);
        assert_eq!(enc, expect);
    }

    #[test]
    fn address_array_word_layout() {
        let addr = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let enc = encode_address_array(&[addr]).unwrap();
        assert_eq!(enc.len(), 96);
        assert_eq!(&enc[64 + 12..], &hex::decode(&addr[2..]).unwrap()[..]);
        assert!(encode_address_array(&["0x1234"]).is_err());
    }

    #[test]
    fn decodes_uint_array() {
        let mut data = Vec::new();
        data.extend(w(0x20));
        data.extend(w(2));
        data.extend(w(17));
        data.extend(w(42));
        assert_eq!(decode_uint_array(&data).unwrap(), vec![17, 42]);
    }

    #[test]
    fn decodes_address_array() {
        let addr = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let mut data = Vec::new();
        data.extend(w(0x20));
        data.extend(w(1));
        let mut word = vec![0u8; 12];
        word.extend(hex::decode(&addr[2..]).unwrap());
        data.extend(word);
        assert_eq!(decode_address_array(&data).unwrap(), vec![addr.to_string()]);
    }

    #[test]
    fn decodes_string_matrix() {
        // [["peerA"]]
        let mut data = Vec::new();
        data.extend(w(0x20)); // offset to outer array
        data.extend(w(1)); // outer length
        data.extend(w(0x20)); // inner[0] offset, relative to outer base
        data.extend(w(1)); // inner length
        data.extend(w(0x20)); // string offset, relative to inner base
        data.extend(w(5)); // string length
        let mut body = b"peerA".to_vec();
        body.resize(32, 0);
        data.extend(body);
        assert_eq!(
            decode_string_matrix(&data).unwrap(),
            vec![vec!["peerA".to_string()]]
        );
    }

    #[test]
    fn truncated_data_is_an_error() {
        assert!(decode_uint(&[0u8; 16]).is_err());
        let mut data = Vec::new();
        data.extend(w(0x20));
        data.extend(w(3)); // claims 3 items, provides none
        assert!(decode_uint_array(&data).is_err());
    }

    #[test]
    fn oversized_uint_rejected() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(decode_uint(&word).is_err());
    }
}
