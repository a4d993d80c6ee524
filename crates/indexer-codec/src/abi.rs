use crate::CodecError;

/// A minimal ABI head/tail reader for the fixed parameter lists used by
/// the four known events: a run of `address`/`uint256` head words,
/// optionally followed by one dynamic `string` whose head word is an
/// offset into the tail.
pub struct WordReader<'a> {
    data: &'a [u8],
}

impl<'a> WordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word(&self, index: usize) -> Result<&'a [u8; 32], CodecError> {
        let start = index * 32;
        let end = start + 32;
        if self.data.len() < end {
            return Err(CodecError::DataTooShort {
                need: end,
                have: self.data.len(),
            });
        }
        Ok(self.data[start..end].try_into().expect("slice is 32 bytes"))
    }

    pub fn read_address(&self, index: usize) -> Result<String, CodecError> {
        let word = self.word(index)?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..32]);
        let addr = indexer_types::Address::from_bytes(bytes);
        Ok(addr.to_string())
    }

    pub fn read_uint256(&self, index: usize) -> Result<String, CodecError> {
        let word = self.word(index)?;
        Ok(u256_be_to_decimal(word))
    }

    /// Reads a dynamic `string` whose head word (at `index`) is a
    /// byte-offset from the start of `data` to its length-prefixed tail.
    pub fn read_string(&self, index: usize) -> Result<String, CodecError> {
        let offset_word = self.word(index)?;
        let offset = u256_be_to_usize(offset_word);
        if offset + 32 > self.data.len() {
            return Err(CodecError::OffsetOutOfBounds {
                offset,
                len: self.data.len(),
            });
        }
        let len_word: &[u8; 32] = self.data[offset..offset + 32]
            .try_into()
            .expect("slice is 32 bytes");
        let len = u256_be_to_usize(len_word);
        let start = offset + 32;
        let end = start + len;
        if end > self.data.len() {
            return Err(CodecError::OffsetOutOfBounds {
                offset: end,
                len: self.data.len(),
            });
        }
        String::from_utf8(self.data[start..end].to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

/// Renders a big-endian 256-bit word as its decimal string, the canonical
/// representation `ArgValue::Uint` requires.
fn u256_be_to_decimal(word: &[u8; 32]) -> String {
    // Skip leading zero bytes, then accumulate via repeated base-256 long
    // division into decimal — avoids pulling in a bignum dependency for a
    // word that is, in practice, almost always far smaller than 2^128.
    let mut digits = vec![0u8]; // decimal digits, little-endian
    for &byte in word {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            let value = *digit as u32 * 256 + carry;
            *digit = (value % 10) as u8;
            carry = value / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }
    while digits.len() > 1 && *digits.last().unwrap() == 0 {
        digits.pop();
    }
    digits
        .iter()
        .rev()
        .map(|d| (d + b'0') as char)
        .collect()
}

fn u256_be_to_usize(word: &[u8; 32]) -> usize {
    let mut value: u128 = 0;
    for &byte in &word[16..32] {
        value = (value << 8) | byte as u128;
    }
    value as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_conversion_matches_known_value() {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&2_000_000_000_000_000_000u128.to_be_bytes());
        assert_eq!(u256_be_to_decimal(&word), "2000000000000000000");
    }

    #[test]
    fn zero_word_is_zero() {
        assert_eq!(u256_be_to_decimal(&[0u8; 32]), "0");
    }
}
