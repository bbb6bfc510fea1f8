use bytes::{Buf, BufMut};

use crate::encoding::varint::{decode_varint, encode_varint, encoded_len_varint};
use crate::error::{parse_fail_kind, EncodeFail, ParseFail};

/// Encodes a length delimiter to the buffer.
///
/// An error is returned if the buffer does not have sufficient capacity to
/// hold the delimiter.
pub fn encode_length_delimiter(length: usize, buf: &mut impl BufMut) -> Result<(), EncodeFail> {
    let length = length as u64;
    let required = encoded_len_varint(length);
    let remaining = buf.remaining_mut();
    if required > remaining {
        return Err(EncodeFail::Capacity {
            required,
            remaining,
        });
    }
    encode_varint(length, buf);
    Ok(())
}

/// Returns the encoded length of a length delimiter, between 1 and 10 bytes.
pub fn length_delimiter_len(length: usize) -> usize {
    encoded_len_varint(length as u64)
}

/// Decodes a length delimiter from the buffer, independently of the message
/// payload it prefixes.
pub fn decode_length_delimiter(mut buf: impl Buf) -> Result<usize, ParseFail> {
    let length = decode_varint(&mut buf)?;
    if length > usize::MAX as u64 {
        return Err(parse_fail_kind::Malformed::new(
            "length delimiter exceeds maximum usize value".into(),
        )
        .into());
    }
    Ok(length as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let mut buf = Vec::new();
        encode_length_delimiter(300, &mut buf).unwrap();
        assert_eq!(length_delimiter_len(300), buf.len());
        let decoded = decode_length_delimiter(&buf[..]).unwrap();
        assert_eq!(decoded, 300);
    }
}
