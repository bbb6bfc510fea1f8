//! Little-endian fixed-width integer codecs (wire types `Fixed32`/`Fixed64`).

use bytes::{Buf, BufMut};

use crate::error::{parse_fail_kind, ParseFail};

macro_rules! require {
    ($buf:expr, $len:expr) => {
        if $buf.remaining() < $len {
            return Err(parse_fail_kind::Malformed::new(format!(
                "buffer underflow: need {} bytes, have {}",
                $len,
                $buf.remaining()
            ))
            .into());
        }
    };
}

#[inline]
pub fn write_fixed32(value: u32, buf: &mut impl BufMut) {
    buf.put_u32_le(value);
}

#[inline]
pub fn read_fixed32(buf: &mut impl Buf) -> Result<u32, ParseFail> {
    require!(buf, 4);
    Ok(buf.get_u32_le())
}

#[inline]
pub fn write_fixed64(value: u64, buf: &mut impl BufMut) {
    buf.put_u64_le(value);
}

#[inline]
pub fn read_fixed64(buf: &mut impl Buf) -> Result<u64, ParseFail> {
    require!(buf, 8);
    Ok(buf.get_u64_le())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed32_round_trips() {
        let mut buf = Vec::new();
        write_fixed32(0xdeadbeef, &mut buf);
        assert_eq!(buf, vec![0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(read_fixed32(&mut &buf[..]).unwrap(), 0xdeadbeef);
    }

    #[test]
    fn fixed64_round_trips() {
        let mut buf = Vec::new();
        write_fixed64(0x0123456789abcdef, &mut buf);
        assert_eq!(read_fixed64(&mut &buf[..]).unwrap(), 0x0123456789abcdef);
    }

    #[test]
    fn short_buffer_fails() {
        assert!(read_fixed32(&mut &[0u8, 1, 2][..]).is_err());
        assert!(read_fixed64(&mut &[0u8; 4][..]).is_err());
    }
}
