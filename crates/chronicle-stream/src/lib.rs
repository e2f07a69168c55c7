//! Chronicle binary stream layer
//!
//! A little-endian, alignment-padded byte stream shared by every wire
//! format in the workspace: variants, node records and action records all
//! encode through [`StreamWriter`] and decode through [`StreamReader`].
//!
//! Strings and raw byte blocks are written as an `i32` length, the bytes,
//! then zero padding up to the next four-byte boundary. Readers fail fast:
//! the first decode error is returned and partial results are dropped.

mod error;
mod reader;
mod writer;

pub use error::{Result, StreamError};
pub use reader::StreamReader;
pub use writer::StreamWriter;

/// Streams pad strings and byte blocks to this boundary.
pub const ALIGNMENT: u64 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_roundtrip() {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            w.write_bool(true).unwrap();
            w.write_i8(-5).unwrap();
            w.write_u16(0xBEEF).unwrap();
            w.write_i32(-123456).unwrap();
            w.write_u64(0xDEAD_BEEF_CAFE).unwrap();
            w.write_f64(2.5).unwrap();
        }

        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_i8().unwrap(), -5);
        assert_eq!(r.read_u16().unwrap(), 0xBEEF);
        assert_eq!(r.read_i32().unwrap(), -123456);
        assert_eq!(r.read_u64().unwrap(), 0xDEAD_BEEF_CAFE);
        assert_eq!(r.read_f64().unwrap(), 2.5);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            w.write_u32(0x0403_0201).unwrap();
        }
        assert_eq!(buf, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_string_padding() {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            w.write_string("hello").unwrap();
        }
        // 4 length bytes + 5 payload bytes + 3 padding bytes
        assert_eq!(buf.len(), 12);
        assert_eq!(&buf[..4], &[5, 0, 0, 0]);
        assert_eq!(&buf[4..9], b"hello");
        assert_eq!(&buf[9..], &[0, 0, 0]);

        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        assert_eq!(r.read_string().unwrap(), "hello");
        assert_eq!(r.position(), 12);
    }

    #[test]
    fn test_aligned_string_has_no_padding() {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            w.write_string("door").unwrap();
        }
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_truncated_read_fails() {
        let buf = vec![5, 0, 0, 0, b'h', b'i'];
        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        assert!(matches!(
            r.read_string(),
            Err(StreamError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_negative_length_fails() {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            w.write_i32(-1).unwrap();
        }
        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        assert!(matches!(
            r.read_byte_block(),
            Err(StreamError::InvalidLength(-1))
        ));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            w.write_byte_block(&[0xFF, 0xFE]).unwrap();
        }
        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        assert!(matches!(r.read_string(), Err(StreamError::InvalidUtf8(_))));
    }

    #[test]
    fn test_manual_alignment() {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            w.write_u8(1).unwrap();
            w.align(4).unwrap();
            w.write_u32(7).unwrap();
        }
        assert_eq!(buf.len(), 8);

        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        assert_eq!(r.read_u8().unwrap(), 1);
        r.align(4).unwrap();
        assert_eq!(r.read_u32().unwrap(), 7);
    }
}
