//! Little-endian stream writer with alignment padding

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{Result, StreamError, ALIGNMENT};

/// Writer half of the binary stream.
///
/// All multi-byte values are little-endian. The writer tracks its own
/// position so callers can pad to an alignment boundary without the
/// underlying device being seekable.
pub struct StreamWriter<'a> {
    out: &'a mut dyn Write,
    pos: u64,
}

impl<'a> StreamWriter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out, pos: 0 }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.out.write_all(data).map_err(StreamError::from_io)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Pad with zero bytes until the position is a multiple of `size`.
    pub fn align(&mut self, size: u64) -> Result<()> {
        let rem = self.pos % size;
        if rem == 0 {
            return Ok(());
        }
        let mut pad = (size - rem) as usize;
        let zeros = [0u8; 16];
        while pad > 0 {
            let chunk = pad.min(zeros.len());
            self.write_raw(&zeros[..chunk])?;
            pad -= chunk;
        }
        Ok(())
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(v as u8)
    }

    pub fn write_i8(&mut self, v: i8) -> Result<()> {
        self.out.write_i8(v).map_err(StreamError::from_io)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.out.write_u8(v).map_err(StreamError::from_io)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_i16(&mut self, v: i16) -> Result<()> {
        self.out
            .write_i16::<LittleEndian>(v)
            .map_err(StreamError::from_io)?;
        self.pos += 2;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.out
            .write_u16::<LittleEndian>(v)
            .map_err(StreamError::from_io)?;
        self.pos += 2;
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.out
            .write_i32::<LittleEndian>(v)
            .map_err(StreamError::from_io)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.out
            .write_u32::<LittleEndian>(v)
            .map_err(StreamError::from_io)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.out
            .write_i64::<LittleEndian>(v)
            .map_err(StreamError::from_io)?;
        self.pos += 8;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.out
            .write_u64::<LittleEndian>(v)
            .map_err(StreamError::from_io)?;
        self.pos += 8;
        Ok(())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.out
            .write_f32::<LittleEndian>(v)
            .map_err(StreamError::from_io)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.out
            .write_f64::<LittleEndian>(v)
            .map_err(StreamError::from_io)?;
        self.pos += 8;
        Ok(())
    }

    /// Write `i32 length` + bytes, padded with zeros to the next multiple
    /// of four.
    pub fn write_byte_block(&mut self, data: &[u8]) -> Result<()> {
        self.write_i32(data.len() as i32)?;
        self.write_raw(data)?;
        self.align(ALIGNMENT)
    }

    /// Strings share the byte-block convention; the length counts bytes,
    /// not characters.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_byte_block(s.as_bytes())
    }
}
