//! Little-endian stream reader with alignment padding

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::{Result, StreamError, ALIGNMENT};

/// Reader half of the binary stream.
///
/// Mirrors [`StreamWriter`](crate::StreamWriter): little-endian values,
/// position tracking for alignment skips. Every method returns `Err` on
/// the first failure and leaves the destination untouched; callers are
/// expected to propagate with `?` and discard partial results.
pub struct StreamReader<'a> {
    input: &'a mut dyn Read,
    pos: u64,
}

impl<'a> StreamReader<'a> {
    pub fn new(input: &'a mut dyn Read) -> Self {
        Self { input, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn read_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        self.input.read_exact(buf).map_err(StreamError::from_io)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        let mut remaining = len;
        let mut scratch = [0u8; 64];
        while remaining > 0 {
            let chunk = remaining.min(scratch.len());
            self.read_raw(&mut scratch[..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }

    /// Skip padding until the position is a multiple of `size`.
    pub fn align(&mut self, size: u64) -> Result<()> {
        let rem = self.pos % size;
        if rem == 0 {
            return Ok(());
        }
        self.skip((size - rem) as usize)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        let v = self.input.read_i8().map_err(StreamError::from_io)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let v = self.input.read_u8().map_err(StreamError::from_io)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let v = self
            .input
            .read_i16::<LittleEndian>()
            .map_err(StreamError::from_io)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let v = self
            .input
            .read_u16::<LittleEndian>()
            .map_err(StreamError::from_io)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let v = self
            .input
            .read_i32::<LittleEndian>()
            .map_err(StreamError::from_io)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let v = self
            .input
            .read_u32::<LittleEndian>()
            .map_err(StreamError::from_io)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let v = self
            .input
            .read_i64::<LittleEndian>()
            .map_err(StreamError::from_io)?;
        self.pos += 8;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let v = self
            .input
            .read_u64::<LittleEndian>()
            .map_err(StreamError::from_io)?;
        self.pos += 8;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let v = self
            .input
            .read_f32::<LittleEndian>()
            .map_err(StreamError::from_io)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let v = self
            .input
            .read_f64::<LittleEndian>()
            .map_err(StreamError::from_io)?;
        self.pos += 8;
        Ok(v)
    }

    /// Read a length-prefixed byte block and skip its trailing padding.
    pub fn read_byte_block(&mut self) -> Result<Vec<u8>> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(StreamError::InvalidLength(len as i64));
        }
        let mut data = vec![0u8; len as usize];
        self.read_raw(&mut data)?;
        self.align(ALIGNMENT)?;
        Ok(data)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let data = self.read_byte_block()?;
        Ok(String::from_utf8(data)?)
    }

    /// Read a non-negative `i32` length field, typically an element count.
    pub fn read_len(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(StreamError::InvalidLength(len as i64));
        }
        Ok(len as usize)
    }
}
