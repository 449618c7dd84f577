//! Big-endian primitive encoding over `std::io` streams.
//!
//! Strings are written as a `u16` byte length followed by UTF-8 bytes, so a
//! single string is limited to 65535 bytes.

use std::io::{self, Read, Write};

/// Writes fixed-width big-endian primitives and length-prefixed strings.
pub trait DataWrite: Write {
    /// Writes `1` or `0`.
    fn write_bool(&mut self, value: bool) -> io::Result<()> {
        self.write_all(&[u8::from(value)])
    }

    /// Writes one byte.
    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_all(&[value])
    }

    /// Writes a big-endian `i16`.
    fn write_i16(&mut self, value: i16) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Writes a big-endian `i32`.
    fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Writes a big-endian `i64`.
    fn write_i64(&mut self, value: i64) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Writes a big-endian IEEE 754 `f32`.
    fn write_f32(&mut self, value: f32) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Writes a big-endian IEEE 754 `f64`.
    fn write_f64(&mut self, value: f64) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Writes a `u16` length prefix and the UTF-8 bytes of `value`.
    fn write_utf(&mut self, value: &str) -> io::Result<()> {
        let len = u16::try_from(value.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("string of {} bytes exceeds 65535", value.len()),
            )
        })?;
        self.write_all(&len.to_be_bytes())?;
        self.write_all(value.as_bytes())
    }

    /// Writes a collection length as `i32`.
    fn write_len(&mut self, len: usize) -> io::Result<()> {
        let len = i32::try_from(len).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("length {len} exceeds i32"))
        })?;
        self.write_i32(len)
    }
}

impl<W: Write + ?Sized> DataWrite for W {}

/// Reads what [`DataWrite`] writes.
pub trait DataRead: Read {
    /// Reads a byte and treats anything non-zero as `true`.
    fn read_bool(&mut self) -> io::Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads one byte.
    fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Reads a big-endian `i16`.
    fn read_i16(&mut self) -> io::Result<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }

    /// Reads a big-endian `i32`.
    fn read_i32(&mut self) -> io::Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Reads a big-endian `i64`.
    fn read_i64(&mut self) -> io::Result<i64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    /// Reads a big-endian `f32`.
    fn read_f32(&mut self) -> io::Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_be_bytes(buf))
    }

    /// Reads a big-endian `f64`.
    fn read_f64(&mut self) -> io::Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }

    /// Reads a length-prefixed UTF-8 string.
    fn read_utf(&mut self) -> io::Result<String> {
        let mut len = [0u8; 2];
        self.read_exact(&mut len)?;
        let mut bytes = vec![0u8; usize::from(u16::from_be_bytes(len))];
        self.read_exact(&mut bytes)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Reads a collection length written by [`DataWrite::write_len`].
    fn read_len(&mut self) -> io::Result<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, format!("negative length {len}"))
        })
    }
}

impl<R: Read + ?Sized> DataRead for R {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_layout() {
        let mut out: Vec<u8> = Vec::new();
        out.write_i32(1).unwrap();
        out.write_i16(-2).unwrap();
        out.write_bool(true).unwrap();
        assert_eq!(out, vec![0, 0, 0, 1, 0xff, 0xfe, 1]);
    }

    #[test]
    fn test_utf_layout() {
        let mut out: Vec<u8> = Vec::new();
        out.write_utf("add").unwrap();
        assert_eq!(out, vec![0, 3, b'a', b'd', b'd']);
        assert_eq!(out.as_slice().read_utf().unwrap(), "add");
    }

    #[test]
    fn test_utf_too_long() {
        let long = "x".repeat(70_000);
        let err = Vec::<u8>::new().write_utf(&long).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes = [0u8, 2, 0xff, 0xfe];
        let err = (&bytes[..]).read_utf().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_negative_length_rejected() {
        let bytes = (-1i32).to_be_bytes();
        assert!((&bytes[..]).read_len().is_err());
    }

    #[test]
    fn test_truncated_input() {
        let bytes = [0u8, 0, 1];
        let err = (&bytes[..]).read_i32().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_floats() {
        let mut out: Vec<u8> = Vec::new();
        out.write_f64(1.5).unwrap();
        out.write_f32(-0.25).unwrap();
        let mut input = out.as_slice();
        assert_eq!(input.read_f64().unwrap(), 1.5);
        assert_eq!(input.read_f32().unwrap(), -0.25);
    }
}
