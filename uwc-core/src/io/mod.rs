// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements length-checked, little-endian byte-level I/O.
//!
//! All readers implement the [`ReadBytes`] trait, and any [`std::io::Write`] implements the
//! [`WriteBytes`] trait. Every multi-byte accessor is named after the width it consumes or
//! produces so that a fixed binary layout can be expressed field-by-field.

use std::io;

mod buf_reader;

pub use buf_reader::BufReader;

/// `ReadBytes` provides methods to read bytes and interpret them as little-endian integers or
/// floating-point values of standard widths.
pub trait ReadBytes {
    /// Reads a single byte from the stream and returns it or an error.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Reads two bytes from the stream and returns them in read-order or an error.
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]>;

    /// Reads four bytes from the stream and returns them in read-order or an error.
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]>;

    /// Reads exactly the number of bytes required to fill be provided buffer or returns an error.
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Ignores the specified number of bytes from the stream or returns an error.
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()>;

    /// Gets the position of the stream.
    fn pos(&self) -> u64;

    /// Reads a single unsigned byte from the stream and returns it or an error.
    #[inline(always)]
    fn read_u8(&mut self) -> io::Result<u8> {
        self.read_byte()
    }

    /// Reads two bytes from the stream and interprets them as an unsigned 16-bit little-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_le_bytes(self.read_double_bytes()?))
    }

    /// Reads two bytes from the stream and interprets them as an signed 16-bit little-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_i16(&mut self) -> io::Result<i16> {
        Ok(i16::from_le_bytes(self.read_double_bytes()?))
    }

    /// Reads four bytes from the stream and interprets them as an unsigned 32-bit little-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_le_bytes(self.read_quad_bytes()?))
    }

    /// Reads four bytes from the stream and interprets them as an signed 32-bit little-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_i32(&mut self) -> io::Result<i32> {
        Ok(i32::from_le_bytes(self.read_quad_bytes()?))
    }

    /// Reads four bytes from the stream and interprets them as a 32-bit little-endian IEEE-754
    /// floating-point value.
    #[inline(always)]
    fn read_f32(&mut self) -> io::Result<f32> {
        Ok(f32::from_le_bytes(self.read_quad_bytes()?))
    }

    /// Reads exactly the number of bytes requested, and returns a boxed slice of the data or an
    /// error.
    fn read_boxed_slice_exact(&mut self, len: usize) -> io::Result<Box<[u8]>> {
        let mut buf = vec![0u8; len];
        self.read_buf_exact(&mut buf)?;
        Ok(buf.into_boxed_slice())
    }
}

impl<R: ReadBytes> ReadBytes for &mut R {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        (*self).read_byte()
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        (*self).read_double_bytes()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        (*self).read_quad_bytes()
    }

    #[inline(always)]
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (*self).read_buf_exact(buf)
    }

    #[inline(always)]
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        (*self).ignore_bytes(count)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

impl<F: FiniteStream> FiniteStream for &mut F {
    fn byte_len(&self) -> u64 {
        (**self).byte_len()
    }

    fn bytes_read(&self) -> u64 {
        (**self).bytes_read()
    }

    fn bytes_available(&self) -> u64 {
        (**self).bytes_available()
    }
}

/// A `FiniteStream` is a stream that has a known length in bytes.
pub trait FiniteStream {
    /// Returns the length of the the stream in bytes.
    fn byte_len(&self) -> u64;

    /// Returns the number of bytes that have been read.
    fn bytes_read(&self) -> u64;

    /// Returns the number of bytes available for reading.
    fn bytes_available(&self) -> u64;
}

/// `WriteBytes` provides methods to emit little-endian integers and floating-point values of
/// standard widths. It is implemented for every [`std::io::Write`].
pub trait WriteBytes {
    /// Writes the entire buffer or returns an error.
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Writes four bytes in the order given.
    #[inline(always)]
    fn write_quad_bytes(&mut self, bytes: [u8; 4]) -> io::Result<()> {
        self.write_buf(&bytes)
    }

    /// Writes an unsigned 16-bit integer in little-endian byte order.
    #[inline(always)]
    fn write_u16(&mut self, value: u16) -> io::Result<()> {
        self.write_buf(&value.to_le_bytes())
    }

    /// Writes a signed 16-bit integer in little-endian byte order.
    #[inline(always)]
    fn write_i16(&mut self, value: i16) -> io::Result<()> {
        self.write_buf(&value.to_le_bytes())
    }

    /// Writes an unsigned 32-bit integer in little-endian byte order.
    #[inline(always)]
    fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.write_buf(&value.to_le_bytes())
    }

    /// Writes a signed 32-bit integer in little-endian byte order.
    #[inline(always)]
    fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.write_buf(&value.to_le_bytes())
    }

    /// Writes a 32-bit IEEE-754 floating-point value in little-endian byte order.
    #[inline(always)]
    fn write_f32(&mut self, value: f32) -> io::Result<()> {
        self.write_buf(&value.to_le_bytes())
    }
}

impl<W: io::Write + ?Sized> WriteBytes for W {
    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::{BufReader, ReadBytes, WriteBytes};

    #[test]
    fn verify_write_then_read_widths() {
        let mut out: Vec<u8> = Vec::new();

        out.write_quad_bytes(*b"fact").unwrap();
        out.write_u16(0xbeef).unwrap();
        out.write_i16(-2).unwrap();
        out.write_u32(0xdead_beef).unwrap();
        out.write_i32(-70000).unwrap();
        out.write_f32(123.5).unwrap();

        assert_eq!(out.len(), 4 + 2 + 2 + 4 + 4 + 4);
        assert_eq!(&out[4..6], &[0xef, 0xbe]);

        let mut reader = BufReader::new(&out);

        assert_eq!(reader.read_quad_bytes().unwrap(), *b"fact");
        assert_eq!(reader.read_u16().unwrap(), 0xbeef);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(reader.read_i32().unwrap(), -70000);
        assert_eq!(reader.read_f32().unwrap(), 123.5);
        assert!(reader.read_u8().is_err());
    }
}
