//! In-memory bit streams used by the grammar coders.
//!
//! Bits are packed LSB-first within each byte. Values wider than 32 bits are
//! written as two halves, low half first. Elias-gamma codes store the unary
//! length as zero bits followed by a one bit, then the remaining bits of the
//! value.

use crate::error::{RecompressionError, Result};

/// Bit writer collecting its output in a byte vector.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// Completed bytes.
    bytes: Vec<u8>,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of bits in buffer.
    bits_in_buffer: u8,
    /// Total bits written.
    total_bits_written: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.total_bits_written
    }

    #[inline]
    fn flush_bytes(&mut self) {
        while self.bits_in_buffer >= 8 {
            self.bytes.push((self.buffer & 0xFF) as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Write up to 32 bits, LSB-first.
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32, "Cannot write more than 32 bits at once");
        if count == 0 {
            return;
        }

        let mask = (1u64 << count) - 1;
        self.buffer |= (u64::from(value) & mask) << self.bits_in_buffer;
        self.bits_in_buffer += count;
        self.total_bits_written += u64::from(count);
        self.flush_bytes();
    }

    /// Write up to 64 bits.
    pub fn write_u64(&mut self, value: u64, count: u8) {
        debug_assert!(count <= 64);
        let low = count.min(32);
        self.write_bits(value as u32, low);
        self.write_bits((value >> 32) as u32, count - low);
    }

    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u32::from(bit), 1);
    }

    /// Elias-gamma code of `value >= 1`.
    pub fn write_gamma(&mut self, value: u64) {
        debug_assert!(value >= 1, "gamma codes start at one");
        let width = 64 - value.leading_zeros() as u8;
        for _ in 1..width {
            self.write_bit(false);
        }
        self.write_bit(true);
        self.write_u64(value, width - 1);
    }

    /// Gamma code of `value + 1`, for values below `u64::MAX` that may be
    /// zero.
    pub fn write_gamma0(&mut self, value: u64) {
        debug_assert!(value < u64::MAX);
        self.write_gamma(value.saturating_add(1));
    }

    /// Sign bit followed by the gamma code of the magnitude.
    pub fn write_signed(&mut self, value: i64) {
        self.write_bit(value < 0);
        self.write_gamma0(value.unsigned_abs());
    }

    /// Pads the last byte with zeros and returns the output.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bits_in_buffer > 0 {
            self.bytes.push((self.buffer & 0xFF) as u8);
        }
        self.bytes
    }
}

/// Bit reader over a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next byte of `data` to load.
    next_byte: usize,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
    /// Total bits read (for error reporting).
    total_bits_read: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            next_byte: 0,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_read: 0,
        }
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Bits left before the end of the input, padding included.
    pub fn remaining_bits(&self) -> u64 {
        u64::from(self.bits_in_buffer) + (self.data.len() - self.next_byte) as u64 * 8
    }

    #[inline]
    fn fill_buffer(&mut self, count: u8) -> Result<()> {
        while self.bits_in_buffer < count {
            let Some(&byte) = self.data.get(self.next_byte) else {
                return Err(RecompressionError::UnexpectedEof {
                    bit_position: self.total_bits_read,
                });
            };
            self.buffer |= u64::from(byte) << self.bits_in_buffer;
            self.bits_in_buffer += 8;
            self.next_byte += 1;
        }
        Ok(())
    }

    /// Read up to 32 bits, the first bit read in the LSB position.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");
        if count == 0 {
            return Ok(0);
        }

        self.fill_buffer(count)?;
        let mask = (1u64 << count) - 1;
        let result = (self.buffer & mask) as u32;
        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.total_bits_read += u64::from(count);
        Ok(result)
    }

    /// Read up to 64 bits.
    pub fn read_u64(&mut self, count: u8) -> Result<u64> {
        debug_assert!(count <= 64);
        let low = count.min(32);
        let lo = u64::from(self.read_bits(low)?);
        let hi = u64::from(self.read_bits(count - low)?);
        Ok(lo | (hi << 32))
    }

    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Reads a code written by [`BitWriter::write_gamma`].
    pub fn read_gamma(&mut self) -> Result<u64> {
        let mut zeros = 0u8;
        while !self.read_bit()? {
            zeros += 1;
            if zeros > 63 {
                return Err(RecompressionError::decode(format!(
                    "gamma code longer than 64 bits at bit {}",
                    self.total_bits_read
                )));
            }
        }
        let rest = self.read_u64(zeros)?;
        Ok((1u64 << zeros) | rest)
    }

    /// Reads a code written by [`BitWriter::write_gamma0`].
    pub fn read_gamma0(&mut self) -> Result<u64> {
        Ok(self.read_gamma()? - 1)
    }

    /// Reads a code written by [`BitWriter::write_signed`].
    pub fn read_signed(&mut self) -> Result<i64> {
        let negative = self.read_bit()?;
        let magnitude = self.read_gamma0()?;
        let value = if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        value.ok_or_else(|| {
            RecompressionError::decode(format!(
                "signed value out of range at bit {}",
                self.total_bits_read
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3);
        writer.write_bits(0b1100, 4);
        writer.write_bit(true);
        writer.write_bits(0xDEAD_BEEF, 32);
        assert_eq!(writer.bits_written(), 40);
        let bytes = writer.finish();
        assert_eq!(bytes.len(), 5);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(32).unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.bit_position(), 40);
    }

    #[test]
    fn test_lsb_first() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bit(false);
        writer.write_bit(true);
        assert_eq!(writer.finish(), vec![0b101]);
    }

    #[test]
    fn test_u64() {
        let mut writer = BitWriter::new();
        writer.write_u64(u64::MAX - 5, 64);
        writer.write_u64(1 << 40, 41);
        writer.write_u64((-22i64) as u64, 64);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_u64(64).unwrap(), u64::MAX - 5);
        assert_eq!(reader.read_u64(41).unwrap(), 1 << 40);
        assert_eq!(reader.read_u64(64).unwrap() as i64, -22);
    }

    #[test]
    fn test_gamma() {
        let values = [1u64, 2, 3, 4, 7, 8, 1000, u64::MAX];
        let mut writer = BitWriter::new();
        for &v in &values {
            writer.write_gamma(v);
        }
        writer.write_gamma0(0);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        for &v in &values {
            assert_eq!(reader.read_gamma().unwrap(), v);
        }
        assert_eq!(reader.read_gamma0().unwrap(), 0);
    }

    #[test]
    fn test_gamma_lengths() {
        let mut writer = BitWriter::new();
        writer.write_gamma(1);
        assert_eq!(writer.bits_written(), 1);
        writer.write_gamma(5);
        assert_eq!(writer.bits_written(), 6);
    }

    #[test]
    fn test_signed() {
        let values = [0i64, 1, -1, 17, -300, i64::MAX, i64::MIN];
        let mut writer = BitWriter::new();
        for &v in &values {
            writer.write_signed(v);
        }
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        for &v in &values {
            assert_eq!(reader.read_signed().unwrap(), v);
        }
    }

    #[test]
    fn test_unexpected_eof() {
        let mut reader = BitReader::new(&[0xFF]);
        assert_eq!(reader.read_bits(8).unwrap(), 0xFF);
        assert!(matches!(
            reader.read_bit(),
            Err(RecompressionError::UnexpectedEof { bit_position: 8 })
        ));
    }

    #[test]
    fn test_remaining_bits() {
        let bytes = [0u8; 3];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.remaining_bits(), 24);
        reader.read_bits(5).unwrap();
        assert_eq!(reader.remaining_bits(), 19);
    }

    #[test]
    fn test_runaway_gamma() {
        let bytes = [0u8; 16];
        let mut reader = BitReader::new(&bytes);
        assert!(matches!(
            reader.read_gamma(),
            Err(RecompressionError::Decode { .. })
        ));
    }
}
