//! Plain coder: fixed-width fields, rules in creation order.
//!
//! Layout: empty flag (1 bit), rule count (64), terminal count (64), root
//! (32), block count (64), then per rule the first operand (32) and the
//! sign-encoded second field (64, two's complement).

use super::bitstream::{BitReader, BitWriter};
use super::{Decoder, Encoder, Header};
use crate::error::{RecompressionError, Result};
use crate::rlslp::Rlslp;
use crate::symbol::Production;

const RULE_BITS: u64 = 32 + 64;

/// Coder with fixed 32/64-bit fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCoder;

impl PlainCoder {
    fn write(rlslp: &Rlslp, header: Header) -> Vec<u8> {
        let mut writer = BitWriter::new();
        writer.write_bit(header.empty);
        writer.write_u64(header.size, 64);
        writer.write_u64(header.terminals, 64);
        writer.write_bits(header.root as u32, 32);
        writer.write_u64(header.blocks, 64);

        for nt in &rlslp.non_terminals {
            let (first, second) = nt.production.to_signed();
            writer.write_bits(first, 32);
            writer.write_u64(second as u64, 64);
        }
        writer.finish()
    }
}

impl Encoder for PlainCoder {
    fn encode(&self, rlslp: &Rlslp) -> Vec<u8> {
        Self::write(rlslp, Header::of(rlslp))
    }
}

impl Decoder for PlainCoder {
    fn decode(&self, bytes: &[u8]) -> Result<Rlslp> {
        let mut reader = BitReader::new(bytes);
        let header = Header {
            empty: reader.read_bit()?,
            size: reader.read_u64(64)?,
            terminals: reader.read_u64(64)?,
            root: u64::from(reader.read_bits(32)?),
            blocks: reader.read_u64(64)?,
        };
        header.check_size(reader.remaining_bits(), RULE_BITS)?;

        let mut productions = Vec::with_capacity(header.size as usize);
        for _ in 0..header.size {
            let first = reader.read_bits(32)?;
            let second = reader.read_u64(64)? as i64;
            let production = Production::from_signed(first, second).ok_or_else(|| {
                RecompressionError::decode(format!(
                    "invalid rule ({}, {}) at bit {}",
                    first,
                    second,
                    reader.bit_position()
                ))
            })?;
            productions.push(production);
        }

        header.check_blocks(&productions)?;
        Rlslp::from_productions(header.terminals()?, productions, header.root()?)
    }
}
