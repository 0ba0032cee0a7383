//! Fixed-width coder: every id stored in the minimal width for the largest
//! id of the grammar.
//!
//! Layout: empty flag, the width `w` (6 bits, minus one), rule count,
//! terminal count, root and block count in `w` bits each, the width of block
//! counts (6 bits, minus one), then per rule a tag bit (set for blocks), the
//! first operand in `w` bits and either the second operand in `w` bits or
//! the repetition count.

use super::bitstream::{BitReader, BitWriter};
use super::{variable, Decoder, Encoder, Header};
use crate::error::{RecompressionError, Result};
use crate::rlslp::Rlslp;
use crate::symbol::{bits_for, Production};

/// Coder storing every field in a grammar-specific fixed width.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCoder;

impl FixedCoder {
    fn write(rlslp: &Rlslp, header: Header) -> Vec<u8> {
        let width = bits_for(header.terminals + header.size);
        let count_bits = bits_for(
            rlslp
                .non_terminals
                .iter()
                .filter_map(|nt| match nt.production {
                    Production::Block { count, .. } => Some(u64::from(count)),
                    Production::Pair { .. } => None,
                })
                .max()
                .unwrap_or(0),
        );

        let mut writer = BitWriter::new();
        writer.write_bit(header.empty);
        writer.write_bits(u32::from(width - 1), 6);
        writer.write_u64(header.size, width);
        writer.write_u64(header.terminals, width);
        writer.write_u64(header.root, width);
        writer.write_u64(header.blocks, width);
        writer.write_bits(u32::from(count_bits - 1), 6);

        for nt in &rlslp.non_terminals {
            match nt.production {
                Production::Pair { first, second } => {
                    writer.write_bit(false);
                    writer.write_u64(u64::from(first), width);
                    writer.write_u64(u64::from(second), width);
                }
                Production::Block { symbol, count } => {
                    writer.write_bit(true);
                    writer.write_u64(u64::from(symbol), width);
                    writer.write_u64(u64::from(count), count_bits);
                }
            }
        }
        writer.finish()
    }
}

impl Encoder for FixedCoder {
    fn encode(&self, rlslp: &Rlslp) -> Vec<u8> {
        Self::write(rlslp, Header::of(rlslp))
    }
}

impl Decoder for FixedCoder {
    fn decode(&self, bytes: &[u8]) -> Result<Rlslp> {
        let mut reader = BitReader::new(bytes);
        let empty = reader.read_bit()?;
        let width = reader.read_bits(6)? as u8 + 1;
        let header = Header {
            empty,
            size: reader.read_u64(width)?,
            terminals: reader.read_u64(width)?,
            root: reader.read_u64(width)?,
            blocks: reader.read_u64(width)?,
        };
        let count_bits = reader.read_bits(6)? as u8 + 1;
        let min_rule_bits = 1 + u64::from(width) + u64::from(width.min(count_bits));
        header.check_size(reader.remaining_bits(), min_rule_bits)?;

        let mut productions = Vec::with_capacity(header.size as usize);
        for _ in 0..header.size {
            let is_block = reader.read_bit()?;
            let first = variable(reader.read_u64(width)?)?;
            let production = if is_block {
                let count = reader.read_u64(count_bits)?;
                Production::Block {
                    symbol: first,
                    count: u32::try_from(count).map_err(|_| {
                        RecompressionError::decode(format!(
                            "block count {} out of range",
                            count
                        ))
                    })?,
                }
            } else {
                Production::Pair {
                    first,
                    second: variable(reader.read_u64(width)?)?,
                }
            };
            productions.push(production);
        }

        header.check_blocks(&productions)?;
        Rlslp::from_productions(header.terminals()?, productions, header.root()?)
    }
}
