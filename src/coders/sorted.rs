//! Sorted coder: rules grouped and sorted, stored as gamma-coded deltas.
//!
//! Pair rules come first, ordered by `(first, second)`, followed by block
//! rules ordered by `(symbol, count)`. Rules are renumbered to match their
//! position on disk, so consecutive rules have close operands and the deltas
//! stay small. The order on disk is generally not a valid creation order;
//! the decoder renumbers the rules topologically.
//!
//! Layout: empty flag, then terminal count, rule count, block count and root
//! as gamma codes of `value + 1`; then per rule the signed deltas of both
//! fields against the previous rule of the same group.

use super::bitstream::{BitReader, BitWriter};
use super::{variable, Decoder, Encoder, Header};
use crate::error::{RecompressionError, Result};
use crate::rlslp::Rlslp;
use crate::symbol::{Production, Variable};

/// Each rule takes at least two signed codes of two bits.
const MIN_RULE_BITS: u64 = 4;

/// Coder storing sorted rules as Elias-gamma coded deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedCoder;

/// Position of every rule on disk, pairs before blocks.
fn disk_order(rlslp: &Rlslp) -> Vec<usize> {
    let key = |k: &usize| {
        let p = rlslp.non_terminals[*k].production;
        let (first, second) = p.to_signed();
        (p.is_block(), first, second.unsigned_abs())
    };
    let mut order: Vec<usize> = (0..rlslp.size()).collect();
    order.sort_by_key(key);
    order
}

/// Writes `values` as signed deltas, each against its predecessor.
fn write_deltas(writer: &mut BitWriter, previous: &mut [i64; 2], values: [i64; 2]) {
    for (prev, value) in previous.iter_mut().zip(values) {
        writer.write_signed(value - *prev);
        *prev = value;
    }
}

fn read_deltas(reader: &mut BitReader<'_>, previous: &mut [i64; 2]) -> Result<[u64; 2]> {
    let mut values = [0u64; 2];
    for (prev, value) in previous.iter_mut().zip(values.iter_mut()) {
        let delta = reader.read_signed()?;
        *prev = prev.checked_add(delta).ok_or_else(|| {
            RecompressionError::decode(format!("delta overflow at bit {}", reader.bit_position()))
        })?;
        *value = u64::try_from(*prev).map_err(|_| {
            RecompressionError::decode(format!(
                "negative field {} at bit {}",
                prev,
                reader.bit_position()
            ))
        })?;
    }
    Ok(values)
}

impl Encoder for SortedCoder {
    fn encode(&self, rlslp: &Rlslp) -> Vec<u8> {
        let header = Header::of(rlslp);
        let terminals = rlslp.terminals;
        let order = disk_order(rlslp);
        let mut new_id = vec![0 as Variable; order.len()];
        for (position, &k) in order.iter().enumerate() {
            new_id[k] = (terminals + position) as Variable;
        }
        let rename = |v: Variable| -> i64 {
            match (v as usize).checked_sub(terminals) {
                Some(k) => i64::from(new_id[k]),
                None => i64::from(v),
            }
        };

        let mut writer = BitWriter::new();
        writer.write_bit(header.empty);
        writer.write_gamma0(header.terminals);
        writer.write_gamma0(header.size);
        writer.write_gamma0(header.blocks);
        writer.write_gamma0(if header.empty {
            0
        } else {
            rename(rlslp.root) as u64
        });

        let mut pairs = [0i64; 2];
        let mut blocks = [0i64; 2];
        for &k in &order {
            match rlslp.non_terminals[k].production {
                Production::Pair { first, second } => {
                    write_deltas(&mut writer, &mut pairs, [rename(first), rename(second)]);
                }
                Production::Block { symbol, count } => {
                    write_deltas(&mut writer, &mut blocks, [rename(symbol), i64::from(count)]);
                }
            }
        }
        writer.finish()
    }
}

impl Decoder for SortedCoder {
    fn decode(&self, bytes: &[u8]) -> Result<Rlslp> {
        let mut reader = BitReader::new(bytes);
        let header = Header {
            empty: reader.read_bit()?,
            terminals: reader.read_gamma0()?,
            size: reader.read_gamma0()?,
            blocks: reader.read_gamma0()?,
            root: reader.read_gamma0()?,
        };
        if header.blocks > header.size {
            return Err(RecompressionError::mismatch(header.size, header.blocks));
        }
        header.check_size(reader.remaining_bits(), MIN_RULE_BITS)?;

        let mut productions = Vec::with_capacity(header.size as usize);
        let mut pairs = [0i64; 2];
        for _ in 0..header.size - header.blocks {
            let [first, second] = read_deltas(&mut reader, &mut pairs)?;
            productions.push(Production::Pair {
                first: variable(first)?,
                second: variable(second)?,
            });
        }
        let mut blocks = [0i64; 2];
        for _ in 0..header.blocks {
            let [symbol, count] = read_deltas(&mut reader, &mut blocks)?;
            productions.push(Production::Block {
                symbol: variable(symbol)?,
                count: u32::try_from(count).map_err(|_| {
                    RecompressionError::decode(format!("block count {} out of range", count))
                })?,
            });
        }

        Rlslp::from_unordered(header.terminals()?, productions, header.root()?)
    }
}
