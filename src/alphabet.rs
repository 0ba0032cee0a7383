//! Alphabet compaction.
//!
//! Maps the symbols of a text onto a dense `[0, k)` range while keeping the
//! inverse mapping, so per-symbol tables can be plain vectors.

use rayon::prelude::*;

use crate::error::{RecompressionError, Result};
use crate::symbol::{Text, Variable};

/// Fails with [`RecompressionError::AlphabetBound`] on the first symbol that
/// is not below `alphabet_size`.
pub fn check_alphabet(text: &[Variable], alphabet_size: usize) -> Result<()> {
    match text.iter().find(|&&c| c as usize >= alphabet_size) {
        Some(&symbol) => Err(RecompressionError::AlphabetBound {
            symbol: u64::from(symbol),
            bound: alphabet_size,
        }),
        None => Ok(()),
    }
}

/// Rewrites `text` onto `[0, k)` preserving symbol order and returns the
/// inverse mapping: `mapping[new] == old`, ascending.
///
/// # Example
///
/// ```
/// use recompression::alphabet::replace_letters;
///
/// let mut text = vec![7, 3, 7, 250];
/// let mapping = replace_letters(&mut text, 256).unwrap();
/// assert_eq!(text, vec![1, 0, 1, 2]);
/// assert_eq!(mapping, vec![3, 7, 250]);
/// ```
pub fn replace_letters(text: &mut Text, alphabet_size: usize) -> Result<Vec<Variable>> {
    check_alphabet(text, alphabet_size)?;

    let mut occurs = vec![false; occupied(text)];
    for &c in text.iter() {
        occurs[c as usize] = true;
    }

    let (mapping, rank) = ranks(&occurs);
    for c in text.iter_mut() {
        *c = rank[*c as usize];
    }
    Ok(mapping)
}

/// Parallel [`replace_letters`]: every chunk marks its own occurrences, the
/// marks are merged, then the text is rewritten in parallel.
pub fn par_replace_letters(text: &mut Text, alphabet_size: usize) -> Result<Vec<Variable>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let chunk = text.len().div_ceil(rayon::current_num_threads()).max(1);

    text.par_chunks(chunk)
        .try_for_each(|part| check_alphabet(part, alphabet_size))?;
    let size = text.par_iter().max().map_or(0, |&c| c as usize + 1);

    let occurs = text
        .par_chunks(chunk)
        .map(|part| {
            let mut occurs = vec![false; size];
            for &c in part {
                occurs[c as usize] = true;
            }
            occurs
        })
        .reduce(
            || vec![false; size],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x |= y);
                a
            },
        );

    let (mapping, rank) = ranks(&occurs);
    text.par_iter_mut().for_each(|c| *c = rank[*c as usize]);
    Ok(mapping)
}

/// Compacts a text whose symbols index `mapping`, dropping every entry of
/// `mapping` that no longer occurs. Returns the new alphabet size.
///
/// Used between phases when new symbols have been appended above the current
/// alphabet and some old symbols have disappeared.
pub fn compute_alphabet(text: &mut Text, mapping: &mut Vec<Variable>) -> usize {
    let mut occurs = vec![false; mapping.len()];
    for &c in text.iter() {
        occurs[c as usize] = true;
    }

    let (kept, rank) = ranks(&occurs);
    for c in text.iter_mut() {
        *c = rank[*c as usize];
    }
    *mapping = kept.into_iter().map(|old| mapping[old as usize]).collect();
    mapping.len()
}

/// Size of a table indexed by the symbols of `text`.
fn occupied(text: &[Variable]) -> usize {
    text.iter().max().map_or(0, |&c| c as usize + 1)
}

/// Rank structure over an occurrence vector: the occurring symbols in
/// ascending order, and for each symbol its rank among them.
fn ranks(occurs: &[bool]) -> (Vec<Variable>, Vec<Variable>) {
    let mut present = Vec::new();
    let mut rank = vec![0; occurs.len()];
    for (c, _) in occurs.iter().enumerate().filter(|(_, o)| **o) {
        rank[c] = present.len() as Variable;
        present.push(c as Variable);
    }
    (present, rank)
}
