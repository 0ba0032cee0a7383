//! Alphabet partitioning for pair compression.
//!
//! Every adjacency of the text is recorded as a [`MultisetEntry`]. After
//! sorting, the symbols are split into two classes so that at least half of
//! the adjacencies cross between them, and the crossing direction that occurs
//! more often is selected. A pair is eligible when its first symbol is in the
//! left class and its second in the right class, so eligible pairs never
//! share a position.

use rayon::prelude::*;

use crate::symbol::Variable;

/// One adjacency `(a, b)` of the text, stored as `(max, min, side)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct MultisetEntry {
    pub larger: Variable,
    pub smaller: Variable,
    /// `false` when the larger symbol came first in the text.
    pub side: bool,
}

impl MultisetEntry {
    #[inline]
    pub fn new(a: Variable, b: Variable) -> Self {
        debug_assert_ne!(a, b, "equal neighbours must be removed by bcomp first");
        if a > b {
            Self {
                larger: a,
                smaller: b,
                side: false,
            }
        } else {
            Self {
                larger: b,
                smaller: a,
                side: true,
            }
        }
    }
}

/// Two-class partition of the symbols in `[offset, offset + sides.len())`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Partition {
    offset: Variable,
    sides: Vec<bool>,
    /// Which class is on the left of an eligible pair.
    left: bool,
}

impl Partition {
    /// Class of `c`.
    #[inline]
    pub fn side(&self, c: Variable) -> bool {
        self.sides[(c - self.offset) as usize]
    }

    #[inline]
    pub fn is_left(&self, c: Variable) -> bool {
        self.side(c) == self.left
    }

    #[inline]
    pub fn is_right(&self, c: Variable) -> bool {
        !self.is_left(c)
    }

    /// True if `(a, b)` is replaced by pcomp.
    #[inline]
    pub fn eligible(&self, a: Variable, b: Variable) -> bool {
        self.is_left(a) && self.is_right(b)
    }

    pub fn left(&self) -> bool {
        self.left
    }
}

pub(crate) fn compute_multiset(text: &[Variable]) -> Vec<MultisetEntry> {
    text.windows(2)
        .map(|w| MultisetEntry::new(w[0], w[1]))
        .collect()
}

pub(crate) fn par_compute_multiset(text: &[Variable]) -> Vec<MultisetEntry> {
    text.par_windows(2)
        .map(|w| MultisetEntry::new(w[0], w[1]))
        .collect()
}

/// Sorts the multiset by `(larger, smaller, side)` with an LSD radix sort.
pub(crate) fn sort_multiset(multiset: &mut Vec<MultisetEntry>) {
    radix_sort_by_key(multiset, |e| u32::from(e.side));
    radix_sort_by_key(multiset, |e| e.smaller);
    radix_sort_by_key(multiset, |e| e.larger);
}

pub(crate) fn par_sort_multiset(multiset: &mut [MultisetEntry]) {
    multiset.par_sort_unstable();
}

/// Stable LSD radix sort on a 32-bit key, one byte per pass. Passes above the
/// highest byte of the largest key are skipped.
fn radix_sort_by_key<T: Copy>(items: &mut Vec<T>, key: impl Fn(&T) -> u32) {
    let Some(max) = items.iter().map(&key).max() else {
        return;
    };
    let mut buffer = Vec::with_capacity(items.len());
    let mut shift = 0;
    while shift < 32 && (max >> shift) > 0 {
        let mut counts = [0usize; 257];
        for item in items.iter() {
            counts[((key(item) >> shift) & 0xff) as usize + 1] += 1;
        }
        for i in 1..257 {
            counts[i] += counts[i - 1];
        }

        buffer.clear();
        buffer.resize(items.len(), items[0]);
        for item in items.iter() {
            let digit = ((key(item) >> shift) & 0xff) as usize;
            buffer[counts[digit]] = *item;
            counts[digit] += 1;
        }
        std::mem::swap(items, &mut buffer);
        shift += 8;
    }
}

/// Assigns classes to the symbols in `[min, max]` from a sorted multiset.
///
/// Symbols are visited in ascending order. A symbol joins the class opposite
/// to the majority of its smaller neighbours, counted with multiplicity:
/// it becomes `true` iff more of them are `false` than `true`. A symbol with
/// no smaller neighbour is `false`. The left class defaults to `false`; call
/// [`choose_direction`] to pick the better direction.
pub(crate) fn compute_partition(
    multiset: &[MultisetEntry],
    min: Variable,
    max: Variable,
) -> Partition {
    let mut sides = vec![false; (max - min) as usize + 1];
    for group in multiset.chunk_by(|a, b| a.larger == b.larger) {
        let c = group[0].larger;
        let (mut l, mut r) = (0usize, 0usize);
        for entry in group {
            debug_assert!(entry.smaller < c);
            if sides[(entry.smaller - min) as usize] {
                r += 1;
            } else {
                l += 1;
            }
        }
        sides[(c - min) as usize] = l > r;
    }
    Partition {
        offset: min,
        sides,
        left: false,
    }
}

/// Counts `false -> true` and `true -> false` adjacencies.
fn count_directions(partition: &Partition, text: &[Variable]) -> (usize, usize) {
    let mut f2t = 0;
    let mut t2f = 0;
    for w in text.windows(2) {
        match (partition.side(w[0]), partition.side(w[1])) {
            (false, true) => f2t += 1,
            (true, false) => t2f += 1,
            _ => {}
        }
    }
    (f2t, t2f)
}

/// Picks the direction covering more positions: `false -> true` unless
/// `true -> false` is strictly more frequent.
pub(crate) fn choose_direction(text: &[Variable], partition: &mut Partition) {
    let (f2t, t2f) = count_directions(partition, text);
    partition.left = t2f > f2t;
}

/// Parallel [`choose_direction`]. Windows spanning chunk boundaries are
/// counted by the chunk holding their first symbol.
pub(crate) fn par_choose_direction(text: &[Variable], partition: &mut Partition) {
    let chunk = text.len().div_ceil(rayon::current_num_threads()).max(1);
    let (f2t, t2f) = (0..text.len())
        .into_par_iter()
        .step_by(chunk)
        .map(|start| {
            let end = (start + chunk + 1).min(text.len());
            count_directions(partition, &text[start..end])
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));
    partition.left = t2f > f2t;
}

/// Full sequential pipeline over a text without equal neighbours.
pub(crate) fn partition(text: &[Variable]) -> Partition {
    let (min, max) = bounds(text);
    let mut multiset = compute_multiset(text);
    sort_multiset(&mut multiset);
    let mut partition = compute_partition(&multiset, min, max);
    choose_direction(text, &mut partition);
    partition
}

/// Full parallel pipeline; runs on the current rayon pool.
pub(crate) fn par_partition(text: &[Variable]) -> Partition {
    let min = text.par_iter().copied().min().unwrap_or(0);
    let max = text.par_iter().copied().max().unwrap_or(0);
    let mut multiset = par_compute_multiset(text);
    par_sort_multiset(&mut multiset);
    let mut partition = compute_partition(&multiset, min, max);
    par_choose_direction(text, &mut partition);
    partition
}

fn bounds(text: &[Variable]) -> (Variable, Variable) {
    text.iter()
        .fold(None, |acc, &c| match acc {
            None => Some((c, c)),
            Some((lo, hi)) => Some((c.min(lo), c.max(hi))),
        })
        .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: [Variable; 24] = [
        2, 1, 2, 1, 8, 1, 6, 2, 3, 5, 4, 1, 7, 4, 1, 6, 2, 3, 5, 4, 1, 3, 2, 1,
    ];

    #[test]
    fn test_multiset_entry() {
        assert_eq!(
            MultisetEntry::new(5, 2),
            MultisetEntry {
                larger: 5,
                smaller: 2,
                side: false
            }
        );
        assert_eq!(
            MultisetEntry::new(2, 5),
            MultisetEntry {
                larger: 5,
                smaller: 2,
                side: true
            }
        );
    }

    #[test]
    fn test_multiset() {
        let multiset = compute_multiset(&TEXT);
        assert_eq!(multiset.len(), TEXT.len() - 1);
        assert_eq!(multiset[0], MultisetEntry::new(2, 1));
        assert_eq!(multiset[3], MultisetEntry::new(1, 8));
        assert_eq!(par_compute_multiset(&TEXT), multiset);
    }

    #[test]
    fn test_sort_multiset() {
        let mut seq = compute_multiset(&TEXT);
        let mut par = seq.clone();
        let mut expected = seq.clone();
        expected.sort();

        sort_multiset(&mut seq);
        par_sort_multiset(&mut par);
        assert_eq!(seq, expected);
        assert_eq!(par, expected);
    }

    #[test]
    fn test_radix_sort_is_stable() {
        let mut items = vec![(300u32, 0), (1, 1), (300, 2), (70_000, 3), (1, 4)];
        radix_sort_by_key(&mut items, |&(k, _)| k);
        assert_eq!(items, vec![(1, 1), (1, 4), (300, 0), (300, 2), (70_000, 3)]);
    }

    #[test]
    fn test_compute_partition() {
        let mut multiset = compute_multiset(&TEXT);
        sort_multiset(&mut multiset);
        let partition = compute_partition(&multiset, 1, 8);

        let expected = [false, true, false, true, false, false, false, true];
        for (c, &side) in (1..=8).zip(expected.iter()) {
            assert_eq!(partition.side(c), side, "symbol {c}");
        }
    }

    #[test]
    fn test_choose_direction() {
        let mut p = partition(&TEXT);
        let (f2t, t2f) = count_directions(&p, &TEXT);
        assert_eq!(p.left(), t2f > f2t);

        let left = p.left();
        par_choose_direction(&TEXT, &mut p);
        assert_eq!(p.left(), left);
    }

    #[test]
    fn test_eligible_pairs_do_not_overlap() {
        let p = partition(&TEXT);
        let eligible: Vec<usize> = (0..TEXT.len() - 1)
            .filter(|&i| p.eligible(TEXT[i], TEXT[i + 1]))
            .collect();
        assert!(!eligible.is_empty());
        for w in eligible.windows(2) {
            assert!(w[1] > w[0] + 1, "pairs at {} and {} overlap", w[0], w[1]);
        }
    }

    #[test]
    fn test_cut_covers_half() {
        let p = partition(&TEXT);
        let (f2t, t2f) = count_directions(&p, &TEXT);
        assert!(2 * (f2t + t2f) >= TEXT.len() - 1);
    }

    #[test]
    fn test_par_partition_matches_sequential() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let par = pool.install(|| par_partition(&TEXT));
        assert_eq!(par, partition(&TEXT));
    }

    #[test]
    fn test_two_symbols() {
        let p = partition(&[4, 9]);
        assert!(p.eligible(4, 9));
        assert!(!p.eligible(9, 4));
    }
}
