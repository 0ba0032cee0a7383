//! Shared-memory parallel recompression on a rayon thread pool.
//!
//! Each phase splits the text into one chunk per core and works in three
//! steps:
//!
//! 1. every chunk scans its own positions and records replacements; a run or
//!    pair crossing a chunk boundary belongs to the chunk it starts in, the
//!    next chunk skips its tail
//! 2. the keys of all replacements are sorted in parallel and deduplicated,
//!    nonterminals are created in key order
//! 3. every chunk writes its part of the output text, the parts are
//!    concatenated
//!
//! Chunks never share mutable state; the ids only depend on the text, not on
//! the number of cores.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{finish, run_rounds, Phases, Recompression};
use crate::alphabet::check_alphabet;
use crate::error::Result;
use crate::partition::{self, Partition};
use crate::rlslp::Rlslp;
use crate::symbol::{Text, Variable};

/// Recompression running its phases on a dedicated thread pool.
#[derive(Debug)]
pub struct ParallelRecompression {
    pool: ThreadPool,
    cores: usize,
}

impl ParallelRecompression {
    /// Builds a pool with `cores` threads (at least one).
    pub fn new(cores: usize) -> Result<Self> {
        let cores = cores.max(1);
        let pool = ThreadPoolBuilder::new().num_threads(cores).build()?;
        Ok(Self { pool, cores })
    }

    pub fn cores(&self) -> usize {
        self.cores
    }
}

impl Recompression for ParallelRecompression {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn recomp(&mut self, text: &mut Text, alphabet_size: usize) -> Result<Rlslp> {
        let name = self.name();
        let mut phases = Chunked { parts: self.cores };
        self.pool.install(|| -> Result<Rlslp> {
            let mut rlslp = Rlslp::new(alphabet_size);
            rlslp.reserve_ids(0)?;
            let chunk = text.len().div_ceil(phases.parts).max(1);
            text.par_chunks(chunk)
                .try_for_each(|part| check_alphabet(part, alphabet_size))?;

            let levels = run_rounds(&mut phases, text, &mut rlslp)?;
            finish(name, text, &mut rlslp, levels);
            Ok(rlslp)
        })
    }
}

/// Replacements found in one chunk. The chunk owns the output for text
/// positions `from..to`; `found` holds `(start, span)` of each replacement.
#[derive(Debug, Default)]
struct ChunkScan {
    from: usize,
    to: usize,
    found: Vec<(usize, usize)>,
}

/// Phase implementation splitting the text into `parts` chunks.
#[derive(Debug)]
struct Chunked {
    parts: usize,
}

impl Chunked {
    /// Runs `scan(start, end)` on every chunk, in text order.
    fn scan<F>(&self, n: usize, scan: F) -> Vec<ChunkScan>
    where
        F: Fn(usize, usize) -> ChunkScan + Sync,
    {
        let chunk = n.div_ceil(self.parts).max(1);
        (0..n)
            .into_par_iter()
            .step_by(chunk)
            .map(|start| scan(start, (start + chunk).min(n)))
            .collect()
    }
}

/// Sorted distinct keys of all replacements.
fn collect_keys<K>(scans: &[ChunkScan], key: K) -> Vec<(Variable, u32)>
where
    K: Fn(usize, usize) -> (Variable, u32) + Sync,
{
    let mut keys: Vec<(Variable, u32)> = scans
        .par_iter()
        .flat_map_iter(|scan| scan.found.iter().map(|&(start, span)| key(start, span)))
        .collect();
    keys.par_sort_unstable();
    keys.dedup();
    keys
}

/// Builds the new text chunk by chunk.
fn compact<F>(text: &[Variable], scans: &[ChunkScan], id_of: F) -> Text
where
    F: Fn(usize, usize) -> Variable + Sync,
{
    let parts: Vec<Text> = scans
        .par_iter()
        .map(|scan| {
            let mut out = Vec::with_capacity(scan.to - scan.from);
            let mut p = scan.from;
            for &(start, span) in &scan.found {
                out.extend_from_slice(&text[p..start]);
                out.push(id_of(start, span));
                p = start + span;
            }
            out.extend_from_slice(&text[p..scan.to]);
            out
        })
        .collect();
    parts.concat()
}

/// Maximal runs starting in `start..end`. The tail of a run begun in the
/// previous chunk is skipped.
fn scan_runs(text: &[Variable], start: usize, end: usize) -> ChunkScan {
    let n = text.len();
    let mut p = start;
    if start > 0 {
        let prev = text[start - 1];
        while p < end && text[p] == prev {
            p += 1;
        }
    }

    let mut scan = ChunkScan {
        from: p,
        ..Default::default()
    };
    while p < end {
        let c = text[p];
        let mut q = p + 1;
        while q < n && text[q] == c {
            q += 1;
        }
        if q - p > 1 {
            scan.found.push((p, q - p));
        }
        p = q;
    }
    scan.to = p;
    scan
}

/// Eligible pairs starting in `start..end`. A pair starting at `start - 1`
/// belongs to the previous chunk.
fn scan_pairs(text: &[Variable], partition: &Partition, start: usize, end: usize) -> ChunkScan {
    let n = text.len();
    let mut p = start;
    if start > 0 && partition.eligible(text[start - 1], text[start]) {
        p += 1;
    }

    let mut scan = ChunkScan {
        from: p,
        ..Default::default()
    };
    while p < end {
        if p + 1 < n && partition.eligible(text[p], text[p + 1]) {
            scan.found.push((p, 2));
            p += 2;
        } else {
            p += 1;
        }
    }
    scan.to = p.max(scan.from);
    scan
}

impl Phases for Chunked {
    fn bcomp(&mut self, text: &mut Text, rlslp: &mut Rlslp) -> Result<usize> {
        let scans = self.scan(text.len(), |start, end| scan_runs(text, start, end));
        let run_key = |start: usize, span: usize| (text[start], span as u32);
        let keys = collect_keys(&scans, run_key);

        rlslp.reserve_ids(keys.len())?;
        let first = rlslp.next_id();
        for &(symbol, count) in &keys {
            rlslp.push_block(symbol, count);
        }

        let replaced = scans.iter().map(|s| s.found.len()).sum();
        *text = compact(text, &scans, |start, span| {
            first + keys.partition_point(|k| *k < run_key(start, span)) as Variable
        });
        Ok(replaced)
    }

    fn pcomp(&mut self, text: &mut Text, rlslp: &mut Rlslp) -> Result<usize> {
        let partition = partition::par_partition(text);
        let scans = self.scan(text.len(), |start, end| {
            scan_pairs(text, &partition, start, end)
        });
        let pair_key = |start: usize, _: usize| (text[start], text[start + 1]);
        let keys = collect_keys(&scans, pair_key);

        rlslp.reserve_ids(keys.len())?;
        let first = rlslp.next_id();
        for &(a, b) in &keys {
            rlslp.push_pair(a, b);
        }

        let replaced = scans.iter().map(|s| s.found.len()).sum();
        *text = compact(text, &scans, |start, span| {
            first + keys.partition_point(|k| *k < pair_key(start, span)) as Variable
        });
        Ok(replaced)
    }
}
