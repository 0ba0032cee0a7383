//! Sequential recompression over a dense alphabet.
//!
//! The text always holds symbols in `[0, k)`; `mapping` translates them back
//! to grammar ids. New nonterminals are appended above `k` and the alphabet is
//! compacted again after every phase, so all per-symbol tables stay small
//! vectors. Nonterminals of one phase are created in sorted key order.

use super::{finish, run_rounds, Phases, Recompression};
use crate::alphabet::{compute_alphabet, replace_letters};
use crate::error::Result;
use crate::partition;
use crate::rlslp::Rlslp;
use crate::symbol::{Production, Text, Variable};

/// A replacement found during a scan: key of the new nonterminal and the
/// output position holding the placeholder.
#[derive(Debug, Clone, Copy)]
struct Occurrence {
    first: Variable,
    second: u32,
    pos: usize,
}

/// Recompression on a dense alphabet, re-compacted after each phase.
#[derive(Debug, Default)]
pub struct FastRecompression {
    /// Dense symbol to grammar id. Ascending at all times.
    mapping: Vec<Variable>,
}

impl FastRecompression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates one nonterminal per distinct key in ascending key order and
    /// writes its dense id at every occurrence.
    fn assign(
        &mut self,
        text: &mut Text,
        rlslp: &mut Rlslp,
        mut found: Vec<Occurrence>,
        make: impl Fn(&[Variable], Variable, u32) -> Production,
    ) -> Result<()> {
        found.sort_unstable_by_key(|o| (o.first, o.second));
        let same_key = |a: &Occurrence, b: &Occurrence| (a.first, a.second) == (b.first, b.second);
        rlslp.reserve_ids(found.chunk_by(same_key).count())?;
        for group in found.chunk_by(same_key) {
            let production = make(&self.mapping, group[0].first, group[0].second);
            let real = rlslp.push(production);
            let dense = self.mapping.len() as Variable;
            self.mapping.push(real);
            for o in group {
                text[o.pos] = dense;
            }
        }
        compute_alphabet(text, &mut self.mapping);
        Ok(())
    }
}

impl Recompression for FastRecompression {
    fn name(&self) -> &'static str {
        "fast"
    }

    fn recomp(&mut self, text: &mut Text, alphabet_size: usize) -> Result<Rlslp> {
        let mut rlslp = Rlslp::new(alphabet_size);
        rlslp.reserve_ids(0)?;
        self.mapping = replace_letters(text, alphabet_size)?;
        let levels = run_rounds(self, text, &mut rlslp)?;
        if let Some(c) = text.first_mut() {
            *c = self.mapping[*c as usize];
        }
        finish(self.name(), text, &mut rlslp, levels);
        Ok(rlslp)
    }
}

impl Phases for FastRecompression {
    fn bcomp(&mut self, text: &mut Text, rlslp: &mut Rlslp) -> Result<usize> {
        let n = text.len();
        let mut runs = Vec::new();
        let mut read = 0;
        let mut write = 0;

        while read < n {
            let c = text[read];
            let mut end = read + 1;
            while end < n && text[end] == c {
                end += 1;
            }
            if end - read > 1 {
                runs.push(Occurrence {
                    first: c,
                    second: (end - read) as u32,
                    pos: write,
                });
            }
            text[write] = c;
            write += 1;
            read = end;
        }
        text.truncate(write);

        let replaced = runs.len();
        if replaced > 0 {
            self.assign(text, rlslp, runs, |mapping, c, count| Production::Block {
                symbol: mapping[c as usize],
                count,
            })?;
        }
        Ok(replaced)
    }

    fn pcomp(&mut self, text: &mut Text, rlslp: &mut Rlslp) -> Result<usize> {
        let partition = partition::partition(text);
        let n = text.len();
        let mut pairs = Vec::new();
        let mut read = 0;
        let mut write = 0;

        while read < n {
            let a = text[read];
            if read + 1 < n && partition.eligible(a, text[read + 1]) {
                pairs.push(Occurrence {
                    first: a,
                    second: text[read + 1],
                    pos: write,
                });
                read += 2;
            } else {
                read += 1;
            }
            text[write] = a;
            write += 1;
        }
        text.truncate(write);

        let replaced = pairs.len();
        if replaced > 0 {
            self.assign(text, rlslp, pairs, |mapping, a, b| Production::Pair {
                first: mapping[a as usize],
                second: mapping[b as usize],
            })?;
        }
        Ok(replaced)
    }
}
