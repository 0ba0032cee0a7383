//! Sequential recompression with hash-map deduplication.
//!
//! Both phases are a single in-place left-to-right scan. Nonterminals get
//! ids in the order their key is first seen.

use std::collections::hash_map::Entry;

use ahash::AHashMap;

use super::{finish, run_rounds, Phases, Recompression};
use crate::alphabet::check_alphabet;
use crate::error::Result;
use crate::partition;
use crate::rlslp::Rlslp;
use crate::symbol::{Text, Variable};

/// Hash-based recompression. Symbols in the text are grammar ids throughout.
#[derive(Debug, Default)]
pub struct HashRecompression {
    blocks: AHashMap<(Variable, u32), Variable>,
    pairs: AHashMap<(Variable, Variable), Variable>,
}

impl HashRecompression {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Recompression for HashRecompression {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn recomp(&mut self, text: &mut Text, alphabet_size: usize) -> Result<Rlslp> {
        let mut rlslp = Rlslp::new(alphabet_size);
        rlslp.reserve_ids(0)?;
        check_alphabet(text, alphabet_size)?;
        let levels = run_rounds(self, text, &mut rlslp)?;
        finish(self.name(), text, &mut rlslp, levels);
        Ok(rlslp)
    }
}

impl Phases for HashRecompression {
    fn bcomp(&mut self, text: &mut Text, rlslp: &mut Rlslp) -> Result<usize> {
        self.blocks.clear();
        let n = text.len();
        let mut replaced = 0;
        let mut read = 0;
        let mut write = 0;

        while read < n {
            let c = text[read];
            let mut end = read + 1;
            while end < n && text[end] == c {
                end += 1;
            }
            let run = (end - read) as u32;
            text[write] = if run > 1 {
                replaced += 1;
                match self.blocks.entry((c, run)) {
                    Entry::Occupied(e) => *e.get(),
                    Entry::Vacant(e) => {
                        rlslp.reserve_ids(1)?;
                        *e.insert(rlslp.push_block(c, run))
                    }
                }
            } else {
                c
            };
            write += 1;
            read = end;
        }
        text.truncate(write);
        Ok(replaced)
    }

    fn pcomp(&mut self, text: &mut Text, rlslp: &mut Rlslp) -> Result<usize> {
        self.pairs.clear();
        let partition = partition::partition(text);
        let n = text.len();
        let mut replaced = 0;
        let mut read = 0;
        let mut write = 0;

        while read < n {
            let a = text[read];
            if read + 1 < n && partition.eligible(a, text[read + 1]) {
                let b = text[read + 1];
                text[write] = match self.pairs.entry((a, b)) {
                    Entry::Occupied(e) => *e.get(),
                    Entry::Vacant(e) => {
                        rlslp.reserve_ids(1)?;
                        *e.insert(rlslp.push_pair(a, b))
                    }
                };
                replaced += 1;
                read += 2;
            } else {
                text[write] = a;
                read += 1;
            }
            write += 1;
        }
        text.truncate(write);
        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Production;

    #[test]
    fn test_bcomp_first_seen_ids() {
        let mut text = vec![4, 4, 4, 1, 3, 3, 1, 1, 3, 3, 2];
        let mut rlslp = Rlslp::new(5);
        let replaced = HashRecompression::new().bcomp(&mut text, &mut rlslp).unwrap();

        assert_eq!(replaced, 4);
        assert_eq!(text, vec![5, 1, 6, 7, 6, 2]);
        assert_eq!(
            rlslp.non_terminals[0].production,
            Production::Block {
                symbol: 4,
                count: 3
            }
        );
        assert_eq!(rlslp.size(), 3);
    }

    #[test]
    fn test_bcomp_without_runs() {
        let original = vec![
            2, 1, 2, 1, 4, 1, 3, 2, 3, 1, 4, 1, 3, 4, 1, 3, 2, 3, 1, 4, 1, 3, 2, 1,
        ];
        let mut text = original.clone();
        let mut rlslp = Rlslp::new(5);
        assert_eq!(HashRecompression::new().bcomp(&mut text, &mut rlslp).unwrap(), 0);
        assert_eq!(text, original);
        assert_eq!(rlslp.size(), 0);
    }

    #[test]
    fn test_pcomp_shrinks_by_replacements() {
        let original: Text = vec![
            2, 1, 2, 1, 8, 1, 6, 2, 3, 5, 4, 1, 7, 4, 1, 6, 2, 3, 5, 4, 1, 3, 2, 1,
        ];
        let mut text = original.clone();
        let mut rlslp = Rlslp::new(9);
        let replaced = HashRecompression::new().pcomp(&mut text, &mut rlslp).unwrap();

        assert!(replaced > 0);
        assert_eq!(text.len(), original.len() - replaced);
        let expanded: Text = text.iter().flat_map(|&c| rlslp.derive(c)).collect();
        assert_eq!(expanded, original);
    }

    #[test]
    fn test_bcomp_runs_out_of_ids() {
        // One id left above the terminals, two distinct runs.
        let mut text = vec![0, 0, 1, 1];
        let mut rlslp = Rlslp::new(Variable::MAX as usize);
        let result = HashRecompression::new().bcomp(&mut text, &mut rlslp);
        assert!(matches!(
            result,
            Err(crate::RecompressionError::IdSpaceExhausted {
                productions: 2,
                ..
            })
        ));
        assert_eq!(rlslp.size(), 1);
        assert_eq!(
            rlslp.non_terminals[0].production,
            Production::Block {
                symbol: 0,
                count: 2
            }
        );
    }
}
