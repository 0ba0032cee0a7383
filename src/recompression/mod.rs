//! The recompression driver and its algorithm variants.
//!
//! Every variant alternates block compression and pair compression on a text
//! until at most one symbol is left. The variants differ only in how a single
//! phase is carried out:
//!
//! - [`HashRecompression`]: sequential, deduplicates with hash maps
//! - [`FastRecompression`]: sequential, re-compacts the alphabet after every
//!   phase and works on dense tables
//! - [`ParallelRecompression`]: rayon thread pool, chunked detection and
//!   parallel compaction

mod fast;
mod hash;
mod parallel;

use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};

use crate::error::{RecompressionError, Result};
use crate::rlslp::Rlslp;
use crate::symbol::{Text, CHAR_ALPHABET};

pub use fast::FastRecompression;
pub use hash::HashRecompression;
pub use parallel::ParallelRecompression;

/// Builds an RLSLP from a text.
pub trait Recompression {
    /// Name under which the variant is selected.
    fn name(&self) -> &'static str;

    /// Compresses `text`, whose symbols must all be below `alphabet_size`.
    /// Fails with [`RecompressionError::IdSpaceExhausted`] when the terminals
    /// and the new nonterminals do not fit in the symbol id space.
    ///
    /// The text is consumed as scratch space and holds at most one symbol
    /// afterwards. The returned grammar has `alphabet_size` terminals and
    /// derives the original text.
    fn recomp(&mut self, text: &mut Text, alphabet_size: usize) -> Result<Rlslp>;
}

/// One compression phase pair as seen by the driver.
pub(crate) trait Phases {
    /// Replaces every maximal run of length at least two. Returns the number
    /// of runs replaced.
    fn bcomp(&mut self, text: &mut Text, rlslp: &mut Rlslp) -> Result<usize>;

    /// Replaces every eligible pair. Returns the number of pairs replaced.
    fn pcomp(&mut self, text: &mut Text, rlslp: &mut Rlslp) -> Result<usize>;
}

/// Alternates bcomp and pcomp until the text has at most one symbol.
/// Returns the number of rounds.
pub(crate) fn run_rounds<P: Phases>(
    phases: &mut P,
    text: &mut Text,
    rlslp: &mut Rlslp,
) -> Result<usize> {
    let mut level = 0;
    while text.len() > 1 {
        let before = text.len();
        let blocks = phases.bcomp(text, rlslp)?;
        debug!(
            "level {}: bcomp replaced {} runs, {} -> {} symbols",
            level,
            blocks,
            before,
            text.len()
        );

        if text.len() > 1 {
            let after_bcomp = text.len();
            let pairs = phases.pcomp(text, rlslp)?;
            debug!(
                "level {}: pcomp replaced {} pairs, {} -> {} symbols",
                level,
                pairs,
                after_bcomp,
                text.len()
            );
        }

        if text.len() > 1 && text.len() == before {
            warn!("level {}: no progress at length {}", level, before);
            return Err(RecompressionError::NoProgress { level, len: before });
        }
        level += 1;
    }
    Ok(level)
}

/// Sets the root from the final text and logs a summary.
pub(crate) fn finish(name: &str, text: &Text, rlslp: &mut Rlslp, levels: usize) {
    match text.first() {
        Some(&root) => rlslp.set_root(root),
        None => rlslp.clear_root(),
    }
    info!(
        "{}: {} productions ({} blocks) in {} levels, text length {}",
        name,
        rlslp.size(),
        rlslp.blocks(),
        levels,
        rlslp.text_len()
    );
}

/// Available recompression variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    Hash,
    #[default]
    Fast,
    Parallel,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Hash, Algorithm::Fast, Algorithm::Parallel];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Hash => "hash",
            Algorithm::Fast => "fast",
            Algorithm::Parallel => "parallel",
        }
    }

    /// Instantiates the variant. `cores` is only used by
    /// [`Algorithm::Parallel`].
    pub fn create(&self, cores: usize) -> Result<Box<dyn Recompression + Send>> {
        Ok(match self {
            Algorithm::Hash => Box::new(HashRecompression::new()),
            Algorithm::Fast => Box::new(FastRecompression::new()),
            Algorithm::Parallel => Box::new(ParallelRecompression::new(cores)?),
        })
    }
}

impl FromStr for Algorithm {
    type Err = RecompressionError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| RecompressionError::UnknownAlgorithm(s.to_string()))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compresses a byte string with the default variant.
///
/// # Example
///
/// ```
/// let rlslp = recompression::recompress(b"abababab").unwrap();
/// assert_eq!(rlslp.extract(2, 3), vec![b'a' as u32, b'b' as u32, b'a' as u32]);
/// ```
pub fn recompress(bytes: &[u8]) -> Result<Rlslp> {
    let mut text: Text = bytes.iter().map(|&b| u32::from(b)).collect();
    FastRecompression::new().recomp(&mut text, CHAR_ALPHABET)
}
