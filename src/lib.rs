//! # Recompression - Grammar Compression into Run-Length SLPs
//!
//! Recompression turns a text into a run-length straight-line program
//! (RLSLP): a grammar whose nonterminals each derive either a pair of
//! symbols or a run of one symbol repeated. It alternates two phases until a
//! single symbol is left:
//!
//! 1. **Block compression**: every maximal run of a repeated symbol becomes
//!    one nonterminal
//! 2. **Pair compression**: the alphabet is split into a left and a right
//!    class, and every left symbol followed by a right symbol becomes one
//!    nonterminal; such pairs never overlap
//!
//! The resulting grammar supports random access ([`Rlslp::extract`]) and
//! longest common extension queries ([`lce_query`]) without decompressing the
//! text, and can be stored with one of the [`Coder`]s.
//!
//! ## Example
//!
//! ```
//! use recompression::{Algorithm, Coder, Recompression};
//!
//! let mut text: Vec<u32> = b"abababababcabc".iter().map(|&b| b as u32).collect();
//! let original = text.clone();
//!
//! let mut recompression = Algorithm::Fast.create(1).unwrap();
//! let rlslp = recompression.recomp(&mut text, 256).unwrap();
//!
//! // Reconstructs the original sequence
//! assert_eq!(rlslp.derive_text(), original);
//! assert_eq!(rlslp.extract(10, 3), vec![b'c' as u32, b'a' as u32, b'b' as u32]);
//!
//! let bytes = Coder::Sorted.encode(&rlslp);
//! let decoded = Coder::Sorted.decode(&bytes).unwrap();
//! assert_eq!(decoded.derive_text(), original);
//! ```
//!
//! ## Variants
//!
//! - `hash`: sequential, hash-map deduplication
//! - `fast`: sequential, dense tables over a re-compacted alphabet
//! - `parallel`: rayon thread pool with a configurable number of cores
//!
//! All variants produce grammars deriving the same text; nonterminal ids may
//! differ.

pub mod alphabet;
pub mod coders;
pub mod error;
pub mod io;
mod lce;
mod partition;
pub mod recompression;
mod rlslp;
mod symbol;

#[cfg(test)]
mod tests;

pub use coders::{Coder, Decoder, Encoder};
pub use error::{RecompressionError, Result};
pub use lce::lce_query;
pub use recompression::{
    recompress, Algorithm, FastRecompression, HashRecompression, ParallelRecompression,
    Recompression,
};
pub use rlslp::{DeriveIter, NonTerminal, Rlslp, RlslpStats};
pub use symbol::{Production, Text, Variable, CHAR_ALPHABET};
