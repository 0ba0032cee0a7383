//! Error type shared by the recompression engine, the coders and file input.

use std::io;
use thiserror::Error;

/// Everything that can go wrong while building, storing or loading a grammar.
///
/// Out-of-range queries are not errors: `extract` and `lce_query` answer them
/// with an empty result.
#[derive(Debug, Error)]
pub enum RecompressionError {
    /// I/O error while reading a text or writing an encoded grammar.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input contains a symbol outside the declared alphabet.
    #[error("symbol {symbol} exceeds the alphabet bound {bound}")]
    AlphabetBound {
        /// The offending symbol.
        symbol: u64,
        /// The declared alphabet size.
        bound: usize,
    },

    /// Terminals plus productions need more ids than a [`Variable`] holds.
    ///
    /// [`Variable`]: crate::Variable
    #[error("{terminals} terminals and {productions} productions exceed the symbol id space")]
    IdSpaceExhausted {
        /// Number of terminals of the grammar.
        terminals: usize,
        /// Number of productions that were requested.
        productions: usize,
    },

    /// A full bcomp + pcomp round did not shrink the text.
    #[error("recompression made no progress at level {level} (text length {len})")]
    NoProgress {
        /// Level at which the round started.
        level: usize,
        /// Text length before and after the round.
        len: usize,
    },

    /// The worker pool of the parallel variant could not be started.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Algorithm name not known to [`Algorithm::from_str`](crate::Algorithm).
    #[error("unknown recompression algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Coder name not known to [`Coder::from_str`](crate::Coder).
    #[error("unknown coder: {0}")]
    UnknownCoder(String),

    /// The encoded grammar ended early.
    #[error("unexpected end of encoded grammar at bit {bit_position}")]
    UnexpectedEof {
        /// Number of bits consumed before the end was hit.
        bit_position: u64,
    },

    /// A header field disagrees with the rules actually decoded.
    #[error("serialization mismatch: header declares {expected}, found {found}")]
    SerializationMismatch {
        /// Value declared by the header.
        expected: u64,
        /// Value found in the decoded rules.
        found: u64,
    },

    /// The encoded grammar is structurally invalid.
    #[error("invalid encoded grammar: {message}")]
    Decode {
        /// Description of the problem.
        message: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RecompressionError>;

impl RecompressionError {
    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a serialization mismatch error.
    pub fn mismatch(expected: impl Into<u64>, found: impl Into<u64>) -> Self {
        Self::SerializationMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
