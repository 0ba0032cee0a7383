//! Binary encodings of a grammar.
//!
//! Three coders are available, selected by name through [`Coder`]:
//!
//! - `plain`: fixed 32/64-bit fields, rules in creation order
//! - `fixed`: every field in the minimal width for the largest id
//! - `sorted`: rules reordered by their operands and stored as Elias-gamma
//!   coded deltas; decoding renumbers them into creation order again
//!
//! Every decoder validates what it reads: truncated input, a block count that
//! disagrees with the header, undefined or cyclic references and blocks with
//! fewer than two repetitions are reported as errors.

mod bitstream;
mod fixed;
mod plain;
mod sorted;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::info;

use crate::error::{RecompressionError, Result};
use crate::rlslp::Rlslp;
use crate::symbol::{Production, Variable};

pub use bitstream::{BitReader, BitWriter};
pub use fixed::FixedCoder;
pub use plain::PlainCoder;
pub use sorted::SortedCoder;

/// Turns a grammar into bytes.
pub trait Encoder {
    fn encode(&self, rlslp: &Rlslp) -> Vec<u8>;
}

/// Restores a grammar from bytes written by the matching [`Encoder`].
pub trait Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<Rlslp>;
}

/// Available grammar coders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Coder {
    #[default]
    Plain,
    Fixed,
    Sorted,
}

impl Coder {
    pub const ALL: [Coder; 3] = [Coder::Plain, Coder::Fixed, Coder::Sorted];

    pub fn name(&self) -> &'static str {
        match self {
            Coder::Plain => "plain",
            Coder::Fixed => "fixed",
            Coder::Sorted => "sorted",
        }
    }

    /// Looks a coder up by name.
    pub fn from_name(name: &str) -> Result<Self> {
        Coder::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| RecompressionError::UnknownCoder(name.to_string()))
    }

    /// File extension for grammars written with this coder.
    pub fn extension(&self) -> &'static str {
        match self {
            Coder::Plain => "rlslp",
            Coder::Fixed => "frlslp",
            Coder::Sorted => "srlslp",
        }
    }

    pub fn encode(&self, rlslp: &Rlslp) -> Vec<u8> {
        match self {
            Coder::Plain => PlainCoder.encode(rlslp),
            Coder::Fixed => FixedCoder.encode(rlslp),
            Coder::Sorted => SortedCoder.encode(rlslp),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Rlslp> {
        match self {
            Coder::Plain => PlainCoder.decode(bytes),
            Coder::Fixed => FixedCoder.decode(bytes),
            Coder::Sorted => SortedCoder.decode(bytes),
        }
    }

    /// Encodes `rlslp` into the file at `path`. Returns the number of bytes
    /// written.
    pub fn write_file(&self, rlslp: &Rlslp, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.encode(rlslp);
        fs::write(path.as_ref(), &bytes)?;
        info!(
            "{}: wrote {} bytes to {}",
            self.name(),
            bytes.len(),
            path.as_ref().display()
        );
        Ok(bytes.len())
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Rlslp> {
        let bytes = fs::read(path)?;
        self.decode(&bytes)
    }
}

impl FromStr for Coder {
    type Err = RecompressionError;

    fn from_str(s: &str) -> Result<Self> {
        Coder::from_name(s)
    }
}

impl fmt::Display for Coder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Header fields shared by all coders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    empty: bool,
    size: u64,
    terminals: u64,
    root: u64,
    blocks: u64,
}

impl Header {
    fn of(rlslp: &Rlslp) -> Self {
        Self {
            empty: rlslp.is_empty(),
            size: rlslp.size() as u64,
            terminals: rlslp.terminals as u64,
            root: u64::from(rlslp.root),
            blocks: rlslp.blocks() as u64,
        }
    }

    /// Rejects headers declaring more rules than `remaining` bits can hold.
    fn check_size(&self, remaining: u64, min_rule_bits: u64) -> Result<()> {
        if self.size.saturating_mul(min_rule_bits) > remaining {
            return Err(RecompressionError::decode(format!(
                "header declares {} rules but only {} bits follow",
                self.size, remaining
            )));
        }
        Ok(())
    }

    fn terminals(&self) -> Result<usize> {
        usize::try_from(self.terminals).map_err(|_| {
            RecompressionError::decode(format!("terminal count {} too large", self.terminals))
        })
    }

    fn root(&self) -> Result<Option<Variable>> {
        if self.empty {
            return Ok(None);
        }
        Variable::try_from(self.root)
            .map(Some)
            .map_err(|_| RecompressionError::decode(format!("root {} out of range", self.root)))
    }

    /// Compares the declared block count against the decoded rules.
    fn check_blocks(&self, productions: &[Production]) -> Result<()> {
        let found = productions.iter().filter(|p| p.is_block()).count() as u64;
        if found != self.blocks {
            return Err(RecompressionError::mismatch(self.blocks, found));
        }
        Ok(())
    }
}

/// Narrows a decoded id.
fn variable(value: u64) -> Result<Variable> {
    Variable::try_from(value)
        .map_err(|_| RecompressionError::decode(format!("symbol {} out of range", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recompression::Algorithm;
    use crate::symbol::Text;

    pub(super) fn sample() -> Rlslp {
        let mut text: Text = b"abracadabra abracadabra aaaaaaa abracadabra"
            .iter()
            .map(|&b| u32::from(b))
            .collect();
        Algorithm::Fast
            .create(1)
            .unwrap()
            .recomp(&mut text, 256)
            .unwrap()
    }

    pub(super) fn single_terminal() -> Rlslp {
        let mut rlslp = Rlslp::new(256);
        rlslp.set_root(b'x' as Variable);
        rlslp
    }

    #[test]
    fn test_names() {
        for coder in Coder::ALL {
            assert_eq!(Coder::from_name(coder.name()).unwrap(), coder);
            assert_eq!(coder.to_string().parse::<Coder>().unwrap(), coder);
        }
        assert!(matches!(
            Coder::from_name("gzip"),
            Err(RecompressionError::UnknownCoder(name)) if name == "gzip"
        ));
    }

    #[test]
    fn test_extensions_distinct() {
        assert_ne!(Coder::Plain.extension(), Coder::Fixed.extension());
        assert_ne!(Coder::Fixed.extension(), Coder::Sorted.extension());
        assert_ne!(Coder::Plain.extension(), Coder::Sorted.extension());
    }

    #[test]
    fn test_roundtrip_all_coders() {
        let rlslp = sample();
        for coder in Coder::ALL {
            let decoded = coder.decode(&coder.encode(&rlslp)).unwrap();
            assert_eq!(decoded.derive_text(), rlslp.derive_text(), "{coder}");
            assert_eq!(decoded.size(), rlslp.size());
            assert_eq!(decoded.blocks(), rlslp.blocks());
            assert!(decoded.validate().is_ok());
        }
    }

    #[test]
    fn test_roundtrip_edge_grammars() {
        for coder in Coder::ALL {
            let single = single_terminal();
            let decoded = coder.decode(&coder.encode(&single)).unwrap();
            assert_eq!(decoded.derive_text(), vec![b'x' as Variable], "{coder}");

            let empty = Rlslp::new(256);
            let decoded = coder.decode(&coder.encode(&empty)).unwrap();
            assert!(decoded.is_empty(), "{coder}");
            assert!(decoded.derive_text().is_empty());
        }
    }

    #[test]
    fn test_truncated_input() {
        let rlslp = sample();
        for coder in Coder::ALL {
            let bytes = coder.encode(&rlslp);
            for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
                assert!(coder.decode(&bytes[..cut]).is_err(), "{coder} cut at {cut}");
            }
        }
    }

    #[test]
    fn test_file_roundtrip() {
        let rlslp = sample();
        for coder in Coder::ALL {
            let path = std::env::temp_dir().join(format!(
                "recompression-{}-coder.{}",
                std::process::id(),
                coder.extension()
            ));
            let written = coder.write_file(&rlslp, &path).unwrap();
            assert_eq!(written as u64, fs::metadata(&path).unwrap().len());
            let decoded = coder.read_file(&path).unwrap();
            assert_eq!(decoded.derive_text(), rlslp.derive_text());
            fs::remove_file(path).unwrap();
        }
    }
}
