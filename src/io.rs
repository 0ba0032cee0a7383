//! Reading input texts from files.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::symbol::{Text, Variable};

/// Reads a file as a byte text.
///
/// Only the first `prefix` bytes are kept when `prefix > 0`. With
/// `remove_zeroes`, zero bytes are dropped after truncation.
pub fn read_text(path: impl AsRef<Path>, prefix: usize, remove_zeroes: bool) -> Result<Text> {
    let path = path.as_ref();
    let mut bytes = fs::read(path)?;
    if prefix > 0 {
        bytes.truncate(prefix);
    }

    let text: Text = bytes
        .iter()
        .filter(|&&b| !remove_zeroes || b != 0)
        .map(|&b| Variable::from(b))
        .collect();
    debug!(
        "read {} symbols from {} ({} bytes)",
        text.len(),
        path.display(),
        bytes.len()
    );
    Ok(text)
}
