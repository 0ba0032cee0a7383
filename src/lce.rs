//! Longest common extension queries on a compressed text.

use crate::rlslp::Rlslp;

/// Size of the first window compared.
const INITIAL_WINDOW: usize = 8;

/// Length of the longest common prefix of the suffixes starting at `i` and
/// `j`.
///
/// Windows of doubling size are extracted from both positions until they
/// differ or one suffix ends. Returns 0 for an empty grammar or an
/// out-of-range position.
///
/// # Example
///
/// ```
/// use recompression::{lce_query, recompress};
///
/// let rlslp = recompress(b"abcabcabd").unwrap();
/// assert_eq!(lce_query(&rlslp, 0, 3), 5);
/// ```
pub fn lce_query(rlslp: &Rlslp, i: usize, j: usize) -> usize {
    let n = rlslp.text_len();
    if rlslp.is_empty() || i as u64 >= n || j as u64 >= n {
        return 0;
    }
    if i == j {
        return (n - i as u64) as usize;
    }

    let mut lce = 0;
    let mut window = INITIAL_WINDOW;
    loop {
        let a = rlslp.extract(i + lce, window);
        let b = rlslp.extract(j + lce, window);
        let common = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
        lce += common;
        if common < a.len().min(b.len()) || a.len() < window || b.len() < window {
            return lce;
        }
        window *= 2;
    }
}
