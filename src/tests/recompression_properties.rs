use crate::lce_query;
use crate::recompression::Algorithm;
use crate::rlslp::Rlslp;
use crate::symbol::{Production, Text, Variable};
use proptest::prelude::*;

/// Runs one variant on a copy of `text`.
fn compress(algorithm: Algorithm, text: &[Variable], terminals: usize) -> Rlslp {
    let mut work = text.to_vec();
    algorithm
        .create(3)
        .unwrap()
        .recomp(&mut work, terminals)
        .unwrap()
}

/// Texts over a small alphabet, so that runs and repeated pairs are common.
fn small_alphabet_text() -> impl Strategy<Value = Text> {
    prop::collection::vec(0u32..4, 0..300)
}

fn naive_lce(text: &[Variable], i: usize, j: usize) -> usize {
    if i >= text.len() || j >= text.len() {
        return 0;
    }
    text[i..]
        .iter()
        .zip(&text[j..])
        .take_while(|(a, b)| a == b)
        .count()
}

proptest! {
    /// Property 1: Roundtrip fidelity
    /// Every variant derives exactly the input text.
    #[test]
    fn prop_roundtrip(input in small_alphabet_text()) {
        for algorithm in Algorithm::ALL {
            let rlslp = compress(algorithm, &input, 4);
            prop_assert_eq!(rlslp.derive_text(), input.clone(), "{}", algorithm);
            prop_assert_eq!(rlslp.text_len(), input.len() as u64);
            prop_assert_eq!(rlslp.is_empty(), input.is_empty());
        }
    }

    /// Property 2: Byte roundtrip
    /// Arbitrary bytes over the full byte alphabet.
    #[test]
    fn prop_roundtrip_bytes(input: Vec<u8>) {
        let text: Text = input.iter().map(|&b| Variable::from(b)).collect();
        for algorithm in Algorithm::ALL {
            let rlslp = compress(algorithm, &text, 256);
            prop_assert_eq!(rlslp.derive_text(), text.clone(), "{}", algorithm);
        }
    }

    /// Property 3: Extraction equivalence
    /// extract(i, len) equals the corresponding slice, clipped to the text.
    #[test]
    fn prop_extract(
        input in small_alphabet_text(),
        i in 0usize..320,
        len in 0usize..64,
    ) {
        for algorithm in Algorithm::ALL {
            let rlslp = compress(algorithm, &input, 4);
            let expected: Text = input.iter().skip(i).take(len).copied().collect();
            prop_assert_eq!(rlslp.extract(i, len), expected);
        }
    }

    /// Property 4: Arena order
    /// Every operand is older than the production using it.
    #[test]
    fn prop_acyclic(input in small_alphabet_text()) {
        for algorithm in Algorithm::ALL {
            let rlslp = compress(algorithm, &input, 4);
            for (k, nt) in rlslp.non_terminals.iter().enumerate() {
                let id = (rlslp.terminals + k) as Variable;
                match nt.production {
                    Production::Pair { first, second } => {
                        prop_assert!(first < id && second < id);
                    }
                    Production::Block { symbol, count } => {
                        prop_assert!(symbol < id);
                        prop_assert!(count >= 2);
                    }
                }
            }
        }
    }

    /// Property 5: Cached lengths
    /// The length of every nonterminal matches its expansion.
    #[test]
    fn prop_lengths(input in small_alphabet_text()) {
        let rlslp = compress(Algorithm::Hash, &input, 4);
        for k in 0..rlslp.size() {
            let id = (rlslp.terminals + k) as Variable;
            prop_assert_eq!(rlslp.derive(id).len() as u64, rlslp.len(id));
        }
    }

    /// Property 6: Variant agreement
    /// The fast variant works on a re-compacted alphabet that preserves the
    /// symbol order, so it builds exactly the grammar of the parallel one.
    #[test]
    fn prop_fast_matches_parallel(input in small_alphabet_text()) {
        let fast = compress(Algorithm::Fast, &input, 4);
        let parallel = compress(Algorithm::Parallel, &input, 4);
        prop_assert_eq!(fast, parallel);
    }

    /// Property 7: LCE
    /// lce_query agrees with a direct comparison of the suffixes.
    #[test]
    fn prop_lce(input in small_alphabet_text(), i in 0usize..300, j in 0usize..300) {
        let rlslp = compress(Algorithm::Fast, &input, 4);
        prop_assert_eq!(lce_query(&rlslp, i, j), naive_lce(&input, i, j));
        prop_assert_eq!(lce_query(&rlslp, i, j), lce_query(&rlslp, j, i));
    }
}

/// Bolero fuzz test: No panics on arbitrary input
#[test]
fn fuzz_no_panic() {
    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let text: Text = input.iter().map(|&b| Variable::from(b)).collect();
        for algorithm in Algorithm::ALL {
            let rlslp = compress(algorithm, &text, 256);
            let _ = rlslp.stats();
            assert_eq!(rlslp.iter().count(), text.len());
            assert_eq!(rlslp.derive_text(), text);
        }
    });
}

/// Bolero fuzz test: Random access over every position
#[test]
fn fuzz_extract_every_position() {
    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let text: Text = input.iter().map(|&b| Variable::from(b % 3)).collect();
        let rlslp = compress(Algorithm::Parallel, &text, 3);
        for i in 0..text.len() {
            assert_eq!(rlslp.extract(i, 1), vec![text[i]]);
        }
    });
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Every text of length up to 8 over two symbols.
    fn all_binary_texts() -> impl Iterator<Item = Text> {
        (0..=8usize).flat_map(|n| {
            (0..1u32 << n).map(move |bits| (0..n).map(|k| (bits >> k) & 1).collect())
        })
    }

    #[test]
    fn test_exhaustive_small_texts() {
        for text in all_binary_texts() {
            for algorithm in Algorithm::ALL {
                let rlslp = compress(algorithm, &text, 2);
                assert_eq!(rlslp.derive_text(), text, "{algorithm} on {text:?}");
                for i in 0..text.len() {
                    for len in 0..=text.len() - i {
                        assert_eq!(rlslp.extract(i, len), text[i..i + len].to_vec());
                    }
                }
            }
        }
    }

    #[test]
    fn test_long_single_run() {
        let text = vec![1; 100_000];
        for algorithm in Algorithm::ALL {
            let rlslp = compress(algorithm, &text, 2);
            assert_eq!(rlslp.size(), 1);
            assert_eq!(rlslp.text_len(), 100_000);
            assert_eq!(rlslp.extract(99_998, 10), vec![1, 1]);
        }
    }

    #[test]
    fn test_logarithmic_depth() {
        let text: Text = (0..4096u32).map(|i| i.count_ones() % 5).collect();
        let rlslp = compress(Algorithm::Fast, &text, 5);
        let depth = rlslp.stats().depth;
        assert!(depth <= 64, "depth {depth} for 4096 symbols");
    }
}
