use crate::partition::{par_partition, partition};
use crate::symbol::{Text, Variable};
use proptest::prelude::*;

/// Texts without equal neighbours, as left behind by block compression.
fn text_without_runs() -> impl Strategy<Value = Text> {
    prop::collection::vec(0u32..64, 2..400).prop_map(|mut text| {
        text.dedup();
        text
    })
}

fn eligible_positions(text: &[Variable]) -> Vec<usize> {
    let p = partition(text);
    (0..text.len() - 1)
        .filter(|&i| p.eligible(text[i], text[i + 1]))
        .collect()
}

proptest! {
    /// Property 1: Eligible pairs never share a position
    #[test]
    fn prop_no_overlap(text in text_without_runs()) {
        let positions = eligible_positions(&text);
        for w in positions.windows(2) {
            prop_assert!(w[1] > w[0] + 1);
        }
    }

    /// Property 2: Half cut
    /// At least half of the adjacencies cross the partition, so the chosen
    /// direction covers at least a quarter of them.
    #[test]
    fn prop_half_cut(text in text_without_runs()) {
        let p = partition(&text);
        let adjacencies = text.len() - 1;
        let crossing = text
            .windows(2)
            .filter(|w| p.side(w[0]) != p.side(w[1]))
            .count();
        prop_assert!(2 * crossing >= adjacencies);
        prop_assert!(4 * eligible_positions(&text).len() >= adjacencies);
    }

    /// Property 3: The parallel pipeline yields the same partition
    #[test]
    fn prop_par_matches_sequential(text in text_without_runs(), threads in 1usize..6) {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        let par = pool.install(|| par_partition(&text));
        prop_assert_eq!(par, partition(&text));
    }
}

/// Bolero fuzz test: Partitioning arbitrary run-free texts
#[test]
fn fuzz_partition() {
    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let mut text: Text = input.iter().map(|&b| Variable::from(b)).collect();
        text.dedup();
        if text.len() < 2 {
            return;
        }
        let positions = eligible_positions(&text);
        assert!(!positions.is_empty());
        assert!(positions.windows(2).all(|w| w[1] > w[0] + 1));
    });
}
