//! The synthetic rank files must be valid vocabularies, or the benchmarks measure error paths.
use proptest::prelude::*;
use vocabstore::Vocabulary;
use vocabstore_bench::{synthetic_rank_file, synthetic_token};

#[test]
fn synthetic_vocab_loads() {
    let vocab = Vocabulary::from_reader(synthetic_rank_file(5_000).as_bytes()).unwrap();

    assert_eq!(vocab.count(), 5_000);
    assert_eq!(vocab.max_rank(), Some(4_999));
    for rank in [0, 255, 256, 1_000, 4_999] {
        assert_eq!(vocab.get_token(rank).unwrap(), synthetic_token(rank));
    }
}

proptest! {
    #[test]
    fn synthetic_tokens_are_unique(a in 0usize..1_000_000, b in 0usize..1_000_000) {
        prop_assume!(a != b);
        prop_assert_ne!(synthetic_token(a), synthetic_token(b));
    }
}
