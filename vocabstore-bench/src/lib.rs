//! Synthetic vocabularies for benchmarking `vocabstore`.
//!
//! Real vocabularies are big files with licensing of their own, so the benchmarks generate rank
//! files with a similar shape instead: every single byte is a token, followed by progressively
//! longer multi-byte tokens, with ranks assigned in order.
use base64::{engine::general_purpose, Engine as _};
use vocabstore::Rank;

/// The token with the given rank in a synthetic vocabulary.
///
/// Ranks 0 through 255 are the single bytes.  Higher ranks are the minimal big-endian base-256
/// digits of the rank, then `n` padding bytes, then `n` itself, where `n` cycles every 256 ranks.
/// Reading `n` off the end recovers the digits, so tokens stay unique while their lengths spread
/// out the way merged tokens do.
pub fn synthetic_token(rank: Rank) -> Vec<u8> {
    if rank < 256 {
        return vec![rank as u8];
    }

    let digits = rank
        .to_be_bytes()
        .into_iter()
        .skip_while(|b| *b == 0)
        .collect::<Vec<_>>();

    let padding = (rank / 256 % 8) as u8;

    let mut token = digits;
    token.extend(std::iter::repeat(padding).take(padding as usize));
    token.push(padding);
    token
}

/// A rank file with `size` records, ranks `0..size`.
pub fn synthetic_rank_file(size: usize) -> String {
    (0..size)
        .map(|rank| {
            format!(
                "{} {rank}\n",
                general_purpose::STANDARD.encode(synthetic_token(rank))
            )
        })
        .collect()
}
