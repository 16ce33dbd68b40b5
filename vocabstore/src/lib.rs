//! The vocabulary half of a BPE tokenizer.
//!
//! A BPE vocabulary assigns every token (a byte sequence) a unique integer rank.  The merge loop
//! of a BPE encoder asks "what is the rank of this byte span, if any" many times per word, and a
//! decoder turns ranks back into bytes.  [`Vocabulary`] loads the tiktoken rank file format and
//! answers both questions with a single hash lookup.
//!
//! ```no_run
//! use vocabstore::Vocabulary;
//!
//! # fn main() -> vocabstore::Result<()> {
//! let vocab = Vocabulary::from_file("cl100k_base.tiktoken")?;
//!
//! if let Some(rank) = vocab.try_get_rank(b"hello") {
//!     assert_eq!(vocab.get_token(rank)?, b"hello");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Applications that use several encodings can keep them in a [`VocabCache`], which loads each
//! vocabulary on first use from a directory of rank files.
mod cache;
mod codec;
mod error;
mod store;
mod token;

pub use cache::*;
pub use codec::decode_text;
pub use error::*;
pub use store::*;
pub use token::*;

pub type Result<T> = std::result::Result<T, VocabError>;

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::sync::OnceLock;
    use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

    static TRACING: OnceLock<()> = OnceLock::new();

    /// Initialize tracing for tests with a stdout subscriber.
    /// Safe to call multiple times - will only initialize once.
    pub fn init_test_logging() {
        TRACING.get_or_init(|| {
            let filter = std::env::var("RUST_LOG")
                .map(EnvFilter::new)
                .unwrap_or_else(|_| EnvFilter::new("debug"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_span_events(FmtSpan::CLOSE)
                .with_test_writer()
                .try_init()
                .ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn shareable_across_threads() {
        assert_send_sync::<Vocabulary>();
        assert_send_sync::<VocabCache>();
        assert_send_sync::<VocabError>();
    }
}
