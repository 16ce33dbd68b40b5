//! The choice of hash algorithm and key representation used for the lookup tables has a big impact
//! on the performance of the merge loop, which looks up candidate byte spans over and over.
//!
//! This is isolated to this module to make it easier to experiment with different impls.
use crate::codec::{self, ByteKey};
use crate::{Rank, Token};

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// Encoders maintain the mapping between byte sequences and the ranks assigned to them in the
/// vocabulary.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenEncoder(HashMap<ByteKey, Rank>);

/// Decoders maintain the reverse mapping, from the rank of the token to the corresponding byte
/// sequence.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenDecoder(HashMap<Rank, Token>);

impl TokenEncoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity_and_hasher(capacity, Default::default()))
    }

    /// Add a token.  If the token was already present its previous rank is replaced and returned.
    pub fn insert(&mut self, bytes: &[u8], rank: Rank) -> Option<Rank> {
        self.0.insert(codec::encode(bytes), rank)
    }

    pub fn rank_for_bytes(&self, bytes: impl AsRef<[u8]>) -> Option<Rank> {
        self.0.get(&codec::encode(bytes.as_ref())).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The length in bytes of the longest token
    pub fn max_token_len(&self) -> usize {
        self.0.keys().map(ByteKey::len).max().unwrap_or(0)
    }

    /// Invert the lookup table so the keys become the values, which is another way of describing a
    /// decoder.
    ///
    /// If two tokens share a rank only one of them survives, so the decoder ends up smaller than
    /// the encoder.  Callers detect that by comparing lengths.
    pub fn invert(&self) -> TokenDecoder {
        TokenDecoder(
            self.0
                .iter()
                .map(|(key, rank)| (*rank, codec::decode(key)))
                .collect(),
        )
    }

    /// All of the byte string/rank pairs in the encoder
    pub fn tokens(&self) -> impl Iterator<Item = (&[u8], Rank)> {
        self.0.iter().map(|(key, rank)| (key.as_bytes(), *rank))
    }

    /// Find a rank that more than one token maps to.
    ///
    /// This is only for error reporting after [`Self::invert`] has already shown that there is
    /// such a rank, so it's fine that it does a second full pass.
    pub fn find_duplicate_rank(&self) -> Option<Rank> {
        let mut seen = HashSet::with_capacity_and_hasher(self.len(), Default::default());
        self.0.values().copied().find(|rank| !seen.insert(*rank))
    }
}

impl TokenDecoder {
    pub fn bytes_for_rank(&self, rank: Rank) -> Option<&Token> {
        self.0.get(&rank)
    }

    /// Without actually copying the token out, return the length of the corresponding byte
    /// sequence.
    pub fn token_len(&self, rank: Rank) -> Option<usize> {
        self.bytes_for_rank(rank).map(Token::len)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn max_rank(&self) -> Option<Rank> {
        self.0.keys().copied().max()
    }

    /// All of the rank/byte string pairs in the decoder, in no particular order
    pub fn tokens(&self) -> impl Iterator<Item = (Rank, &Token)> {
        self.0.iter().map(|(rank, bytes)| (*rank, bytes))
    }
}
