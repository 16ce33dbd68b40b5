/// The integer priority of a token in a vocabulary.
///
/// BPE merge logic treats a lower rank as a higher merge priority, but that policy belongs to the
/// merge algorithm.  As far as the vocabulary is concerned a rank is just a unique integer
/// attached to exactly one token.  Ranks don't have to be contiguous.
pub type Rank = usize;

/// A token in its byte string form.
///
/// Tokens are arbitrary non-empty byte sequences.  Byte-level BPE routinely splits multi-byte
/// UTF-8 code points across tokens, so there is no expectation that a token on its own is valid
/// text.
pub type Token = Vec<u8>;
