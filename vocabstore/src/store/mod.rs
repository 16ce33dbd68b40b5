use crate::error::*;
use crate::{Rank, Result, Token};
use snafu::{OptionExt, ResultExt};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tracing::*;

mod hash;
mod parse;

use hash::{TokenDecoder, TokenEncoder};

/// The vocabulary of a BPE encoding: every token byte sequence and the rank assigned to it.
///
/// A `Vocabulary` is immutable once constructed, and either construction succeeds completely or
/// there is no `Vocabulary` at all.  It's also `Send + Sync` with no interior locking, so a single
/// instance (usually behind an `Arc`) can serve lookups from as many threads as needed.
///
/// Both lookup directions are hash table lookups.  The token to rank direction is what the BPE
/// merge loop hammers on, and building the key for it doesn't allocate for tokens up to 23 bytes
/// long.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    /// Mapping of byte sequences to ranks
    encode: TokenEncoder,

    /// Mapping of ranks back to byte sequences.
    ///
    /// Always built from `encode` after it's complete, never updated separately.
    decode: TokenDecoder,

    /// Length of the longest token in bytes.
    ///
    /// Merge loops can use this to skip lookups of spans that can't possibly be tokens.
    max_token_len: usize,
}

impl Vocabulary {
    /// Load a vocabulary from a tiktoken rank file on the filesystem.
    ///
    /// The file is closed before this returns, whether or not loading succeeds.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        debug!(path = %path.display(), "Loading vocabulary");
        let file = File::open(path).with_context(|_| FileIoSnafu {
            path: path.to_path_buf(),
        })?;

        let vocab = Self::from_stream(file).map_err(|e| {
            warn!(path = %path.display(), line = e.line(), "Failed to load vocabulary: {e}");
            e
        })?;

        debug!(path = %path.display(), tokens = vocab.count(), "Loaded vocabulary");
        Ok(vocab)
    }

    /// Load a vocabulary from a seekable stream containing a tiktoken rank file.
    ///
    /// The stream is rewound to its start first, so it doesn't matter where the caller left the
    /// cursor.
    pub fn from_stream<R: Read + Seek>(mut source: R) -> Result<Self> {
        source.rewind().context(RewindSnafu)?;

        Self::from_reader(BufReader::new(source))
    }

    /// Load a vocabulary from a tiktoken rank file, reading lines from the current position of
    /// `reader` until the end.
    ///
    /// Fails on the first malformed line, on a token that appears on more than one line, and on a
    /// rank that's assigned to more than one token.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut encode = TokenEncoder::default();

        parse::for_each_record(reader, |line, segment, token, rank| {
            snafu::ensure!(
                encode.insert(&token, rank).is_none(),
                DuplicateTokenSnafu {
                    line,
                    segment: segment.to_string(),
                }
            );

            Ok(())
        })?;

        Self::from_encoder(encode)
    }

    /// Build a vocabulary from in-memory token/rank pairs.
    ///
    /// The same rules apply as for rank files: tokens must be non-empty, and both tokens and ranks
    /// must be unique.  For errors that cite a line, the line is the 1-based position of the
    /// offending pair in `items`.
    pub fn from_pairs<Iter, Bytes>(items: Iter) -> Result<Self>
    where
        Iter: IntoIterator<Item = (Bytes, Rank)>,
        Bytes: AsRef<[u8]>,
    {
        let items = items.into_iter();
        let mut encode = TokenEncoder::with_capacity(items.size_hint().0);

        for (index, (bytes, rank)) in items.enumerate() {
            let bytes = bytes.as_ref();
            let line = index + 1;

            snafu::ensure!(
                !bytes.is_empty(),
                EmptyTokenSnafu {
                    line,
                    segment: String::new(),
                }
            );
            snafu::ensure!(
                encode.insert(bytes, rank).is_none(),
                DuplicateTokenSnafu {
                    line,
                    segment: String::from_utf8_lossy(bytes).into_owned(),
                }
            );
        }

        Self::from_encoder(encode)
    }

    /// Second phase of construction: derive the reverse map from the completed forward map.
    ///
    /// Every token in `encode` is already known to be unique, so if the reverse map comes out
    /// smaller than the forward map, some rank was assigned to more than one token.
    fn from_encoder(encode: TokenEncoder) -> Result<Self> {
        let decode = encode.invert();

        if decode.len() != encode.len() {
            let rank = encode.find_duplicate_rank().unwrap_or_default();

            return DuplicateRankSnafu {
                rank,
                tokens: encode.len(),
                ranks: decode.len(),
            }
            .fail();
        }

        let max_token_len = encode.max_token_len();
        trace!(
            tokens = encode.len(),
            max_token_len,
            "Built vocabulary lookup tables"
        );

        Ok(Self {
            encode,
            decode,
            max_token_len,
        })
    }
}

impl Vocabulary {
    /// Look up the rank of a token, if it's in the vocabulary.
    ///
    /// This is the lookup to use in a merge loop, where most candidate byte spans aren't tokens
    /// and that's not an error.
    pub fn try_get_rank(&self, token: impl AsRef<[u8]>) -> Option<Rank> {
        self.encode.rank_for_bytes(token)
    }

    /// Look up the rank of a token that's expected to be in the vocabulary.
    pub fn get_rank(&self, token: impl AsRef<[u8]>) -> Result<Rank> {
        let token = token.as_ref();

        self.try_get_rank(token).with_context(|| UnknownTokenSnafu {
            token: token.to_vec(),
        })
    }

    /// Get a copy of the token with the given rank.
    pub fn get_token(&self, rank: Rank) -> Result<Token> {
        self.token_bytes(rank)
            .map(<[u8]>::to_vec)
            .context(UnknownRankSnafu { rank })
    }

    /// Like [`Self::get_token`] but borrows the token bytes from the vocabulary instead of copying
    /// them.
    pub fn token_bytes(&self, rank: Rank) -> Option<&[u8]> {
        self.decode.bytes_for_rank(rank).map(Vec::as_slice)
    }

    /// The length in bytes of the token with the given rank, without copying the token.
    pub fn token_len(&self, rank: Rank) -> Option<usize> {
        self.decode.token_len(rank)
    }

    /// Whether the token is in the vocabulary.
    pub fn contains_token(&self, token: impl AsRef<[u8]>) -> bool {
        self.try_get_rank(token).is_some()
    }

    /// Concatenate the tokens for a sequence of ranks.
    ///
    /// Fails on the first rank that isn't in the vocabulary.  The result is bytes and not a string
    /// because a byte-level BPE vocabulary is free to split UTF-8 code points across tokens.
    pub fn decode_ranks(&self, ranks: &[Rank]) -> Result<Token> {
        let mut bytes = Vec::with_capacity(ranks.len() * 4);

        for &rank in ranks {
            let token = self.token_bytes(rank).context(UnknownRankSnafu { rank })?;
            bytes.extend_from_slice(token);
        }

        Ok(bytes)
    }

    /// The number of tokens in the vocabulary.
    pub fn count(&self) -> usize {
        self.encode.len()
    }

    /// The length in bytes of the longest token, or zero if the vocabulary is empty.
    pub fn max_token_len(&self) -> usize {
        self.max_token_len
    }

    /// The highest rank in the vocabulary, or `None` if the vocabulary is empty.
    pub fn max_rank(&self) -> Option<Rank> {
        self.decode.max_rank()
    }

    /// All tokens and their ranks, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], Rank)> {
        self.encode.tokens()
    }
}

impl Vocabulary {
    /// Write the vocabulary in the tiktoken rank file format, one record per line in ascending
    /// rank order.
    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        let mut records = self.decode.tokens().collect::<Vec<_>>();
        records.sort_unstable_by_key(|(rank, _)| *rank);

        for (rank, token) in records {
            parse::write_record(writer, token, rank)?;
        }

        Ok(())
    }

    /// Write the vocabulary to a tiktoken rank file, replacing the file if it exists.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let context = || FileIoSnafu {
            path: path.to_path_buf(),
        };

        let mut writer = BufWriter::new(File::create(path).with_context(|_| context())?);
        self.write_to(&mut writer)?;
        writer.flush().with_context(|_| context())?;

        debug!(path = %path.display(), tokens = self.count(), "Saved vocabulary");
        Ok(())
    }
}
