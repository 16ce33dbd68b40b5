//! Conversion between token byte sequences and the opaque keys the forward lookup table is keyed
//! by.
//!
//! Most tokens in real vocabularies are short, so a key packs up to [`INLINE_CAPACITY`] bytes
//! inline next to an explicit length byte, and only spills to the heap for longer tokens.  That
//! way building a key for a lookup in the BPE merge loop doesn't allocate in the common case.
//!
//! The packing is canonical: a given byte sequence always produces the same variant with the
//! same padding, so the derived `Eq` and `Hash` are exactly equality of the underlying bytes.
//! The explicit length keeps sequences that differ only by trailing zero bytes apart.
use crate::Token;
use std::fmt;

/// The longest token that is stored inline in a [`ByteKey`].
pub(crate) const INLINE_CAPACITY: usize = 23;

/// Opaque hash key for a token.  Never exposed outside of the crate.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) enum ByteKey {
    Inline {
        len: u8,
        bytes: [u8; INLINE_CAPACITY],
    },
    Heap(Box<[u8]>),
}

impl ByteKey {
    /// The token bytes this key was made from.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            ByteKey::Inline { len, bytes } => &bytes[..*len as usize],
            ByteKey::Heap(bytes) => &bytes[..],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.as_bytes().len()
    }
}

impl fmt::Debug for ByteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteKey").field(&self.as_bytes()).finish()
    }
}

/// Make the key for a token.
///
/// Deterministic and injective: equal tokens always produce equal keys, different tokens never do.
pub(crate) fn encode(token: &[u8]) -> ByteKey {
    if token.len() <= INLINE_CAPACITY {
        let mut bytes = [0u8; INLINE_CAPACITY];
        bytes[..token.len()].copy_from_slice(token);

        ByteKey::Inline {
            len: token.len() as u8,
            bytes,
        }
    } else {
        ByteKey::Heap(token.into())
    }
}

/// Recover the token a key was made from.  Returns an independent copy.
pub(crate) fn decode(key: &ByteKey) -> Token {
    key.as_bytes().to_vec()
}

/// The token bytes of a piece of text, which are just its UTF-8 encoding.
///
/// Every string has a byte representation, so this can't fail.
pub fn decode_text(text: &str) -> Token {
    text.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &ByteKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn short_tokens_are_inline() {
        assert!(matches!(encode(b"hello"), ByteKey::Inline { len: 5, .. }));
        assert!(matches!(
            encode(&[0xffu8; INLINE_CAPACITY]),
            ByteKey::Inline { .. }
        ));
        assert!(matches!(
            encode(&[0xffu8; INLINE_CAPACITY + 1]),
            ByteKey::Heap(_)
        ));
    }

    #[test]
    fn trailing_zero_bytes_are_significant() {
        // Inline padding is zero, so only the length tells these apart
        assert_ne!(encode(&[1]), encode(&[1, 0]));
        assert_ne!(encode(&[0]), encode(&[0, 0]));
        assert_ne!(encode(&[0]), encode(&[]));
    }

    #[test]
    fn delimiter_like_bytes_do_not_collide() {
        // A naive "join with spaces" or "join with commas" scheme would conflate these
        assert_ne!(encode(b"1 2"), encode(&[1, 2]));
        assert_ne!(encode(b"12,3"), encode(b"1,23"));
    }

    #[test]
    fn decode_text_uses_utf8_bytes() {
        assert_eq!(decode_text("hello"), b"hello".to_vec());
        assert_eq!(decode_text(""), Vec::<u8>::new());
        // U+00E9 is two bytes in UTF-8, not the single Latin-1 byte 0xe9
        assert_eq!(decode_text("caf\u{e9}"), vec![b'c', b'a', b'f', 0xc3, 0xa9]);
        assert_eq!(decode_text("\u{1f600}"), vec![0xf0, 0x9f, 0x98, 0x80]);
        assert_eq!(decode(&encode(&decode_text("caf\u{e9}"))), "caf\u{e9}".as_bytes());
    }

    proptest! {
        #[test]
        fn decode_reverses_encode(token in prop::collection::vec(any::<u8>(), 1..64)) {
            let key = encode(&token);
            prop_assert_eq!(key.len(), token.len());
            prop_assert_eq!(decode(&key), token);
        }

        #[test]
        fn encode_is_deterministic(token in prop::collection::vec(any::<u8>(), 1..64)) {
            let first = encode(&token);
            let second = encode(&token);
            prop_assert_eq!(hash_of(&first), hash_of(&second));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn distinct_tokens_get_distinct_keys(
            a in prop::collection::vec(any::<u8>(), 1..40),
            b in prop::collection::vec(any::<u8>(), 1..40),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(encode(&a), encode(&b));
        }
    }
}
