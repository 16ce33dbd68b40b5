//! A cache of loaded vocabularies, keyed by encoding name.
//!
//! Unlike tiktoken, there is no process-wide cache hiding behind a global.  Whoever needs one
//! creates a [`VocabCache`] pointed at a directory of rank files and decides how long it lives.
//! Tests can have as many isolated caches as they like.
use crate::error::*;
use crate::{Result, Vocabulary};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use snafu::ensure;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use strum::{EnumIter, EnumString, EnumVariantNames};
use tracing::*;

/// The well-known OpenAI tokenizer encodings.
///
/// Each of these has its own vocabulary, except for `p50k_edit` which shares the vocabulary of
/// `p50k_base` and only differs in its special tokens.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, EnumString, EnumIter, EnumVariantNames, strum::Display,
)]
pub enum EncodingType {
    #[strum(serialize = "cl100k_base")]
    Cl100kBase,
    #[strum(serialize = "o200k_base")]
    O200kBase,
    #[strum(serialize = "gpt2")]
    Gpt2,
    #[strum(serialize = "p50k_base")]
    P50kBase,
    #[strum(serialize = "p50k_edit")]
    P50kEdit,
    #[strum(serialize = "r50k_base")]
    R50kBase,
}

impl EncodingType {
    /// Parse an encoding name like `cl100k_base`.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| {
            UnknownEncodingSnafu {
                encoding: name.to_string(),
            }
            .build()
        })
    }

    /// The name of the rank file this encoding's vocabulary is stored in, without the extension.
    pub fn vocab_name(self) -> &'static str {
        match self {
            // NOTE: p50k_edit and p50k_base share the same tokens
            EncodingType::P50kBase | EncodingType::P50kEdit => "p50k_base",
            EncodingType::Cl100kBase => "cl100k_base",
            EncodingType::O200kBase => "o200k_base",
            EncodingType::Gpt2 => "gpt2",
            EncodingType::R50kBase => "r50k_base",
        }
    }
}

/// Where a [`VocabCache`] finds rank files.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VocabCacheConfig {
    /// Directory holding one rank file per vocabulary.
    pub dir: PathBuf,

    /// Extension of rank files, without the leading dot.
    ///
    /// The vocabulary named `name` is read from `<dir>/<name>.<extension>`.
    pub extension: String,
}

impl VocabCacheConfig {
    pub const DEFAULT_EXTENSION: &'static str = "tiktoken";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: Self::DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The path of the rank file for the vocabulary `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{}", self.extension))
    }
}

/// A slot in the cache.  The slot is created under the map lock, but the vocabulary itself is
/// loaded outside of it so one slow load doesn't hold up lookups of other vocabularies.
type Slot = Arc<OnceCell<Arc<Vocabulary>>>;

/// Caller-owned cache of loaded vocabularies.
///
/// Vocabularies are loaded on first use and then shared as `Arc<Vocabulary>`.  Concurrent requests
/// for the same vocabulary only load it once; the others wait for that load to finish.  A failed
/// load isn't cached, so the next request tries again.
///
/// Evicting or clearing only drops the cache's own references.  Anyone still holding an
/// `Arc<Vocabulary>` keeps using it undisturbed.
#[derive(Debug)]
pub struct VocabCache {
    config: VocabCacheConfig,
    slots: Mutex<FxHashMap<String, Slot>>,
}

impl VocabCache {
    pub fn new(config: VocabCacheConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn config(&self) -> &VocabCacheConfig {
        &self.config
    }

    /// Get the vocabulary named `name` if it's already loaded, without trying to load it.
    pub fn get(&self, name: &str) -> Option<Arc<Vocabulary>> {
        self.slots
            .lock()
            .get(name)
            .and_then(|slot| slot.get().cloned())
    }

    /// Get the vocabulary named `name`, loading it from the cache directory if it's not already
    /// loaded.
    pub fn get_or_load(&self, name: &str) -> Result<Arc<Vocabulary>> {
        validate_name(name)?;

        let slot = self.slots.lock().entry(name.to_string()).or_default().clone();

        if let Some(vocab) = slot.get() {
            trace!(name, "Vocabulary cache hit");
            return Ok(vocab.clone());
        }

        slot.get_or_try_init(|| {
            let path = self.config.path_for(name);
            debug!(name, path = %path.display(), "Vocabulary cache miss");

            Vocabulary::from_file(&path).map(Arc::new)
        })
        .cloned()
    }

    /// Like [`Self::get_or_load`], for one of the well-known encodings.
    pub fn get_or_load_encoding(&self, encoding: EncodingType) -> Result<Arc<Vocabulary>> {
        self.get_or_load(encoding.vocab_name())
    }

    /// Put a vocabulary obtained some other way into the cache under `name`, replacing whatever
    /// was there before.
    pub fn insert(&self, name: &str, vocab: Vocabulary) -> Result<Arc<Vocabulary>> {
        validate_name(name)?;

        let vocab = Arc::new(vocab);
        let slot = OnceCell::with_value(vocab.clone());

        if self
            .slots
            .lock()
            .insert(name.to_string(), Arc::new(slot))
            .is_some()
        {
            debug!(name, "Replaced cached vocabulary");
        }

        Ok(vocab)
    }

    /// Remove the vocabulary named `name` from the cache.  Returns `true` if it was loaded.
    pub fn evict(&self, name: &str) -> bool {
        let evicted = self
            .slots
            .lock()
            .remove(name)
            .map_or(false, |slot| slot.get().is_some());

        if evicted {
            debug!(name, "Evicted vocabulary from cache");
        }

        evicted
    }

    /// Remove all vocabularies from the cache.
    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        debug!(entries = slots.len(), "Clearing vocabulary cache");
        slots.clear();
    }

    /// The number of vocabularies currently loaded.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vocabulary names become file names in the cache directory, so anything that could point
/// somewhere else is rejected.
fn validate_name(name: &str) -> Result<()> {
    ensure!(
        !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..",
        InvalidEncodingNameSnafu { name }
    );

    Ok(())
}
