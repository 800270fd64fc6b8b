//! Vocabulary store
//!
//! Single owner of the vocabulary collection and both priority indexes;
//! every read and write of vocabulary data goes through [`VocabStore`].
//! Reviews are persisted before they return. Additions are not — the
//! caller decides when a batch of adds becomes durable by calling
//! [`VocabStore::save`].
//!
//! The store is single-threaded by design (shared `Rc` handles, matching
//! the cooperative UI ownership of the surrounding application); a
//! multi-threaded port must put one mutex around the whole store so the
//! collection and the indexes are never observed out of sync.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::storage::KeyValueStorage;

use super::algorithm::{ScheduledStates, Scheduler, SchedulerParams};
use super::index::{due_key, recency_key, DueKey, PriorityIndex, RecencyKey, SharedVocab};
use super::models::{Card, Rating, Result, SerializedVocab, Vocab, VocabError};

/// Key the whole collection is persisted under.
const VOCAB_KEY: &str = "vocab";

/// Language profile of the learner; read by the tutoring layers above the
/// core when building prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    /// Language the user already speaks
    pub user_language: String,
    /// Language being learned
    pub learn_language: String,
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self {
            user_language: "English".to_string(),
            learn_language: "Korean".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct VocabStore<S: KeyValueStorage> {
    storage: S,
    scheduler: Scheduler,
    pub languages: LanguagePair,
    items: HashMap<String, SharedVocab>,
    due_index: PriorityIndex<DueKey>,
    recency_index: PriorityIndex<RecencyKey>,
}

impl<S: KeyValueStorage> VocabStore<S> {
    /// Load the persisted collection from `storage`. A missing record set
    /// loads as an empty store; a single bad card aborts the whole load.
    pub fn load(storage: S) -> Result<Self> {
        Self::load_with_params(storage, SchedulerParams::default())
    }

    /// Load with custom scheduling parameters.
    pub fn load_with_params(storage: S, params: SchedulerParams) -> Result<Self> {
        let mut store = Self {
            storage,
            scheduler: Scheduler::new(params),
            languages: LanguagePair::default(),
            items: HashMap::new(),
            due_index: PriorityIndex::new(due_key),
            recency_index: PriorityIndex::new(recency_key),
        };

        let document = match store.storage.get(VOCAB_KEY)? {
            Some(document) => document,
            None => {
                log::debug!("no persisted vocabulary, starting empty");
                return Ok(store);
            }
        };

        let serialized: HashMap<String, SerializedVocab> = serde_json::from_str(&document)?;
        for record in serialized.into_values() {
            let vocab = Vocab::from_serialized(&record)?;
            store.insert_shared(vocab);
        }

        log::info!("loaded {} vocabulary items", store.items.len());
        Ok(store)
    }

    /// Add a new word with a fresh card due at `now`. Not persisted until
    /// the next [`VocabStore::save`].
    pub fn add_item(&mut self, text: &str, notes: &str, now: DateTime<Utc>) -> Result<()> {
        if text.is_empty() {
            return Err(VocabError::EmptyText);
        }
        if self.items.contains_key(text) {
            return Err(VocabError::DuplicateItem(text.to_string()));
        }

        log::debug!("adding vocabulary item: {}", text);
        self.insert_shared(Vocab::new(text.to_string(), notes.to_string(), now));
        Ok(())
    }

    /// Commit a review outcome for `text` at `now`.
    ///
    /// The chosen rating's card replaces the item's card, both indexes
    /// are repositioned, and the collection is persisted before this
    /// returns. The committed card is handed back to the caller.
    pub fn review_item(&mut self, text: &str, rating: Rating, now: DateTime<Utc>) -> Result<Card> {
        let item = self
            .items
            .get(text)
            .cloned()
            .ok_or_else(|| VocabError::ItemNotFound(text.to_string()))?;

        let next = {
            let current = item.borrow();
            self.scheduler.next_states(&current.card, now).take(rating)
        };

        item.borrow_mut().card = next.clone();
        self.due_index.reposition(&item);
        self.recency_index.reposition(&item);

        log::debug!("reviewed {} as {:?}, next due {}", text, rating, next.due);
        self.save()?;
        Ok(next)
    }

    /// Preview the card each rating would produce for `text`, without
    /// committing anything.
    pub fn preview(&self, text: &str, now: DateTime<Utc>) -> Result<ScheduledStates> {
        let item = self
            .items
            .get(text)
            .ok_or_else(|| VocabError::ItemNotFound(text.to_string()))?;

        let current = item.borrow();
        Ok(self.scheduler.next_states(&current.card, now))
    }

    /// Up to `limit` words with the soonest due dates.
    pub fn due_items(&self, limit: usize) -> Vec<SharedVocab> {
        self.due_index.top_k(limit)
    }

    /// Up to `limit` most recently reviewed words.
    pub fn recent_items(&self, limit: usize) -> Vec<SharedVocab> {
        self.recency_index.top_k(limit)
    }

    pub fn lookup(&self, text: &str) -> Option<SharedVocab> {
        self.items.get(text).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize the whole collection and persist it in one write. Keys
    /// are written in sorted order so the document is deterministic.
    pub fn save(&mut self) -> Result<()> {
        let mut serialized = BTreeMap::new();
        for (text, item) in &self.items {
            serialized.insert(text.clone(), item.borrow().to_serialized());
        }

        let document = serde_json::to_string(&serialized)?;
        self.storage.set(VOCAB_KEY, &document)?;

        log::debug!("saved {} vocabulary items", serialized.len());
        Ok(())
    }

    fn insert_shared(&mut self, vocab: Vocab) {
        let text = vocab.text.clone();
        let shared: SharedVocab = Rc::new(RefCell::new(vocab));
        self.due_index.insert(Rc::clone(&shared));
        self.recency_index.insert(Rc::clone(&shared));
        self.items.insert(text, shared);
    }
}
