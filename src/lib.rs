//! Baeum — vocabulary store and spaced repetition core for a
//! language-learning assistant.
//!
//! The chat tutor, language-model plumbing, tokenizer, and UI live above
//! this crate. What lives here is the part with scheduling semantics:
//! per-word card state, the FSRS scheduler, the due/recency priority
//! indexes, and the store that owns the collection and persists it
//! through a key-value collaborator.
//!
//! The core never reads the wall clock; callers inject `now` into every
//! scheduling call, which keeps [`Scheduler::next_states`] deterministic
//! and testable.

pub mod storage;
pub mod vocab;

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use vocab::{
    Card, CardStatus, LanguagePair, Rating, ScheduledStates, Scheduler, SchedulerParams, Vocab,
    VocabError, VocabStore,
};
