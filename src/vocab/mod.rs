//! Vocabulary and spaced repetition core
//!
//! This module provides:
//! - Per-word card state with versioned tuple serialization
//! - FSRS scheduling (preview of all four review outcomes)
//! - Due/recency priority indexes with O(log n) reposition
//! - The vocabulary store that owns the collection and persists it

pub mod algorithm;
pub mod index;
pub mod models;
pub mod store;

pub use algorithm::{ScheduledStates, Scheduler, SchedulerParams, DEFAULT_WEIGHTS};
pub use index::{PriorityIndex, SharedVocab};
pub use models::{
    Card, CardStatus, Rating, SerializedCard, SerializedVocab, Vocab, VocabError,
    CARD_SCHEMA_VERSION,
};
pub use store::{LanguagePair, VocabStore};
