//! Data models for the vocabulary store
//!
//! A vocabulary item owns exactly one scheduling card. Cards persist as a
//! fixed-order tuple so the schema version rides in slot 0 and the layout
//! stays compact; loading a tuple with an unsupported version is a fatal
//! error, there is no migration path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema tag written into slot 0 of every serialized card.
pub const CARD_SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum VocabError {
    #[error("unknown card serialization version: {found}")]
    SchemaVersionMismatch { found: u32 },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    #[error("unknown card status: {0}")]
    UnknownCardStatus(u8),

    #[error("word text must not be empty")]
    EmptyText,

    #[error("word already exists: {0}")]
    DuplicateItem(String),

    #[error("word not found: {0}")]
    ItemNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

pub type Result<T> = std::result::Result<T, VocabError>;

/// Learning phase of a card in the spaced repetition system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    /// Never reviewed
    New,
    /// In initial learning steps
    Learning,
    /// Regular spaced review
    Review,
    /// Failed and re-learning
    Relearning,
}

impl Default for CardStatus {
    fn default() -> Self {
        Self::New
    }
}

impl CardStatus {
    /// Wire discriminant stored in slot 8 of the card tuple.
    pub fn to_wire(self) -> u8 {
        match self {
            Self::New => 0,
            Self::Learning => 1,
            Self::Review => 2,
            Self::Relearning => 3,
        }
    }

    pub fn from_wire(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::New),
            1 => Ok(Self::Learning),
            2 => Ok(Self::Review),
            3 => Ok(Self::Relearning),
            other => Err(VocabError::UnknownCardStatus(other)),
        }
    }
}

/// Reviewer's self-assessment of recall quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    /// Failed to recall
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled with some hesitation
    Good = 3,
    /// Perfect recall
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];
}

/// Per-word memory state driving the scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// When the word should next be presented
    pub due: DateTime<Utc>,
    /// Estimate of how slowly memory for this word decays
    pub stability: f64,
    /// Estimate of intrinsic word difficulty
    pub difficulty: f64,
    /// Days since the previous review, at the time of the latest review
    pub elapsed_days: u32,
    /// Days the previous interval was scheduled for
    pub scheduled_days: u32,
    /// Total review count
    pub reps: u32,
    /// Number of reviews rated Again
    pub lapses: u32,
    pub status: CardStatus,
    /// Time of the most recent review, `None` before the first review
    pub last_review: Option<DateTime<Utc>>,
}

impl Card {
    /// Fresh card for a word added at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            status: CardStatus::New,
            last_review: None,
        }
    }

    pub fn to_serialized(&self) -> SerializedCard {
        SerializedCard(
            CARD_SCHEMA_VERSION,
            self.due.to_rfc3339(),
            self.stability,
            self.difficulty,
            self.elapsed_days,
            self.scheduled_days,
            self.reps,
            self.lapses,
            self.status.to_wire(),
            self.last_review.map(|t| t.to_rfc3339()).unwrap_or_default(),
        )
    }

    pub fn from_serialized(serialized: &SerializedCard) -> Result<Self> {
        if serialized.0 != CARD_SCHEMA_VERSION {
            return Err(VocabError::SchemaVersionMismatch { found: serialized.0 });
        }

        let last_review = if serialized.9.is_empty() {
            None
        } else {
            Some(parse_timestamp(&serialized.9)?)
        };

        Ok(Self {
            due: parse_timestamp(&serialized.1)?,
            stability: serialized.2,
            difficulty: serialized.3,
            elapsed_days: serialized.4,
            scheduled_days: serialized.5,
            reps: serialized.6,
            lapses: serialized.7,
            status: CardStatus::from_wire(serialized.8)?,
            last_review,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Persisted card tuple: `[version, due, stability, difficulty,
/// elapsed_days, scheduled_days, reps, lapses, status, last_review]`.
///
/// Timestamps are RFC 3339 strings; `last_review` is the empty string for
/// cards that were never reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedCard(u32, String, f64, f64, u32, u32, u32, u32, u8, String);

/// A vocabulary word with user notes and its scheduling card
#[derive(Debug, Clone, PartialEq)]
pub struct Vocab {
    /// The word or expression; unique key of the collection
    pub text: String,
    /// Free-form definition or translation
    pub notes: String,
    pub card: Card,
}

impl Vocab {
    pub fn new(text: String, notes: String, now: DateTime<Utc>) -> Self {
        Self {
            text,
            notes,
            card: Card::new(now),
        }
    }

    pub fn to_serialized(&self) -> SerializedVocab {
        SerializedVocab {
            text: self.text.clone(),
            notes: self.notes.clone(),
            card: self.card.to_serialized(),
        }
    }

    pub fn from_serialized(serialized: &SerializedVocab) -> Result<Self> {
        Ok(Self {
            text: serialized.text.clone(),
            notes: serialized.notes.clone(),
            card: Card::from_serialized(&serialized.card)?,
        })
    }
}

/// Persisted form of a [`Vocab`] record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedVocab {
    pub text: String,
    pub notes: String,
    pub card: SerializedCard,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_new_card_defaults() {
        let now = fixed_time();
        let card = Card::new(now);

        assert_eq!(card.status, CardStatus::New);
        assert_eq!(card.due, now);
        assert_eq!(card.reps, 0);
        assert_eq!(card.lapses, 0);
        assert_eq!(card.last_review, None);
    }

    #[test]
    fn test_card_round_trip() {
        let now = fixed_time();
        let card = Card {
            due: now + chrono::Duration::days(6),
            stability: 5.8,
            difficulty: 4.93,
            elapsed_days: 3,
            scheduled_days: 6,
            reps: 4,
            lapses: 1,
            status: CardStatus::Review,
            last_review: Some(now),
        };

        let restored = Card::from_serialized(&card.to_serialized()).unwrap();
        assert_eq!(restored, card);
    }

    #[test]
    fn test_unreviewed_card_round_trip() {
        let card = Card::new(fixed_time());
        let restored = Card::from_serialized(&card.to_serialized()).unwrap();
        assert_eq!(restored, card);
        assert_eq!(restored.last_review, None);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut serialized = Card::new(fixed_time()).to_serialized();
        serialized.0 = 2;

        let err = Card::from_serialized(&serialized).unwrap_err();
        assert!(matches!(err, VocabError::SchemaVersionMismatch { found: 2 }));
    }

    #[test]
    fn test_serialized_card_is_tuple() {
        let value = serde_json::to_value(Card::new(fixed_time()).to_serialized()).unwrap();
        let slots = value.as_array().expect("card should serialize as an array");

        assert_eq!(slots.len(), 10);
        assert_eq!(slots[0], serde_json::json!(CARD_SCHEMA_VERSION));
        // slot 9 is the empty sentinel for a never-reviewed card
        assert_eq!(slots[9], serde_json::json!(""));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut serialized = Card::new(fixed_time()).to_serialized();
        serialized.8 = 9;

        let err = Card::from_serialized(&serialized).unwrap_err();
        assert!(matches!(err, VocabError::UnknownCardStatus(9)));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let mut serialized = Card::new(fixed_time()).to_serialized();
        serialized.1 = "not a timestamp".to_string();

        let err = Card::from_serialized(&serialized).unwrap_err();
        assert!(matches!(err, VocabError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_vocab_round_trip() {
        let vocab = Vocab::new("가다".to_string(), "to go".to_string(), fixed_time());
        let restored = Vocab::from_serialized(&vocab.to_serialized()).unwrap();
        assert_eq!(restored, vocab);
    }
}
