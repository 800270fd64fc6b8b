//! FSRS spaced repetition scheduler
//!
//! Implementation of the FSRS forgetting-curve model for computing review
//! intervals from a card's stability and difficulty estimates.
//!
//! One call produces the resulting card for every possible rating, so the
//! caller can preview all four outcomes and commit exactly one. The wall
//! clock is never read here; `now` is injected by the caller, which keeps
//! scheduling deterministic.

use chrono::{DateTime, Duration, Utc};

use super::models::{Card, CardStatus, Rating};

/// Stock FSRS model weights.
pub const DEFAULT_WEIGHTS: [f64; 17] = [
    0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26, 0.29,
    2.61,
];

/// Difficulty is kept within this range by every update
const MIN_DIFFICULTY: f64 = 1.0;
const MAX_DIFFICULTY: f64 = 10.0;

/// Stability floor for freshly seeded cards
const MIN_STABILITY: f64 = 0.1;

/// Tunable scheduling parameters
#[derive(Debug, Clone)]
pub struct SchedulerParams {
    /// Target probability of recall at review time
    pub request_retention: f64,
    /// Hard cap on any scheduled interval, in days
    pub maximum_interval: u32,
    /// FSRS model weights
    pub weights: [f64; 17],
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            request_retention: 0.9,
            maximum_interval: 36500,
            weights: DEFAULT_WEIGHTS,
        }
    }
}

/// The card a review would produce, for every possible rating.
///
/// A closed mapping: one slot per rating, nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledStates {
    pub again: Card,
    pub hard: Card,
    pub good: Card,
    pub easy: Card,
}

impl ScheduledStates {
    pub fn get(&self, rating: Rating) -> &Card {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }

    fn get_mut(&mut self, rating: Rating) -> &mut Card {
        match rating {
            Rating::Again => &mut self.again,
            Rating::Hard => &mut self.hard,
            Rating::Good => &mut self.good,
            Rating::Easy => &mut self.easy,
        }
    }

    /// Consume the preview, keeping only the chosen outcome.
    pub fn take(self, rating: Rating) -> Card {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    params: SchedulerParams,
}

impl Scheduler {
    pub fn new(params: SchedulerParams) -> Self {
        Self { params }
    }

    /// Compute the card each rating would produce for a review at `now`.
    ///
    /// `reps` increments for every outcome; `lapses` increments only for
    /// Again. Deterministic given identical `(card, now)`.
    pub fn next_states(&self, card: &Card, now: DateTime<Utc>) -> ScheduledStates {
        let mut current = card.clone();
        current.elapsed_days = match (current.status, current.last_review) {
            (CardStatus::New, _) | (_, None) => 0,
            (_, Some(last)) => (now - last).num_days().max(0) as u32,
        };
        current.last_review = Some(now);
        current.reps += 1;

        let mut states = ScheduledStates {
            again: current.clone(),
            hard: current.clone(),
            good: current.clone(),
            easy: current.clone(),
        };
        states.again.lapses += 1;

        match card.status {
            CardStatus::New => self.schedule_new(&mut states, now),
            CardStatus::Learning | CardStatus::Relearning => {
                self.schedule_learning(&mut states, card.status, now)
            }
            CardStatus::Review => self.schedule_review(&mut states, &current, now),
        }

        states
    }

    /// First review: seed stability and difficulty per rating, keep the
    /// card in minutes-scale learning steps unless it was rated Easy.
    fn schedule_new(&self, states: &mut ScheduledStates, now: DateTime<Utc>) {
        for rating in Rating::ALL {
            let state = states.get_mut(rating);
            state.stability = self.init_stability(rating);
            state.difficulty = self.init_difficulty(rating);
        }

        states.again.status = CardStatus::Learning;
        states.hard.status = CardStatus::Learning;
        states.good.status = CardStatus::Learning;
        states.easy.status = CardStatus::Review;

        states.again.scheduled_days = 0;
        states.again.due = now + Duration::minutes(1);
        states.hard.scheduled_days = 0;
        states.hard.due = now + Duration::minutes(5);
        states.good.scheduled_days = 0;
        states.good.due = now + Duration::minutes(10);

        let easy_interval = self.next_interval(states.easy.stability);
        states.easy.scheduled_days = easy_interval;
        states.easy.due = now + Duration::days(easy_interval as i64);
    }

    /// Learning steps: stability and difficulty stay at their seeds; Good
    /// and Easy graduate to day-scale review intervals.
    fn schedule_learning(&self, states: &mut ScheduledStates, status: CardStatus, now: DateTime<Utc>) {
        states.again.status = status;
        states.hard.status = status;
        states.good.status = CardStatus::Review;
        states.easy.status = CardStatus::Review;

        let good_interval = self.next_interval(states.good.stability);
        let easy_interval = self.next_interval(states.easy.stability).max(good_interval + 1);
        self.apply_intervals(states, now, 0, good_interval, easy_interval);
    }

    /// Graduated review: full retrievability-driven stability/difficulty
    /// update, with intervals forced strictly apart per rating.
    fn schedule_review(&self, states: &mut ScheduledStates, current: &Card, now: DateTime<Utc>) {
        states.again.status = CardStatus::Relearning;
        states.hard.status = CardStatus::Review;
        states.good.status = CardStatus::Review;
        states.easy.status = CardStatus::Review;

        let last_difficulty = current.difficulty;
        let last_stability = current.stability;
        let retrievability = self.retrievability(current.elapsed_days, last_stability);

        for rating in Rating::ALL {
            states.get_mut(rating).difficulty = self.next_difficulty(last_difficulty, rating);
        }
        states.again.stability =
            self.next_forget_stability(last_difficulty, last_stability, retrievability);
        for rating in [Rating::Hard, Rating::Good, Rating::Easy] {
            states.get_mut(rating).stability =
                self.next_recall_stability(last_difficulty, last_stability, retrievability, rating);
        }

        let mut hard_interval = self.next_interval(states.hard.stability);
        let mut good_interval = self.next_interval(states.good.stability);
        hard_interval = hard_interval.min(good_interval);
        good_interval = good_interval.max(hard_interval + 1);
        let easy_interval = self.next_interval(states.easy.stability).max(good_interval + 1);

        self.apply_intervals(states, now, hard_interval, good_interval, easy_interval);
    }

    fn apply_intervals(
        &self,
        states: &mut ScheduledStates,
        now: DateTime<Utc>,
        hard_interval: u32,
        good_interval: u32,
        easy_interval: u32,
    ) {
        states.again.scheduled_days = 0;
        states.again.due = now + Duration::minutes(5);

        states.hard.scheduled_days = hard_interval;
        states.hard.due = if hard_interval > 0 {
            now + Duration::days(hard_interval as i64)
        } else {
            now + Duration::minutes(10)
        };

        states.good.scheduled_days = good_interval;
        states.good.due = now + Duration::days(good_interval as i64);

        states.easy.scheduled_days = easy_interval;
        states.easy.due = now + Duration::days(easy_interval as i64);
    }

    // ===== Model equations =====

    fn init_stability(&self, rating: Rating) -> f64 {
        let w = &self.params.weights;
        w[rating as usize - 1].max(MIN_STABILITY)
    }

    fn init_difficulty(&self, rating: Rating) -> f64 {
        let w = &self.params.weights;
        (w[4] - (rating as u8 as f64 - 3.0) * w[5]).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Probability the card is still recalled `elapsed_days` after the
    /// previous review, given its stability.
    fn retrievability(&self, elapsed_days: u32, stability: f64) -> f64 {
        (1.0 + elapsed_days as f64 / (9.0 * stability)).recip()
    }

    fn next_difficulty(&self, difficulty: f64, rating: Rating) -> f64 {
        let w = &self.params.weights;
        let next = difficulty - w[6] * (rating as u8 as f64 - 3.0);
        // mean reversion toward the initial Good difficulty
        (w[7] * w[4] + (1.0 - w[7]) * next).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    fn next_recall_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        rating: Rating,
    ) -> f64 {
        let w = &self.params.weights;
        let hard_penalty = if rating == Rating::Hard { w[15] } else { 1.0 };
        let easy_bonus = if rating == Rating::Easy { w[16] } else { 1.0 };

        stability
            * (1.0
                + w[8].exp()
                    * (11.0 - difficulty)
                    * stability.powf(-w[9])
                    * (((1.0 - retrievability) * w[10]).exp() - 1.0)
                    * hard_penalty
                    * easy_bonus)
    }

    fn next_forget_stability(&self, difficulty: f64, stability: f64, retrievability: f64) -> f64 {
        let w = &self.params.weights;
        w[11]
            * difficulty.powf(-w[12])
            * ((stability + 1.0).powf(w[13]) - 1.0)
            * (((1.0 - retrievability) * w[14]).exp())
    }

    /// Map a stability to the interval that hits the requested retention.
    fn next_interval(&self, stability: f64) -> u32 {
        let interval = stability * 9.0 * (1.0 / self.params.request_retention - 1.0);
        (interval.round() as i64).clamp(1, self.params.maximum_interval as i64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn review_card(now: DateTime<Utc>) -> Card {
        Card {
            due: now,
            stability: 5.0,
            difficulty: 5.0,
            elapsed_days: 5,
            scheduled_days: 5,
            reps: 3,
            lapses: 0,
            status: CardStatus::Review,
            last_review: Some(now - Duration::days(5)),
        }
    }

    #[test]
    fn test_reps_increment_for_every_rating() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let card = review_card(now);

        let states = scheduler.next_states(&card, now);
        for rating in Rating::ALL {
            assert_eq!(states.get(rating).reps, card.reps + 1);
        }
    }

    #[test]
    fn test_lapses_increment_only_on_again() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let card = review_card(now);

        let states = scheduler.next_states(&card, now);
        assert_eq!(states.again.lapses, card.lapses + 1);
        assert_eq!(states.hard.lapses, card.lapses);
        assert_eq!(states.good.lapses, card.lapses);
        assert_eq!(states.easy.lapses, card.lapses);
    }

    #[test]
    fn test_next_states_is_deterministic() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let card = review_card(now);

        assert_eq!(
            scheduler.next_states(&card, now),
            scheduler.next_states(&card, now)
        );
    }

    #[test]
    fn test_new_card_seeds() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let card = Card::new(now);

        let states = scheduler.next_states(&card, now);
        for rating in Rating::ALL {
            let state = states.get(rating);
            assert_eq!(state.stability, DEFAULT_WEIGHTS[rating as usize - 1]);
            assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&state.difficulty));
            assert_eq!(state.elapsed_days, 0);
            assert_eq!(state.last_review, Some(now));
        }

        // harder ratings seed higher difficulty
        assert!(states.again.difficulty > states.good.difficulty);
        assert!(states.good.difficulty > states.easy.difficulty);
    }

    #[test]
    fn test_new_card_phases_and_steps() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let card = Card::new(now);

        let states = scheduler.next_states(&card, now);
        assert_eq!(states.again.status, CardStatus::Learning);
        assert_eq!(states.hard.status, CardStatus::Learning);
        assert_eq!(states.good.status, CardStatus::Learning);
        assert_eq!(states.easy.status, CardStatus::Review);

        // learning steps are minutes-scale
        assert_eq!(states.again.due, now + Duration::minutes(1));
        assert_eq!(states.hard.due, now + Duration::minutes(5));
        assert_eq!(states.good.due, now + Duration::minutes(10));

        // Easy skips straight to a day-scale interval: round(5.8 * 9 * (1/0.9 - 1)) = 6
        assert_eq!(states.easy.scheduled_days, 6);
        assert_eq!(states.easy.due, now + Duration::days(6));
    }

    #[test]
    fn test_learning_card_graduates_on_good() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let learning = scheduler.next_states(&Card::new(now), now).take(Rating::Good);

        let later = now + Duration::minutes(10);
        let states = scheduler.next_states(&learning, later);

        assert_eq!(states.again.status, CardStatus::Learning);
        assert_eq!(states.hard.status, CardStatus::Learning);
        assert_eq!(states.good.status, CardStatus::Review);
        assert_eq!(states.easy.status, CardStatus::Review);

        assert!(states.good.scheduled_days >= 1);
        assert!(states.easy.scheduled_days > states.good.scheduled_days);
    }

    #[test]
    fn test_review_card_intervals_strictly_ordered() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let card = review_card(now);

        let states = scheduler.next_states(&card, now);
        assert!(states.hard.scheduled_days <= states.good.scheduled_days);
        assert!(states.good.scheduled_days < states.easy.scheduled_days);
    }

    #[test]
    fn test_again_from_review_lapses() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let card = review_card(now);

        let states = scheduler.next_states(&card, now);
        assert_eq!(states.again.status, CardStatus::Relearning);
        assert_eq!(states.again.scheduled_days, 0);
        assert_eq!(states.again.due, now + Duration::minutes(5));
        // forgetting costs stability
        assert!(states.again.stability < card.stability);
    }

    #[test]
    fn test_review_stability_and_difficulty_updates() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let card = review_card(now);

        let states = scheduler.next_states(&card, now);
        // successful recall grows stability, Easy more than Good
        assert!(states.good.stability > card.stability);
        assert!(states.easy.stability > states.good.stability);
        assert!(states.hard.stability < states.good.stability);
        // difficulty moves opposite to the rating
        assert!(states.again.difficulty > card.difficulty);
        assert!(states.easy.difficulty < card.difficulty);
    }

    #[test]
    fn test_elapsed_days_from_last_review() {
        let scheduler = Scheduler::default();
        let now = fixed_time();
        let mut card = review_card(now);
        card.last_review = Some(now - Duration::days(12));

        let states = scheduler.next_states(&card, now);
        assert_eq!(states.good.elapsed_days, 12);
    }

    #[test]
    fn test_due_never_before_review_time() {
        let scheduler = Scheduler::default();
        let now = fixed_time();

        for card in [Card::new(now), review_card(now)] {
            let states = scheduler.next_states(&card, now);
            for rating in Rating::ALL {
                assert!(states.get(rating).due >= now);
            }
        }
    }

    #[test]
    fn test_interval_clamped_to_maximum() {
        let scheduler = Scheduler::new(SchedulerParams {
            maximum_interval: 30,
            ..SchedulerParams::default()
        });
        let now = fixed_time();
        let mut card = review_card(now);
        card.stability = 10_000.0;

        let states = scheduler.next_states(&card, now);
        // hard is the raw clamped interval; good/easy may sit 1-2 days
        // above it to keep the ratings strictly ordered
        assert_eq!(states.hard.scheduled_days, 30);
        assert_eq!(states.good.scheduled_days, 31);
        assert_eq!(states.easy.scheduled_days, 32);
    }
}
