//! Score, lives and distance ledger
//!
//! Listeners register with [`ScoreLedger::subscribe`]. Every mutation
//! notifies all current listeners synchronously, in registration order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::Ledger;

/// Scoring rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub score_per_meter: u64,
    pub score_per_coin: u64,
    pub score_per_trash: u64,
    pub initial_lives: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            score_per_meter: SCORE_PER_METER,
            score_per_coin: SCORE_PER_COIN,
            score_per_trash: SCORE_PER_TRASH,
            initial_lives: INITIAL_LIVES,
        }
    }
}

/// A value changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreEvent {
    Coins(u32),
    Trash(u32),
    Lives(u32),
    Distance(f32),
    Score(u64),
    BestScore(u64),
}

/// Returned by [`ScoreLedger::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(&ScoreEvent)>;

pub struct ScoreLedger {
    config: ScoreConfig,
    coins: u32,
    trash: u32,
    lives: u32,
    distance: f32,
    score: u64,
    best_score: u64,
    /// Distance already converted into score
    last_scored_distance: f32,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u32,
}

impl fmt::Debug for ScoreLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreLedger")
            .field("coins", &self.coins)
            .field("trash", &self.trash)
            .field("lives", &self.lives)
            .field("distance", &self.distance)
            .field("score", &self.score)
            .field("best_score", &self.best_score)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self::new(ScoreConfig::default())
    }
}

impl ScoreLedger {
    pub fn new(config: ScoreConfig) -> Self {
        Self {
            lives: config.initial_lives,
            config,
            coins: 0,
            trash: 0,
            distance: 0.0,
            score: 0,
            best_score: 0,
            last_scored_distance: 0.0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ScoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: ScoreEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    /// Start-of-run values; every field is re-announced
    pub fn reset_stats(&mut self) {
        self.coins = 0;
        self.trash = 0;
        self.lives = self.config.initial_lives;
        self.distance = 0.0;
        self.score = 0;
        self.last_scored_distance = 0.0;

        self.notify(ScoreEvent::Coins(self.coins));
        self.notify(ScoreEvent::Trash(self.trash));
        self.notify(ScoreEvent::Lives(self.lives));
        self.notify(ScoreEvent::Distance(self.distance));
        self.notify(ScoreEvent::Score(self.score));
    }

    /// Add travelled distance; whole units since the last award become score
    pub fn add_distance(&mut self, delta: f32) {
        if !(delta > 0.0) {
            return;
        }
        self.distance += delta;

        let unscored = self.distance - self.last_scored_distance;
        if unscored >= 1.0 {
            let meters = unscored.floor();
            self.score += meters as u64 * self.config.score_per_meter;
            self.last_scored_distance += meters;
            self.notify(ScoreEvent::Score(self.score));
        }

        self.notify(ScoreEvent::Distance(self.distance));
    }

    /// Seed the best score from storage
    pub fn set_best_score(&mut self, best: u64) {
        self.best_score = best;
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn trash(&self) -> u32 {
        self.trash
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn is_out_of_lives(&self) -> bool {
        self.lives == 0
    }

    fn handle_game_over(&mut self) {
        if self.score > self.best_score {
            self.best_score = self.score;
            log::info!("New best score: {}", self.best_score);
            self.notify(ScoreEvent::BestScore(self.best_score));
        }
    }
}

impl Ledger for ScoreLedger {
    fn lose_life(&mut self) {
        if self.lives == 0 {
            return;
        }
        self.lives -= 1;
        self.notify(ScoreEvent::Lives(self.lives));

        if self.lives == 0 {
            self.handle_game_over();
        }
    }

    fn add_coin(&mut self) {
        self.coins += 1;
        self.score += self.config.score_per_coin;
        self.notify(ScoreEvent::Coins(self.coins));
        self.notify(ScoreEvent::Score(self.score));
    }

    fn add_trash(&mut self) {
        self.trash += 1;
        self.score += self.config.score_per_trash;
        self.notify(ScoreEvent::Trash(self.trash));
        self.notify(ScoreEvent::Score(self.score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(ledger: &mut ScoreLedger) -> Rc<RefCell<Vec<ScoreEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        ledger.subscribe(move |e| sink.borrow_mut().push(*e));
        events
    }

    #[test]
    fn test_distance_scored_in_whole_units() {
        let mut ledger = ScoreLedger::default();
        for _ in 0..3 {
            ledger.add_distance(0.3);
        }
        assert_eq!(ledger.score(), 0);

        ledger.add_distance(0.3);
        assert_eq!(ledger.score(), 1);

        for _ in 0..3 {
            ledger.add_distance(0.3);
        }
        // 2.1 travelled
        assert_eq!(ledger.score(), 2);
        assert!((ledger.distance() - 2.1).abs() < 1e-4);
    }

    #[test]
    fn test_large_delta_awards_floor() {
        let mut ledger = ScoreLedger::default();
        ledger.add_distance(3.7);
        assert_eq!(ledger.score(), 3);
        ledger.add_distance(0.3);
        assert_eq!(ledger.score(), 4);
    }

    #[test]
    fn test_non_positive_distance_ignored() {
        let mut ledger = ScoreLedger::default();
        let events = recorder(&mut ledger);
        ledger.add_distance(0.0);
        ledger.add_distance(-2.0);
        ledger.add_distance(f32::NAN);
        assert_eq!(ledger.distance(), 0.0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_pickups_and_lives() {
        let mut ledger = ScoreLedger::default();
        ledger.add_coin();
        ledger.add_trash();
        assert_eq!(ledger.score(), SCORE_PER_COIN + SCORE_PER_TRASH);
        assert_eq!((ledger.coins(), ledger.trash()), (1, 1));

        for _ in 0..INITIAL_LIVES {
            ledger.lose_life();
        }
        assert!(ledger.is_out_of_lives());
        assert_eq!(ledger.best_score(), 35);
        ledger.lose_life();
        assert_eq!(ledger.lives(), 0);
    }

    #[test]
    fn test_best_score_only_raised() {
        let mut ledger = ScoreLedger::default();
        ledger.set_best_score(500);
        ledger.add_coin();
        for _ in 0..INITIAL_LIVES {
            ledger.lose_life();
        }
        assert_eq!(ledger.best_score(), 500);
    }

    #[test]
    fn test_listeners_notified_in_order() {
        let mut ledger = ScoreLedger::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let order = order.clone();
            ledger.subscribe(move |_| order.borrow_mut().push(tag));
        }
        ledger.add_coin();
        // Two events (coins, score), each to three listeners in order
        assert_eq!(*order.borrow(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_reset_announces_everything() {
        let mut ledger = ScoreLedger::default();
        ledger.add_coin();
        let events = recorder(&mut ledger);
        ledger.reset_stats();
        assert_eq!(
            *events.borrow(),
            vec![
                ScoreEvent::Coins(0),
                ScoreEvent::Trash(0),
                ScoreEvent::Lives(INITIAL_LIVES),
                ScoreEvent::Distance(0.0),
                ScoreEvent::Score(0),
            ]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let mut ledger = ScoreLedger::default();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let id = ledger.subscribe(move |_| *c.borrow_mut() += 1);
        ledger.add_trash();
        assert!(ledger.unsubscribe(id));
        assert!(!ledger.unsubscribe(id));
        ledger.add_trash();
        assert_eq!(*count.borrow(), 2);
    }
}
