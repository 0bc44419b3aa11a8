//! Run lifecycle: menu, running, paused, game over
//!
//! The host calls [`RunController::tick`] once per frame. Difficulty is
//! advanced before the track is extended, so new segments are populated
//! with this frame's densities.

use std::fmt;

use crate::audio::AudioSink;
use crate::config::GameConfig;
use crate::score::ScoreLedger;
use crate::sim::{Difficulty, EntityHandle, Observer, Runner, TrackManager};

pub use crate::sim::RunPhase;

/// Lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Started,
    Ended,
    Paused,
    Resumed,
}

type RunListener = Box<dyn FnMut(RunEvent)>;

pub struct RunController {
    phase: RunPhase,
    difficulty: Difficulty,
    track: TrackManager,
    ledger: ScoreLedger,
    runner: Runner,
    /// Runner position as seen by the track
    observer: Observer,
    listeners: Vec<RunListener>,
}

impl fmt::Debug for RunController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunController")
            .field("phase", &self.phase)
            .field("elapsed", &self.difficulty.elapsed())
            .field("runner_z", &self.runner.z)
            .field("segments", &self.track.active_len())
            .field("ledger", &self.ledger)
            .finish()
    }
}

impl RunController {
    pub fn new(config: &GameConfig) -> Self {
        let difficulty = Difficulty::new(config.difficulty.clone());
        let mut track = TrackManager::new(
            config.track.clone(),
            config.segments.clone(),
            config.spawn.as_ref(),
        );
        let runner = Runner::with_lanes(config.lane_offsets());
        let observer = Observer::new(runner.position());
        track.set_observer(observer.clone());
        track.initialize(&difficulty);

        Self {
            phase: RunPhase::Menu,
            difficulty,
            track,
            ledger: ScoreLedger::new(config.score.clone()),
            runner,
            observer,
            listeners: Vec::new(),
        }
    }

    pub fn on_event(&mut self, listener: impl FnMut(RunEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, event: RunEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    /// Reset clock, runner, track and stats, then enter Running
    pub fn start_run(&mut self) {
        self.difficulty.reset();
        self.runner.reset_to_start();
        self.observer.set(self.runner.position());
        self.track.reset_track(&self.difficulty);
        self.ledger.reset_stats();

        self.phase = RunPhase::Running;
        log::info!("Run started");
        self.notify(RunEvent::Started);
    }

    pub fn end_run(&mut self) {
        if !matches!(self.phase, RunPhase::Running | RunPhase::Paused) {
            return;
        }
        self.flush_distance();
        self.phase = RunPhase::GameOver;
        log::info!(
            "Run ended: score {}, distance {:.1}",
            self.ledger.score(),
            self.ledger.distance()
        );
        self.notify(RunEvent::Ended);
    }

    pub fn pause(&mut self) {
        if self.phase != RunPhase::Running {
            return;
        }
        self.phase = RunPhase::Paused;
        self.notify(RunEvent::Paused);
    }

    pub fn resume(&mut self) {
        if self.phase != RunPhase::Paused {
            return;
        }
        self.phase = RunPhase::Running;
        self.notify(RunEvent::Resumed);
    }

    pub fn return_to_menu(&mut self) {
        self.phase = RunPhase::Menu;
    }

    /// Advance one frame of `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.difficulty.advance(dt, self.phase);
        if self.phase != RunPhase::Running {
            return;
        }

        let speed = self.difficulty.speed();
        if let Some(distance) = self.runner.advance(dt, speed) {
            self.ledger.add_distance(distance);
        }
        self.observer.set(self.runner.position());
        self.track.update(&self.difficulty);
    }

    /// The runner touched `entity`. Ends the run when the last life is lost.
    pub fn handle_contact(&mut self, entity: EntityHandle, audio: &mut dyn AudioSink) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }
        // Distance up to the point of contact counts before a final hit ends the run
        self.flush_distance();
        let applied = self.track.touch(entity, &mut self.ledger, audio);
        if applied && self.ledger.is_out_of_lives() {
            self.end_run();
        }
        applied
    }

    fn flush_distance(&mut self) {
        if let Some(distance) = self.runner.take_unreported() {
            self.ledger.add_distance(distance);
        }
    }

    /// Active entities within `radius` of the runner
    pub fn contacts(&self, radius: f32) -> impl Iterator<Item = EntityHandle> + '_ {
        self.track.entities_near(self.runner.position(), radius)
    }

    pub fn move_left(&mut self) {
        if self.phase == RunPhase::Running {
            self.runner.move_left();
        }
    }

    pub fn move_right(&mut self) {
        if self.phase == RunPhase::Running {
            self.runner.move_right();
        }
    }

    /// Jump to `lane` while Running; false otherwise or if out of range
    pub fn set_lane(&mut self, lane: usize) -> bool {
        self.phase == RunPhase::Running && self.runner.set_lane(lane)
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn track(&self) -> &TrackManager {
        &self.track
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    /// For subscribing to score events and seeding the best score
    pub fn ledger_mut(&mut self) -> &mut ScoreLedger {
        &mut self.ledger
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }
}
