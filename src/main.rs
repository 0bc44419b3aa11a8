//! Trash Runner headless driver
//!
//! Runs the track core with a simple lane-dodging autopilot at a fixed
//! timestep until the runner is out of lives or the time limit is hit.
//!
//! Usage: `trash-runner [config.json] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::{Path, PathBuf};

    use trash_runner::audio::LogAudio;
    use trash_runner::consts::SIM_DT;
    use trash_runner::{BestScore, GameConfig, RunController, RunPhase};

    env_logger::init();
    log::info!("Trash Runner (headless) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::load(Path::new(&path)).unwrap_or_else(|e| {
            log::warn!("{e}; using built-in tuning");
            GameConfig::default()
        }),
        None => GameConfig::default(),
    };
    let max_seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(120.0);

    let best_path = PathBuf::from(BestScore::FILE_NAME);
    let mut best = BestScore::load(&best_path);

    let mut run = RunController::new(&config);
    run.ledger_mut().set_best_score(best.score);
    run.start_run();

    let mut audio = LogAudio::default();
    let mut elapsed = 0.0;
    let mut next_report = 10.0;
    while run.phase() == RunPhase::Running && elapsed < max_seconds {
        autopilot::steer(&mut run);
        run.tick(SIM_DT);
        elapsed += SIM_DT;

        let touching: Vec<_> = run.contacts(autopilot::CONTACT_RADIUS).collect();
        for entity in touching {
            run.handle_contact(entity, &mut audio);
        }

        if elapsed >= next_report {
            next_report += 10.0;
            let ledger = run.ledger();
            log::info!(
                "t={elapsed:.0}s z={:.0} speed={:.1} score={} lives={} coins={} trash={}",
                run.runner().z,
                run.difficulty().speed(),
                ledger.score(),
                ledger.lives(),
                ledger.coins(),
                ledger.trash()
            );
        }
    }
    run.end_run();

    let score = run.ledger().score();
    println!(
        "Distance {:.1}  Score {}  Coins {}  Trash {}",
        run.ledger().distance(),
        score,
        run.ledger().coins(),
        run.ledger().trash()
    );
    if best.submit(score) {
        println!("New best score!");
        best.save(&best_path);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No web surface; the library is the product on wasm32
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::Vec3;
    use trash_runner::RunController;
    use trash_runner::sim::Placeable;

    pub const CONTACT_RADIUS: f32 = 0.75;
    /// How far ahead obstacles are checked
    const LOOK_AHEAD: f32 = 4.0;

    fn lane_blocked(run: &RunController, x: f32) -> bool {
        let z = run.runner().z;
        let probe = Vec3::new(x, 0.0, z + LOOK_AHEAD * 0.5);
        run.track()
            .entities_near(probe, LOOK_AHEAD * 0.5)
            .filter_map(|h| run.track().entity(h))
            .any(|e| e.kind == Placeable::Obstacle && (e.position.x - x).abs() < 0.5)
    }

    /// Sidestep an obstacle in the current lane if a neighbour is clear
    pub fn steer(run: &mut RunController) {
        let position = run.runner().position();
        if !lane_blocked(run, position.x) {
            return;
        }
        let lane = run.runner().lane();
        let lanes = run.runner().lane_count();
        let offsets = run.track().active_segments().next().map(|s| {
            (0..s.anchor_count())
                .filter_map(|i| s.anchor(i).map(|a| a.x))
                .collect::<Vec<_>>()
        });
        let Some(offsets) = offsets else {
            return;
        };

        let left = lane.checked_sub(1);
        let right = (lane + 1 < lanes).then_some(lane + 1);
        for candidate in [left, right].into_iter().flatten() {
            let Some(&x) = offsets.get(candidate) else {
                continue;
            };
            if !lane_blocked(run, x) {
                if candidate < lane {
                    run.move_left();
                } else {
                    run.move_right();
                }
                return;
            }
        }
    }
}
