//! Swipe Nexus entry point
//!
//! On the web the engine is driven from JavaScript through
//! `platform::web::WebGame`. Natively this runs a headless session with a
//! simple autopilot and prints the final board.
//!
//! Usage: `swipe-nexus [level] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use swipe_nexus::sim::{Direction, GameEvent, GridPosition, ObstacleKind};
    use swipe_nexus::platform::default_store;
    use swipe_nexus::{Engine, Snapshot};

    /// Simulated frame length (~60 Hz)
    const FRAME_MS: u64 = 16;
    /// Give up after this much simulated time
    const MAX_RUN_MS: u64 = 180_000;

    pub fn run(level: u32, seed: u64) -> Result<(), swipe_nexus::ConfigError> {
        let mut engine = Engine::with_seed(default_store(), seed);
        engine.select_level(level)?;
        engine.start_session()?;

        let mut last_decision_tick = u64::MAX;
        while engine.snapshot().is_active && engine.clock_ms() < MAX_RUN_MS {
            engine.advance(FRAME_MS);

            // One decision per tick interval, like a player reacting to each step
            let snap = engine.snapshot();
            let tick_index = engine.clock_ms() / u64::from(snap.tick_interval_ms);
            if tick_index != last_decision_tick {
                last_decision_tick = tick_index;
                if let Some(dir) = autopilot(&snap) {
                    engine.move_player(dir);
                }
            }

            for event in engine.drain_events() {
                match event {
                    GameEvent::GameOver { .. } | GameEvent::TargetReached { .. } => {
                        log::info!("{:?}", event)
                    }
                    other => log::debug!("{:?}", other),
                }
            }
        }

        if engine.snapshot().is_active {
            engine.end_session();
        }

        let snap = engine.snapshot();
        println!("{}", render(&snap));
        println!(
            "Score {} | best {} | {}ms ticks | {:.1}s survived",
            snap.score,
            snap.high_score,
            snap.tick_interval_ms,
            engine.clock_ms() as f64 / 1000.0
        );
        println!(
            "Collected {} energy, {} boosts, {} shields ({} barriers blocked)",
            snap.stats.energy_collected,
            snap.stats.speed_boosts_collected,
            snap.stats.shields_collected,
            snap.stats.shield_blocks
        );
        Ok(())
    }

    /// Sidestep whatever is about to land on us, drift toward powerups otherwise
    fn autopilot(snap: &Snapshot) -> Option<Direction> {
        let pos = snap.player.position;
        let above = |x: u8| -> Option<ObstacleKind> {
            let y = pos.y.checked_sub(1)?;
            snap.obstacles
                .iter()
                .find(|o| o.position == GridPosition::new(x, y))
                .map(|o| o.kind)
        };
        let safe = |x: u8| above(x) != Some(ObstacleKind::Barrier);

        let neighbors = [
            pos.x.checked_sub(1),
            (pos.x + 1 < snap.grid.width).then_some(pos.x + 1),
        ];
        let toward = |x: u8| if x < pos.x { Direction::Left } else { Direction::Right };
        let powerup_beside = neighbors
            .iter()
            .flatten()
            .copied()
            .find(|&x| safe(x) && above(x).is_some_and(|k| k.is_powerup()));

        if !safe(pos.x) {
            let escape = powerup_beside
                .or_else(|| neighbors.iter().flatten().copied().find(|&x| safe(x)));
            return escape.map(toward);
        }
        if above(pos.x).is_some_and(|k| k.is_powerup()) {
            return None;
        }
        powerup_beside.map(toward)
    }

    fn render(snap: &Snapshot) -> String {
        let mut out = String::new();
        for y in 0..snap.grid.height {
            for x in 0..snap.grid.width {
                let cell = GridPosition::new(x, y);
                let glyph = if cell == snap.player.position {
                    if snap.player.has_shield { '@' } else { 'P' }
                } else {
                    match snap.obstacles.iter().find(|o| o.position == cell).map(|o| o.kind) {
                        Some(ObstacleKind::Barrier) => '#',
                        Some(ObstacleKind::Energy) => '*',
                        Some(ObstacleKind::SpeedBoost) => '>',
                        Some(ObstacleKind::Shield) => '+',
                        None => '.',
                    }
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Swipe Nexus (native) starting...");

    let mut args = std::env::args().skip(1);
    let level = parse_arg("level", args.next()).unwrap_or(1);
    let seed = parse_arg("seed", args.next()).unwrap_or_else(rand::random);

    if let Err(e) = demo::run(level, seed) {
        log::error!("Cannot start level {}: {}", level, e);
        std::process::exit(1);
    }
}

/// Parse an optional positional argument, warning when it is malformed
#[cfg(not(target_arch = "wasm32"))]
fn parse_arg<T: std::str::FromStr>(name: &str, arg: Option<String>) -> Option<T> {
    let arg = arg?;
    match arg.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring invalid {} argument {:?}, using the default", name, arg);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_start, this is just to satisfy the compiler
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg::<u32>("level", Some("3".to_string())), Some(3));
        assert_eq!(parse_arg::<u32>("level", Some("7x".to_string())), None);
        assert_eq!(parse_arg::<u64>("seed", None), None);
    }
}
