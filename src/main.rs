/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod oracle;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Instant;

use tracing::{info, trace, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::rules::MoveOracle;
use oracle::CommandOracle;
use sim::event::GameEvent;
use sim::level;
use sim::snapshot;
use sim::step;
use sim::world::WorldState;
use ui::input::{Command, InputState};
use ui::renderer::Renderer;

fn main() {
    let (config, config_err) = GameConfig::load();
    let logging = init_tracing(&config);
    if let Some(err) = &config_err {
        warn!(%err, "config.toml ignored, using defaults");
    }

    let oracle = config
        .oracle
        .as_ref()
        .map(|o| Box::new(CommandOracle::from_config(o)) as Box<dyn MoveOracle>);
    let mut world = level::new_game(&config, oracle);

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        warn!(%e, "game loop aborted");
        eprintln!("Game error: {e}");
    }
    if let (Some(err), false) = (&config_err, logging) {
        eprintln!("config.toml ignored: {err}");
    }

    info!(seed = world.seed, collected = world.collected, "quit");
    println!();
    println!("Thanks for playing Clue Grid!");
    println!("Items collected this session: {}/{}", world.collected, world.items_total);
}

/// Log to the configured file; the terminal belongs to the renderer.
/// `RUST_LOG` overrides the configured filter. Returns false when logging
/// could not be set up, in which case the game runs silently.
fn init_tracing(config: &GameConfig) -> bool {
    let file = match OpenOptions::new().create(true).append(true).open(&config.log_file) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    let mut last_adversary = Instant::now();
    let mut last_auto = Instant::now();

    loop {
        input.drain_events();

        if input.quit_requested() {
            break;
        }

        for &cmd in &input.commands {
            let events = match cmd {
                Command::Move(dir) => step::step_actor(world, dir),
                Command::Confirm if world.phase.is_over() => {
                    level::restart(world, &config.spawn);
                    last_adversary = Instant::now();
                    vec![]
                }
                Command::Confirm => {
                    last_auto = Instant::now();
                    step::toggle_auto(world)
                }
                Command::Restart => {
                    level::restart(world, &config.spawn);
                    last_adversary = Instant::now();
                    vec![]
                }
                Command::Quit => vec![],
            };
            report(world, &events);
        }

        if world.auto_mode && last_auto.elapsed() >= config.speed.auto_move_interval {
            let events = step::step_autonomous(world);
            report(world, &events);
            last_auto = Instant::now();
        }

        if last_adversary.elapsed() >= config.speed.adversary_interval {
            let events = step::step_adversary(world);
            report(world, &events);
            last_adversary = Instant::now();
        }

        renderer.render(&snapshot::capture(world))?;
        std::thread::sleep(config.speed.frame_sleep);
    }

    Ok(())
}

fn report(world: &WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Won | GameEvent::Caught { .. } => info!(
                seed = world.seed,
                phase = ?world.phase,
                collected = world.collected,
                items_total = world.items_total,
                ticks = world.tick,
                "session ended"
            ),
            other => trace!(event = ?other, "game event"),
        }
    }
}
