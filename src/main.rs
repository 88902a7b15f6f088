//! Headless simulation runner: builds the demo arena, spawns enemies, feeds
//! a short scripted input session, and logs state snapshots.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use nalgebra::Vector3;

use skirmish::config::GameConfig;
use skirmish::game::constants::physics::TIMESTEP;
use skirmish::game::input::InputEvent;
use skirmish::game::GameWorld;

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Headless skirmish gameplay simulation", long_about = None)]
struct Cli {
    /// Path to a game.toml tuning file (defaults when omitted)
    #[arg(short, long, env = "SKIRMISH_CONFIG")]
    config: Option<PathBuf>,
    /// Number of 60 Hz frames to simulate
    #[arg(short, long, default_value = "600")]
    frames: u32,
    /// Number of enemies to spawn around the arena
    #[arg(short, long, default_value = "3")]
    enemies: u32,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match GameConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };

    let mut world = GameWorld::new(config);
    world.spawn_arena();
    for i in 0..cli.enemies {
        let angle = i as f32 / cli.enemies.max(1) as f32 * std::f32::consts::TAU;
        world.spawn_enemy(Vector3::new(angle.cos() * 12.0, 2.0, angle.sin() * 12.0));
    }

    let input = world.input_handle();
    input.send(InputEvent::Move([0.0, 1.0]));

    for frame in 0..cli.frames {
        // A short scripted session: run forward, hop, cut the jump, dash,
        // take a shot, then strafe.
        match frame {
            90 => input.send(InputEvent::Jump),
            100 => input.send(InputEvent::JumpCanceled),
            180 => input.send(InputEvent::Dash),
            240 => input.send(InputEvent::Attack),
            300 => input.send(InputEvent::Move([1.0, 0.0])),
            420 => input.send(InputEvent::Look([0.5, 0.0])),
            450 => input.send(InputEvent::Look([0.0, 0.0])),
            _ => {}
        }
        world.frame(TIMESTEP);

        if frame % 60 == 0 {
            let position = world
                .physics
                .position(world.player.id())
                .unwrap_or_else(Vector3::zeros);
            info!(
                "t={:>4.1}s player=({:.2}, {:.2}, {:.2}) grounded={} health={} enemies={} bullets={}",
                frame as f32 * TIMESTEP,
                position.x,
                position.y,
                position.z,
                world.player.locomotion().is_grounded(),
                world.player.health(),
                world.enemies.len(),
                world.bullets.len()
            );
        }
    }

    info!("simulation finished after {} frames", cli.frames);
}
