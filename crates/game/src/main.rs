//! walksim: generate a world from world.ron and walk a player across it.

mod config;
mod player;
mod world;

use anyhow::Result;
use engine_core::HeightSampler;
use physics::Body;

use crate::config::WorldConfig;
use crate::player::{Player, PlayerState};
use crate::world::World;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = WorldConfig::load();
    config.save();
    let world = World::build(&config)?;

    let stats = world.stats();
    log::info!(
        "World ready: {} vertices, {} triangles, map {} vertices / {} triangles",
        stats.vertices,
        stats.triangles,
        stats.map_vertices,
        stats.map_triangles
    );

    let ground = world.ground();
    let mut player = Player::new(PlayerState::load());
    player.apply_terrain_collision(&ground);
    log::info!(
        "Player at ({:.2}, {:.2}, {:.2}) in {} ({:?})",
        player.position.x,
        player.position.y,
        player.position.z,
        world.biome_name(player.position.x, player.position.z),
        player.view_mode
    );

    let walk = &config.walk;
    if walk.toggle_view {
        player.toggle_view();
    }
    player.look(walk.turn_degrees.to_radians(), 0.0);
    let step = player.move_speed * walk.step_seconds;
    for i in 0..walk.steps {
        player.move_by(walk.direction, step);
        player.update(walk.step_seconds);
        player.apply_terrain_collision(&ground);
        if i % 30 == 29 {
            let eye = player.camera_position();
            log::debug!(
                "step {}: ground {:.2} m, camera ({:.2}, {:.2}, {:.2})",
                i + 1,
                ground.height_at(player.position.x, player.position.z),
                eye.x,
                eye.y,
                eye.z
            );
        }
    }

    log::info!(
        "Walked {} steps to ({:.2}, {:.2}, {:.2}) in {}",
        walk.steps,
        player.position.x,
        player.position.y,
        player.position.z,
        world.biome_name(player.position.x, player.position.z)
    );

    let mut capsule = [Body::new(player.position, player.collider)];
    world.grounding().step(&mut capsule);
    let target = player.camera_target();
    log::info!(
        "Capsule centre at {:.2} m, camera looking at ({:.2}, {:.2}, {:.2})",
        capsule[0].position.y,
        target.x,
        target.y,
        target.z
    );

    player.state().save();
    Ok(())
}
