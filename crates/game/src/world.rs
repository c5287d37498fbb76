//! The walkable world: terrain, overview map and collision built together.

use anyhow::{Context, Result};
use engine_core::{HeightSampler, Renderable};
use physics::{CollisionMesh, GroundingSystem};
use procgen::{BiomeTable, QuadTerrain, TerrainData, TerrainGenerator};

use crate::config::{GroundQuery, TerrainSource, WorldConfig};

/// Ground geometry of the world.
#[derive(Debug)]
pub enum WorldTerrain {
    Procedural(Box<TerrainData>),
    Quad(QuadTerrain),
}

impl WorldTerrain {
    pub fn renderable(&self) -> &dyn Renderable {
        match self {
            Self::Procedural(t) => t.as_ref(),
            Self::Quad(t) => t,
        }
    }
}

impl HeightSampler for WorldTerrain {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        match self {
            Self::Procedural(t) => t.height_at(world_x, world_z),
            Self::Quad(t) => t.height_at(world_x, world_z),
        }
    }
}

/// Ground lookup the world was configured with.
pub struct Ground<'a> {
    world: &'a World,
}

impl HeightSampler for Ground<'_> {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        match self.world.ground_query {
            GroundQuery::Interpolated => self.world.terrain.height_at(world_x, world_z),
            GroundQuery::Exact => self.world.collision.height_at(world_x, world_z),
        }
    }
}

pub struct World {
    pub terrain: WorldTerrain,
    pub collision: CollisionMesh,
    pub biomes: BiomeTable,
    pub ground_query: GroundQuery,
}

impl World {
    pub fn build(config: &WorldConfig) -> Result<Self> {
        let (terrain, biomes) = match &config.terrain {
            TerrainSource::Procedural(t) => {
                let generator = TerrainGenerator::new(t.seed, t.params.clone())
                    .context("invalid terrain parameters")?;
                let data = generator
                    .generate(t.size_x, t.size_z, t.resolution)
                    .context("terrain generation failed")?;
                (WorldTerrain::Procedural(Box::new(data)), t.params.biomes.clone())
            }
            TerrainSource::Quad(q) => (
                WorldTerrain::Quad(QuadTerrain::random(q).context("invalid quad terrain")?),
                BiomeTable::small_scale(),
            ),
            TerrainSource::Image {
                path,
                width,
                depth,
                resolution,
                height_scale,
            } => {
                let image = image::open(path)
                    .with_context(|| format!("could not read heightmap {}", path.display()))?;
                let terrain = QuadTerrain::from_image(*width, *depth, *resolution, &image, *height_scale)
                    .with_context(|| format!("bad heightmap {}", path.display()))?;
                (WorldTerrain::Quad(terrain), BiomeTable::small_scale())
            }
        };

        let collision = match &terrain {
            WorldTerrain::Procedural(t) => CollisionMesh::from_renderable(t.as_ref()),
            WorldTerrain::Quad(q) => CollisionMesh::from_triangles(q.triangles().to_vec()),
        };
        log::info!("Collision mesh: {} triangles", collision.len());

        Ok(Self {
            terrain,
            collision,
            biomes,
            ground_query: config.ground_query,
        })
    }

    pub fn ground(&self) -> Ground<'_> {
        Ground { world: self }
    }

    /// Grounding pass over the configured ground lookup.
    pub fn grounding(&self) -> GroundingSystem<Ground<'_>> {
        GroundingSystem::with_terrain(self.ground())
    }

    /// Biome name under a position, by ground height.
    pub fn biome_name(&self, world_x: f32, world_z: f32) -> &str {
        let h = self.ground().height_at(world_x, world_z);
        &self.biomes.classify(h as f64).name
    }

    pub fn stats(&self) -> WorldStats {
        let mesh = self.terrain.renderable();
        let (map_vertices, map_triangles) = match &self.terrain {
            WorldTerrain::Procedural(t) => (t.map.vertex_count(), t.map.num_triangles()),
            WorldTerrain::Quad(_) => (0, 0),
        };
        WorldStats {
            vertices: mesh.vertex_count(),
            triangles: mesh.index_count() / 3,
            map_vertices,
            map_triangles,
            collision_triangles: self.collision.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldStats {
    pub vertices: usize,
    pub triangles: usize,
    pub map_vertices: usize,
    pub map_triangles: usize,
    pub collision_triangles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Player, PlayerState};
    use physics::Body;
    use procgen::{QuadTerrainConfig, TerrainConfig};

    fn small_procedural(query: GroundQuery) -> WorldConfig {
        WorldConfig {
            terrain: TerrainSource::Procedural(TerrainConfig {
                size_x: 200.0,
                size_z: 200.0,
                resolution: 10.0,
                ..Default::default()
            }),
            ground_query: query,
            ..Default::default()
        }
    }

    #[test]
    fn procedural_world_stats() {
        let world = World::build(&small_procedural(GroundQuery::Interpolated)).unwrap();
        let stats = world.stats();
        assert_eq!(stats.vertices, 441);
        assert_eq!(stats.triangles, 800);
        assert_eq!(stats.collision_triangles, 800);
        assert_eq!(stats.map_vertices, 121);
        assert_eq!(stats.map_triangles, 200);
    }

    #[test]
    fn origin_is_plains_both_ways() {
        for query in [GroundQuery::Interpolated, GroundQuery::Exact] {
            let world = World::build(&small_procedural(query)).unwrap();
            assert!((world.ground().height_at(0.0, 0.0) - 41.0).abs() < 1e-3);
            assert_eq!(world.biome_name(0.0, 0.0), "Plains");
        }
    }

    #[test]
    fn player_and_capsules_stand_on_quad_world() {
        let config = WorldConfig {
            terrain: TerrainSource::Quad(QuadTerrainConfig::default()),
            ..Default::default()
        };
        let world = World::build(&config).unwrap();
        let ground = world.ground();

        let mut player = Player::new(PlayerState::default());
        player.apply_terrain_collision(&ground);
        assert_eq!(player.position.y, ground.height_at(0.0, 5.0));

        let mut bodies = [Body::new(player.position, player.collider)];
        assert_eq!(world.grounding().step(&mut bodies), 1);
        assert!((bodies[0].position.y - (player.position.y + 0.9)).abs() < 1e-5);
    }

    #[test]
    fn missing_heightmap_image_is_an_error() {
        let config = WorldConfig {
            terrain: TerrainSource::Image {
                path: "definitely/not/here.png".into(),
                width: 10.0,
                depth: 10.0,
                resolution: 1.0,
                height_scale: 5.0,
            },
            ..Default::default()
        };
        assert!(World::build(&config).is_err());
    }
}
