//! Procedural map generation
//!
//! Two independent fractal noise fields (elevation and moisture) drive a
//! fixed terrain decision table, then resources are scattered with a flat
//! per-tile probability. The whole pipeline is a deterministic function
//! of the seed and map dimensions.

pub mod noise;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::core::types::Position;
use crate::data::GameData;
use crate::world::grid::WorldGrid;
use crate::world::tile::{Terrain, Tile};

const ELEVATION_SCALE: f64 = 10.0;
const ELEVATION_OCTAVES: u32 = 4;
const ELEVATION_PERSISTENCE: f64 = 0.5;
const ELEVATION_LACUNARITY: f64 = 2.0;

const MOISTURE_SCALE: f64 = 15.0;
const MOISTURE_OCTAVES: u32 = 3;
const MOISTURE_PERSISTENCE: f64 = 0.4;
const MOISTURE_LACUNARITY: f64 = 2.0;

/// Domain separators so the three random streams never correlate
const MOISTURE_SEED_SALT: u64 = 0x6d6f_6973_7475_7265;
const RESOURCE_SEED_SALT: u64 = 0x7265_736f_7572_6365;

pub struct Generator<'a> {
    data: &'a GameData,
    resource_chance: f64,
}

impl<'a> Generator<'a> {
    pub fn new(data: &'a GameData, resource_chance: f64) -> Self {
        Self {
            data,
            resource_chance,
        }
    }

    pub fn generate(&self, width: u32, height: u32, seed: u64) -> WorldGrid {
        let elevation = self.noise_field(
            width,
            height,
            seed,
            ELEVATION_SCALE,
            ELEVATION_OCTAVES,
            ELEVATION_PERSISTENCE,
            ELEVATION_LACUNARITY,
        );
        let moisture = self.noise_field(
            width,
            height,
            seed ^ MOISTURE_SEED_SALT,
            MOISTURE_SCALE,
            MOISTURE_OCTAVES,
            MOISTURE_PERSISTENCE,
            MOISTURE_LACUNARITY,
        );

        let cells = (width * height) as usize;
        let mut tiles = Vec::with_capacity(cells);
        for i in 0..cells {
            tiles.push(Tile::new(classify(elevation[i], moisture[i])));
        }
        let mut grid = WorldGrid::from_tiles(width, height, tiles);
        self.place_resources(&mut grid, seed ^ RESOURCE_SEED_SALT);

        let land = grid
            .positions()
            .filter(|p| grid.tile(*p).map(|t| t.terrain.is_land()).unwrap_or(false))
            .count();
        info!(width, height, seed, land_tiles = land, "world generated");
        grid
    }

    /// Sampled field min-max normalized to [0, 1]; a flat field maps to 0.5
    fn noise_field(
        &self,
        width: u32,
        height: u32,
        seed: u64,
        scale: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> Vec<f64> {
        let mut field = Vec::with_capacity((width * height) as usize);
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for y in 0..height {
            for x in 0..width {
                let v = noise::fractal(
                    seed,
                    f64::from(x) / scale,
                    f64::from(y) / scale,
                    octaves,
                    persistence,
                    lacunarity,
                );
                min = min.min(v);
                max = max.max(v);
                field.push(v);
            }
        }
        let range = max - min;
        if range <= f64::EPSILON {
            for v in &mut field {
                *v = 0.5;
            }
        } else {
            for v in &mut field {
                *v = (*v - min) / range;
            }
        }
        field
    }

    /// Scatters resources in scan order with a flat per-tile chance,
    /// restricted to resources valid on each tile's terrain
    fn place_resources(&self, grid: &mut WorldGrid, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let positions: Vec<Position> = grid.positions().collect();
        for pos in positions {
            if !rng.gen_bool(self.resource_chance) {
                continue;
            }
            let Some(tile) = grid.tile(pos) else { continue };
            let candidates: Vec<&String> = self
                .data
                .resources
                .iter()
                .filter(|(_, spec)| spec.valid_terrains.contains(&tile.terrain))
                .map(|(id, _)| id)
                .collect();
            if let Some(&id) = candidates.choose(&mut rng) {
                if let Some(tile) = grid.tile_mut(pos) {
                    tile.resource = Some(id.clone());
                }
            }
        }
    }
}

/// Fixed decision table on the normalized noise fields
fn classify(elevation: f64, moisture: f64) -> Terrain {
    if elevation < 0.3 {
        Terrain::Water
    } else if elevation > 0.8 {
        Terrain::Mountains
    } else if elevation > 0.6 {
        Terrain::Hills
    } else if moisture < 0.3 {
        Terrain::Desert
    } else if moisture > 0.6 {
        Terrain::Forest
    } else {
        Terrain::Plains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        assert_eq!(classify(0.1, 0.5), Terrain::Water);
        assert_eq!(classify(0.9, 0.5), Terrain::Mountains);
        assert_eq!(classify(0.7, 0.5), Terrain::Hills);
        assert_eq!(classify(0.5, 0.1), Terrain::Desert);
        assert_eq!(classify(0.5, 0.9), Terrain::Forest);
        assert_eq!(classify(0.5, 0.5), Terrain::Plains);
    }

    #[test]
    fn test_resources_respect_terrain() {
        let data = GameData::builtin();
        let grid = Generator::new(&data, 0.5).generate(30, 30, 99);
        for pos in grid.positions() {
            let tile = grid.tile(pos).unwrap();
            if let Some(resource) = &tile.resource {
                let spec = data.resource(resource).unwrap();
                assert!(spec.valid_terrains.contains(&tile.terrain));
            }
        }
    }
}
