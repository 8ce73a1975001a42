//! Block Grid
//!
//! The destructible map: a fixed `width × height` grid of blocks, some of
//! which hide a chest.
//!
//! Cells are stored column by column (`index = x * height + y`), which is
//! also the wire layout: the outer sequence is indexed by `x`, the inner by
//! `y`.

use serde::{Serialize, Deserialize};

use crate::core::grid::GridPos;
use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::state::ConfigError;

// =============================================================================
// CHEST
// =============================================================================

/// Kind of chest. New kinds may be added without breaking the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChestType {
    /// Plain money chest
    Normal,
}

/// Money hidden inside a block. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chest {
    money: u32,
    chest_type: ChestType,
}

impl Chest {
    /// Create a chest. Money is clamped to at least 1.
    pub fn new(money: u32, chest_type: ChestType) -> Self {
        Self {
            money: money.max(1),
            chest_type,
        }
    }

    /// Money awarded when the owning block is destroyed.
    pub fn money(&self) -> u32 {
        self.money
    }

    /// Chest kind.
    pub fn chest_type(&self) -> ChestType {
        self.chest_type
    }
}

// =============================================================================
// BLOCK
// =============================================================================

/// One destructible cell.
///
/// Health only goes down and stops at 0; a block at 0 health is destroyed
/// and its chest (if any) counts as collected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    health: u32,
    chest: Option<Chest>,
}

impl Block {
    /// Create a block.
    pub fn new(health: u32, chest: Option<Chest>) -> Self {
        Self { health, chest }
    }

    /// Remaining health.
    #[inline]
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Whether a chest is hidden here.
    #[inline]
    pub fn has_chest(&self) -> bool {
        self.chest.is_some()
    }

    /// The hidden chest.
    #[inline]
    pub fn chest(&self) -> Option<&Chest> {
        self.chest.as_ref()
    }

    /// `health == 0`
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.health == 0
    }

    /// Apply damage, clamping at zero.
    ///
    /// Returns `true` only if this hit moved the block from intact to
    /// destroyed.
    pub fn take_damage(&mut self, damage: u32) -> bool {
        let was_intact = !self.is_destroyed();
        self.health = self.health.saturating_sub(damage);
        was_intact && self.is_destroyed()
    }
}

// =============================================================================
// MAP CONFIG
// =============================================================================

/// Map generation parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapConfig {
    /// Columns
    pub width: u32,
    /// Rows
    pub height: u32,
    /// Chance (0-100) that a block hides a chest
    pub chest_chance_percent: u32,
    /// Minimum starting block health (inclusive)
    pub health_min: u32,
    /// Maximum starting block health (inclusive)
    pub health_max: u32,
    /// Minimum chest money (inclusive)
    pub chest_money_min: u32,
    /// Maximum chest money (inclusive)
    pub chest_money_max: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 45,
            chest_chance_percent: 10,
            health_min: 1,
            health_max: 50,
            chest_money_min: 10,
            chest_money_max: 99,
        }
    }
}

impl MapConfig {
    /// Reject configurations that would break map invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyMap {
                width: self.width,
                height: self.height,
            });
        }
        if i32::try_from(self.width).is_err() || i32::try_from(self.height).is_err() {
            return Err(ConfigError::MapTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        if self.chest_chance_percent > 100 {
            return Err(ConfigError::ChestChance(self.chest_chance_percent));
        }
        if self.health_min == 0 || self.health_min > self.health_max {
            return Err(ConfigError::HealthRange {
                min: self.health_min,
                max: self.health_max,
            });
        }
        if self.chest_money_min == 0 || self.chest_money_min > self.chest_money_max {
            return Err(ConfigError::MoneyRange {
                min: self.chest_money_min,
                max: self.chest_money_max,
            });
        }
        Ok(())
    }
}

// =============================================================================
// GAME MAP
// =============================================================================

/// Fixed-size grid of blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameMap {
    width: u32,
    height: u32,
    blocks: Vec<Block>,
}

impl GameMap {
    /// Generate a map, drawing every cell independently from `rng`.
    ///
    /// The config is assumed validated.
    pub fn generate(config: &MapConfig, rng: &mut DeterministicRng) -> Self {
        let cell_count = config.width as usize * config.height as usize;
        let mut blocks = Vec::with_capacity(cell_count);

        for _x in 0..config.width {
            for _y in 0..config.height {
                let chest = if rng.chance_percent(config.chest_chance_percent) {
                    let money = rng.next_int_range(config.chest_money_min, config.chest_money_max);
                    Some(Chest::new(money, ChestType::Normal))
                } else {
                    None
                };
                let health = rng.next_int_range(config.health_min, config.health_max);
                blocks.push(Block::new(health, chest));
            }
        }

        Self {
            width: config.width,
            height: config.height,
            blocks,
        }
    }

    /// A chest-free map where every block has the same health.
    pub fn uniform(width: u32, height: u32, health: u32) -> Self {
        let cell_count = width as usize * height as usize;
        Self {
            width,
            height,
            blocks: vec![Block::new(health, None); cell_count],
        }
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether `pos` lies on the map.
    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as u32) < self.width
            && (pos.y as u32) < self.height
    }

    #[inline]
    fn index(&self, pos: GridPos) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.x as usize * self.height as usize + pos.y as usize)
        } else {
            None
        }
    }

    /// Block at `pos`, if in bounds.
    pub fn block(&self, pos: GridPos) -> Option<&Block> {
        self.index(pos).map(|i| &self.blocks[i])
    }

    /// Mutable block at `pos`, if in bounds.
    pub fn block_mut(&mut self, pos: GridPos) -> Option<&mut Block> {
        self.index(pos).map(move |i| &mut self.blocks[i])
    }

    /// Whether `pos` is on the map and already cleared.
    pub fn is_destroyed_at(&self, pos: GridPos) -> bool {
        self.block(pos).is_some_and(Block::is_destroyed)
    }

    /// Whether `pos` is on the map and still standing.
    pub fn is_intact_at(&self, pos: GridPos) -> bool {
        self.block(pos).is_some_and(|b| !b.is_destroyed())
    }

    /// Every in-bounds cell within Chebyshev distance `range` of `center`.
    ///
    /// This is a square window scan, not a flood fill: intact cells are
    /// included regardless of what lies between them and the center.
    /// Order is `x` ascending, then `y` ascending.
    pub fn positions_in_range(&self, center: GridPos, range: u32) -> Vec<GridPos> {
        let r = i64::from(range);
        let x_lo = (i64::from(center.x) - r).max(0);
        let x_hi = (i64::from(center.x) + r).min(i64::from(self.width) - 1);
        let y_lo = (i64::from(center.y) - r).max(0);
        let y_hi = (i64::from(center.y) + r).min(i64::from(self.height) - 1);

        if x_lo > x_hi || y_lo > y_hi {
            return Vec::new();
        }

        let mut positions = Vec::with_capacity(((x_hi - x_lo + 1) * (y_hi - y_lo + 1)) as usize);
        for x in x_lo..=x_hi {
            for y in y_lo..=y_hi {
                positions.push(GridPos::new(x as i32, y as i32));
            }
        }
        positions
    }

    /// Blocks within `range` of `center`, paired with their positions.
    pub fn blocks_in_range(&self, center: GridPos, range: u32) -> Vec<(GridPos, &Block)> {
        self.positions_in_range(center, range)
            .into_iter()
            .filter_map(|pos| self.block(pos).map(|b| (pos, b)))
            .collect()
    }

    /// Chest-bearing blocks that are still standing.
    pub fn chests_remaining(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.has_chest() && !b.is_destroyed())
            .count()
    }

    /// True when every chest-bearing block has been destroyed.
    pub fn all_chests_collected(&self) -> bool {
        self.chests_remaining() == 0
    }

    /// Column `x` (all rows, top to bottom).
    pub fn column(&self, x: u32) -> &[Block] {
        let h = self.height as usize;
        let start = x as usize * h;
        &self.blocks[start..start + h]
    }

    /// Iterate columns in `x` order.
    pub fn columns(&self) -> impl Iterator<Item = &[Block]> {
        self.blocks.chunks(self.height.max(1) as usize)
    }

    /// Feed every cell into the state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.width);
        hasher.update_u32(self.height);
        for block in &self.blocks {
            hasher.update_u32(block.health);
            match &block.chest {
                Some(chest) => {
                    hasher.update_bool(true);
                    hasher.update_u32(chest.money);
                }
                None => hasher.update_bool(false),
            }
        }
    }
}
