//! World State
//!
//! The single authoritative game world: one map, one character, the running
//! counters and the flags the game loop consults.

use std::time::Instant;

use crate::core::grid::{Direction, GridPos};
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::action::GameAction;
use crate::game::autonomy::choose_action;
use crate::game::character::{Character, CharacterConfig};
use crate::game::combat::BombOutcome;
use crate::game::events::{Counters, GameEvent, GameOutcome};
use crate::game::map::{GameMap, MapConfig};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Rejected world configuration.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Zero width or height
    #[error("map must have at least one cell (got {width}x{height})")]
    EmptyMap { width: u32, height: u32 },

    /// Dimensions do not fit grid coordinates
    #[error("map {width}x{height} is too large")]
    MapTooLarge { width: u32, height: u32 },

    /// Chest chance above 100%
    #[error("chest chance {0}% is above 100%")]
    ChestChance(u32),

    /// Empty or zero-based health range
    #[error("invalid block health range {min}..={max}")]
    HealthRange { min: u32, max: u32 },

    /// Empty or zero-based money range
    #[error("invalid chest money range {min}..={max}")]
    MoneyRange { min: u32, max: u32 },

    /// Character would start exhausted
    #[error("max stamina must be positive")]
    NoStamina,

    /// Negative or non-finite speed
    #[error("invalid movement speed {0}")]
    MovementSpeed(f64),
}

/// Everything needed to create a world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Map generation parameters
    pub map: MapConfig,
    /// Character stats
    pub character: CharacterConfig,
    /// Starting cell; clamped into the map
    pub start_position: GridPos,
    /// Seed for map generation and autonomous behavior
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            character: CharacterConfig::default(),
            start_position: GridPos::new(7, 7),
            seed: 0,
        }
    }
}

impl WorldConfig {
    /// Validate map and character settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.map.validate()?;
        self.character.validate()
    }
}

// =============================================================================
// WORLD
// =============================================================================

/// Authoritative game world.
///
/// Counters only ever increase. Once `is_running` is false it stays false
/// and every action is rejected.
#[derive(Clone, Debug)]
pub struct World {
    map: GameMap,
    character: Character,
    seed: u64,
    tick: u32,
    destroyed_blocks: u32,
    collected_chests: u32,
    collected_money: u32,
    is_running: bool,
    last_move_direction: Option<Direction>,
    external_input_pending: bool,
    autonomy_rng: DeterministicRng,
}

impl World {
    /// Generate a fresh world.
    ///
    /// The starting cell is left as generated, so the character may begin
    /// standing on an intact block.
    pub fn new(config: &WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut map_rng = DeterministicRng::derived(config.seed, b"map");
        let map = GameMap::generate(&config.map, &mut map_rng);

        let character = Character::new(&config.character, config.start_position);
        Ok(Self::from_parts(map, character, config.seed))
    }

    /// Assemble a world from an existing map and character.
    ///
    /// A character standing outside the map is clamped onto its nearest edge.
    pub fn from_parts(map: GameMap, mut character: Character, seed: u64) -> Self {
        let position = character.position();
        let clamped = GridPos::new(
            position.x.min(map.width() as i32 - 1).max(0),
            position.y.min(map.height() as i32 - 1).max(0),
        );
        if clamped != position {
            character.set_position(clamped);
        }

        Self {
            map,
            character,
            seed,
            tick: 0,
            destroyed_blocks: 0,
            collected_chests: 0,
            collected_money: 0,
            is_running: true,
            last_move_direction: None,
            external_input_pending: false,
            autonomy_rng: DeterministicRng::derived(seed, b"autonomy"),
        }
    }

    /// The block grid.
    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// Mutable block grid.
    pub fn map_mut(&mut self) -> &mut GameMap {
        &mut self.map
    }

    /// The character.
    pub fn character(&self) -> &Character {
        &self.character
    }

    /// Mutable character.
    pub fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    pub(crate) fn map_and_character_mut(&mut self) -> (&mut GameMap, &mut Character) {
        (&mut self.map, &mut self.character)
    }

    /// World seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Ticks processed so far.
    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    /// Whether the game is still in progress.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Direction of the last successful move.
    pub fn last_move_direction(&self) -> Option<Direction> {
        self.last_move_direction
    }

    /// Current counters.
    pub fn counters(&self) -> Counters {
        Counters {
            destroyed_blocks: self.destroyed_blocks,
            collected_chests: self.collected_chests,
        }
    }

    /// Money taken from uncovered chests.
    pub fn collected_money(&self) -> u32 {
        self.collected_money
    }

    pub(crate) fn record_move(&mut self, direction: Direction, position: GridPos) {
        self.character.set_position(position);
        self.last_move_direction = Some(direction);
    }

    pub(crate) fn record_bomb(&mut self, outcome: &BombOutcome) {
        self.destroyed_blocks = self.destroyed_blocks.saturating_add(outcome.newly_destroyed);
        self.collected_chests = self.collected_chests.saturating_add(outcome.chests_revealed);
        self.collected_money = self.collected_money.saturating_add(outcome.money_collected);
    }

    pub(crate) fn mark_external_input(&mut self) {
        self.external_input_pending = true;
    }

    /// Consume the external-input flag, returning whether it was set.
    pub(crate) fn take_external_input(&mut self) -> bool {
        std::mem::take(&mut self.external_input_pending)
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Ask the autonomous behavior for its next action.
    pub(crate) fn autonomous_action(&mut self, now: Instant) -> Option<GameAction> {
        choose_action(
            &self.map,
            &self.character,
            self.last_move_direction,
            &mut self.autonomy_rng,
            now,
        )
    }

    /// Stop the game and produce the terminal event.
    pub(crate) fn end(&mut self, outcome: GameOutcome) -> GameEvent {
        self.is_running = false;
        GameEvent::GameOver {
            outcome,
            tick: self.tick,
            collected_money: self.collected_money,
            counters: self.counters(),
        }
    }

    /// Hash of everything that determines future play.
    ///
    /// Two worlds built from the same seed and fed the same actions at the
    /// same ticks hash identically.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.seed, |hasher| {
            self.map.hash_into(hasher);
            self.character.hash_into(hasher);
            hasher.update_u32(self.destroyed_blocks);
            hasher.update_u32(self.collected_chests);
            hasher.update_u32(self.collected_money);
            hasher.update_bool(self.is_running);
            match self.last_move_direction {
                Some(direction) => hasher.update_u8(direction as u8 + 1),
                None => hasher.update_u8(0),
            }
            for word in self.autonomy_rng.state() {
                hasher.update_u64(word);
            }
        })
    }
}
