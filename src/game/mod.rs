//! Game Logic Module
//!
//! All game rules. Nothing in here touches the network or reads the clock;
//! time comes in as an `Instant` argument.
//!
//! ## Module Structure
//!
//! - `map`: Block grid, chests, map generation
//! - `character`: The miner's stats, stamina and bomb cooldown
//! - `combat`: Bomb blast resolution
//! - `action`: Action types, errors and the action processor
//! - `autonomy`: What the character does on its own
//! - `state`: The world and its configuration
//! - `events`: Events produced for broadcast
//! - `tick`: One step of the game loop

pub mod map;
pub mod character;
pub mod combat;
pub mod action;
pub mod autonomy;
pub mod state;
pub mod events;
pub mod tick;

// Re-export key types
pub use map::{Block, Chest, ChestType, GameMap, MapConfig};
pub use character::{Character, CharacterConfig};
pub use combat::{AffectedBlock, BombOutcome};
pub use action::{process_action, ActionError, ActionSource, GameAction};
pub use state::{ConfigError, World, WorldConfig};
pub use events::{Counters, GameEvent, GameOutcome};
pub use tick::{tick, TickResult};
