//! Game Events
//!
//! What actions and ticks report back to be broadcast.

use serde::{Serialize, Deserialize};

use crate::core::grid::{Direction, GridPos};
use crate::game::combat::BombOutcome;

/// Running totals carried by every broadcast event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Blocks destroyed since the game began
    #[serde(rename = "destroyedBlocksCount")]
    pub destroyed_blocks: u32,
    /// Chests uncovered since the game began
    #[serde(rename = "collectedChestCount")]
    pub collected_chests: u32,
}

/// How a finished game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Every chest was uncovered
    Won,
    /// Stamina could not be regenerated
    Lost,
}

impl GameOutcome {
    /// Human-readable reason sent with `GameOver`.
    pub fn message(self) -> &'static str {
        match self {
            GameOutcome::Won => "All chests have been destroyed. You win!",
            GameOutcome::Lost => "Game Over: Character ran out of stamina.",
        }
    }
}

/// Game event data.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Character stepped onto a cleared cell
    CharacterMoved {
        direction: Direction,
        position: GridPos,
        counters: Counters,
    },

    /// A bomb went off
    BombPlaced {
        outcome: BombOutcome,
        stamina: u32,
        on_cooldown: bool,
        counters: Counters,
    },

    /// Stamina was topped up by the game loop
    StaminaRegenerated {
        stamina: u32,
        counters: Counters,
    },

    /// Terminal event; nothing follows it
    GameOver {
        outcome: GameOutcome,
        tick: u32,
        collected_money: u32,
        counters: Counters,
    },
}

impl GameEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::CharacterMoved { .. } => "CharacterMoved",
            GameEvent::BombPlaced { .. } => "BombPlaced",
            GameEvent::StaminaRegenerated { .. } => "StaminaRegenerated",
            GameEvent::GameOver { .. } => "GameOver",
        }
    }

    /// Counters at the time of the event.
    pub fn counters(&self) -> Counters {
        match self {
            GameEvent::CharacterMoved { counters, .. }
            | GameEvent::BombPlaced { counters, .. }
            | GameEvent::StaminaRegenerated { counters, .. }
            | GameEvent::GameOver { counters, .. } => *counters,
        }
    }

    /// Whether this event ends the game.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEvent::GameOver { .. })
    }
}
