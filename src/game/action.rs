//! Action Processing
//!
//! The two things the character can do, and the single code path that
//! applies them to the world. Client commands and autonomous decisions both
//! go through [`process_action`].

use std::time::{Duration, Instant};

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::grid::{Direction, GridPos};
use crate::game::combat::place_bomb;
use crate::game::events::GameEvent;
use crate::game::state::World;

/// A command for the character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Step one cell onto a destroyed block
    Move(Direction),
    /// Bomb the blast square centered on a cell
    PlaceBomb(GridPos),
}

/// Where an action came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionSource {
    /// Sent by a connected client
    External,
    /// Chosen by the game loop
    Autonomy,
}

/// Why an action was rejected.
///
/// A rejected action never changes the world and is never broadcast.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// Target cell lies outside the map
    #[error("target {0} is outside the map")]
    OutOfBounds(GridPos),

    /// Tried to walk into an intact block
    #[error("block at {0} is still intact")]
    BlockStillIntact(GridPos),

    /// Tried to bomb a block that is already rubble
    #[error("block at {0} is already destroyed")]
    BlockAlreadyDestroyed(GridPos),

    /// No stamina left to pay for a bomb
    #[error("out of stamina")]
    OutOfStamina,

    /// Bomb is still cooling down
    #[error("bomb on cooldown for another {remaining:?}")]
    OnCooldown {
        /// Time left
        remaining: Duration,
    },

    /// No bombs available
    #[error("out of bomb ammo")]
    OutOfAmmo,

    /// Message could not be decoded into an action
    #[error("malformed action: {0}")]
    MalformedAction(String),

    /// Message named an action that does not exist
    #[error("unknown action type: {0}")]
    UnknownActionType(String),

    /// The game has already ended
    #[error("game is not running")]
    GameNotRunning,
}

/// Validate and apply one action.
///
/// On success the world is mutated and the event to broadcast is returned.
/// An accepted external action suppresses autonomy on the next tick.
pub fn process_action(
    world: &mut World,
    action: GameAction,
    source: ActionSource,
    now: Instant,
) -> Result<GameEvent, ActionError> {
    let result = apply(world, action, now);

    match &result {
        Ok(event) => {
            if source == ActionSource::External {
                world.mark_external_input();
            }
            debug!("{:?} action {:?} applied: {}", source, action, event.name());
        }
        Err(e) => {
            debug!("{:?} action {:?} rejected: {}", source, action, e);
        }
    }

    result
}

fn apply(world: &mut World, action: GameAction, now: Instant) -> Result<GameEvent, ActionError> {
    if !world.is_running() {
        return Err(ActionError::GameNotRunning);
    }

    match action {
        GameAction::Move(direction) => {
            let target = world.character().position().step(direction);
            if !world.map().contains(target) {
                return Err(ActionError::OutOfBounds(target));
            }
            if world.map().is_intact_at(target) {
                return Err(ActionError::BlockStillIntact(target));
            }

            world.record_move(direction, target);

            Ok(GameEvent::CharacterMoved {
                direction,
                position: target,
                counters: world.counters(),
            })
        }

        GameAction::PlaceBomb(target) => {
            if !world.map().contains(target) {
                return Err(ActionError::OutOfBounds(target));
            }
            if world.map().is_destroyed_at(target) {
                return Err(ActionError::BlockAlreadyDestroyed(target));
            }

            let (map, character) = world.map_and_character_mut();
            let outcome = place_bomb(map, character, target, now)?;
            world.record_bomb(&outcome);

            Ok(GameEvent::BombPlaced {
                stamina: world.character().stamina(),
                on_cooldown: world.character().is_on_cooldown(now),
                counters: world.counters(),
                outcome,
            })
        }
    }
}
