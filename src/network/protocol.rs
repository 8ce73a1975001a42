//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. Everything
//! is JSON text.
//!
//! Inbound: `{"type": "Move" | "PlaceBomb", "direction"?: .., "x"?: .., "y"?: ..}`
//!
//! Outbound: `{"event": <name>, "data": {..}}`
//!
//! Maps are sent as `map[x][y]`: the outer sequence is indexed by column.

use std::time::Instant;

use serde::{Serialize, Deserialize};

use crate::core::grid::{Direction, GridPos};
use crate::game::action::{ActionError, GameAction};
use crate::game::character::Character;
use crate::game::combat::AffectedBlock;
use crate::game::events::{Counters, GameEvent, GameOutcome};
use crate::game::map::Block;
use crate::game::state::World;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Action message as sent by a client.
///
/// Every field but `type` is optional at this level;
/// [`ClientAction::into_action`] checks the combination. PascalCase keys are
/// accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAction {
    /// `"Move"` or `"PlaceBomb"`
    #[serde(rename = "type", alias = "Type")]
    pub action_type: String,
    /// Move direction
    #[serde(default, alias = "Direction", skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Bomb target column
    #[serde(default, alias = "X", skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Bomb target row
    #[serde(default, alias = "Y", skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
}

impl ClientAction {
    /// Decode from JSON text.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Encode to JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Turn the loose wire form into a game action.
    pub fn into_action(self) -> Result<GameAction, ActionError> {
        match self.action_type.as_str() {
            "Move" => {
                let name = self
                    .direction
                    .ok_or_else(|| ActionError::MalformedAction("Move without direction".into()))?;
                Direction::from_name(&name)
                    .map(GameAction::Move)
                    .ok_or_else(|| ActionError::MalformedAction(format!("unknown direction {:?}", name)))
            }
            "PlaceBomb" => match (self.x, self.y) {
                (Some(x), Some(y)) => Ok(GameAction::PlaceBomb(GridPos::new(x, y))),
                _ => Err(ActionError::MalformedAction("PlaceBomb without x and y".into())),
            },
            _ => Err(ActionError::UnknownActionType(self.action_type)),
        }
    }
}

impl From<GameAction> for ClientAction {
    fn from(action: GameAction) -> Self {
        match action {
            GameAction::Move(direction) => Self {
                action_type: "Move".into(),
                direction: Some(format!("{:?}", direction)),
                ..Self::default()
            },
            GameAction::PlaceBomb(target) => Self {
                action_type: "PlaceBomb".into(),
                x: Some(target.x),
                y: Some(target.y),
                ..Self::default()
            },
        }
    }
}

/// Decode an inbound text frame into an action.
pub fn parse_action(text: &str) -> Result<GameAction, ActionError> {
    ClientAction::from_json(text)
        .map_err(|e| ActionError::MalformedAction(e.to_string()))?
        .into_action()
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    /// Full snapshot, sent once per new connection
    GameState(GameStateData),
    /// Character moved
    CharacterMoved(CharacterMovedData),
    /// Bomb went off
    BombPlaced(BombPlacedData),
    /// Stamina refilled by the game loop
    StaminaRegenerated(StaminaRegeneratedData),
    /// Game finished
    GameOver(GameOverData),
}

impl ServerMessage {
    /// Encode to JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from JSON text.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Full snapshot of `world` as seen at `now`.
    pub fn snapshot(world: &World, now: Instant) -> Self {
        ServerMessage::GameState(GameStateData::from_world(world, now))
    }
}

/// Character stats in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterView {
    /// Display name
    pub name: String,
    /// Current stamina
    pub stamina: u32,
    /// Stamina cap
    pub max_stamina: u32,
    /// Damage per hit
    pub power: u32,
    /// Reserved speed stat
    pub movement_speed: f64,
    /// Blast radius
    pub bomb_range: u32,
    /// Bombs available
    pub bomb_ammo: u32,
    /// Cooldown after each bomb
    pub bomb_cooldown_seconds: f64,
    /// Bomb cooling down right now
    pub on_cooldown: bool,
    /// Column
    pub position_x: i32,
    /// Row
    pub position_y: i32,
    /// Granted abilities, sorted
    pub special_abilities: Vec<String>,
}

impl CharacterView {
    fn new(character: &Character, now: Instant) -> Self {
        Self {
            name: character.name().to_string(),
            stamina: character.stamina(),
            max_stamina: character.max_stamina(),
            power: character.power(),
            movement_speed: character.movement_speed(),
            bomb_range: character.bomb_range(),
            bomb_ammo: character.bomb_ammo(),
            bomb_cooldown_seconds: character.bomb_cooldown().as_secs_f64(),
            on_cooldown: character.is_on_cooldown(now),
            position_x: character.position().x,
            position_y: character.position().y,
            special_abilities: character.special_abilities().map(str::to_string).collect(),
        }
    }
}

/// One map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
    /// Remaining health
    pub health: u32,
    /// A chest is hidden here
    pub has_chest: bool,
    /// Health is zero
    pub is_destroyed: bool,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        Self {
            health: block.health(),
            has_chest: block.has_chest(),
            is_destroyed: block.is_destroyed(),
        }
    }
}

/// `GameState` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateData {
    /// Character stats and position
    pub character: CharacterView,
    /// Columns
    pub width: u32,
    /// Rows
    pub height: u32,
    /// `map[x][y]`
    pub map: Vec<Vec<BlockView>>,
    /// Running counters
    #[serde(flatten)]
    pub counters: Counters,
    /// Money from uncovered chests
    pub collected_money: u32,
    /// Game still in progress
    pub is_running: bool,
    /// Ticks simulated so far
    pub tick: u32,
}

impl GameStateData {
    /// Capture the whole world.
    pub fn from_world(world: &World, now: Instant) -> Self {
        let map = world.map();
        Self {
            character: CharacterView::new(world.character(), now),
            width: map.width(),
            height: map.height(),
            map: map
                .columns()
                .map(|column| column.iter().map(BlockView::from).collect())
                .collect(),
            counters: world.counters(),
            collected_money: world.collected_money(),
            is_running: world.is_running(),
            tick: world.tick_count(),
        }
    }
}

/// `CharacterMoved` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterMovedData {
    /// Step taken
    pub direction: Direction,
    /// New column
    pub position_x: i32,
    /// New row
    pub position_y: i32,
    /// Running counters
    #[serde(flatten)]
    pub counters: Counters,
}

/// A block touched by a blast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedBlockView {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
    /// Health after the blast
    pub health: u32,
    /// A chest is (or was) hidden here
    pub has_chest: bool,
    /// Health is zero
    pub is_destroyed: bool,
}

impl From<&AffectedBlock> for AffectedBlockView {
    fn from(block: &AffectedBlock) -> Self {
        Self {
            x: block.position.x,
            y: block.position.y,
            health: block.health,
            has_chest: block.has_chest,
            is_destroyed: block.is_destroyed,
        }
    }
}

/// Character fields a bomb changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedCharacter {
    /// Stamina after paying for the bomb
    pub stamina: u32,
    /// Bomb cooling down
    pub on_cooldown: bool,
}

/// `BombPlaced` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BombPlacedData {
    /// Blast center column
    pub x: i32,
    /// Blast center row
    pub y: i32,
    /// Every block the blast reached
    pub affected_blocks: Vec<AffectedBlockView>,
    /// Character after the bomb
    pub updated_character: UpdatedCharacter,
    /// Running counters
    #[serde(flatten)]
    pub counters: Counters,
}

/// `StaminaRegenerated` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaminaRegeneratedData {
    /// Stamina after regeneration
    pub stamina: u32,
    /// Running counters
    #[serde(flatten)]
    pub counters: Counters,
}

/// `GameOver` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverData {
    /// Won or lost
    pub outcome: GameOutcome,
    /// Human-readable reason
    pub message: String,
    /// Tick the game ended on
    pub tick: u32,
    /// Money from uncovered chests
    pub collected_money: u32,
    /// Final counters
    #[serde(flatten)]
    pub counters: Counters,
}

impl From<&GameEvent> for ServerMessage {
    fn from(event: &GameEvent) -> Self {
        match event {
            GameEvent::CharacterMoved { direction, position, counters } => {
                ServerMessage::CharacterMoved(CharacterMovedData {
                    direction: *direction,
                    position_x: position.x,
                    position_y: position.y,
                    counters: *counters,
                })
            }
            GameEvent::BombPlaced { outcome, stamina, on_cooldown, counters } => {
                ServerMessage::BombPlaced(BombPlacedData {
                    x: outcome.target.x,
                    y: outcome.target.y,
                    affected_blocks: outcome.affected.iter().map(AffectedBlockView::from).collect(),
                    updated_character: UpdatedCharacter {
                        stamina: *stamina,
                        on_cooldown: *on_cooldown,
                    },
                    counters: *counters,
                })
            }
            GameEvent::StaminaRegenerated { stamina, counters } => {
                ServerMessage::StaminaRegenerated(StaminaRegeneratedData {
                    stamina: *stamina,
                    counters: *counters,
                })
            }
            GameEvent::GameOver { outcome, tick, collected_money, counters } => {
                ServerMessage::GameOver(GameOverData {
                    outcome: *outcome,
                    message: outcome.message().to_string(),
                    tick: *tick,
                    collected_money: *collected_money,
                    counters: *counters,
                })
            }
        }
    }
}
