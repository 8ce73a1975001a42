//! Character State
//!
//! The single playable miner shared by every connected viewer.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::core::grid::GridPos;
use crate::core::hash::StateHasher;
use crate::game::action::ActionError;
use crate::game::state::ConfigError;

/// Starting stats for the character.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterConfig {
    /// Display name
    pub name: String,
    /// Stamina cap (also the starting stamina)
    pub max_stamina: u32,
    /// Damage dealt to each block a bomb reaches
    pub power: u32,
    /// Reserved; reported to clients but not used by any rule
    pub movement_speed: f64,
    /// Chebyshev radius of a bomb blast
    pub bomb_range: u32,
    /// Bombs available (checked, never consumed)
    pub bomb_ammo: u32,
    /// Time before another bomb may be placed
    pub bomb_cooldown: Duration,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            name: "Miner".to_string(),
            max_stamina: 100,
            power: 20,
            movement_speed: 1.5,
            bomb_range: 1,
            bomb_ammo: 5,
            bomb_cooldown: Duration::from_secs(2),
        }
    }
}

impl CharacterConfig {
    /// Reject stats the game cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stamina == 0 {
            return Err(ConfigError::NoStamina);
        }
        if !self.movement_speed.is_finite() || self.movement_speed < 0.0 {
            return Err(ConfigError::MovementSpeed(self.movement_speed));
        }
        Ok(())
    }
}

/// The miner.
///
/// Stamina never exceeds `max_stamina`. The bomb cooldown is a deadline
/// compared against the caller's clock, so no background timer exists.
#[derive(Clone, Debug)]
pub struct Character {
    name: String,
    stamina: u32,
    max_stamina: u32,
    power: u32,
    movement_speed: f64,
    bomb_range: u32,
    bomb_ammo: u32,
    bomb_cooldown: Duration,
    cooldown_until: Option<Instant>,
    position: GridPos,
    special_abilities: BTreeSet<String>,
}

impl Character {
    /// Create a character at full stamina.
    pub fn new(config: &CharacterConfig, position: GridPos) -> Self {
        Self {
            name: config.name.clone(),
            stamina: config.max_stamina,
            max_stamina: config.max_stamina,
            power: config.power,
            movement_speed: config.movement_speed,
            bomb_range: config.bomb_range,
            bomb_ammo: config.bomb_ammo,
            bomb_cooldown: config.bomb_cooldown,
            cooldown_until: None,
            position,
            special_abilities: BTreeSet::new(),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current stamina.
    #[inline]
    pub fn stamina(&self) -> u32 {
        self.stamina
    }

    /// Stamina cap.
    #[inline]
    pub fn max_stamina(&self) -> u32 {
        self.max_stamina
    }

    /// Damage per hit.
    #[inline]
    pub fn power(&self) -> u32 {
        self.power
    }

    /// Reserved speed stat.
    #[inline]
    pub fn movement_speed(&self) -> f64 {
        self.movement_speed
    }

    /// Blast radius.
    #[inline]
    pub fn bomb_range(&self) -> u32 {
        self.bomb_range
    }

    /// Bombs available.
    #[inline]
    pub fn bomb_ammo(&self) -> u32 {
        self.bomb_ammo
    }

    /// Cooldown applied after each bomb.
    #[inline]
    pub fn bomb_cooldown(&self) -> Duration {
        self.bomb_cooldown
    }

    /// Current cell.
    #[inline]
    pub fn position(&self) -> GridPos {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: GridPos) {
        self.position = position;
    }

    /// Overwrite stamina, clamped to the cap.
    pub fn set_stamina(&mut self, stamina: u32) {
        self.stamina = stamina.min(self.max_stamina);
    }

    /// Whether the bomb is still cooling down at `now`.
    #[inline]
    pub fn is_on_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Time left on the cooldown at `now`.
    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        self.cooldown_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default()
    }

    /// Put the bomb on cooldown starting at `now`.
    pub fn start_cooldown(&mut self, now: Instant) {
        self.cooldown_until = Some(now + self.bomb_cooldown);
    }

    /// Spend one stamina and start the cooldown.
    ///
    /// Fails without touching state if stamina is exhausted or the bomb is
    /// still cooling down.
    pub fn use_bomb(&mut self, now: Instant) -> Result<(), ActionError> {
        if self.stamina == 0 {
            return Err(ActionError::OutOfStamina);
        }
        if self.is_on_cooldown(now) {
            return Err(ActionError::OnCooldown {
                remaining: self.cooldown_remaining(now),
            });
        }

        self.stamina -= 1;
        self.start_cooldown(now);
        Ok(())
    }

    /// Restore half of max stamina (integer division), capped at max.
    ///
    /// Returns the new stamina.
    pub fn regenerate_stamina(&mut self) -> u32 {
        self.stamina = self
            .stamina
            .saturating_add(self.max_stamina / 2)
            .min(self.max_stamina);
        self.stamina
    }

    /// Grant a named ability. Returns `false` if it was already granted.
    pub fn add_special_ability(&mut self, ability: impl Into<String>) -> bool {
        self.special_abilities.insert(ability.into())
    }

    /// Whether a named ability is granted.
    pub fn has_special_ability(&self, ability: &str) -> bool {
        self.special_abilities.contains(ability)
    }

    /// Granted abilities in sorted order.
    pub fn special_abilities(&self) -> impl Iterator<Item = &str> {
        self.special_abilities.iter().map(String::as_str)
    }

    /// Feed the deterministic part of the character into the state hash.
    ///
    /// The cooldown deadline is wall-clock dependent and left out.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(&self.name);
        hasher.update_u32(self.stamina);
        hasher.update_u32(self.max_stamina);
        hasher.update_u32(self.power);
        hasher.update_u32(self.bomb_range);
        hasher.update_u32(self.bomb_ammo);
        hasher.update_pos(self.position);
        hasher.update_u32(self.special_abilities.len() as u32);
        for ability in &self.special_abilities {
            hasher.update_str(ability);
        }
    }
}
