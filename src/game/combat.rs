//! Bomb Damage
//!
//! Resolves a bomb: checks the character can throw it, then damages every
//! block in the blast square.

use std::time::Instant;

use crate::core::grid::GridPos;
use crate::game::action::ActionError;
use crate::game::character::Character;
use crate::game::map::GameMap;

/// State of one block after a blast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffectedBlock {
    /// Cell
    pub position: GridPos,
    /// Health after damage
    pub health: u32,
    /// Whether a chest is (or was) hidden here
    pub has_chest: bool,
    /// Health is zero
    pub is_destroyed: bool,
    /// This blast is what destroyed it
    pub newly_destroyed: bool,
}

/// Summary of one bomb.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BombOutcome {
    /// Blast center
    pub target: GridPos,
    /// Every block the blast reached, in scan order
    pub affected: Vec<AffectedBlock>,
    /// Blocks that went from intact to destroyed
    pub newly_destroyed: u32,
    /// Chests uncovered by those blocks
    pub chests_revealed: u32,
    /// Money in those chests
    pub money_collected: u32,
}

/// Throw a bomb at `target`.
///
/// Preconditions are checked in order ammo, stamina, cooldown; a failure
/// leaves the character and map untouched. Ammo is checked but not spent.
pub fn place_bomb(
    map: &mut GameMap,
    character: &mut Character,
    target: GridPos,
    now: Instant,
) -> Result<BombOutcome, ActionError> {
    if character.bomb_ammo() == 0 {
        return Err(ActionError::OutOfAmmo);
    }

    character.use_bomb(now)?;

    let power = character.power();
    let mut outcome = BombOutcome {
        target,
        ..BombOutcome::default()
    };

    for position in map.positions_in_range(target, character.bomb_range()) {
        let Some(block) = map.block_mut(position) else {
            continue;
        };

        let newly_destroyed = block.take_damage(power);
        if newly_destroyed {
            outcome.newly_destroyed += 1;
            if let Some(chest) = block.chest() {
                outcome.chests_revealed += 1;
                outcome.money_collected = outcome.money_collected.saturating_add(chest.money());
            }
        }

        outcome.affected.push(AffectedBlock {
            position,
            health: block.health(),
            has_chest: block.has_chest(),
            is_destroyed: block.is_destroyed(),
            newly_destroyed,
        });
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::CharacterConfig;
    use crate::game::map::{Block, Chest, ChestType};
    use std::time::Duration;

    fn setup(power: u32, range: u32) -> (GameMap, Character) {
        let config = CharacterConfig {
            power,
            bomb_range: range,
            ..CharacterConfig::default()
        };
        (GameMap::uniform(10, 10, 30), Character::new(&config, GridPos::new(5, 5)))
    }

    #[test]
    fn test_blast_damages_square() {
        let (mut map, mut character) = setup(20, 1);
        let now = Instant::now();

        let outcome = place_bomb(&mut map, &mut character, GridPos::new(5, 4), now).unwrap();

        assert_eq!(outcome.affected.len(), 9);
        assert_eq!(outcome.newly_destroyed, 0);
        for affected in &outcome.affected {
            assert_eq!(affected.health, 10);
            assert_eq!(map.block(affected.position).unwrap().health(), 10);
        }
        // Outside the square is untouched
        assert_eq!(map.block(GridPos::new(5, 6)).unwrap().health(), 30);
        assert_eq!(character.stamina(), 99);
        assert!(character.is_on_cooldown(now));
    }

    #[test]
    fn test_counts_only_transitions() {
        let (mut map, mut character) = setup(30, 1);
        let now = Instant::now();

        // One neighbor already rubble, one hides a chest
        map.block_mut(GridPos::new(4, 4)).unwrap().take_damage(100);
        *map.block_mut(GridPos::new(6, 4)).unwrap() =
            Block::new(5, Some(Chest::new(40, ChestType::Normal)));

        let outcome = place_bomb(&mut map, &mut character, GridPos::new(5, 4), now).unwrap();

        assert_eq!(outcome.newly_destroyed, 8);
        assert_eq!(outcome.chests_revealed, 1);
        assert_eq!(outcome.money_collected, 40);
        let rubble = outcome
            .affected
            .iter()
            .find(|a| a.position == GridPos::new(4, 4))
            .unwrap();
        assert!(rubble.is_destroyed);
        assert!(!rubble.newly_destroyed);
    }

    #[test]
    fn test_no_stamina_leaves_map_untouched() {
        let (mut map, mut character) = setup(20, 1);
        character.set_stamina(0);
        let before = map.clone();

        let result = place_bomb(&mut map, &mut character, GridPos::new(5, 4), Instant::now());

        assert!(matches!(result, Err(ActionError::OutOfStamina)));
        assert_eq!(map, before);
    }

    #[test]
    fn test_on_cooldown_rejected() {
        let (mut map, mut character) = setup(5, 0);
        let now = Instant::now();

        place_bomb(&mut map, &mut character, GridPos::new(2, 2), now).unwrap();
        let before = map.clone();
        let result = place_bomb(&mut map, &mut character, GridPos::new(2, 2), now + Duration::from_millis(10));

        assert!(matches!(result, Err(ActionError::OnCooldown { .. })));
        assert_eq!(map, before);
        assert_eq!(character.stamina(), 99);
    }

    #[test]
    fn test_out_of_ammo_checked_first() {
        let config = CharacterConfig { bomb_ammo: 0, ..CharacterConfig::default() };
        let mut character = Character::new(&config, GridPos::ZERO);
        character.set_stamina(0);
        let mut map = GameMap::uniform(3, 3, 10);

        let result = place_bomb(&mut map, &mut character, GridPos::new(1, 1), Instant::now());
        assert!(matches!(result, Err(ActionError::OutOfAmmo)));
    }

    #[test]
    fn test_ammo_is_not_consumed() {
        let (mut map, mut character) = setup(1, 0);
        let start = Instant::now();
        for i in 0..10u64 {
            let now = start + Duration::from_secs(3 * i);
            place_bomb(&mut map, &mut character, GridPos::new(0, 0), now).unwrap();
        }
        assert_eq!(character.bomb_ammo(), 5);
        assert_eq!(character.stamina(), 90);
    }
}
