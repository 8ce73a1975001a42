//! Autonomous Behavior
//!
//! What the character does on its own when nobody has sent a command.
//!
//! 1. If the bomb is ready, bomb the first intact neighbor (Up, Down, Left,
//!    Right).
//! 2. Otherwise wander: pick a random legal move, avoiding an immediate
//!    reversal of the previous move when any other option exists.

use std::time::Instant;

use crate::core::grid::Direction;
use crate::core::rng::DeterministicRng;
use crate::game::action::GameAction;
use crate::game::character::Character;
use crate::game::map::GameMap;

/// Pick the next autonomous action, or `None` if the character is boxed in.
///
/// Randomness is drawn from `rng` only when wandering.
pub fn choose_action(
    map: &GameMap,
    character: &Character,
    last_move: Option<Direction>,
    rng: &mut DeterministicRng,
    now: Instant,
) -> Option<GameAction> {
    let position = character.position();

    // Ammo is not consulted: with none left the bomb is rejected, no cooldown
    // starts, and the character stays put until an external command arrives.
    if !character.is_on_cooldown(now) {
        let target = Direction::ALL
            .into_iter()
            .map(|direction| position.step(direction))
            .find(|&neighbor| map.is_intact_at(neighbor));
        if let Some(target) = target {
            return Some(GameAction::PlaceBomb(target));
        }
    }

    let mut legal: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|&direction| map.is_destroyed_at(position.step(direction)))
        .collect();
    if legal.is_empty() {
        return None;
    }

    rng.shuffle(&mut legal);
    let choice = legal
        .iter()
        .copied()
        .find(|direction| Some(direction.opposite()) != last_move)
        .unwrap_or(legal[0]);

    Some(GameAction::Move(choice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridPos;
    use crate::game::character::CharacterConfig;
    use std::time::Duration;

    fn miner_at(x: i32, y: i32) -> Character {
        Character::new(&CharacterConfig::default(), GridPos::new(x, y))
    }

    fn clear(map: &mut GameMap, x: i32, y: i32) {
        map.block_mut(GridPos::new(x, y)).unwrap().take_damage(u32::MAX);
    }

    #[test]
    fn test_bombs_first_intact_neighbor() {
        let mut map = GameMap::uniform(5, 5, 10);
        clear(&mut map, 2, 2);
        clear(&mut map, 2, 1); // Up is rubble, Down is next in order
        let character = miner_at(2, 2);
        let mut rng = DeterministicRng::new(1);

        let action = choose_action(&map, &character, None, &mut rng, Instant::now());
        assert_eq!(action, Some(GameAction::PlaceBomb(GridPos::new(2, 3))));
    }

    #[test]
    fn test_bombing_does_not_consume_randomness() {
        let mut map = GameMap::uniform(5, 5, 10);
        clear(&mut map, 2, 2);
        let character = miner_at(2, 2);
        let mut rng = DeterministicRng::new(9);
        let before = rng.state();

        choose_action(&map, &character, None, &mut rng, Instant::now());
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn test_wanders_while_on_cooldown() {
        let mut map = GameMap::uniform(5, 5, 10);
        clear(&mut map, 2, 2);
        clear(&mut map, 3, 2);
        let mut character = miner_at(2, 2);
        let now = Instant::now();
        character.start_cooldown(now);
        let mut rng = DeterministicRng::new(3);

        let action = choose_action(&map, &character, None, &mut rng, now + Duration::from_millis(500));
        assert_eq!(action, Some(GameAction::Move(Direction::Right)));
    }

    #[test]
    fn test_boxed_in_does_nothing() {
        let mut map = GameMap::uniform(5, 5, 10);
        clear(&mut map, 2, 2);
        let mut character = miner_at(2, 2);
        let now = Instant::now();
        character.start_cooldown(now);
        let mut rng = DeterministicRng::new(3);

        assert_eq!(choose_action(&map, &character, None, &mut rng, now), None);
    }

    #[test]
    fn test_never_reverses_when_alternative_exists() {
        // Corridor: only Up and Down are open
        let mut map = GameMap::uniform(5, 5, 10);
        clear(&mut map, 2, 1);
        clear(&mut map, 2, 2);
        clear(&mut map, 2, 3);
        let mut character = miner_at(2, 2);
        let now = Instant::now();
        character.start_cooldown(now);

        for seed in 0..200u64 {
            let mut rng = DeterministicRng::new(seed);
            let action = choose_action(&map, &character, Some(Direction::Up), &mut rng, now);
            assert_eq!(action, Some(GameAction::Move(Direction::Up)), "seed {}", seed);
        }
    }

    #[test]
    fn test_reverses_from_dead_end() {
        let mut map = GameMap::uniform(5, 5, 10);
        clear(&mut map, 2, 2);
        clear(&mut map, 2, 3);
        let mut character = miner_at(2, 2);
        let now = Instant::now();
        character.start_cooldown(now);
        let mut rng = DeterministicRng::new(5);

        // Came up from (2, 3); the only way out is back down
        let action = choose_action(&map, &character, Some(Direction::Up), &mut rng, now);
        assert_eq!(action, Some(GameAction::Move(Direction::Down)));
    }

    #[test]
    fn test_same_seed_same_choice() {
        let mut map = GameMap::uniform(5, 5, 10);
        for (x, y) in [(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)] {
            clear(&mut map, x, y);
        }
        let mut character = miner_at(2, 2);
        let now = Instant::now();
        character.start_cooldown(now);

        let mut a = DeterministicRng::new(77);
        let mut b = DeterministicRng::new(77);
        for _ in 0..20 {
            assert_eq!(
                choose_action(&map, &character, None, &mut a, now),
                choose_action(&map, &character, None, &mut b, now),
            );
        }
    }
}
