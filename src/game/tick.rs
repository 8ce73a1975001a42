//! Game Loop Step
//!
//! One tick of the authoritative simulation. Given the same world, the same
//! session presence and the same clock readings, a tick always produces the
//! same events.

use std::time::Instant;

use tracing::{debug, info};

use crate::game::action::{process_action, ActionSource};
use crate::game::events::{GameEvent, GameOutcome};
use crate::game::state::World;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events to broadcast, in order
    pub events: Vec<GameEvent>,
    /// Whether the game ended this tick
    pub game_over: bool,
    /// Whether the tick got past the idle checks
    pub simulated: bool,
}

/// Run one tick.
///
/// Steps, in order:
/// 1. A finished game does nothing.
/// 2. With nobody watching, the tick is skipped.
/// 3. If no chest is left standing, the game is won.
/// 4. An exhausted character regenerates; if that yields nothing the game
///    is lost.
/// 5. If a client action was applied since the last tick, autonomy waits.
/// 6. Otherwise the autonomous choice goes through the action processor.
pub fn tick(world: &mut World, has_sessions: bool, now: Instant) -> TickResult {
    let mut result = TickResult::default();

    if !world.is_running() {
        return result;
    }

    if !has_sessions {
        debug!("No sessions connected, skipping tick");
        return result;
    }

    world.advance_tick();
    result.simulated = true;

    // 1. Win check
    if world.map().all_chests_collected() {
        finish(world, GameOutcome::Won, &mut result);
        return result;
    }

    // 2. Stamina
    if world.character().stamina() == 0 {
        let stamina = world.character_mut().regenerate_stamina();
        if stamina == 0 {
            finish(world, GameOutcome::Lost, &mut result);
        } else {
            debug!("Stamina regenerated to {}", stamina);
            result.events.push(GameEvent::StaminaRegenerated {
                stamina,
                counters: world.counters(),
            });
        }
        return result;
    }

    // 3. Client input takes precedence over autonomy
    if world.take_external_input() {
        debug!("Tick {}: external input pending, autonomy skipped", world.tick_count());
        return result;
    }

    // 4. Autonomy
    match world.autonomous_action(now) {
        Some(action) => {
            if let Ok(event) = process_action(world, action, ActionSource::Autonomy, now) {
                result.events.push(event);
            }
        }
        None => debug!("Tick {}: no autonomous action available", world.tick_count()),
    }

    result
}

fn finish(world: &mut World, outcome: GameOutcome, result: &mut TickResult) {
    let event = world.end(outcome);
    info!(
        "Game over at tick {}: {:?}, {} blocks destroyed, {} chests, {} money, state hash {}",
        world.tick_count(),
        outcome,
        world.counters().destroyed_blocks,
        world.counters().collected_chests,
        world.collected_money(),
        hex::encode(world.compute_hash()),
    );
    result.events.push(event);
    result.game_over = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridPos;
    use crate::game::action::GameAction;
    use crate::game::character::{Character, CharacterConfig};
    use crate::game::map::{Block, Chest, ChestType, GameMap, MapConfig};
    use crate::game::state::WorldConfig;
    use std::time::Duration;

    /// 10x10 world with a single chest far from the character at (5, 5).
    fn world_with_chest(character: CharacterConfig) -> World {
        let mut map = GameMap::uniform(10, 10, 10);
        *map.block_mut(GridPos::new(0, 0)).unwrap() =
            Block::new(10, Some(Chest::new(50, ChestType::Normal)));
        World::from_parts(map, Character::new(&character, GridPos::new(5, 5)), 11)
    }

    #[test]
    fn test_no_sessions_skips() {
        let mut world = world_with_chest(CharacterConfig::default());
        let before = world.compute_hash();

        let result = tick(&mut world, false, Instant::now());

        assert!(!result.simulated);
        assert!(result.events.is_empty());
        assert_eq!(world.compute_hash(), before);
    }

    #[test]
    fn test_autonomy_acts() {
        let mut world = world_with_chest(CharacterConfig::default());

        let result = tick(&mut world, true, Instant::now());

        assert!(result.simulated);
        assert_eq!(result.events.len(), 1);
        assert!(matches!(result.events[0], GameEvent::BombPlaced { .. }));
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn test_win_emits_single_game_over() {
        let map = GameMap::uniform(5, 5, 10);
        let character = Character::new(&CharacterConfig::default(), GridPos::new(2, 2));
        let mut world = World::from_parts(map, character, 1);
        let now = Instant::now();

        let result = tick(&mut world, true, now);
        assert!(result.game_over);
        assert_eq!(result.events.len(), 1);
        assert!(matches!(
            result.events[0],
            GameEvent::GameOver { outcome: GameOutcome::Won, tick: 1, .. }
        ));
        assert!(!world.is_running());

        for i in 1..5 {
            let later = tick(&mut world, true, now + Duration::from_secs(i));
            assert!(later.events.is_empty());
            assert!(!later.game_over);
        }
    }

    #[test]
    fn test_bombing_last_chest_ends_game_next_tick() {
        let mut world = world_with_chest(CharacterConfig::default());
        let now = Instant::now();

        process_action(&mut world, GameAction::PlaceBomb(GridPos::new(0, 0)), ActionSource::External, now)
            .unwrap();
        assert!(world.map().all_chests_collected());
        assert!(world.is_running());

        let result = tick(&mut world, true, now);
        assert!(result.game_over);
        assert_eq!(result.events.len(), 1);
        match &result.events[0] {
            GameEvent::GameOver { outcome, counters, collected_money, .. } => {
                assert_eq!(*outcome, GameOutcome::Won);
                assert_eq!(counters.collected_chests, 1);
                assert_eq!(*collected_money, 50);
            }
            other => panic!("expected game over, got {:?}", other),
        }
        assert!(!world.is_running());

        let later = tick(&mut world, true, now + Duration::from_secs(1));
        assert!(later.events.is_empty());
    }

    #[test]
    fn test_out_of_ammo_leaves_character_idle() {
        let config = CharacterConfig { bomb_ammo: 0, ..CharacterConfig::default() };
        let mut world = world_with_chest(config);
        // Up is open, but a bomb at Down is chosen first every tick
        world.map_mut().block_mut(GridPos::new(5, 4)).unwrap().take_damage(u32::MAX);
        let now = Instant::now();

        for i in 0..5 {
            let result = tick(&mut world, true, now + Duration::from_secs(i));
            assert!(result.simulated);
            assert!(result.events.is_empty());
        }
        assert_eq!(world.character().position(), GridPos::new(5, 5));
        assert_eq!(world.character().stamina(), 100);
        assert_eq!(world.counters().destroyed_blocks, 0);
    }

    #[test]
    fn test_stamina_regenerates_instead_of_acting() {
        let mut world = world_with_chest(CharacterConfig::default());
        world.character_mut().set_stamina(0);
        let before = world.map().clone();

        let result = tick(&mut world, true, Instant::now());

        assert_eq!(result.events.len(), 1);
        assert!(matches!(result.events[0], GameEvent::StaminaRegenerated { stamina: 50, .. }));
        assert_eq!(world.character().stamina(), 50);
        assert_eq!(world.map(), &before);
        assert!(world.is_running());
    }

    #[test]
    fn test_loss_when_regeneration_yields_nothing() {
        let config = CharacterConfig { max_stamina: 1, ..CharacterConfig::default() };
        let mut world = world_with_chest(config);
        world.character_mut().set_stamina(0);

        let result = tick(&mut world, true, Instant::now());

        assert!(result.game_over);
        assert!(matches!(
            result.events.as_slice(),
            [GameEvent::GameOver { outcome: GameOutcome::Lost, .. }]
        ));
        assert!(!world.is_running());
    }

    #[test]
    fn test_external_input_preempts_autonomy() {
        let mut world = world_with_chest(CharacterConfig::default());
        let now = Instant::now();

        process_action(
            &mut world,
            GameAction::PlaceBomb(GridPos::new(9, 9)),
            ActionSource::External,
            now,
        )
        .unwrap();
        let map_after_external = world.map().clone();

        // Autonomy yields this tick, then resumes
        let skipped = tick(&mut world, true, now + Duration::from_secs(3));
        assert!(skipped.simulated);
        assert!(skipped.events.is_empty());
        assert_eq!(world.map(), &map_after_external);
        assert_eq!(world.character().position(), GridPos::new(5, 5));

        let resumed = tick(&mut world, true, now + Duration::from_secs(6));
        assert_eq!(resumed.events.len(), 1);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let config = WorldConfig {
            map: MapConfig { width: 16, height: 12, ..MapConfig::default() },
            start_position: GridPos::new(8, 6),
            seed: 2024,
            ..WorldConfig::default()
        };
        let mut a = World::new(&config).unwrap();
        let mut b = World::new(&config).unwrap();
        let start = Instant::now();

        for i in 0..60u64 {
            let now = start + Duration::from_secs(i);
            let ra = tick(&mut a, true, now);
            let rb = tick(&mut b, true, now);
            assert_eq!(ra.events, rb.events);
        }
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_counters_never_decrease() {
        let config = WorldConfig {
            map: MapConfig { width: 12, height: 12, ..MapConfig::default() },
            start_position: GridPos::new(6, 6),
            seed: 99,
            ..WorldConfig::default()
        };
        let mut world = World::new(&config).unwrap();
        let start = Instant::now();
        let mut last = world.counters();

        for i in 0..120u64 {
            tick(&mut world, true, start + Duration::from_secs(i));
            let now = world.counters();
            assert!(now.destroyed_blocks >= last.destroyed_blocks);
            assert!(now.collected_chests >= last.collected_chests);
            last = now;
        }
    }
}
