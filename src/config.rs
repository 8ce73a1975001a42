//! Environment Configuration
//!
//! Builds the world and server configuration from `MINER_*` environment
//! variables on top of the built-in defaults. A value that fails to parse is
//! reported and the default kept.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::core::grid::GridPos;
use crate::game::state::WorldConfig;
use crate::network::server::ServerConfig;

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Map, character, start position and seed
    pub world: WorldConfig,
    /// Network and game loop settings
    pub server: ServerConfig,
}

/// Load settings from the process environment.
pub fn load_from_env() -> Settings {
    load_with(|key| std::env::var(key).ok())
}

/// Load settings, resolving variables through `lookup`.
pub fn load_with<F>(lookup: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let mut world = WorldConfig::default();
    let mut server = ServerConfig::default();

    let map = &mut world.map;
    map.width = read(&lookup, "MINER_MAP_WIDTH", map.width);
    map.height = read(&lookup, "MINER_MAP_HEIGHT", map.height);
    map.chest_chance_percent = read(&lookup, "MINER_CHEST_CHANCE", map.chest_chance_percent);
    map.health_min = read(&lookup, "MINER_HEALTH_MIN", map.health_min);
    map.health_max = read(&lookup, "MINER_HEALTH_MAX", map.health_max);
    map.chest_money_min = read(&lookup, "MINER_CHEST_MONEY_MIN", map.chest_money_min);
    map.chest_money_max = read(&lookup, "MINER_CHEST_MONEY_MAX", map.chest_money_max);

    let character = &mut world.character;
    if let Some(name) = lookup("MINER_CHARACTER_NAME").filter(|n| !n.trim().is_empty()) {
        character.name = name.trim().to_string();
    }
    character.max_stamina = read(&lookup, "MINER_MAX_STAMINA", character.max_stamina);
    character.power = read(&lookup, "MINER_POWER", character.power);
    character.movement_speed = read(&lookup, "MINER_MOVEMENT_SPEED", character.movement_speed);
    character.bomb_range = read(&lookup, "MINER_BOMB_RANGE", character.bomb_range);
    character.bomb_ammo = read(&lookup, "MINER_BOMB_AMMO", character.bomb_ammo);
    let cooldown_secs = read(
        &lookup,
        "MINER_BOMB_COOLDOWN_SECS",
        character.bomb_cooldown.as_secs_f64(),
    );
    match Duration::try_from_secs_f64(cooldown_secs) {
        Ok(cooldown) => character.bomb_cooldown = cooldown,
        Err(_) => warn!(
            "Invalid MINER_BOMB_COOLDOWN_SECS={}, using {:?}",
            cooldown_secs, character.bomb_cooldown
        ),
    }

    world.start_position = GridPos::new(
        read(&lookup, "MINER_START_X", world.start_position.x),
        read(&lookup, "MINER_START_Y", world.start_position.y),
    );

    world.seed = match lookup("MINER_SEED") {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(seed) => seed,
            Err(_) => {
                let seed = clock_seed();
                warn!("Invalid MINER_SEED={:?}, using clock seed {}", raw, seed);
                seed
            }
        },
        None => {
            let seed = clock_seed();
            info!("No MINER_SEED set, using clock seed {}", seed);
            seed
        }
    };

    server.bind_addr = read::<SocketAddr, _>(&lookup, "MINER_BIND_ADDR", server.bind_addr);
    let tick_ms = read(&lookup, "MINER_TICK_MS", server.tick_interval.as_millis() as u64);
    if tick_ms == 0 {
        warn!("MINER_TICK_MS must be positive, using {:?}", server.tick_interval);
    } else {
        server.tick_interval = Duration::from_millis(tick_ms);
    }
    server.max_connections = read(&lookup, "MINER_MAX_CONNECTIONS", server.max_connections);
    server.outbound_capacity = read(&lookup, "MINER_OUTBOUND_CAPACITY", server.outbound_capacity);

    Settings { world, server }
}

/// Parse `key` if set, falling back to `default` with a warning.
fn read<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn load(vars: &[(&str, &str)]) -> Settings {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = load(&[("MINER_SEED", "1")]);

        assert_eq!(settings.world.map.width, 80);
        assert_eq!(settings.world.map.height, 45);
        assert_eq!(settings.world.character.max_stamina, 100);
        assert_eq!(settings.world.start_position, GridPos::new(7, 7));
        assert_eq!(settings.world.seed, 1);
        assert_eq!(settings.server.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let settings = load(&[
            ("MINER_MAP_WIDTH", "20"),
            ("MINER_MAP_HEIGHT", " 15 "),
            ("MINER_CHEST_CHANCE", "25"),
            ("MINER_POWER", "7"),
            ("MINER_BOMB_COOLDOWN_SECS", "0.5"),
            ("MINER_CHARACTER_NAME", "Digger"),
            ("MINER_START_X", "3"),
            ("MINER_SEED", "99"),
            ("MINER_BIND_ADDR", "127.0.0.1:9000"),
            ("MINER_TICK_MS", "250"),
        ]);

        assert_eq!(settings.world.map.width, 20);
        assert_eq!(settings.world.map.height, 15);
        assert_eq!(settings.world.map.chest_chance_percent, 25);
        assert_eq!(settings.world.character.power, 7);
        assert_eq!(settings.world.character.bomb_cooldown, Duration::from_millis(500));
        assert_eq!(settings.world.character.name, "Digger");
        assert_eq!(settings.world.start_position, GridPos::new(3, 7));
        assert_eq!(settings.world.seed, 99);
        assert_eq!(settings.server.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(settings.server.tick_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let settings = load(&[
            ("MINER_MAP_WIDTH", "wide"),
            ("MINER_BOMB_COOLDOWN_SECS", "-3"),
            ("MINER_TICK_MS", "0"),
            ("MINER_BIND_ADDR", "nowhere"),
            ("MINER_SEED", "1"),
        ]);

        assert_eq!(settings.world.map.width, 80);
        assert_eq!(settings.world.character.bomb_cooldown, Duration::from_secs(2));
        assert_eq!(settings.server.tick_interval, Duration::from_secs(1));
        assert_eq!(settings.server.bind_addr.port(), 8080);
    }

    #[test]
    fn test_settings_build_a_world() {
        let settings = load(&[("MINER_MAP_WIDTH", "10"), ("MINER_MAP_HEIGHT", "10"), ("MINER_SEED", "5")]);
        let world = crate::game::state::World::new(&settings.world).unwrap();
        assert_eq!(world.map().width(), 10);
        assert_eq!(world.seed(), 5);
    }
}
