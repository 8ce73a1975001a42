//! # Miner Game Server
//!
//! Authoritative server for a shared real-time mining game: one miner on a
//! destructible block grid, bombing its way to hidden chests while every
//! connected viewer watches the same world.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MINER GAME SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── grid.rs     - Grid coordinates and directions           │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - World state hashing                       │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── map.rs      - Blocks, chests, map generation            │
//! │  ├── character.rs- Stamina, bomb stats, cooldown             │
//! │  ├── combat.rs   - Bomb blast resolution                     │
//! │  ├── action.rs   - Move / PlaceBomb processing               │
//! │  ├── autonomy.rs - Behavior when nobody is steering          │
//! │  ├── state.rs    - The world and its config                  │
//! │  └── tick.rs     - One game loop step                        │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── protocol.rs - Wire messages                             │
//! │  ├── session.rs  - Session registry and broadcast            │
//! │  ├── host.rs     - Shared world + game loop                  │
//! │  └── server.rs   - WebSocket server                          │
//! │                                                              │
//! │  config.rs       - MINER_* environment settings              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! `core/` and `game/` never read the clock or the network. Time is passed
//! in as an `Instant`, and all randomness comes from seeded Xorshift128+, so
//! the same seed and the same inputs at the same ticks give the same world
//! hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod config;

// Re-export commonly used types
pub use core::grid::{Direction, GridPos};
pub use core::rng::DeterministicRng;
pub use game::action::{ActionError, GameAction};
pub use game::state::{World, WorldConfig};
pub use network::host::GameHost;
pub use network::server::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default time between game loop ticks (milliseconds)
pub const TICK_INTERVAL_MS: u64 = 1000;
