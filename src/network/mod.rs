//! Network Layer
//!
//! WebSocket server and session fan-out for the shared game.
//! This layer is **non-deterministic** - all game rules live in `game/`.

pub mod protocol;
pub mod session;
pub mod host;
pub mod server;

pub use protocol::{
    parse_action, ClientAction, ServerMessage, GameStateData, CharacterView, BlockView,
};
pub use session::{
    BroadcastReport, ChannelConnection, Connection, Outbound, SessionError, SessionId,
    SessionRegistry,
};
pub use host::GameHost;
pub use server::{GameServer, ServerConfig, GameServerError};
