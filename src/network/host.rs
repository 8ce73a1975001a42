//! Game Host
//!
//! Owns the single shared world and the session registry, and is the only
//! place either is touched from async code.
//!
//! Every world mutation happens under one mutex. Before that lock is
//! released the mutating task queues on a second `publish` lock, which it
//! holds while broadcasting. Tokio mutexes are fair, so broadcasts go out in
//! mutation order without any send happening under the world lock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::action::{process_action, ActionError, ActionSource};
use crate::game::events::GameEvent;
use crate::game::state::World;
use crate::game::tick::{tick, TickResult};
use crate::network::protocol::{parse_action, GameStateData, ServerMessage};
use crate::network::session::{Connection, SessionError, SessionId, SessionRegistry};

/// Current time on the runtime clock (honors paused time in tests).
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// The running game and everyone watching it.
pub struct GameHost {
    world: Mutex<World>,
    /// Orders broadcasts; always acquired while `world` is held.
    publish: Mutex<()>,
    sessions: SessionRegistry,
}

impl GameHost {
    /// Host `world` with no sessions yet.
    pub fn new(world: World) -> Self {
        Self {
            world: Mutex::new(world),
            publish: Mutex::new(()),
            sessions: SessionRegistry::new(),
        }
    }

    /// Register a new session and send it the current snapshot.
    ///
    /// The world stays locked until the session is registered, so no update
    /// can fall between the snapshot and the session's first broadcast.
    /// Waiting on `publish` first lets broadcasts of earlier mutations finish.
    pub async fn connect(&self, id: SessionId, connection: Arc<dyn Connection>) -> Result<(), SessionError> {
        let world = self.world.lock().await;
        let _order = self.publish.lock().await;
        let snapshot = ServerMessage::snapshot(&world, now());
        self.sessions.add(id, connection, &snapshot).await
    }

    /// Drop a session. Safe to call for unknown or already-removed ids.
    pub async fn disconnect(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).await
    }

    /// Handle one inbound text frame from a session.
    ///
    /// Bad payloads and rejected actions are logged and dropped; the
    /// session stays connected either way.
    pub async fn handle_message(&self, id: &SessionId, text: &str) -> Result<GameEvent, ActionError> {
        if !self.sessions.contains(id).await {
            debug!("Ignoring message from unregistered session {}", id);
            return Err(ActionError::MalformedAction(format!("unknown session {}", id)));
        }

        let action = parse_action(text).map_err(|e| {
            warn!("Dropping message from session {}: {}", id, e);
            e
        })?;

        let (event, _order) = {
            let mut world = self.world.lock().await;
            let event = process_action(&mut world, action, ActionSource::External, now())?;
            (event, self.publish.lock().await)
        };

        self.sessions.broadcast(&ServerMessage::from(&event)).await;
        Ok(event)
    }

    /// Run one game loop step and broadcast its events.
    pub async fn run_tick(&self) -> TickResult {
        let has_sessions = !self.sessions.is_empty().await;

        let (result, _order) = {
            let mut world = self.world.lock().await;
            let result = tick(&mut world, has_sessions, now());
            (result, self.publish.lock().await)
        };

        for event in &result.events {
            self.sessions.broadcast(&ServerMessage::from(event)).await;
        }
        result
    }

    /// Drive the game loop every `period` until the game ends.
    ///
    /// Late ticks are skipped rather than replayed in a burst.
    pub async fn run_loop(self: Arc<Self>, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Game loop started ({:?} per tick)", period);
        loop {
            ticker.tick().await;

            if !self.is_running().await {
                break;
            }
            let result = self.run_tick().await;
            if result.game_over {
                break;
            }
        }
        info!("Game loop stopped");
    }

    /// Whether the game is still in progress.
    pub async fn is_running(&self) -> bool {
        self.world.lock().await.is_running()
    }

    /// Number of connected sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// Current snapshot of the world.
    pub async fn snapshot(&self) -> GameStateData {
        GameStateData::from_world(&*self.world.lock().await, now())
    }

    /// Run `f` against the locked world.
    pub async fn with_world<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut *self.world.lock().await)
    }
}
