//! Miner Game Server
//!
//! Generates the world, then serves it over WebSocket until Ctrl-C.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use miner_game::{config, GameHost, GameServer, World, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let default_level = if cfg!(feature = "debug-tracing") { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Miner Game Server v{}", VERSION);

    let settings = config::load_from_env();
    let world = World::new(&settings.world)?;

    info!(
        "Map {}x{} (seed {}), {} chests hidden",
        world.map().width(),
        world.map().height(),
        world.seed(),
        world.map().chests_remaining(),
    );
    info!(
        "Character '{}' at {}: stamina {}, power {}, bomb range {}, cooldown {:?}",
        world.character().name(),
        world.character().position(),
        world.character().max_stamina(),
        world.character().power(),
        world.character().bomb_range(),
        world.character().bomb_cooldown(),
    );
    info!("Tick interval: {:?}", settings.server.tick_interval);

    let host = Arc::new(GameHost::new(world));
    let server = Arc::new(GameServer::new(settings.server, host));

    let runner = Arc::clone(&server);
    let mut handle = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        joined = &mut handle => {
            joined??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Ctrl-C received, shutting down");
            server.shutdown();
            handle.await??;
        }
    }

    let host = server.host();
    info!(
        "Server stopped (game {})",
        if host.is_running().await { "still running" } else { "over" }
    );
    Ok(())
}
