//! Warroom Server
//!
//! Authoritative session server: trusted context from the connect token,
//! validated actions, team-scoped results.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use renet::{ConnectionConfig, RenetServer, ServerEvent};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use warroom_protocol::encode_server_message;
use warroom_server::{
    channel_for, channel_id, create_channel_configs, ConnectionContext, ConnectionRegistry,
    Dispatcher, Game, Gateway, MemoryGateway, Outgoing, Router, ServerConfig, ServerRunner,
    SessionError, SessionKey, TransportConfig, PROTOCOL_ID,
};

#[derive(Parser)]
#[command(name = "warroom-server")]
#[command(about = "Authoritative Warroom session server", version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("warroom_server=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warroom_server=info"))
    };
    fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }

    let gateway = Arc::new(MemoryGateway::new(config.unique_section_instructor));
    bootstrap(gateway.as_ref(), &config).await?;

    let registry = ConnectionRegistry::new();
    let (router, mut outbox) = Router::new(registry.clone());
    let dispatcher = Dispatcher::new(gateway, router);

    let mut runner = ServerRunner::new(TransportConfig {
        public_address: config.bind_address,
        max_clients: config.max_clients,
        private_key: config.private_key_bytes()?,
    })
    .with_context(|| format!("Failed to create transport on {}", config.bind_address))?;

    let mut renet = RenetServer::new(ConnectionConfig {
        available_bytes_per_tick: 60_000,
        server_channels_config: create_channel_configs(),
        client_channels_config: create_channel_configs(),
    });

    info!("Warroom Server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Listening on {}",
        runner.local_addr().unwrap_or(config.bind_address)
    );
    info!("Protocol ID: {:016x}", PROTOCOL_ID);

    let tick = config.tick();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let start = Instant::now();

        runner.receive(&mut renet);

        while let Some(event) = renet.get_event() {
            handle_server_event(event, &runner, &mut renet, &registry, &dispatcher);
        }

        // One task per client keeps each client's actions in arrival order.
        let mut inbound: HashMap<u64, Vec<_>> = HashMap::new();
        for client_id in renet.clients_id() {
            while let Some(message) = renet.receive_message(client_id, channel_id::ACTIONS) {
                inbound.entry(client_id).or_default().push(message);
            }
        }
        for (client_id, messages) in inbound {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                for message in messages {
                    dispatcher.dispatch_bytes(client_id, &message).await;
                }
            });
        }

        while let Ok(Outgoing { client_id, message }) = outbox.try_recv() {
            match encode_server_message(&message) {
                Ok(data) => renet.send_message(client_id, channel_for(&message), data),
                Err(e) => warn!(client_id, "Failed to encode {}: {}", message.tag(), e),
            }
        }

        runner.send(&mut renet);

        let remaining = tick.saturating_sub(start.elapsed());
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            _ = tokio::time::sleep(remaining) => {}
        }
    }

    renet.disconnect_all();
    runner.send(&mut renet);
    Ok(())
}

fn handle_server_event(
    event: ServerEvent,
    runner: &ServerRunner,
    renet: &mut RenetServer,
    registry: &ConnectionRegistry,
    dispatcher: &Dispatcher,
) {
    match event {
        ServerEvent::ClientConnected { client_id } => {
            let ctx = runner
                .user_data(client_id)
                .ok_or_else(|| "no user data".to_owned())
                .and_then(|data| {
                    ConnectionContext::from_user_data(client_id, &data).map_err(|e| e.to_string())
                });
            match ctx {
                Ok(ctx) => {
                    info!(
                        client_id,
                        session = %ctx.session,
                        team = %ctx.team,
                        controller = %ctx.controller,
                        "Client connected"
                    );
                    registry.register(ctx);
                    let dispatcher = dispatcher.clone();
                    tokio::spawn(async move { dispatcher.join(ctx).await });
                }
                Err(reason) => {
                    warn!(client_id, %reason, "Rejecting client with bad connect token");
                    renet.disconnect(client_id);
                }
            }
        }
        ServerEvent::ClientDisconnected { client_id, reason } => {
            info!(client_id, "Client disconnected: {:?}", reason);
            if let Some(ctx) = registry.unregister(client_id) {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.leave(ctx).await });
            }
        }
    }
}

/// Create the configured sessions that do not exist yet and apply their
/// active flag.
async fn bootstrap(gateway: &dyn Gateway, config: &ServerConfig) -> Result<()> {
    for entry in &config.sessions {
        let key = SessionKey::Alternate {
            section: entry.section.clone(),
            instructor: entry.instructor.clone(),
        };
        let game = match Game::load(gateway, &key).await {
            Ok(game) => game,
            Err(SessionError::NotFound) => {
                let game = Game::create(gateway, entry.to_new_session())
                    .await
                    .with_context(|| format!("Failed to create session {}", entry.section))?;
                gateway.seed_session(game.id(), &config.seed).await?;
                debug!(session = %game.id(), "seeded");
                Game::load(gateway, &SessionKey::Id(game.id())).await?
            }
            Err(e) => return Err(e.into()),
        };
        if game.is_active() != entry.active {
            game.set_active(gateway, entry.active).await?;
        }
        info!(
            session = %game.id(),
            section = %entry.section,
            instructor = %entry.instructor,
            active = entry.active,
            "Session ready"
        );
    }
    Ok(())
}
