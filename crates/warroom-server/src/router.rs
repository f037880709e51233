//! Result addressing.
//!
//! Handlers never touch the socket. They push `(client, message)` pairs into
//! an outbox which the transport loop drains once per tick. Audiences are
//! resolved against the [`ConnectionRegistry`] at send time, so a client that
//! disconnected in the meantime simply misses the message.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::{trace, warn};

use warroom_protocol::{ServerMessage, SessionId, TeamId};

use crate::context::{ClientId, ConnectionContext};

/// Connected clients and their trusted context.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<ClientId, ConnectionContext>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, ctx: ConnectionContext) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ctx.client_id, ctx);
    }

    pub fn unregister(&self, client_id: ClientId) -> Option<ConnectionContext> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&client_id)
    }

    pub fn get(&self, client_id: ClientId) -> Option<ConnectionContext> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&client_id)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clients_where(&self, keep: impl Fn(&ConnectionContext) -> bool) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|ctx| keep(ctx))
            .map(|ctx| ctx.client_id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// One queued delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub client_id: ClientId,
    pub message: ServerMessage,
}

#[derive(Debug, Clone)]
pub struct Router {
    registry: ConnectionRegistry,
    outbox: mpsc::UnboundedSender<Outgoing>,
}

impl Router {
    /// Router plus the receiving end the transport loop drains.
    pub fn new(registry: ConnectionRegistry) -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (outbox, rx) = mpsc::unbounded_channel();
        (Self { registry, outbox }, rx)
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn send_to_connection(&self, client_id: ClientId, message: ServerMessage) {
        trace!(client_id, tag = message.tag(), "queue");
        if self
            .outbox
            .send(Outgoing {
                client_id,
                message,
            })
            .is_err()
        {
            warn!(client_id, "outbox closed, dropping message");
        }
    }

    /// Every connection of `team` in `session`.
    pub fn send_to_team(&self, session: SessionId, team: TeamId, message: &ServerMessage) {
        for client_id in self
            .registry
            .clients_where(|ctx| ctx.session == session && ctx.team == team)
        {
            self.send_to_connection(client_id, message.clone());
        }
    }

    /// Every connection of `team` in `session` other than `except`.
    pub fn send_to_team_except(
        &self,
        session: SessionId,
        team: TeamId,
        except: ClientId,
        message: &ServerMessage,
    ) {
        for client_id in self.registry.clients_where(|ctx| {
            ctx.session == session && ctx.team == team && ctx.client_id != except
        }) {
            self.send_to_connection(client_id, message.clone());
        }
    }

    /// Every connection in `session`, both teams.
    pub fn send_to_session(&self, session: SessionId, message: &ServerMessage) {
        for client_id in self.registry.clients_where(|ctx| ctx.session == session) {
            self.send_to_connection(client_id, message.clone());
        }
    }
}
