//! Action handlers and the dispatcher in front of them.
//!
//! Every handler is a straight pipeline: payload shape, session, phase and
//! role gates, resource lookups, ownership, domain checks, then one mutation
//! and a typed result. The first failing gate returns a [`Rejection`] and
//! nothing after it runs.

pub mod biological_weapons_confirm;
pub mod piece_place;
pub mod shop_confirm_purchase;

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use warroom_protocol::{
    decode_client_action, ClientAction, Phase, RedirectTag, ServerMessage, Slice,
};

use crate::context::{ClientId, ConnectionContext};
use crate::gateway::{Gateway, GatewayError, SessionKey};
use crate::router::Router;
use crate::session::{Game, SessionError};

pub const MALFORMED_PAYLOAD: &str = "Server Error: Malformed Payload";
pub const SERVER_ERROR: &str = "Server Error: could not complete the request, try again.";
pub const WRONG_PHASE: &str = "Not the right phase...";
pub const WRONG_SLICE: &str = "Not the right slice (must be planning)...";
pub const NOT_PRIMARY: &str = "Not the main controller (0)...";

/// Why an action was refused. Always delivered to the originating
/// connection only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Inline message; the client may retry.
    Feedback(String),
    /// The client's view of its session is invalid.
    Redirect(RedirectTag),
}

impl Rejection {
    pub fn feedback(message: impl Into<String>) -> Self {
        Rejection::Feedback(message.into())
    }

    pub fn into_message(self) -> ServerMessage {
        match self {
            Rejection::Feedback(message) => ServerMessage::UserFeedback(message),
            Rejection::Redirect(tag) => ServerMessage::ServerRedirect(tag),
        }
    }
}

impl From<GatewayError> for Rejection {
    fn from(err: GatewayError) -> Self {
        error!(error = %err, "gateway failure aborted action");
        Rejection::feedback(SERVER_ERROR)
    }
}

impl From<SessionError> for Rejection {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => Rejection::Redirect(RedirectTag::GameDoesNotExist),
            SessionError::Duplicate => Rejection::feedback(SERVER_ERROR),
            SessionError::Gateway(err) => err.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Origin,
    /// The whole team of the origin, the origin included exactly once.
    TeamAndOrigin,
}

/// A successful result and who receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Delivery {
    pub fn origin(message: ServerMessage) -> Self {
        Self {
            audience: Audience::Origin,
            message,
        }
    }

    pub fn team(message: ServerMessage) -> Self {
        Self {
            audience: Audience::TeamAndOrigin,
            message,
        }
    }
}

pub type Outcome = Result<Delivery, Rejection>;

/// Load the caller's session and require it to be active.
pub(crate) async fn active_game(
    gateway: &dyn Gateway,
    ctx: &ConnectionContext,
) -> Result<Game, Rejection> {
    let game = Game::load(gateway, &SessionKey::Id(ctx.session)).await?;
    if !game.is_active() {
        return Err(Rejection::Redirect(RedirectTag::GameInactive));
    }
    Ok(game)
}

pub(crate) fn require_phase(game: &Game, phase: Phase) -> Result<(), Rejection> {
    if game.phase() == phase {
        Ok(())
    } else {
        Err(Rejection::feedback(WRONG_PHASE))
    }
}

pub(crate) fn require_slice(game: &Game, slice: Slice) -> Result<(), Rejection> {
    if game.slice() == slice {
        Ok(())
    } else {
        Err(Rejection::feedback(WRONG_SLICE))
    }
}

pub(crate) fn require_primary(ctx: &ConnectionContext) -> Result<(), Rejection> {
    if ctx.controller.is_primary() {
        Ok(())
    } else {
        Err(Rejection::feedback(NOT_PRIMARY))
    }
}

/// Routes decoded actions to their handler and results to their audience.
#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn Gateway>,
    router: Router,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn Gateway>, router: Router) -> Self {
        Self { gateway, router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Entry point for raw bytes from the actions channel.
    pub async fn dispatch_bytes(&self, client_id: ClientId, data: &[u8]) {
        let Some(ctx) = self.router.registry().get(client_id) else {
            warn!(client_id, "message from unregistered client dropped");
            return;
        };
        match decode_client_action(data) {
            Ok(action) => self.dispatch(&ctx, action).await,
            Err(err) => {
                debug!(client_id, error = %err, "undecodable action");
                self.router
                    .send_to_connection(client_id, ServerMessage::UserFeedback(MALFORMED_PAYLOAD.into()));
            }
        }
    }

    pub async fn dispatch(&self, ctx: &ConnectionContext, action: ClientAction) {
        let tag = action.tag();
        let gateway = self.gateway.as_ref();
        let outcome = match action {
            ClientAction::PiecePlace(request) => piece_place::handle(gateway, ctx, request).await,
            ClientAction::ShopConfirmPurchase(request) => {
                shop_confirm_purchase::handle(gateway, ctx, request).await
            }
            ClientAction::BiologicalWeaponsConfirm(request) => {
                biological_weapons_confirm::handle(gateway, ctx, request).await
            }
        };
        self.route(ctx, tag, outcome);
    }

    fn route(&self, ctx: &ConnectionContext, action: &'static str, outcome: Outcome) {
        match outcome {
            Ok(Delivery { audience, message }) => {
                info!(
                    client_id = ctx.client_id,
                    session = %ctx.session,
                    team = %ctx.team,
                    action,
                    result = message.tag(),
                    "action applied"
                );
                match audience {
                    Audience::Origin => self.router.send_to_connection(ctx.client_id, message),
                    Audience::TeamAndOrigin => {
                        self.router.send_to_team_except(
                            ctx.session,
                            ctx.team,
                            ctx.client_id,
                            &message,
                        );
                        self.router.send_to_connection(ctx.client_id, message);
                    }
                }
            }
            Err(rejection) => {
                debug!(client_id = ctx.client_id, action, ?rejection, "action rejected");
                self.router
                    .send_to_connection(ctx.client_id, rejection.into_message());
            }
        }
    }

    /// A client finished its handshake: mark it logged in and send the full
    /// resync.
    pub async fn join(&self, ctx: ConnectionContext) {
        let message = match self.resync(&ctx).await {
            Ok(state) => state,
            Err(rejection) => {
                debug!(client_id = ctx.client_id, ?rejection, "join refused");
                rejection.into_message()
            }
        };
        self.router.send_to_connection(ctx.client_id, message);
    }

    async fn resync(&self, ctx: &ConnectionContext) -> Result<ServerMessage, Rejection> {
        let gateway = self.gateway.as_ref();
        let game = active_game(gateway, ctx).await?;
        let game = game
            .set_logged_in(gateway, ctx.team, ctx.controller, true)
            .await?;
        let state = game.initial_state(gateway, ctx.team, ctx.controller).await?;
        Ok(ServerMessage::InitialGameState(Box::new(state)))
    }

    /// A client went away: clear its login flag if the session still exists.
    pub async fn leave(&self, ctx: ConnectionContext) {
        let gateway = self.gateway.as_ref();
        let result = match Game::load(gateway, &SessionKey::Id(ctx.session)).await {
            Ok(game) => game
                .set_logged_in(gateway, ctx.team, ctx.controller, false)
                .await
                .map(|_| ()),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            debug!(client_id = ctx.client_id, error = %err, "could not clear login flag");
        }
    }
}
