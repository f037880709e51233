//! Warroom wire protocol.
//!
//! Shared between the authoritative server and its clients: identifiers, the
//! type table, resource records, the resync snapshot and the action/result
//! envelopes.

pub mod action;
pub mod ids;
pub mod kinds;
pub mod records;
pub mod snapshot;
pub mod wire;

pub use action::{
    BioWeaponSelected, BioWeaponsRequest, ClientAction, InvItemRef, MessageClass,
    PiecePlaceRequest, PiecePlaced, RedirectTag, ServerMessage, ShopConfirmRequest, ShopTransfer,
};
pub use ids::{
    ControllerId, InvItemId, NewsId, Phase, PieceId, PositionId, SessionId, ShopItemId, Slice,
    TeamId, CONTROLLER_COUNT, TEAM_COUNT,
};
pub use kinds::{KindCategory, PieceKind};
pub use records::{Capability, CapabilityPlan, InvItem, Piece, PieceContents, PlanStep, ShopItem};
pub use snapshot::{
    BattleView, GameInfo, GameboardMeta, GameboardPieces, InitialGameState, NewsView, PanelView,
    PlanningView,
};
pub use wire::{
    decode_client_action, decode_server_message, encode_client_action, encode_server_message,
    ProtocolError,
};
