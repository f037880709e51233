//! Resource records as they travel between server and clients.
//!
//! Field names follow the client store (`invItemId`, `pieceTeamId`, ...), so
//! the rename attributes are load-bearing.

use serde::{Deserialize, Serialize};

use crate::ids::{InvItemId, PieceId, PositionId, SessionId, ShopItemId, TeamId};
use crate::kinds::PieceKind;

/// An owned, unplaced item in a team's inventory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvItem {
    #[serde(rename = "invItemId")]
    pub id: InvItemId,
    #[serde(rename = "invItemGameId")]
    pub session: SessionId,
    #[serde(rename = "invItemTeamId")]
    pub team: TeamId,
    #[serde(rename = "invItemTypeId")]
    pub kind: PieceKind,
}

/// A purchased but unconfirmed item. Refundable until the purchase is confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    #[serde(rename = "shopItemId")]
    pub id: ShopItemId,
    #[serde(rename = "shopItemGameId")]
    pub session: SessionId,
    #[serde(rename = "shopItemTeamId")]
    pub team: TeamId,
    #[serde(rename = "shopItemTypeId")]
    pub kind: PieceKind,
}

/// Nested contents of a container piece.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceContents {
    pub pieces: Vec<Piece>,
}

/// A piece on the board, possibly carrying other pieces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    #[serde(rename = "pieceId")]
    pub id: PieceId,
    #[serde(rename = "pieceGameId")]
    pub session: SessionId,
    #[serde(rename = "pieceTeamId")]
    pub team: TeamId,
    #[serde(rename = "pieceTypeId")]
    pub kind: PieceKind,
    #[serde(rename = "piecePositionId")]
    pub position: PositionId,
    #[serde(rename = "pieceContainerId")]
    pub container: Option<PieceId>,
    #[serde(rename = "pieceVisible")]
    pub visible: bool,
    #[serde(rename = "pieceMoves")]
    pub moves: u8,
    #[serde(rename = "pieceFuel")]
    pub fuel: Option<u8>,
    /// Recomputed from container references on every read, never stored.
    #[serde(rename = "pieceContents", default)]
    pub contents: PieceContents,
}

/// One confirmed movement step for a piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(rename = "planGameId")]
    pub session: SessionId,
    #[serde(rename = "planTeamId")]
    pub team: TeamId,
    #[serde(rename = "planPieceId")]
    pub piece: PieceId,
    #[serde(rename = "planMovementOrder")]
    pub order: u32,
    #[serde(rename = "planPositionId")]
    pub position: PositionId,
    #[serde(rename = "planSpecialFlag")]
    pub special: u8,
}

/// Capabilities that are armed by consuming an inventory item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    BiologicalWeapons,
    RodsFromGod,
    AntiSatelliteMissiles,
    CommunicationsInterruption,
    Insurgency,
}

impl Capability {
    /// The inventory item kind that arms this capability.
    pub const fn item_kind(self) -> PieceKind {
        match self {
            Capability::BiologicalWeapons => PieceKind::BiologicalWeapons,
            Capability::RodsFromGod => PieceKind::RodsFromGod,
            Capability::AntiSatelliteMissiles => PieceKind::AntiSatelliteMissiles,
            Capability::CommunicationsInterruption => PieceKind::CommunicationsInterruption,
            Capability::Insurgency => PieceKind::Insurgency,
        }
    }

    /// Rounds a freshly armed plan stays in effect.
    pub const fn duration_rounds(self) -> u8 {
        match self {
            Capability::BiologicalWeapons => 2,
            Capability::AntiSatelliteMissiles | Capability::Insurgency => 2,
            Capability::RodsFromGod | Capability::CommunicationsInterruption => 1,
        }
    }
}

/// A team's armed capability, unique per (session, team, capability, position).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityPlan {
    pub session: SessionId,
    pub team: TeamId,
    pub capability: Capability,
    pub position: PositionId,
    pub rounds_left: u8,
}
