//! Inbound action and outbound result envelopes.
//!
//! Both are adjacently tagged: `{ "type": <TAG>, "payload": {...} }`. The
//! sender's session, team and controller are never part of an inbound payload;
//! the server takes them from the connection's handshake context.

use serde::{Deserialize, Serialize};

use crate::ids::{InvItemId, PositionId};
use crate::records::{InvItem, Piece};
use crate::snapshot::InitialGameState;

/// Client-to-server actions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientAction {
    #[serde(rename = "PIECE_PLACE")]
    PiecePlace(PiecePlaceRequest),
    #[serde(rename = "SHOP_CONFIRM_PURCHASE")]
    ShopConfirmPurchase(ShopConfirmRequest),
    #[serde(rename = "BIO_WEAPONS_CONFIRM")]
    BiologicalWeaponsConfirm(BioWeaponsRequest),
}

impl ClientAction {
    /// Tag used in logs.
    pub fn tag(&self) -> &'static str {
        match self {
            ClientAction::PiecePlace(_) => "PIECE_PLACE",
            ClientAction::ShopConfirmPurchase(_) => "SHOP_CONFIRM_PURCHASE",
            ClientAction::BiologicalWeaponsConfirm(_) => "BIO_WEAPONS_CONFIRM",
        }
    }
}

/// Fields are optional so a missing field is reported as feedback instead of
/// failing the whole decode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiecePlaceRequest {
    #[serde(default)]
    pub inv_item_id: Option<InvItemId>,
    #[serde(default)]
    pub selected_position: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopConfirmRequest {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvItemRef {
    pub inv_item_id: InvItemId,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BioWeaponsRequest {
    #[serde(default)]
    pub selected_position_id: Option<i64>,
    #[serde(default)]
    pub inv_item: Option<InvItemRef>,
}

/// Closed set of redirect tags. Receiving one means the client's session
/// context is no longer valid and it must leave or reset its view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectTag {
    GameDoesNotExist,
    GameInactive,
    BadRequest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiecePlaced {
    pub inv_item_id: InvItemId,
    pub position_id: PositionId,
    pub new_piece: Piece,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopTransfer {
    pub inv_items: Vec<InvItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BioWeaponSelected {
    pub inv_item: InvItem,
    pub selected_position_id: PositionId,
}

/// Server-to-client messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "INITIAL_GAMESTATE")]
    InitialGameState(Box<InitialGameState>),
    #[serde(rename = "PIECE_PLACE")]
    PiecePlace(PiecePlaced),
    #[serde(rename = "SHOP_TRANSFER")]
    ShopTransfer(ShopTransfer),
    #[serde(rename = "BIO_WEAPON_SELECTED")]
    BioWeaponSelected(BioWeaponSelected),
    /// Non-fatal rejection shown inline to the acting client.
    #[serde(rename = "USER_FEEDBACK")]
    UserFeedback(String),
    #[serde(rename = "SERVER_REDIRECT")]
    ServerRedirect(RedirectTag),
}

/// The three disjoint outcome classes a client can receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageClass {
    Result,
    Feedback,
    Redirect,
}

impl ServerMessage {
    pub fn class(&self) -> MessageClass {
        match self {
            ServerMessage::UserFeedback(_) => MessageClass::Feedback,
            ServerMessage::ServerRedirect(_) => MessageClass::Redirect,
            _ => MessageClass::Result,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ServerMessage::InitialGameState(_) => "INITIAL_GAMESTATE",
            ServerMessage::PiecePlace(_) => "PIECE_PLACE",
            ServerMessage::ShopTransfer(_) => "SHOP_TRANSFER",
            ServerMessage::BioWeaponSelected(_) => "BIO_WEAPON_SELECTED",
            ServerMessage::UserFeedback(_) => "USER_FEEDBACK",
            ServerMessage::ServerRedirect(_) => "SERVER_REDIRECT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{SessionId, TeamId};
    use crate::kinds::PieceKind;

    #[test]
    fn outbound_envelope_shape() {
        let msg = ServerMessage::ShopTransfer(ShopTransfer {
            inv_items: vec![InvItem {
                id: InvItemId(1),
                session: SessionId(9),
                team: TeamId::ZERO,
                kind: PieceKind::Destroyer,
            }],
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "SHOP_TRANSFER");
        assert_eq!(value["payload"]["invItems"].as_array().unwrap().len(), 1);
        assert_eq!(msg.class(), MessageClass::Result);
    }

    #[test]
    fn redirect_and_feedback_are_distinct_classes() {
        let redirect = ServerMessage::ServerRedirect(RedirectTag::GameInactive);
        let value = serde_json::to_value(&redirect).unwrap();
        assert_eq!(value["payload"], "GAME_INACTIVE");
        assert_eq!(redirect.class(), MessageClass::Redirect);

        let feedback = ServerMessage::UserFeedback("Not the right phase...".into());
        assert_eq!(feedback.class(), MessageClass::Feedback);
    }

    #[test]
    fn missing_payload_fields_still_decode() {
        let action: ClientAction = serde_json::from_value(serde_json::json!({
            "type": "BIO_WEAPONS_CONFIRM",
            "payload": {}
        }))
        .unwrap();
        match action {
            ClientAction::BiologicalWeaponsConfirm(req) => {
                assert!(req.selected_position_id.is_none());
                assert!(req.inv_item.is_none());
            }
            other => panic!("wrong action: {other:?}"),
        }
    }
}
