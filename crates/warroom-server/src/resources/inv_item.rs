//! Inventory items: purchased but not yet placed or consumed.

use warroom_protocol::{InvItem, InvItemId, Piece, PieceKind, PositionId, SessionId, TeamId};

use crate::gateway::{Gateway, GatewayError};

pub async fn load(gateway: &dyn Gateway, id: InvItemId) -> Result<Option<InvItem>, GatewayError> {
    gateway.select_inv_item(id).await
}

pub async fn all(
    gateway: &dyn Gateway,
    session: SessionId,
    team: TeamId,
) -> Result<Vec<InvItem>, GatewayError> {
    gateway.list_inv_items(session, team).await
}

pub async fn insert(
    gateway: &dyn Gateway,
    session: SessionId,
    team: TeamId,
    kind: PieceKind,
) -> Result<InvItem, GatewayError> {
    let id = gateway.insert_inv_item(session, team, kind).await?;
    Ok(InvItem {
        id,
        session,
        team,
        kind,
    })
}

/// Returns `false` if the item was already gone.
pub async fn delete(gateway: &dyn Gateway, id: InvItemId) -> Result<bool, GatewayError> {
    Ok(gateway.delete_inv_item(id).await? == 1)
}

/// Whether the stored owner of `item` is exactly this session and team.
pub fn owned_by(item: &InvItem, session: SessionId, team: TeamId) -> bool {
    item.session == session && item.team == team
}

/// Convert the item into a board piece with no contents.
pub async fn place_on_board(
    gateway: &dyn Gateway,
    id: InvItemId,
    position: PositionId,
) -> Result<Option<Piece>, GatewayError> {
    gateway.place_inv_item(id, position).await
}

/// Move the team's whole shop stock into inventory and return the resulting
/// inventory.
pub async fn insert_from_shop(
    gateway: &dyn Gateway,
    session: SessionId,
    team: TeamId,
) -> Result<Vec<InvItem>, GatewayError> {
    let inventory = gateway.transfer_shop_stock(session, team).await?;
    tracing::debug!(
        session = %session,
        team = %team,
        held = inventory.len(),
        "shop stock moved to inventory"
    );
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryGateway, NewSession};

    async fn session(gateway: &MemoryGateway) -> SessionId {
        gateway
            .insert_session(&NewSession {
                id: None,
                section: "M1A".into(),
                instructor: "Jones".into(),
                admin_password_hash: String::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn placing_consumes_the_item() {
        let gateway = MemoryGateway::default();
        let id = session(&gateway).await;
        let item = insert(&gateway, id, TeamId::ZERO, PieceKind::TankPlatoon)
            .await
            .unwrap();

        let piece = place_on_board(&gateway, item.id, PositionId(12))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(piece.kind, PieceKind::TankPlatoon);
        assert_eq!(piece.position, PositionId(12));
        assert!(piece.contents.pieces.is_empty());
        assert!(load(&gateway, item.id).await.unwrap().is_none());

        // A second placement finds nothing to place.
        assert!(place_on_board(&gateway, item.id, PositionId(12))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn ownership_compares_session_and_team() {
        let gateway = MemoryGateway::default();
        let id = session(&gateway).await;
        let item = insert(&gateway, id, TeamId::ONE, PieceKind::Bomber)
            .await
            .unwrap();
        assert!(owned_by(&item, id, TeamId::ONE));
        assert!(!owned_by(&item, id, TeamId::ZERO));
        assert!(!owned_by(&item, SessionId(id.0 + 1), TeamId::ONE));
    }

    #[tokio::test]
    async fn delete_reports_missing_items() {
        let gateway = MemoryGateway::default();
        let id = session(&gateway).await;
        let item = insert(&gateway, id, TeamId::ZERO, PieceKind::Submarine)
            .await
            .unwrap();
        assert!(delete(&gateway, item.id).await.unwrap());
        assert!(!delete(&gateway, item.id).await.unwrap());
    }
}
