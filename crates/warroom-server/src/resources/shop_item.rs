//! Shop stock: items bought this round but not yet confirmed.

use warroom_protocol::{PieceKind, SessionId, ShopItem, TeamId};

use crate::gateway::{Gateway, GatewayError};

pub async fn all(
    gateway: &dyn Gateway,
    session: SessionId,
    team: TeamId,
) -> Result<Vec<ShopItem>, GatewayError> {
    gateway.list_shop_items(session, team).await
}

pub async fn insert(
    gateway: &dyn Gateway,
    session: SessionId,
    team: TeamId,
    kind: PieceKind,
) -> Result<ShopItem, GatewayError> {
    let id = gateway.insert_shop_item(session, team, kind).await?;
    Ok(ShopItem {
        id,
        session,
        team,
        kind,
    })
}
