//! `SHOP_CONFIRM_PURCHASE`: the primary controller commits the team's shop
//! stock to inventory.

use warroom_protocol::{Phase, ServerMessage, ShopConfirmRequest, ShopTransfer};

use super::{active_game, require_phase, require_primary, Delivery, Outcome};
use crate::context::ConnectionContext;
use crate::gateway::Gateway;
use crate::resources::inv_item;

pub async fn handle(
    gateway: &dyn Gateway,
    ctx: &ConnectionContext,
    _request: ShopConfirmRequest,
) -> Outcome {
    let game = active_game(gateway, ctx).await?;
    require_phase(&game, Phase::PURCHASE_CONFIRM)?;
    require_primary(ctx)?;

    let inv_items = inv_item::insert_from_shop(gateway, ctx.session, ctx.team).await?;

    // Teammates pick this up on their next resync.
    Ok(Delivery::origin(ServerMessage::ShopTransfer(ShopTransfer {
        inv_items,
    })))
}
