//! `PIECE_PLACE`: put an inventory item on the board during reinforcement
//! placement.

use warroom_protocol::{
    KindCategory, Phase, PiecePlaceRequest, PiecePlaced, PositionId, RedirectTag, ServerMessage,
};

use super::{active_game, require_phase, Delivery, Outcome, Rejection, MALFORMED_PAYLOAD};
use crate::context::ConnectionContext;
use crate::gateway::Gateway;
use crate::resources::inv_item;

pub async fn handle(
    gateway: &dyn Gateway,
    ctx: &ConnectionContext,
    request: PiecePlaceRequest,
) -> Outcome {
    let (Some(inv_item_id), Some(selected_position)) =
        (request.inv_item_id, request.selected_position)
    else {
        return Err(Rejection::feedback(format!(
            "{MALFORMED_PAYLOAD} (missing invItemId or selectedPosition)"
        )));
    };

    let game = active_game(gateway, ctx).await?;
    require_phase(&game, Phase::REINFORCEMENT_PLACEMENT)?;

    let Some(item) = inv_item::load(gateway, inv_item_id).await? else {
        return Err(Rejection::feedback("Inv Item did not exist..."));
    };
    if !inv_item::owned_by(&item, ctx.session, ctx.team) {
        return Err(Rejection::Redirect(RedirectTag::BadRequest));
    }
    if item.kind.category() == KindCategory::Capability {
        return Err(Rejection::feedback("Capabilities cannot be placed on the board."));
    }
    let Ok(position) = u32::try_from(selected_position).map(PositionId) else {
        return Err(Rejection::feedback("Not a valid board position."));
    };

    let Some(new_piece) = inv_item::place_on_board(gateway, item.id, position).await? else {
        return Err(Rejection::feedback("Inv Item did not exist..."));
    };

    Ok(Delivery::team(ServerMessage::PiecePlace(PiecePlaced {
        inv_item_id,
        position_id: position,
        new_piece,
    })))
}
