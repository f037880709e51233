//! `BIO_WEAPONS_CONFIRM`: arm a biological weapon at a board position.

use warroom_protocol::{
    BioWeaponSelected, BioWeaponsRequest, Capability, Phase, PieceKind, PositionId, RedirectTag,
    ServerMessage, Slice,
};

use super::{
    active_game, require_phase, require_primary, require_slice, Delivery, Outcome, Rejection,
    MALFORMED_PAYLOAD,
};
use crate::context::ConnectionContext;
use crate::gateway::{ArmOutcome, Gateway};
use crate::resources::{capability, inv_item};

const MISSING_ITEM: &str = "Did not have the invItem to complete this request.";

pub async fn handle(
    gateway: &dyn Gateway,
    ctx: &ConnectionContext,
    request: BioWeaponsRequest,
) -> Outcome {
    let Some(selected_position) = request.selected_position_id else {
        return Err(Rejection::feedback(format!(
            "{MALFORMED_PAYLOAD} (missing selectedPositionId)"
        )));
    };
    let Some(item_ref) = request.inv_item else {
        return Err(Rejection::feedback(format!(
            "{MALFORMED_PAYLOAD} (missing invItem)"
        )));
    };

    let game = active_game(gateway, ctx).await?;
    require_phase(&game, Phase::CAPABILITY_PLACEMENT)?;
    require_slice(&game, Slice::PLANNING)?;
    require_primary(ctx)?;

    let Some(item) = inv_item::load(gateway, item_ref.inv_item_id).await? else {
        return Err(Rejection::feedback(MISSING_ITEM));
    };
    if !inv_item::owned_by(&item, ctx.session, ctx.team) {
        return Err(Rejection::Redirect(RedirectTag::BadRequest));
    }
    if item.kind != PieceKind::BiologicalWeapons {
        return Err(Rejection::feedback("Inv Item was not a bio weapon type."));
    }
    let Ok(position) = u32::try_from(selected_position).map(PositionId) else {
        return Err(Rejection::feedback("got a negative position for bio weapon."));
    };

    let armed = capability::arm(
        gateway,
        ctx.session,
        ctx.team,
        Capability::BiologicalWeapons,
        position,
        item.id,
    )
    .await?;
    let item = match armed {
        ArmOutcome::Armed(item) => item,
        ArmOutcome::Conflict => {
            return Err(Rejection::feedback(
                "Already a bio weapon planned for that position.",
            ))
        }
        ArmOutcome::ItemGone => return Err(Rejection::feedback(MISSING_ITEM)),
    };

    Ok(Delivery::origin(ServerMessage::BioWeaponSelected(
        BioWeaponSelected {
            inv_item: item,
            selected_position_id: position,
        },
    )))
}
