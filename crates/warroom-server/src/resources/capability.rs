//! Armed capabilities waiting to resolve.

use warroom_protocol::{Capability, CapabilityPlan, InvItemId, PositionId, SessionId, TeamId};

use crate::gateway::{ArmOutcome, Gateway, GatewayError};

/// Arm `capability` at `position` for the team, consuming inventory item
/// `item`. The plan and the deletion land together or not at all.
pub async fn arm(
    gateway: &dyn Gateway,
    session: SessionId,
    team: TeamId,
    capability: Capability,
    position: PositionId,
    item: InvItemId,
) -> Result<ArmOutcome, GatewayError> {
    let plan = CapabilityPlan {
        session,
        team,
        capability,
        position,
        rounds_left: capability.duration_rounds(),
    };
    gateway.arm_with_item(item, &plan).await
}

pub async fn for_team(
    gateway: &dyn Gateway,
    session: SessionId,
    team: TeamId,
) -> Result<Vec<CapabilityPlan>, GatewayError> {
    gateway.list_capability_plans(session, team).await
}
