//! Confirmed movement plans.

use std::collections::BTreeMap;

use warroom_protocol::{PieceId, PlanStep, SessionId, TeamId};

use crate::gateway::{Gateway, GatewayError, PlanInsert};

/// The team's confirmed plans keyed by piece, each in movement order.
pub async fn confirmed(
    gateway: &dyn Gateway,
    session: SessionId,
    team: TeamId,
) -> Result<BTreeMap<PieceId, Vec<PlanStep>>, GatewayError> {
    let mut plans: BTreeMap<PieceId, Vec<PlanStep>> = BTreeMap::new();
    for step in gateway.list_plan_steps(session, team).await? {
        plans.entry(step.piece).or_default().push(step);
    }
    for steps in plans.values_mut() {
        steps.sort_by_key(|step| step.order);
    }
    Ok(plans)
}

/// Insert a whole plan; a step that is already taken rejects all of it.
pub async fn insert(gateway: &dyn Gateway, steps: &[PlanStep]) -> Result<PlanInsert, GatewayError> {
    gateway.insert_plan_steps(steps).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryGateway, NewSession};
    use warroom_protocol::PositionId;

    fn step(session: SessionId, piece: u64, order: u32, position: u32) -> PlanStep {
        PlanStep {
            session,
            team: TeamId::ZERO,
            piece: PieceId(piece),
            order,
            position: PositionId(position),
            special: 0,
        }
    }

    #[tokio::test]
    async fn steps_come_back_grouped_and_ordered() {
        let gateway = MemoryGateway::default();
        let id = gateway
            .insert_session(&NewSession {
                id: None,
                section: "M1A".into(),
                instructor: "Jones".into(),
                admin_password_hash: String::new(),
            })
            .await
            .unwrap();

        let steps = [step(id, 7, 1, 11), step(id, 7, 0, 10), step(id, 8, 0, 20)];
        assert_eq!(insert(&gateway, &steps).await.unwrap(), PlanInsert::Inserted);
        assert_eq!(
            insert(&gateway, &[step(id, 7, 0, 30)]).await.unwrap(),
            PlanInsert::Conflict
        );

        let plans = confirmed(&gateway, id, TeamId::ZERO).await.unwrap();
        let orders: Vec<_> = plans[&PieceId(7)].iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(plans[&PieceId(8)].len(), 1);
        assert!(confirmed(&gateway, id, TeamId::ONE).await.unwrap().is_empty());
    }
}
