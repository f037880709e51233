//! In-process storage engine.
//!
//! All tables sit behind one async mutex and every trait call runs inside a
//! single lock hold, so each call is one transaction. Deleting a session
//! cascades to everything it owns.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use warroom_protocol::{
    CapabilityPlan, InvItem, InvItemId, NewsId, Piece, PieceContents, PieceId, PieceKind,
    PlanStep, PositionId, SessionId, ShopItem, ShopItemId, TeamId,
};

use super::{
    ArmOutcome, Gateway, GatewayError, NewSession, NewsRow, PlanInsert, SessionKey, SessionRow,
    SessionUpdate,
};
use crate::seed::InitialSeed;

#[derive(Debug, Default)]
struct Tables {
    sessions: BTreeMap<SessionId, SessionRow>,
    inv_items: BTreeMap<InvItemId, InvItem>,
    shop_items: BTreeMap<ShopItemId, ShopItem>,
    pieces: BTreeMap<PieceId, Piece>,
    plan_steps: Vec<PlanStep>,
    capability_plans: Vec<CapabilityPlan>,
    news: BTreeMap<NewsId, NewsRow>,
    next_session: u64,
    next_row: u64,
}

impl Tables {
    fn next_row_id(&mut self) -> u64 {
        self.next_row += 1;
        self.next_row
    }

    fn require_session(&self, id: SessionId) -> Result<(), GatewayError> {
        if self.sessions.contains_key(&id) {
            Ok(())
        } else {
            Err(GatewayError::Schema(format!(
                "foreign key: session {id} does not exist"
            )))
        }
    }

    fn insert_piece(
        &mut self,
        session: SessionId,
        team: TeamId,
        kind: PieceKind,
        position: PositionId,
        container: Option<PieceId>,
        visible: bool,
    ) -> Piece {
        let piece = Piece {
            id: PieceId(self.next_row_id()),
            session,
            team,
            kind,
            position,
            container,
            visible,
            moves: kind.moves(),
            fuel: kind.fuel(),
            contents: PieceContents::default(),
        };
        self.pieces.insert(piece.id, piece.clone());
        piece
    }

    fn insert_inv_item(&mut self, session: SessionId, team: TeamId, kind: PieceKind) -> InvItemId {
        let id = InvItemId(self.next_row_id());
        self.inv_items.insert(
            id,
            InvItem {
                id,
                session,
                team,
                kind,
            },
        );
        id
    }

    fn insert_shop_item(&mut self, session: SessionId, team: TeamId, kind: PieceKind) -> ShopItemId {
        let id = ShopItemId(self.next_row_id());
        self.shop_items.insert(
            id,
            ShopItem {
                id,
                session,
                team,
                kind,
            },
        );
        id
    }

    fn purge_session(&mut self, id: SessionId) {
        self.inv_items.retain(|_, item| item.session != id);
        self.shop_items.retain(|_, item| item.session != id);
        self.pieces.retain(|_, piece| piece.session != id);
        self.plan_steps.retain(|step| step.session != id);
        self.capability_plans.retain(|plan| plan.session != id);
        self.news.retain(|_, news| news.session != id);
    }
}

/// Transactional in-memory [`Gateway`].
#[derive(Debug)]
pub struct MemoryGateway {
    tables: Mutex<Tables>,
    /// Enforce one session per (section, instructor).
    unique_alternate_key: bool,
    offline: AtomicBool,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MemoryGateway {
    pub fn new(unique_alternate_key: bool) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            unique_alternate_key,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate lost connectivity: every call fails with `Unavailable` until
    /// switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(GatewayError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn select_sessions(&self, key: &SessionKey) -> Result<Vec<SessionRow>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .values()
            .filter(|row| row.matches(key))
            .cloned()
            .collect())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRow>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.sessions.values().cloned().collect())
    }

    async fn insert_session(&self, new: &NewSession) -> Result<SessionId, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        if self.unique_alternate_key
            && tables
                .sessions
                .values()
                .any(|row| row.section == new.section && row.instructor == new.instructor)
        {
            return Err(GatewayError::Conflict(format!(
                "session for section {:?} and instructor {:?} already exists",
                new.section, new.instructor
            )));
        }

        let id = match new.id {
            Some(id) if tables.sessions.contains_key(&id) => {
                return Err(GatewayError::Conflict(format!("session {id} already exists")));
            }
            Some(id) => id,
            None => {
                let mut next = tables.next_session + 1;
                while tables.sessions.contains_key(&SessionId(next)) {
                    next += 1;
                }
                SessionId(next)
            }
        };
        tables.next_session = tables.next_session.max(id.0);
        tables.sessions.insert(id, SessionRow::fresh(id, new));
        debug!(session = %id, "inserted session row");
        Ok(id)
    }

    async fn update_session(
        &self,
        id: SessionId,
        update: &SessionUpdate,
    ) -> Result<u64, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        match tables.sessions.get_mut(&id) {
            Some(row) => {
                row.apply(update);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_session(&self, id: SessionId) -> Result<u64, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        if tables.sessions.remove(&id).is_none() {
            return Ok(0);
        }
        tables.purge_session(id);
        debug!(session = %id, "deleted session row and owned resources");
        Ok(1)
    }

    async fn seed_session(&self, id: SessionId, seed: &InitialSeed) -> Result<(), GatewayError> {
        self.check_online()?;
        seed.validate()
            .map_err(|e| GatewayError::Schema(e.to_string()))?;

        let mut tables = self.tables.lock().await;
        tables.require_session(id)?;

        if let Some(row) = tables.sessions.get_mut(&id) {
            for team in &mut row.teams {
                team.points = seed.starting_points;
            }
        }

        let mut placed: Vec<PieceId> = Vec::with_capacity(seed.pieces.len());
        for entry in &seed.pieces {
            let container = entry.inside.map(|index| placed[index]);
            let piece = tables.insert_piece(
                id,
                entry.team,
                entry.kind,
                entry.position,
                container,
                entry.visible,
            );
            placed.push(piece.id);
        }
        for item in &seed.inventory {
            tables.insert_inv_item(id, item.team, item.kind);
        }
        for item in &seed.shop {
            tables.insert_shop_item(id, item.team, item.kind);
        }
        for (order, news) in seed.news.iter().enumerate() {
            let news_id = NewsId(tables.next_row_id());
            tables.news.insert(
                news_id,
                NewsRow {
                    id: news_id,
                    session: id,
                    order: order as u32,
                    title: news.title.clone(),
                    info: news.info.clone(),
                    length: news.length,
                    activated: news.activated,
                },
            );
        }
        Ok(())
    }

    async fn select_inv_item(&self, id: InvItemId) -> Result<Option<InvItem>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.inv_items.get(&id).cloned())
    }

    async fn list_inv_items(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<InvItem>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .inv_items
            .values()
            .filter(|item| item.session == session && item.team == team)
            .cloned()
            .collect())
    }

    async fn insert_inv_item(
        &self,
        session: SessionId,
        team: TeamId,
        kind: PieceKind,
    ) -> Result<InvItemId, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        tables.require_session(session)?;
        Ok(tables.insert_inv_item(session, team, kind))
    }

    async fn delete_inv_item(&self, id: InvItemId) -> Result<u64, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        Ok(u64::from(tables.inv_items.remove(&id).is_some()))
    }

    async fn place_inv_item(
        &self,
        id: InvItemId,
        position: PositionId,
    ) -> Result<Option<Piece>, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        let Some(item) = tables.inv_items.remove(&id) else {
            return Ok(None);
        };
        let piece = tables.insert_piece(item.session, item.team, item.kind, position, None, false);
        Ok(Some(piece))
    }

    async fn transfer_shop_stock(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<InvItem>, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        let stock: Vec<ShopItem> = tables
            .shop_items
            .values()
            .filter(|item| item.session == session && item.team == team)
            .cloned()
            .collect();
        for item in &stock {
            tables.shop_items.remove(&item.id);
            tables.insert_inv_item(item.session, item.team, item.kind);
        }
        debug!(%session, %team, moved = stock.len(), "shop stock transferred");
        Ok(tables
            .inv_items
            .values()
            .filter(|item| item.session == session && item.team == team)
            .cloned()
            .collect())
    }

    async fn list_shop_items(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<ShopItem>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .shop_items
            .values()
            .filter(|item| item.session == session && item.team == team)
            .cloned()
            .collect())
    }

    async fn insert_shop_item(
        &self,
        session: SessionId,
        team: TeamId,
        kind: PieceKind,
    ) -> Result<ShopItemId, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        tables.require_session(session)?;
        Ok(tables.insert_shop_item(session, team, kind))
    }

    async fn list_pieces(&self, session: SessionId) -> Result<Vec<Piece>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .pieces
            .values()
            .filter(|piece| piece.session == session)
            .cloned()
            .collect())
    }

    async fn insert_plan_steps(&self, steps: &[PlanStep]) -> Result<PlanInsert, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        for step in steps {
            tables.require_session(step.session)?;
        }

        let clashes = |a: &PlanStep, b: &PlanStep| {
            a.session == b.session && a.team == b.team && a.piece == b.piece && a.order == b.order
        };
        for (index, step) in steps.iter().enumerate() {
            if tables.plan_steps.iter().any(|existing| clashes(existing, step))
                || steps[..index].iter().any(|earlier| clashes(earlier, step))
            {
                return Ok(PlanInsert::Conflict);
            }
        }
        tables.plan_steps.extend_from_slice(steps);
        Ok(PlanInsert::Inserted)
    }

    async fn list_plan_steps(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<PlanStep>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .plan_steps
            .iter()
            .filter(|step| step.session == session && step.team == team)
            .cloned()
            .collect())
    }

    async fn arm_with_item(
        &self,
        item: InvItemId,
        plan: &CapabilityPlan,
    ) -> Result<ArmOutcome, GatewayError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        tables.require_session(plan.session)?;
        if !tables.inv_items.contains_key(&item) {
            return Ok(ArmOutcome::ItemGone);
        }
        let taken = tables.capability_plans.iter().any(|existing| {
            existing.session == plan.session
                && existing.team == plan.team
                && existing.capability == plan.capability
                && existing.position == plan.position
        });
        if taken {
            return Ok(ArmOutcome::Conflict);
        }
        let Some(consumed) = tables.inv_items.remove(&item) else {
            return Ok(ArmOutcome::ItemGone);
        };
        tables.capability_plans.push(plan.clone());
        Ok(ArmOutcome::Armed(consumed))
    }

    async fn list_capability_plans(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<CapabilityPlan>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .capability_plans
            .iter()
            .filter(|plan| plan.session == session && plan.team == team)
            .cloned()
            .collect())
    }

    async fn select_current_news(
        &self,
        session: SessionId,
    ) -> Result<Option<NewsRow>, GatewayError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .news
            .values()
            .filter(|news| news.session == session && news.activated && news.length != 0)
            .min_by_key(|news| news.order)
            .cloned())
    }
}
