//! Persistence gateway port.
//!
//! The core never talks to a storage engine directly. Everything goes through
//! [`Gateway`], and every call is all-or-nothing: either the whole statement
//! applied or an error came back and nothing changed. Compound operations the
//! core relies on being atomic (shop transfer, placing a piece, reseeding) are
//! single gateway calls for that reason.

mod memory;

pub use memory::MemoryGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use warroom_protocol::{
    CapabilityPlan, ControllerId, InvItem, InvItemId, NewsId, Phase, Piece, PieceKind, PlanStep,
    PositionId, SessionId, ShopItem, ShopItemId, Slice, TeamId, CONTROLLER_COUNT, TEAM_COUNT,
};

use crate::seed::InitialSeed;

/// Gateway failures. Constraint violations the core expects as normal
/// contention are not errors; see [`PlanInsert`] and [`ArmOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("constraint violation: {0}")]
    Conflict(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("schema violation: {0}")]
    Schema(String),
}

/// Outcome of inserting a row guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanInsert {
    Inserted,
    /// A row already exists for that key.
    Conflict,
}

/// Outcome of arming a capability with an inventory item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Plan stored and the consumed item removed.
    Armed(InvItem),
    /// A plan already exists for that key. The item is kept.
    Conflict,
    /// The item no longer exists.
    ItemGone,
}

/// Lookup key for a session row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Id(SessionId),
    /// The human-meaningful alternate key.
    Alternate { section: String, instructor: String },
}

/// Per-team columns of a session row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub status: u32,
    pub points: u32,
    pub logged_in: [bool; CONTROLLER_COUNT],
}

/// One durable session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub id: SessionId,
    pub section: String,
    pub instructor: String,
    pub admin_password_hash: String,
    pub active: bool,
    pub phase: Phase,
    pub slice: Slice,
    pub round: u32,
    pub teams: [TeamRecord; TEAM_COUNT],
}

impl SessionRow {
    /// Row as inserted: inactive, at phase/slice/round zero.
    pub fn fresh(id: SessionId, new: &NewSession) -> Self {
        Self {
            id,
            section: new.section.clone(),
            instructor: new.instructor.clone(),
            admin_password_hash: new.admin_password_hash.clone(),
            active: false,
            phase: Phase::NEWS,
            slice: Slice::PLANNING,
            round: 0,
            teams: Default::default(),
        }
    }

    /// Apply an update in place. Shared by the storage engine and the
    /// in-memory snapshot so both agree on compound effects.
    pub fn apply(&mut self, update: &SessionUpdate) {
        match *update {
            SessionUpdate::Active(active) => {
                self.active = active;
                for team in &mut self.teams {
                    team.logged_in = [false; CONTROLLER_COUNT];
                }
            }
            SessionUpdate::LoggedIn {
                team,
                controller,
                value,
            } => self.teams[team.index()].logged_in[controller.index()] = value,
            SessionUpdate::Points { team, value } => self.teams[team.index()].points = value,
            SessionUpdate::Status { team, value } => self.teams[team.index()].status = value,
            SessionUpdate::Phase(phase) => self.phase = phase,
            SessionUpdate::Slice(slice) => self.slice = slice,
            SessionUpdate::Round(round) => self.round = round,
        }
    }

    pub fn matches(&self, key: &SessionKey) -> bool {
        match key {
            SessionKey::Id(id) => self.id == *id,
            SessionKey::Alternate {
                section,
                instructor,
            } => self.section == *section && self.instructor == *instructor,
        }
    }
}

/// Insert request for a session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    /// Explicit identity; `None` lets the gateway assign one.
    pub id: Option<SessionId>,
    pub section: String,
    pub instructor: String,
    pub admin_password_hash: String,
}

/// Single-column (or single compound) update to a session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Also clears every controller's login flag.
    Active(bool),
    LoggedIn {
        team: TeamId,
        controller: ControllerId,
        value: bool,
    },
    Points { team: TeamId, value: u32 },
    Status { team: TeamId, value: u32 },
    Phase(Phase),
    Slice(Slice),
    Round(u32),
}

/// One news row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRow {
    pub id: NewsId,
    pub session: SessionId,
    pub order: u32,
    pub title: String,
    pub info: String,
    pub length: u32,
    pub activated: bool,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    // Sessions
    /// Every row matching the key. Callers decide what zero or many rows mean.
    async fn select_sessions(&self, key: &SessionKey) -> Result<Vec<SessionRow>, GatewayError>;
    async fn list_sessions(&self) -> Result<Vec<SessionRow>, GatewayError>;
    async fn insert_session(&self, new: &NewSession) -> Result<SessionId, GatewayError>;
    /// Returns the number of rows affected.
    async fn update_session(
        &self,
        id: SessionId,
        update: &SessionUpdate,
    ) -> Result<u64, GatewayError>;
    /// Deletes the session and every resource it owns.
    async fn delete_session(&self, id: SessionId) -> Result<u64, GatewayError>;
    /// Inserts the default pieces, items and news for a session in one transaction.
    async fn seed_session(&self, id: SessionId, seed: &InitialSeed) -> Result<(), GatewayError>;

    // Inventory
    async fn select_inv_item(&self, id: InvItemId) -> Result<Option<InvItem>, GatewayError>;
    async fn list_inv_items(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<InvItem>, GatewayError>;
    async fn insert_inv_item(
        &self,
        session: SessionId,
        team: TeamId,
        kind: PieceKind,
    ) -> Result<InvItemId, GatewayError>;
    async fn delete_inv_item(&self, id: InvItemId) -> Result<u64, GatewayError>;
    /// Turns an inventory item into a board piece and deletes the item.
    /// `None` when the item no longer exists.
    async fn place_inv_item(
        &self,
        id: InvItemId,
        position: PositionId,
    ) -> Result<Option<Piece>, GatewayError>;
    /// Moves every shop item of the team into inventory and empties the shop.
    /// Returns the team's inventory as it stands after the move.
    async fn transfer_shop_stock(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<InvItem>, GatewayError>;

    // Shop
    async fn list_shop_items(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<ShopItem>, GatewayError>;
    async fn insert_shop_item(
        &self,
        session: SessionId,
        team: TeamId,
        kind: PieceKind,
    ) -> Result<ShopItemId, GatewayError>;

    // Board
    /// All pieces of the session with empty contents.
    async fn list_pieces(&self, session: SessionId) -> Result<Vec<Piece>, GatewayError>;

    // Plans
    /// Unique per (session, team, piece, order).
    async fn insert_plan_steps(&self, steps: &[PlanStep]) -> Result<PlanInsert, GatewayError>;
    async fn list_plan_steps(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<PlanStep>, GatewayError>;
    /// Stores `plan` and deletes inventory item `item` together. Plans are
    /// unique per (session, team, capability, position); on conflict or a
    /// missing item nothing changes.
    async fn arm_with_item(
        &self,
        item: InvItemId,
        plan: &CapabilityPlan,
    ) -> Result<ArmOutcome, GatewayError>;
    async fn list_capability_plans(
        &self,
        session: SessionId,
        team: TeamId,
    ) -> Result<Vec<CapabilityPlan>, GatewayError>;

    // News
    /// Lowest-order activated news row with a non-zero length.
    async fn select_current_news(&self, session: SessionId)
        -> Result<Option<NewsRow>, GatewayError>;
}
