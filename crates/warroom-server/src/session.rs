//! The session entity.
//!
//! A [`Game`] is an immutable snapshot of one durable session row. Loading
//! always goes to the gateway; setters write through first and hand back a new
//! snapshot, so a failed write leaves the caller's snapshot as it was.

use tracing::{info, warn};

use warroom_protocol::{
    BattleView, ControllerId, GameInfo, GameboardMeta, InitialGameState, PanelView, Phase,
    PlanningView, SessionId, Slice, TeamId,
};

use crate::gateway::{
    Gateway, GatewayError, NewSession, SessionKey, SessionRow, SessionUpdate, TeamRecord,
};
use crate::resources::{capability, inv_item, news, piece, plan, shop_item};
use crate::seed::InitialSeed;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No row, or more than one row, matched the key.
    #[error("session not found")]
    NotFound,
    #[error("a session with that identity or section/instructor already exists")]
    Duplicate,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Listing entry for operator tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub section: String,
    pub instructor: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    row: SessionRow,
}

impl Game {
    /// Load exactly one session. Ambiguous keys fail closed.
    pub async fn load(gateway: &dyn Gateway, key: &SessionKey) -> Result<Self, SessionError> {
        let mut rows = gateway.select_sessions(key).await?;
        match (rows.pop(), rows.is_empty()) {
            (Some(row), true) => Ok(Self { row }),
            (Some(_), false) => {
                warn!(?key, matches = rows.len() + 1, "ambiguous session key");
                Err(SessionError::NotFound)
            }
            (None, _) => Err(SessionError::NotFound),
        }
    }

    pub async fn create(gateway: &dyn Gateway, new: NewSession) -> Result<Self, SessionError> {
        match gateway.insert_session(&new).await {
            Ok(id) => info!(session = %id, section = %new.section, "session created"),
            Err(GatewayError::Conflict(reason)) => {
                warn!(%reason, "session insert rejected");
                return Err(SessionError::Duplicate);
            }
            Err(err) => return Err(err.into()),
        }
        let key = SessionKey::Alternate {
            section: new.section,
            instructor: new.instructor,
        };
        Self::load(gateway, &key).await
    }

    pub async fn list(gateway: &dyn Gateway) -> Result<Vec<SessionSummary>, SessionError> {
        Ok(gateway
            .list_sessions()
            .await?
            .into_iter()
            .map(|row| SessionSummary {
                id: row.id,
                section: row.section,
                instructor: row.instructor,
                active: row.active,
            })
            .collect())
    }

    /// Remove the session and everything it owns.
    pub async fn delete(self, gateway: &dyn Gateway) -> Result<(), SessionError> {
        match gateway.delete_session(self.row.id).await? {
            0 => Err(SessionError::NotFound),
            _ => {
                info!(session = %self.row.id, "session deleted");
                Ok(())
            }
        }
    }

    async fn update(
        &self,
        gateway: &dyn Gateway,
        update: SessionUpdate,
    ) -> Result<Self, SessionError> {
        if gateway.update_session(self.row.id, &update).await? != 1 {
            return Err(SessionError::NotFound);
        }
        let mut row = self.row.clone();
        row.apply(&update);
        Ok(Self { row })
    }

    /// Toggling the active flag also logs every controller out.
    pub async fn set_active(&self, gateway: &dyn Gateway, active: bool) -> Result<Self, SessionError> {
        self.update(gateway, SessionUpdate::Active(active)).await
    }

    pub async fn set_logged_in(
        &self,
        gateway: &dyn Gateway,
        team: TeamId,
        controller: ControllerId,
        value: bool,
    ) -> Result<Self, SessionError> {
        self.update(
            gateway,
            SessionUpdate::LoggedIn {
                team,
                controller,
                value,
            },
        )
        .await
    }

    pub async fn set_points(
        &self,
        gateway: &dyn Gateway,
        team: TeamId,
        value: u32,
    ) -> Result<Self, SessionError> {
        self.update(gateway, SessionUpdate::Points { team, value }).await
    }

    pub async fn set_status(
        &self,
        gateway: &dyn Gateway,
        team: TeamId,
        value: u32,
    ) -> Result<Self, SessionError> {
        self.update(gateway, SessionUpdate::Status { team, value }).await
    }

    pub async fn set_phase(&self, gateway: &dyn Gateway, phase: Phase) -> Result<Self, SessionError> {
        self.update(gateway, SessionUpdate::Phase(phase)).await
    }

    pub async fn set_slice(&self, gateway: &dyn Gateway, slice: Slice) -> Result<Self, SessionError> {
        self.update(gateway, SessionUpdate::Slice(slice)).await
    }

    pub async fn set_round(&self, gateway: &dyn Gateway, round: u32) -> Result<Self, SessionError> {
        self.update(gateway, SessionUpdate::Round(round)).await
    }

    /// Wipe the session back to its starting content under the same identity.
    ///
    /// The session is deactivated before anything is removed and comes back
    /// inactive, so handlers see `GameInactive` (or `GameDoesNotExist`) for the
    /// whole window. Reactivate it with [`Game::set_active`] once done.
    pub async fn reset(self, gateway: &dyn Gateway, seed: &InitialSeed) -> Result<Self, SessionError> {
        let id = self.row.id;
        let quiesced = self.set_active(gateway, false).await?;
        let new = NewSession {
            id: Some(id),
            section: quiesced.row.section.clone(),
            instructor: quiesced.row.instructor.clone(),
            admin_password_hash: quiesced.row.admin_password_hash.clone(),
        };
        quiesced.delete(gateway).await?;
        Game::create(gateway, new).await?;
        gateway.seed_session(id, seed).await?;
        info!(session = %id, "session reset");
        Game::load(gateway, &SessionKey::Id(id)).await
    }

    /// Full resync payload for one controller of one team.
    pub async fn initial_state(
        &self,
        gateway: &dyn Gateway,
        team: TeamId,
        controller: ControllerId,
    ) -> Result<InitialGameState, SessionError> {
        let id = self.row.id;
        let record = self.team(team);
        let game_info = GameInfo {
            game_section: self.row.section.clone(),
            game_instructor: self.row.instructor.clone(),
            game_controller: controller,
            game_phase: self.row.phase,
            game_round: self.row.round,
            game_slice: self.row.slice,
            game_status: record.status,
            game_points: record.points,
        };

        Ok(InitialGameState {
            game_info,
            shop_items: shop_item::all(gateway, id, team).await?,
            inv_items: inv_item::all(gateway, id, team).await?,
            gameboard_pieces: piece::visible_board(gateway, id, team).await?,
            gameboard_meta: GameboardMeta {
                selected_position: -1,
                selected_piece: -1,
                news: news::current(gateway, id, self.row.phase).await?,
                battle: BattleView::default(),
                container: PanelView::default(),
                refuel: PanelView::default(),
                planning: PlanningView::default(),
                confirmed_plans: plan::confirmed(gateway, id, team).await?,
                capabilities: capability::for_team(gateway, id, team).await?,
            },
        })
    }

    pub fn id(&self) -> SessionId {
        self.row.id
    }

    pub fn section(&self) -> &str {
        &self.row.section
    }

    pub fn instructor(&self) -> &str {
        &self.row.instructor
    }

    pub fn admin_password_hash(&self) -> &str {
        &self.row.admin_password_hash
    }

    pub fn is_active(&self) -> bool {
        self.row.active
    }

    pub fn phase(&self) -> Phase {
        self.row.phase
    }

    pub fn slice(&self) -> Slice {
        self.row.slice
    }

    pub fn round(&self) -> u32 {
        self.row.round
    }

    pub fn team(&self, team: TeamId) -> &TeamRecord {
        &self.row.teams[team.index()]
    }

    pub fn points(&self, team: TeamId) -> u32 {
        self.team(team).points
    }

    pub fn status(&self, team: TeamId) -> u32 {
        self.team(team).status
    }

    pub fn is_logged_in(&self, team: TeamId, controller: ControllerId) -> bool {
        self.team(team).logged_in[controller.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use warroom_protocol::{PieceKind, PositionId};

    fn new_session(section: &str) -> NewSession {
        NewSession {
            id: None,
            section: section.into(),
            instructor: "Jones".into(),
            admin_password_hash: "$2b$10$hash".into(),
        }
    }

    #[tokio::test]
    async fn create_then_load_by_either_key() {
        let gateway = MemoryGateway::default();
        let game = Game::create(&gateway, new_session("M1A")).await.unwrap();
        assert!(!game.is_active());
        assert_eq!(game.phase(), Phase::NEWS);

        let by_id = Game::load(&gateway, &SessionKey::Id(game.id())).await.unwrap();
        assert_eq!(by_id, game);

        let err = Game::create(&gateway, new_session("M1A")).await.unwrap_err();
        assert!(matches!(err, SessionError::Duplicate));
        assert_eq!(Game::list(&gateway).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_alternate_keys_fail_closed() {
        let gateway = MemoryGateway::new(false);
        gateway.insert_session(&new_session("M1A")).await.unwrap();
        gateway.insert_session(&new_session("M1A")).await.unwrap();

        let key = SessionKey::Alternate {
            section: "M1A".into(),
            instructor: "Jones".into(),
        };
        let err = Game::load(&gateway, &key).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn setters_return_a_new_snapshot() {
        let gateway = MemoryGateway::default();
        let game = Game::create(&gateway, new_session("M1A")).await.unwrap();

        let moved = game.set_phase(&gateway, Phase::COMBAT).await.unwrap();
        let moved = moved.set_points(&gateway, TeamId::ONE, 35).await.unwrap();
        assert_eq!(game.phase(), Phase::NEWS);
        assert_eq!(moved.phase(), Phase::COMBAT);
        assert_eq!(moved.points(TeamId::ONE), 35);

        let stored = Game::load(&gateway, &SessionKey::Id(game.id())).await.unwrap();
        assert_eq!(stored, moved);
    }

    #[tokio::test]
    async fn activation_logs_everyone_out() {
        let gateway = MemoryGateway::default();
        let game = Game::create(&gateway, new_session("M1A")).await.unwrap();
        let controller = ControllerId::new(2).unwrap();

        let game = game
            .set_logged_in(&gateway, TeamId::ZERO, controller, true)
            .await
            .unwrap();
        assert!(game.is_logged_in(TeamId::ZERO, controller));

        let game = game.set_active(&gateway, true).await.unwrap();
        assert!(game.is_active());
        assert!(!game.is_logged_in(TeamId::ZERO, controller));
    }

    #[tokio::test]
    async fn failed_write_leaves_snapshot_alone() {
        let gateway = MemoryGateway::default();
        let game = Game::create(&gateway, new_session("M1A")).await.unwrap();

        gateway.set_offline(true);
        let err = game.set_round(&gateway, 4).await.unwrap_err();
        assert!(matches!(err, SessionError::Gateway(GatewayError::Unavailable(_))));
        assert_eq!(game.round(), 0);

        gateway.set_offline(false);
        let stored = Game::load(&gateway, &SessionKey::Id(game.id())).await.unwrap();
        assert_eq!(stored.round(), 0);
    }

    #[tokio::test]
    async fn deleted_session_is_gone() {
        let gateway = MemoryGateway::default();
        let game = Game::create(&gateway, new_session("M1A")).await.unwrap();
        let id = game.id();
        let stale = game.clone();

        game.delete(&gateway).await.unwrap();
        assert!(matches!(
            Game::load(&gateway, &SessionKey::Id(id)).await,
            Err(SessionError::NotFound)
        ));
        assert!(matches!(
            stale.set_round(&gateway, 1).await,
            Err(SessionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn reset_restores_the_starting_state() {
        let gateway = MemoryGateway::default();
        let seed = InitialSeed::default();
        let game = Game::create(&gateway, new_session("M1A")).await.unwrap();
        let id = game.id();
        gateway.seed_session(id, &seed).await.unwrap();
        let pristine = game
            .initial_state(&gateway, TeamId::ZERO, ControllerId::PRIMARY)
            .await
            .unwrap();

        let game = game.set_active(&gateway, true).await.unwrap();
        let game = game.set_phase(&gateway, Phase::REINFORCEMENT_PLACEMENT).await.unwrap();
        let item = inv_item::all(&gateway, id, TeamId::ZERO).await.unwrap()[0].clone();
        inv_item::place_on_board(&gateway, item.id, PositionId(50))
            .await
            .unwrap();
        shop_item::insert(&gateway, id, TeamId::ZERO, PieceKind::Submarine)
            .await
            .unwrap();

        let game = game.reset(&gateway, &seed).await.unwrap();
        assert_eq!(game.id(), id);
        assert!(!game.is_active());
        assert_eq!(game.phase(), Phase::NEWS);
        assert_eq!(game.points(TeamId::ZERO), seed.starting_points);

        let state = game
            .initial_state(&gateway, TeamId::ZERO, ControllerId::PRIMARY)
            .await
            .unwrap();
        assert!(state.shop_items.is_empty());
        assert_eq!(state.inv_items.len(), 1);
        assert_eq!(state.inv_items[0].kind, PieceKind::TankPlatoon);
        assert_eq!(state.visible_piece_count(), pristine.visible_piece_count());
        assert_eq!(state.gameboard_meta.news, pristine.gameboard_meta.news);
    }

    #[tokio::test]
    async fn resync_is_team_scoped() {
        let gateway = MemoryGateway::default();
        let game = Game::create(&gateway, new_session("M1A")).await.unwrap();
        gateway
            .seed_session(game.id(), &InitialSeed::default())
            .await
            .unwrap();
        let game = Game::load(&gateway, &SessionKey::Id(game.id())).await.unwrap();
        shop_item::insert(&gateway, game.id(), TeamId::ONE, PieceKind::Destroyer)
            .await
            .unwrap();

        let state = game
            .initial_state(&gateway, TeamId::ZERO, ControllerId::PRIMARY)
            .await
            .unwrap();
        assert!(state.shop_items.is_empty());
        assert!(state.inv_items.iter().all(|item| item.team == TeamId::ZERO));
        // Own five pieces plus the other team's visible radar.
        assert_eq!(state.visible_piece_count(), 6);
        assert_eq!(state.gameboard_meta.selected_position, -1);
        assert!(state.gameboard_meta.news.active);
        assert_eq!(state.gameboard_meta.battle.selected_battle_piece, -1);
        assert!(!state.gameboard_meta.container.active);
        assert_eq!(state.game_info.game_points, 60);
    }
}
