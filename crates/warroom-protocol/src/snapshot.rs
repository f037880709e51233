//! Full-resync payload sent when a connection joins or rejoins a session.
//!
//! Everything in here is scoped to one team: another team's inventory, shop
//! and plans never appear.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ControllerId, Phase, PieceId, PositionId, Slice};
use crate::records::{CapabilityPlan, InvItem, Piece, PlanStep, ShopItem};

/// Session metadata as seen by one team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub game_section: String,
    pub game_instructor: String,
    pub game_controller: ControllerId,
    pub game_phase: Phase,
    pub game_round: u32,
    pub game_slice: Slice,
    pub game_status: u32,
    pub game_points: u32,
}

/// The single news item shown during the news phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsView {
    pub active: bool,
    pub news_title: String,
    pub news_info: String,
}

/// Client-side planning scratch state. The server never persists it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningView {
    pub active: bool,
    pub moves: Vec<PositionId>,
}

/// Client-side battle panel. Starts closed with nothing selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleView {
    pub active: bool,
    pub selected_battle_piece: i64,
    pub selected_battle_piece_index: i64,
    pub friendly_pieces: Vec<Piece>,
    pub enemy_pieces: Vec<Piece>,
}

impl Default for BattleView {
    fn default() -> Self {
        Self {
            active: false,
            selected_battle_piece: -1,
            selected_battle_piece_index: -1,
            friendly_pieces: Vec::new(),
            enemy_pieces: Vec::new(),
        }
    }
}

/// An open/closed client panel (container, refuel).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelView {
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameboardMeta {
    /// `-1` when nothing is selected.
    pub selected_position: i64,
    pub selected_piece: i64,
    pub news: NewsView,
    pub battle: BattleView,
    pub container: PanelView,
    pub refuel: PanelView,
    pub planning: PlanningView,
    pub confirmed_plans: BTreeMap<PieceId, Vec<PlanStep>>,
    pub capabilities: Vec<CapabilityPlan>,
}

/// Board pieces grouped by position; each entry is a top-level piece.
pub type GameboardPieces = BTreeMap<PositionId, Vec<Piece>>;

/// Payload of `INITIAL_GAMESTATE`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialGameState {
    pub game_info: GameInfo,
    pub shop_items: Vec<ShopItem>,
    pub inv_items: Vec<InvItem>,
    pub gameboard_pieces: GameboardPieces,
    pub gameboard_meta: GameboardMeta,
}

impl InitialGameState {
    /// Total number of pieces visible to the team, nested contents included.
    pub fn visible_piece_count(&self) -> usize {
        fn count(pieces: &[Piece]) -> usize {
            pieces
                .iter()
                .map(|p| 1 + count(&p.contents.pieces))
                .sum()
        }
        self.gameboard_pieces.values().map(|v| count(v)).sum()
    }
}
