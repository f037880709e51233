//! Default starting content inserted when a session is created or reset.

use serde::{Deserialize, Serialize};

use warroom_protocol::{PieceKind, PositionId, TeamId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPiece {
    pub team: TeamId,
    pub kind: PieceKind,
    pub position: PositionId,
    #[serde(default)]
    pub visible: bool,
    /// Index of an earlier entry in `pieces` that carries this piece.
    #[serde(default)]
    pub inside: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedItem {
    pub team: TeamId,
    pub kind: PieceKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedNews {
    pub title: String,
    pub info: String,
    #[serde(default = "default_news_length")]
    pub length: u32,
    #[serde(default = "default_true")]
    pub activated: bool,
}

fn default_news_length() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Starting board, inventory, shop and news for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialSeed {
    pub starting_points: u32,
    pub pieces: Vec<SeedPiece>,
    pub inventory: Vec<SeedItem>,
    pub shop: Vec<SeedItem>,
    /// Shown in list order.
    pub news: Vec<SeedNews>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    #[error("piece {index} is carried by {container}, which is not an earlier piece")]
    ForwardContainer { index: usize, container: usize },
    #[error("piece {index} is carried by a piece of another team or position")]
    MisplacedContents { index: usize },
}

impl InitialSeed {
    /// Containers must precede their contents and share team and position,
    /// which also rules out containment cycles.
    pub fn validate(&self) -> Result<(), SeedError> {
        for (index, piece) in self.pieces.iter().enumerate() {
            let Some(container) = piece.inside else {
                continue;
            };
            if container >= index {
                return Err(SeedError::ForwardContainer { index, container });
            }
            let carrier = &self.pieces[container];
            if carrier.team != piece.team || carrier.position != piece.position {
                return Err(SeedError::MisplacedContents { index });
            }
        }
        Ok(())
    }
}

impl Default for InitialSeed {
    /// Each team starts with a transport ship carrying infantry, a destroyer,
    /// a radar and a bomber, plus one tank platoon in inventory.
    fn default() -> Self {
        let mut pieces = Vec::new();
        let mut inventory = Vec::new();
        for (team, base) in [(TeamId::ZERO, 0u32), (TeamId::ONE, 100u32)] {
            let ship = pieces.len();
            pieces.push(SeedPiece {
                team,
                kind: PieceKind::TransportShip,
                position: PositionId(base + 1),
                visible: false,
                inside: None,
            });
            pieces.push(SeedPiece {
                team,
                kind: PieceKind::ArmyInfantry,
                position: PositionId(base + 1),
                visible: false,
                inside: Some(ship),
            });
            pieces.push(SeedPiece {
                team,
                kind: PieceKind::Destroyer,
                position: PositionId(base + 2),
                visible: false,
                inside: None,
            });
            pieces.push(SeedPiece {
                team,
                kind: PieceKind::RadarStation,
                position: PositionId(base + 3),
                visible: true,
                inside: None,
            });
            pieces.push(SeedPiece {
                team,
                kind: PieceKind::Bomber,
                position: PositionId(base + 4),
                visible: false,
                inside: None,
            });
            inventory.push(SeedItem {
                team,
                kind: PieceKind::TankPlatoon,
            });
        }

        let news = vec![
            SeedNews {
                title: "Tensions Rise".into(),
                info: "Both sides mobilize reserves along the island chain.".into(),
                length: 1,
                activated: true,
            },
            SeedNews {
                title: "Storm Warning".into(),
                info: "Heavy weather is expected to ground aircraft next round.".into(),
                length: 1,
                activated: true,
            },
            SeedNews {
                title: "Ceasefire Talks Collapse".into(),
                info: "Diplomats leave the table without agreement.".into(),
                length: 1,
                activated: true,
            },
        ];

        Self {
            starting_points: 60,
            pieces,
            inventory,
            shop: Vec::new(),
            news,
        }
    }
}
