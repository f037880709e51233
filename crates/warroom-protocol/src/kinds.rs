//! The closed type table shared by every resource.
//!
//! Type ids are stable integers on the wire; anything that does not resolve to
//! a `PieceKind` is rejected at decode time.

use serde::{Deserialize, Serialize};

/// Broad grouping used by handlers to check that an item fits an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindCategory {
    Air,
    Ground,
    Sea,
    SpecialForces,
    /// Consumed from inventory to arm a capability rather than placed on the board.
    Capability,
}

macro_rules! piece_kinds {
    ($($variant:ident = $id:literal, $name:literal, $category:ident, $moves:literal, $fuel:expr;)*) => {
        /// Every type a piece, inventory item or shop item can carry.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u16", into = "u16")]
        #[repr(u16)]
        pub enum PieceKind {
            $($variant = $id,)*
        }

        impl PieceKind {
            pub const ALL: &'static [PieceKind] = &[$(PieceKind::$variant,)*];

            pub const fn id(self) -> u16 {
                self as u16
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(PieceKind::$variant => $name,)*
                }
            }

            pub const fn category(self) -> KindCategory {
                match self {
                    $(PieceKind::$variant => KindCategory::$category,)*
                }
            }

            /// Moves granted to a freshly placed piece.
            pub const fn moves(self) -> u8 {
                match self {
                    $(PieceKind::$variant => $moves,)*
                }
            }

            /// Starting fuel, for kinds that track it.
            pub const fn fuel(self) -> Option<u8> {
                match self {
                    $(PieceKind::$variant => $fuel,)*
                }
            }

            pub const fn from_id(id: u16) -> Option<Self> {
                match id {
                    $($id => Some(PieceKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

piece_kinds! {
    Bomber = 0, "Bomber", Air, 10, Some(10);
    StealthBomber = 1, "Stealth Bomber", Air, 10, Some(10);
    StealthFighter = 2, "Stealth Fighter", Air, 10, Some(10);
    AirRefuelingSquadron = 3, "Air Refueling Squadron", Air, 10, Some(10);
    TacticalAirlift = 4, "Tactical Airlift Squadron", Air, 10, Some(10);
    AirborneRecon = 5, "Air ISR", Air, 10, Some(10);
    ArmyInfantry = 6, "Army Infantry", Ground, 1, None;
    ArtilleryBattery = 7, "Artillery Battery", Ground, 1, None;
    TankPlatoon = 8, "Tank Platoon", Ground, 2, None;
    MarineInfantry = 9, "Marine Infantry", Ground, 1, None;
    AttackHelicopter = 10, "Attack Helicopter", Air, 3, Some(3);
    LightArmoredVehicle = 11, "Light Armored Vehicle", Ground, 3, None;
    SofTeam = 12, "SOF Team", SpecialForces, 2, None;
    RadarStation = 13, "Radar", Ground, 0, None;
    Destroyer = 14, "Destroyer", Sea, 4, None;
    AircraftCarrier = 15, "Aircraft Carrier", Sea, 3, None;
    Submarine = 16, "Submarine", Sea, 4, None;
    TransportShip = 17, "Transport", Sea, 3, None;
    MissileBattery = 18, "Surface-to-Air Missile", Ground, 0, None;
    BiologicalWeapons = 19, "Biological Weapons", Capability, 0, None;
    RodsFromGod = 20, "Rods from God", Capability, 0, None;
    AntiSatelliteMissiles = 21, "Anti-Satellite Missiles", Capability, 0, None;
    CommunicationsInterruption = 22, "Communications Interruption", Capability, 0, None;
    Insurgency = 23, "Insurgency", Capability, 0, None;
}

impl TryFrom<u16> for PieceKind {
    type Error = String;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        PieceKind::from_id(id).ok_or_else(|| format!("unknown type id {id}"))
    }
}

impl From<PieceKind> for u16 {
    fn from(kind: PieceKind) -> u16 {
        kind.id()
    }
}
