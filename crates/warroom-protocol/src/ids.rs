//! Identifier and progression newtypes.
//!
//! Every id is a transparent wrapper so it serializes as the bare integer the
//! clients already use, while keeping session, team and item ids from being
//! mixed up on the server side.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Unique, immutable identity of one game session.
    SessionId(u64)
);
id_type!(
    /// Board position identifier.
    PositionId(u32)
);
id_type!(InvItemId(u64));
id_type!(ShopItemId(u64));
id_type!(PieceId(u64));
id_type!(NewsId(u64));

/// Number of teams in every session.
pub const TEAM_COUNT: usize = 2;

/// Number of controller slots per team.
pub const CONTROLLER_COUNT: usize = 4;

/// One of the two competing sides within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TeamId(u8);

impl TeamId {
    pub const ZERO: TeamId = TeamId(0);
    pub const ONE: TeamId = TeamId(1);

    /// Build a team id, rejecting anything outside `0..TEAM_COUNT`.
    pub const fn new(raw: u8) -> Option<Self> {
        if (raw as usize) < TEAM_COUNT {
            Some(Self(raw))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// The opposing team.
    pub const fn other(self) -> Self {
        Self(1 - self.0)
    }

    pub fn all() -> impl Iterator<Item = TeamId> {
        (0..TEAM_COUNT as u8).map(TeamId)
    }
}

impl TryFrom<u8> for TeamId {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        TeamId::new(raw).ok_or_else(|| format!("team id {raw} out of range"))
    }
}

impl From<TeamId> for u8 {
    fn from(team: TeamId) -> u8 {
        team.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A controller slot within a team. Slot 0 is the primary controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ControllerId(u8);

impl ControllerId {
    pub const PRIMARY: ControllerId = ControllerId(0);

    pub const fn new(raw: u8) -> Option<Self> {
        if (raw as usize) < CONTROLLER_COUNT {
            Some(Self(raw))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_primary(self) -> bool {
        self.0 == Self::PRIMARY.0
    }
}

impl TryFrom<u8> for ControllerId {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        ControllerId::new(raw).ok_or_else(|| format!("controller id {raw} out of range"))
    }
}

impl From<ControllerId> for u8 {
    fn from(controller: ControllerId) -> u8 {
        controller.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-level progression step of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phase(pub u32);

impl Phase {
    /// News is shown and purchases are made.
    pub const NEWS: Phase = Phase(0);
    pub const PURCHASE_CONFIRM: Phase = Phase(1);
    pub const CAPABILITY_PLACEMENT: Phase = Phase(2);
    pub const REINFORCEMENT_PLACEMENT: Phase = Phase(3);
    pub const COMBAT: Phase = Phase(4);
    pub const REFUEL: Phase = Phase(5);
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sub-step within a phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slice(pub u32);

impl Slice {
    pub const PLANNING: Slice = Slice(0);
    pub const EXECUTION: Slice = Slice(1);
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
