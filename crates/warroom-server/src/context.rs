//! Trusted per-connection context.
//!
//! The login service issues a netcode connect token whose private user data
//! names the session, team and controller slot. The server decodes it once
//! when the client connects; handlers only ever see the decoded value.
//!
//! Layout: byte 0 format version, bytes 1..9 session id (little endian),
//! byte 9 team, byte 10 controller. The rest is zero.

use warroom_protocol::{ControllerId, SessionId, TeamId};

/// Renet client identity.
pub type ClientId = u64;

/// Size of the netcode connect-token user data.
pub const USER_DATA_BYTES: usize = 256;

const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("unsupported user data version {0}")]
    UnsupportedVersion(u8),
    #[error("team {0} out of range")]
    InvalidTeam(u8),
    #[error("controller {0} out of range")]
    InvalidController(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionContext {
    pub client_id: ClientId,
    pub session: SessionId,
    pub team: TeamId,
    pub controller: ControllerId,
}

impl ConnectionContext {
    pub fn from_user_data(
        client_id: ClientId,
        data: &[u8; USER_DATA_BYTES],
    ) -> Result<Self, ContextError> {
        if data[0] != FORMAT_VERSION {
            return Err(ContextError::UnsupportedVersion(data[0]));
        }
        let mut session = [0u8; 8];
        session.copy_from_slice(&data[1..9]);
        let team = TeamId::new(data[9]).ok_or(ContextError::InvalidTeam(data[9]))?;
        let controller =
            ControllerId::new(data[10]).ok_or(ContextError::InvalidController(data[10]))?;

        Ok(Self {
            client_id,
            session: SessionId(u64::from_le_bytes(session)),
            team,
            controller,
        })
    }

    /// Same session and same team.
    pub fn is_teammate_of(&self, other: &ConnectionContext) -> bool {
        self.session == other.session && self.team == other.team
    }
}

/// Build the user data a login service embeds in a connect token.
pub fn encode_user_data(
    session: SessionId,
    team: TeamId,
    controller: ControllerId,
) -> [u8; USER_DATA_BYTES] {
    let mut data = [0u8; USER_DATA_BYTES];
    data[0] = FORMAT_VERSION;
    data[1..9].copy_from_slice(&session.0.to_le_bytes());
    data[9] = team.raw();
    data[10] = controller.raw();
    data
}
