//! Transport layer using renet_netcode for UDP communication.
//!
//! Handles socket binding, authentication, and packet routing.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use renet::RenetServer;
use renet_netcode::{NetcodeServerTransport, ServerAuthentication, ServerConfig};
use tracing::{error, info};

use crate::context::{ClientId, USER_DATA_BYTES};

/// Protocol ID for Warroom (must match client)
pub const PROTOCOL_ID: u64 = 0x5741_5252_4F4F_4D01;

pub struct TransportConfig {
    pub public_address: SocketAddr,
    pub max_clients: usize,
    /// Secure authentication key shared with the login service.
    /// If None, uses unsecure authentication (for development)
    pub private_key: Option<[u8; 32]>,
}

pub fn create_server_transport(
    config: TransportConfig,
) -> Result<NetcodeServerTransport, TransportError> {
    let socket = UdpSocket::bind(config.public_address)
        .map_err(|e| TransportError::BindFailed(config.public_address, e))?;

    let bound_addr = socket
        .local_addr()
        .map_err(|e| TransportError::LocalAddrFailed(config.public_address, e))?;

    socket
        .set_nonblocking(true)
        .map_err(TransportError::SocketConfig)?;

    let authentication = match config.private_key {
        Some(key) => ServerAuthentication::Secure { private_key: key },
        None => ServerAuthentication::Unsecure,
    };

    let server_config = ServerConfig {
        current_time: now()?,
        max_clients: config.max_clients,
        protocol_id: PROTOCOL_ID,
        public_addresses: vec![bound_addr],
        authentication,
    };

    let transport = NetcodeServerTransport::new(server_config, socket)
        .map_err(|e| TransportError::TransportCreation(e.to_string()))?;

    info!(
        "Transport bound to {} (max {} clients, protocol {:016x})",
        bound_addr, config.max_clients, PROTOCOL_ID
    );

    Ok(transport)
}

fn now() -> Result<Duration, TransportError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TransportError::Clock)
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to bind socket to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("Failed to determine bound address for {0}: {1}")]
    LocalAddrFailed(SocketAddr, std::io::Error),

    #[error("Failed to configure socket: {0}")]
    SocketConfig(std::io::Error),

    #[error("Failed to create transport: {0}")]
    TransportCreation(String),

    #[error("System clock is before the unix epoch")]
    Clock,
}

/// Owns the netcode transport. The loop calls [`ServerRunner::receive`]
/// before processing events and [`ServerRunner::send`] after queuing replies.
pub struct ServerRunner {
    transport: NetcodeServerTransport,
}

impl ServerRunner {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let transport = create_server_transport(config)?;
        Ok(Self { transport })
    }

    /// Receive packets from the network into renet
    pub fn receive(&mut self, renet_server: &mut RenetServer) {
        let current_time = match now() {
            Ok(time) => time,
            Err(e) => {
                error!("Transport update skipped: {}", e);
                return;
            }
        };
        if let Err(e) = self.transport.update(current_time, renet_server) {
            error!("Transport update error: {}", e);
        }
    }

    /// Send queued renet packets to the network
    pub fn send(&mut self, renet_server: &mut RenetServer) {
        self.transport.send_packets(renet_server);
    }

    /// Connect-token user data of a connected client.
    pub fn user_data(&self, client_id: ClientId) -> Option<[u8; USER_DATA_BYTES]> {
        self.transport.user_data(client_id)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.addresses().first().copied()
    }
}
