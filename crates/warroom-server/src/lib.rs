//! Warroom authoritative server
//!
//! Session authority and action-validation pipeline for team-versus-team
//! sessions, served over Renet.

pub mod channels;
pub mod config;
pub mod context;
pub mod gateway;
pub mod handlers;
pub mod resources;
pub mod router;
pub mod seed;
pub mod session;
pub mod transport;

pub use channels::*;
pub use config::{BootstrapSession, ServerConfig};
pub use context::{encode_user_data, ClientId, ConnectionContext, ContextError};
pub use gateway::{ArmOutcome, Gateway, GatewayError, MemoryGateway, PlanInsert, SessionKey};
pub use handlers::{Audience, Delivery, Dispatcher, Rejection};
pub use router::{ConnectionRegistry, Outgoing, Router};
pub use seed::InitialSeed;
pub use session::{Game, SessionError, SessionSummary};
pub use transport::{ServerRunner, TransportConfig, PROTOCOL_ID};
