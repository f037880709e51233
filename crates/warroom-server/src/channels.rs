//! Renet channel configuration.
//!
//! Channel 0: ReliableOrdered - Action results, redirects, resync snapshots
//! Channel 1: ReliableUnordered - User feedback

use std::time::Duration;

use renet::ChannelConfig;

use warroom_protocol::{MessageClass, ServerMessage};

/// Channel IDs for different message types
pub mod channel_id {
    /// Client actions inbound; results, redirects and snapshots outbound
    pub const ACTIONS: u8 = 0;
    /// Inline feedback - reliable but order does not matter
    pub const FEEDBACK: u8 = 1;
}

/// Maximum bytes per channel
const MAX_CHANNEL_MEMORY: usize = 5 * 1024 * 1024; // 5 MB

pub fn create_channel_configs() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig {
            channel_id: channel_id::ACTIONS,
            max_memory_usage_bytes: MAX_CHANNEL_MEMORY,
            send_type: renet::SendType::ReliableOrdered {
                resend_time: Duration::from_millis(300),
            },
        },
        ChannelConfig {
            channel_id: channel_id::FEEDBACK,
            max_memory_usage_bytes: MAX_CHANNEL_MEMORY / 4,
            send_type: renet::SendType::ReliableUnordered {
                resend_time: Duration::from_millis(300),
            },
        },
    ]
}

/// Redirects share the ordered channel so they never overtake the result
/// they invalidate.
pub fn channel_for(message: &ServerMessage) -> u8 {
    match message.class() {
        MessageClass::Feedback => channel_id::FEEDBACK,
        MessageClass::Result | MessageClass::Redirect => channel_id::ACTIONS,
    }
}
