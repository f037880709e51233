//! MessagePack framing for actions and results.

use crate::action::{ClientAction, ServerMessage};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Serialize a client action for network transmission
pub fn encode_client_action(action: &ClientAction) -> Result<Vec<u8>, ProtocolError> {
    Ok(rmp_serde::to_vec_named(action)?)
}

/// Deserialize a client action from network data
pub fn decode_client_action(data: &[u8]) -> Result<ClientAction, ProtocolError> {
    Ok(rmp_serde::from_slice(data)?)
}

/// Serialize a server message for network transmission
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    Ok(rmp_serde::to_vec_named(msg)?)
}

/// Deserialize a server message from network data
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    Ok(rmp_serde::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{PiecePlaceRequest, RedirectTag};
    use crate::ids::InvItemId;

    #[test]
    fn client_action_survives_the_wire() {
        let action = ClientAction::PiecePlace(PiecePlaceRequest {
            inv_item_id: Some(InvItemId(12)),
            selected_position: Some(40),
        });
        let data = encode_client_action(&action).unwrap();
        assert_eq!(decode_client_action(&data).unwrap(), action);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_client_action(&[0xc1, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn redirect_survives_the_wire() {
        let msg = ServerMessage::ServerRedirect(RedirectTag::BadRequest);
        let data = encode_server_message(&msg).unwrap();
        assert_eq!(decode_server_message(&data).unwrap(), msg);
    }
}
