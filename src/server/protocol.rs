//! Wire protocol: JSON messages exchanged with clients over the WebSocket.
//!
//! Frames are internally tagged on `"type"`. Signaling payloads (session
//! descriptions, ICE candidates) are carried as opaque JSON values and
//! never interpreted by the server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::ConnectionId;
use super::rooms::RoomId;

/// Messages received from clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Request a partner; `interests` is a free-text comma-separated list.
    FindPartner { interests: String },
    /// Withdraw from the waiting pool.
    CancelSearch,
    /// Opaque peer-connection payload to relay to the room partner.
    Signal { payload: Value },
    /// Chat message to relay to the room partner.
    SendMessage { message: String },
    /// Leave the current room (or pool) but keep the connection open.
    ManualDisconnect,
}

/// Messages sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Sent once on connect so the client knows its own id.
    Connected { connection_id: ConnectionId },
    /// A partner was found; `interests` is the partner's original
    /// free-text interest string. Exactly one side is the initiator.
    PartnerFound {
        room_id: RoomId,
        interests: String,
        is_initiator: bool,
    },
    /// The room partner left or disconnected.
    PartnerDisconnected,
    /// Relayed signaling payload from the room partner.
    Signal { payload: Value },
    /// Relayed chat message from the room partner.
    Message { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_find_partner() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"find-partner","interests":"music, film"}"#).unwrap();

        assert_eq!(
            event,
            ClientEvent::FindPartner {
                interests: "music, film".to_string()
            }
        );
    }

    #[test]
    fn test_deserialize_signal_keeps_payload_opaque() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"signal","payload":{"sdp":{"kind":"offer","blob":"v=0"}}}"#,
        )
        .unwrap();

        let ClientEvent::Signal { payload } = event else {
            panic!("expected signal event");
        };
        assert_eq!(payload["sdp"]["kind"], "offer");
    }

    #[test]
    fn test_deserialize_events_without_payload() {
        assert_eq!(
            serde_json::from_str::<ClientEvent>(r#"{"type":"cancel-search"}"#).unwrap(),
            ClientEvent::CancelSearch
        );
        assert_eq!(
            serde_json::from_str::<ClientEvent>(r#"{"type":"manual-disconnect"}"#).unwrap(),
            ClientEvent::ManualDisconnect
        );
    }

    #[test]
    fn test_deserialize_unknown_type_is_rejected() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"type":"teleport"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_partner_found_uses_camel_case_fields() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let event = ServerEvent::PartnerFound {
            room_id: RoomId::derive(a, b),
            interests: "books".to_string(),
            is_initiator: true,
        };

        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "partner-found");
        assert_eq!(value["interests"], "books");
        assert_eq!(value["isInitiator"], json!(true));
        assert!(value["roomId"].is_string());
    }

    #[test]
    fn test_serialize_partner_disconnected() {
        let value = serde_json::to_value(&ServerEvent::PartnerDisconnected).unwrap();

        assert_eq!(value, json!({"type": "partner-disconnected"}));
    }
}
