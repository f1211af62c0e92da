//! 클라이언트-서버 메시지 프로토콜 정의
//!
//! 모든 프레임은 `{"type": "<event-name>", "payload": <value>}` 형태의 JSON 텍스트다.
//! 페이로드가 없는 이벤트는 `payload` 키를 생략한다.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 클라이언트 → 서버 메시지
///
/// 페이로드가 없는 이벤트(`ready`, `cancel-ready` 등)는 함께 온 `payload`를 무시한다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    // Connection
    Heartbeat,

    // Room Management
    JoinRoom(String),

    // Gameplay Relay
    /// 보드 스냅샷. 서버는 내용을 해석하지 않는다.
    BoardUpdate(Value),
    /// 클리어한 줄 수
    Attack(i64),
    Chat(String),
    GameOver,

    // Ready Negotiation
    Ready,
    CancelReady,
}

impl ClientMessage {
    /// 로그용 이벤트 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::JoinRoom(_) => "join-room",
            Self::BoardUpdate(_) => "board-update",
            Self::Attack(_) => "attack",
            Self::Chat(_) => "chat",
            Self::GameOver => "game-over",
            Self::Ready => "ready",
            Self::CancelReady => "cancel-ready",
        }
    }
}

/// 디코딩 전 원시 프레임
#[derive(Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl TryFrom<Frame> for ClientMessage {
    type Error = String;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        fn payload<T: de::DeserializeOwned>(kind: &str, value: Value) -> Result<T, String> {
            serde_json::from_value(value)
                .map_err(|err| format!("invalid `{kind}` payload: {err}"))
        }

        let Frame { kind, payload: value } = frame;
        let message = match kind.as_str() {
            "heartbeat" => Self::Heartbeat,
            "join-room" => Self::JoinRoom(payload(&kind, value)?),
            "board-update" => Self::BoardUpdate(value),
            "attack" => Self::Attack(payload(&kind, value)?),
            "chat" => Self::Chat(payload(&kind, value)?),
            "game-over" => Self::GameOver,
            "ready" => Self::Ready,
            "cancel-ready" => Self::CancelReady,
            other => return Err(format!("unknown event `{other}`")),
        };
        Ok(message)
    }
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let frame = Frame::deserialize(deserializer)?;
        Self::try_from(frame).map_err(de::Error::custom)
    }
}

/// 서버 → 클라이언트 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    // Connection
    Connected { socket_id: String },
    HeartbeatAck,
    Error { code: String, message: String },

    // Room Events
    JoinedRoom,
    OpponentJoined,
    FullRoom,
    EnoughPlayers,
    NotEnoughPlayers,

    // Gameplay Relay
    BoardUpdate(Value),
    Attack(i64),
    Chat(String),
    GameStart,
    GameOver,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_payload_less_events() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ready"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ready);

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"cancel-ready"}"#).unwrap();
        assert_eq!(msg, ClientMessage::CancelReady);
    }

    #[test]
    fn payload_on_payload_less_events_is_ignored() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"ready","payload":true}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ready);

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"cancel-ready","payload":false}"#).unwrap();
        assert_eq!(msg, ClientMessage::CancelReady);

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"game-over","payload":null}"#).unwrap();
        assert_eq!(msg, ClientMessage::GameOver);
    }

    #[test]
    fn decodes_events_with_payload() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join-room","payload":" abc123 "}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinRoom(" abc123 ".to_string()));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"attack","payload":3}"#).unwrap();
        assert_eq!(msg, ClientMessage::Attack(3));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"chat","payload":"gg"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Chat("gg".to_string()));
    }

    #[test]
    fn rejects_missing_or_mistyped_payload() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"join-room"}"#).is_err());
        assert!(
            serde_json::from_str::<ClientMessage>(r#"{"type":"attack","payload":"two"}"#).is_err()
        );
    }

    #[test]
    fn board_snapshot_passes_through_untouched() {
        let grid = json!([[0, 1, 0], ["I", null, "T"]]);
        let frame = json!({ "type": "board-update", "payload": grid.clone() }).to_string();

        let msg: ClientMessage = serde_json::from_str(&frame).unwrap();
        assert_eq!(msg, ClientMessage::BoardUpdate(grid.clone()));

        let out = serde_json::to_value(ServerMessage::BoardUpdate(grid.clone())).unwrap();
        assert_eq!(out, json!({ "type": "board-update", "payload": grid }));
    }

    #[test]
    fn encodes_server_events_in_kebab_case() {
        let out = serde_json::to_value(ServerMessage::NotEnoughPlayers).unwrap();
        assert_eq!(out, json!({ "type": "not-enough-players" }));

        let out = serde_json::to_value(ServerMessage::Connected {
            socket_id: "peer-1".to_string(),
        })
        .unwrap();
        assert_eq!(
            out,
            json!({ "type": "connected", "payload": { "socket_id": "peer-1" } })
        );
    }

    #[test]
    fn rejects_unknown_events() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"offer"}"#).is_err());
        let legacy = r#"{"type":"send-lines","payload":2}"#;
        assert!(serde_json::from_str::<ClientMessage>(legacy).is_err());
    }
}
