//! 릴레이 에러 정의

use thiserror::Error;

/// 방 참여 실패 사유
///
/// `RoomFull`만 클라이언트에게 `full-room`으로 전달되고 나머지는 로그 후 무시된다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("room {key} is full")]
    RoomFull { key: String },

    #[error("connection already joined room {key}")]
    AlreadyInRoom { key: String },

    #[error("room key is empty")]
    EmptyKey,
}
