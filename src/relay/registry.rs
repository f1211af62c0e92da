//! 연결 레지스트리

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// 서버가 발급하는 연결 식별자
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 연결 하나의 상태
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub ready: bool,
    /// 처음 참여에 성공한 방. 한 번 정해지면 바뀌지 않는다.
    pub room_key: Option<String>,
    pub connected_at: Instant,
}

/// 살아있는 연결과 ready 플래그를 추적한다.
///
/// 방 정리는 하지 않는다. `unregister` 호출자가 `RoomTable::leave`까지 수행해야 한다.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: ConnectionId) {
        self.entries.insert(
            id,
            ConnectionEntry {
                ready: false,
                room_key: None,
                connected_at: Instant::now(),
            },
        );
    }

    /// 모르는 연결이면 아무것도 하지 않는다.
    pub fn set_ready(&mut self, id: &ConnectionId, value: bool) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.ready = value;
        }
    }

    pub fn is_ready(&self, id: &ConnectionId) -> bool {
        self.entries.get(id).is_some_and(|entry| entry.ready)
    }

    pub fn unregister(&mut self, id: &ConnectionId) -> Option<ConnectionEntry> {
        self.entries.remove(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn room_of(&self, id: &ConnectionId) -> Option<&str> {
        self.entries.get(id)?.room_key.as_deref()
    }

    pub fn assign_room(&mut self, id: &ConnectionId, key: &str) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.room_key = Some(key.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
