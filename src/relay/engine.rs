//! 릴레이 엔진
//!
//! 연결 하나의 인바운드 이벤트를 받아 방/레지스트리 상태를 바꾸고
//! 보내야 할 아웃바운드 메시지 목록을 돌려준다. I/O는 하지 않는다.

use super::registry::{ConnectionId, ConnectionRegistry};
use super::rooms::{JoinResult, RoomPhase, RoomTable, ROOM_CAPACITY};
use crate::error::JoinError;
use crate::protocol::{ClientMessage, ServerMessage};

/// 특정 연결로 보낼 메시지
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn new(to: ConnectionId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// 연결별 프로토콜 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    AwaitingOpponent,
    Paired,
    ReadyNegotiation,
    InGame,
    Disconnected,
}

/// 1~3줄 클리어는 한 줄 덜 보내고 4줄(테트리스)은 그대로 보낸다.
pub fn normalize_attack(lines: i64) -> i64 {
    if lines < 4 {
        lines.saturating_sub(1)
    } else {
        lines
    }
}

#[derive(Debug, Default)]
pub struct RelayEngine {
    rooms: RoomTable,
    connections: ConnectionRegistry,
}

impl RelayEngine {
    pub fn new() -> Self {
        Self {
            rooms: RoomTable::new(),
            connections: ConnectionRegistry::new(),
        }
    }

    pub fn connect(&mut self, id: ConnectionId) {
        self.connections.register(id);
    }

    pub fn handle(&mut self, from: &ConnectionId, message: ClientMessage) -> Vec<Outbound> {
        let event = message.name();
        match message {
            ClientMessage::Heartbeat => {
                vec![Outbound::new(from.clone(), ServerMessage::HeartbeatAck)]
            }
            ClientMessage::JoinRoom(key) => self.join(from, &key),
            ClientMessage::BoardUpdate(snapshot) => {
                self.relay_to_opponent(from, event, ServerMessage::BoardUpdate(snapshot))
            }
            ClientMessage::Attack(lines) => {
                self.relay_to_opponent(from, event, ServerMessage::Attack(normalize_attack(lines)))
            }
            ClientMessage::Chat(text) => {
                self.relay_to_opponent(from, event, ServerMessage::Chat(text))
            }
            ClientMessage::GameOver => {
                let outbound = self.relay_to_opponent(from, event, ServerMessage::GameOver);
                if !outbound.is_empty() {
                    if let Some(key) = self.connections.room_of(from) {
                        self.rooms.set_phase(key, RoomPhase::Lobby);
                    }
                }
                outbound
            }
            ClientMessage::Ready => self.ready(from),
            ClientMessage::CancelReady => {
                self.connections.set_ready(from, false);
                Vec::new()
            }
        }
    }

    /// 남은 멤버에게 `not-enough-players`를 보낸다. 방은 지우지 않는다.
    pub fn disconnect(&mut self, id: &ConnectionId) -> Vec<Outbound> {
        let Some(entry) = self.connections.unregister(id) else {
            return Vec::new();
        };
        let connected_ms = entry.connected_at.elapsed().as_millis() as u64;

        let Some(room_key) = entry.room_key else {
            tracing::debug!(peer_id = %id, connected_ms, "Connection closed without room");
            return Vec::new();
        };

        let remaining = self.rooms.leave(&room_key, id);
        tracing::info!(
            peer_id = %id,
            room_key = %room_key,
            remaining = remaining.len(),
            connected_ms,
            "User left room"
        );

        remaining
            .into_iter()
            .map(|member| Outbound::new(member, ServerMessage::NotEnoughPlayers))
            .collect()
    }

    pub fn state_of(&self, id: &ConnectionId) -> ConnectionState {
        if !self.connections.contains(id) {
            return ConnectionState::Disconnected;
        }
        let Some(room_key) = self.connections.room_of(id) else {
            return ConnectionState::Connected;
        };
        if self.rooms.size(room_key) < ROOM_CAPACITY {
            return ConnectionState::AwaitingOpponent;
        }
        if self.rooms.phase(room_key) == Some(RoomPhase::InGame) {
            ConnectionState::InGame
        } else if self.connections.is_ready(id) {
            ConnectionState::ReadyNegotiation
        } else {
            ConnectionState::Paired
        }
    }

    #[cfg(test)]
    pub fn is_ready(&self, id: &ConnectionId) -> bool {
        self.connections.is_ready(id)
    }

    pub fn rooms(&self) -> &RoomTable {
        &self.rooms
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn purge_empty_rooms(&mut self) -> usize {
        self.rooms.purge_empty()
    }

    fn join(&mut self, from: &ConnectionId, key: &str) -> Vec<Outbound> {
        match self.try_join(from, key) {
            Ok(outbound) => outbound,
            Err(JoinError::RoomFull { key }) => {
                tracing::warn!(peer_id = %from, room_key = %key, "Room full, rejected join");
                vec![Outbound::new(from.clone(), ServerMessage::FullRoom)]
            }
            Err(err) => {
                tracing::warn!(peer_id = %from, error = %err, "Join ignored");
                Vec::new()
            }
        }
    }

    fn try_join(&mut self, from: &ConnectionId, key: &str) -> Result<Vec<Outbound>, JoinError> {
        if key.is_empty() {
            return Err(JoinError::EmptyKey);
        }
        if !self.connections.contains(from) {
            tracing::debug!(peer_id = %from, "Join from unknown connection dropped");
            return Ok(Vec::new());
        }
        if let Some(existing) = self.connections.room_of(from) {
            return Err(JoinError::AlreadyInRoom {
                key: existing.to_string(),
            });
        }

        let position = match self.rooms.join(key, from) {
            JoinResult::Joined(position) => position,
            JoinResult::RoomFull => {
                return Err(JoinError::RoomFull {
                    key: key.to_string(),
                })
            }
        };
        self.connections.assign_room(from, key);

        let mut outbound = vec![Outbound::new(from.clone(), ServerMessage::JoinedRoom)];
        if let Some(opponent) = self.rooms.opponent_of(key, from) {
            outbound.push(Outbound::new(opponent, ServerMessage::OpponentJoined));
        }

        let members = self.rooms.members(key);
        if members.len() == ROOM_CAPACITY {
            outbound.extend(
                members
                    .into_iter()
                    .map(|member| Outbound::new(member, ServerMessage::EnoughPlayers)),
            );
        }

        tracing::info!(
            peer_id = %from,
            room_key = %key,
            position,
            user_count = self.rooms.size(key),
            "User joined room"
        );
        Ok(outbound)
    }

    fn ready(&mut self, from: &ConnectionId) -> Vec<Outbound> {
        let Some(room_key) = self.connections.room_of(from).map(str::to_owned) else {
            tracing::debug!(peer_id = %from, "Ready without room dropped");
            return Vec::new();
        };
        let members = self.rooms.members(&room_key);
        if members.len() < ROOM_CAPACITY {
            tracing::debug!(
                peer_id = %from,
                room_key = %room_key,
                "Ready without opponent dropped"
            );
            return Vec::new();
        }

        self.connections.set_ready(from, true);
        if !members.iter().all(|member| self.connections.is_ready(member)) {
            return Vec::new();
        }

        for member in &members {
            self.connections.set_ready(member, false);
        }
        self.rooms.set_phase(&room_key, RoomPhase::InGame);
        tracing::info!(room_key = %room_key, "Game started");

        members
            .into_iter()
            .map(|member| Outbound::new(member, ServerMessage::GameStart))
            .collect()
    }

    fn opponent(&self, from: &ConnectionId) -> Option<ConnectionId> {
        let room_key = self.connections.room_of(from)?;
        self.rooms.opponent_of(room_key, from)
    }

    fn relay_to_opponent(
        &self,
        from: &ConnectionId,
        event: &'static str,
        message: ServerMessage,
    ) -> Vec<Outbound> {
        match self.opponent(from) {
            Some(opponent) => {
                tracing::debug!(from = %from, to = %opponent, event, "Relayed event");
                vec![Outbound::new(opponent, message)]
            }
            None => {
                tracing::debug!(from = %from, event, "No opponent, event dropped");
                Vec::new()
            }
        }
    }
}
