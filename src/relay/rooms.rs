//! 방 테이블

use super::registry::ConnectionId;
use std::collections::HashMap;
use std::time::Instant;

/// 방 하나에 들어갈 수 있는 최대 인원
pub const ROOM_CAPACITY: usize = 2;

/// 방 참여 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinResult {
    /// 참여 순서상 위치 (0 = 먼저 들어온 플레이어)
    Joined(usize),
    RoomFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomPhase {
    #[default]
    Lobby,
    InGame,
}

/// 방 정보
///
/// 멤버는 두 칸짜리 슬롯에 참여 순서대로 저장된다. 앞 칸이 비면 뒤 칸이 당겨진다.
#[derive(Debug)]
pub struct Room {
    pub key: String,
    slots: [Option<ConnectionId>; ROOM_CAPACITY],
    pub phase: RoomPhase,
    pub created_at: Instant,
}

impl Room {
    pub fn new(key: String) -> Self {
        Self {
            key,
            slots: Default::default(),
            phase: RoomPhase::Lobby,
            created_at: Instant::now(),
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &ConnectionId> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.members().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.position_of(id).is_some()
    }

    fn position_of(&self, id: &ConnectionId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.as_ref() == Some(id))
    }

    fn insert(&mut self, id: ConnectionId) -> Option<usize> {
        let position = self.slots.iter().position(Option::is_none)?;
        self.slots[position] = Some(id);
        Some(position)
    }

    fn remove(&mut self, id: &ConnectionId) -> bool {
        let Some(position) = self.position_of(id) else {
            return false;
        };
        self.slots[position] = None;

        // 참여 순서 유지
        let remaining: Vec<ConnectionId> =
            self.slots.iter_mut().filter_map(Option::take).collect();
        for (slot, member) in self.slots.iter_mut().zip(remaining) {
            *slot = Some(member);
        }
        true
    }

    /// 방이 꽉 차 있고 `id`가 멤버일 때만 나머지 한 명을 돌려준다.
    pub fn opponent_of(&self, id: &ConnectionId) -> Option<&ConnectionId> {
        if self.len() != ROOM_CAPACITY || !self.contains(id) {
            return None;
        }
        self.members().find(|member| *member != id)
    }
}

/// 방 키 → 방
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<String, Room>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 처음 보는 키면 방을 만든다. 꽉 찬 방은 건드리지 않는다.
    pub fn join(&mut self, key: &str, id: &ConnectionId) -> JoinResult {
        let room = self.rooms.entry(key.to_string()).or_insert_with(|| {
            tracing::info!(room_key = %key, "Room created");
            Room::new(key.to_string())
        });

        if let Some(position) = room.position_of(id) {
            return JoinResult::Joined(position);
        }

        match room.insert(id.clone()) {
            Some(position) => JoinResult::Joined(position),
            None => JoinResult::RoomFull,
        }
    }

    pub fn opponent_of(&self, key: &str, id: &ConnectionId) -> Option<ConnectionId> {
        self.rooms.get(key)?.opponent_of(id).cloned()
    }

    /// 남은 멤버 목록을 돌려준다. 멤버가 아니면 아무것도 바꾸지 않는다.
    pub fn leave(&mut self, key: &str, id: &ConnectionId) -> Vec<ConnectionId> {
        let Some(room) = self.rooms.get_mut(key) else {
            return Vec::new();
        };
        if room.remove(id) {
            room.phase = RoomPhase::Lobby;
        }
        room.members().cloned().collect()
    }

    pub fn size(&self, key: &str) -> usize {
        self.rooms.get(key).map_or(0, Room::len)
    }

    pub fn members(&self, key: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(key)
            .map(|room| room.members().cloned().collect())
            .unwrap_or_default()
    }

    pub fn phase(&self, key: &str) -> Option<RoomPhase> {
        self.rooms.get(key).map(|room| room.phase)
    }

    pub fn set_phase(&mut self, key: &str, phase: RoomPhase) {
        if let Some(room) = self.rooms.get_mut(key) {
            room.phase = phase;
        }
    }

    /// 추적 중인 방 개수 (빈 방 포함)
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// 빈 방 정리
    pub fn purge_empty(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|_, room| {
            if room.is_empty() {
                let age_ms = room.created_at.elapsed().as_millis() as u64;
                tracing::debug!(room_key = %room.key, age_ms, "Purged empty room");
                false
            } else {
                true
            }
        });
        before - self.rooms.len()
    }
}
