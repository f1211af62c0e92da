//! 애플리케이션 상태 관리

use crate::config::Config;
use crate::leaderboard::{InMemoryLeaderboard, Leaderboard};
use crate::relay::RelayEngine;
use crate::transport::PeerDirectory;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 전역 애플리케이션 상태
pub struct AppState {
    /// 방/연결 테이블. 모든 변경은 이 락 하나를 거친다.
    pub relay: Mutex<RelayEngine>,
    /// 피어 송신 채널 (peer_id -> sender)
    pub peers: PeerDirectory,
    pub leaderboard: Arc<dyn Leaderboard>,
    /// 설정
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let leaderboard = Arc::new(InMemoryLeaderboard::new(
            config.leaderboard.channel_capacity,
        ));
        Self {
            relay: Mutex::new(RelayEngine::new()),
            peers: PeerDirectory::new(),
            leaderboard,
            config: Arc::new(config),
        }
    }
}
