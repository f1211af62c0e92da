//! 방 관리 핸들러

use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

/// 빈 방 정리
///
/// 기본값으로는 켜져 있지 않다. 빈 방은 재접속을 위해 남겨 두고,
/// `ROOM_SWEEP_INTERVAL_SECS`를 설정한 경우에만 주기적으로 지운다.
pub async fn sweep_empty_rooms(state: &AppState) -> usize {
    let mut relay = state.relay.lock().await;
    let deleted = relay.purge_empty_rooms();

    if deleted > 0 {
        tracing::info!(
            deleted_rooms = deleted,
            remaining_rooms = relay.rooms().len(),
            "Cleanup completed"
        );
    }
    deleted
}

/// 방 정리 스케줄러
pub fn spawn_room_sweeper(state: Arc<AppState>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            sweep_empty_rooms(&state).await;
        }
    })
}
