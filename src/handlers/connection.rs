//! 연결 핸들러

use crate::protocol::{ClientMessage, ServerMessage};
use crate::relay::ConnectionId;
use crate::state::AppState;
use crate::transport::Transport;
use tokio::sync::mpsc::UnboundedSender;

/// 새 연결 처리
pub async fn handle_connection(
    state: &AppState,
    sender: UnboundedSender<ServerMessage>,
) -> ConnectionId {
    let peer_id = ConnectionId::new_v4();

    state.peers.attach(peer_id.clone(), sender.clone());
    state.relay.lock().await.connect(peer_id.clone());

    let _ = sender.send(ServerMessage::Connected {
        socket_id: peer_id.to_string(),
    });

    tracing::info!(peer_id = %peer_id, "New connection established");
    peer_id
}

/// 연결 해제 처리
pub async fn handle_disconnect(state: &AppState, peer_id: &ConnectionId) {
    state.peers.detach(peer_id);

    let mut relay = state.relay.lock().await;
    let outbound = relay.disconnect(peer_id);
    state.peers.deliver(outbound);
    drop(relay);

    tracing::info!(peer_id = %peer_id, "Connection closed");
}

/// 클라이언트 이벤트 처리
///
/// 전송도 릴레이 락을 잡은 채로 한다. 송신 채널은 블로킹하지 않으므로
/// 엔진이 처리한 순서 그대로 각 연결 큐에 들어간다.
pub async fn handle_client_message(state: &AppState, peer_id: &ConnectionId, msg: ClientMessage) {
    let event = msg.name();

    let mut relay = state.relay.lock().await;
    let outbound = relay.handle(peer_id, msg);
    tracing::trace!(
        peer_id = %peer_id,
        event,
        outbound = outbound.len(),
        state = ?relay.state_of(peer_id),
        "Event handled"
    );
    state.peers.deliver(outbound);
}

/// 해석할 수 없는 프레임. 연결은 유지한다.
pub fn handle_bad_frame(state: &AppState, peer_id: &ConnectionId, reason: &str) {
    tracing::warn!(peer_id = %peer_id, reason, "Undecodable message");
    state.peers.send(
        peer_id,
        ServerMessage::Error {
            code: "bad_message".to_string(),
            message: reason.to_string(),
        },
    );
}
