//! 연결별 송신 채널 관리

use crate::protocol::ServerMessage;
use crate::relay::{ConnectionId, Outbound};
use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;

/// 릴레이 엔진이 만든 메시지를 실제 연결로 보내는 쪽
pub trait Transport {
    /// 연결이 없거나 닫혔으면 `false`
    fn send(&self, to: &ConnectionId, message: ServerMessage) -> bool;

    fn deliver(&self, outbound: Vec<Outbound>) {
        for Outbound { to, message } in outbound {
            if !self.send(&to, message) {
                tracing::debug!(target_peer = %to, "Outbound message dropped, peer gone");
            }
        }
    }
}

/// 피어 ID → 송신 채널
#[derive(Default)]
pub struct PeerDirectory {
    peers: DashMap<ConnectionId, UnboundedSender<ServerMessage>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, id: ConnectionId, sender: UnboundedSender<ServerMessage>) {
        self.peers.insert(id, sender);
    }

    pub fn detach(&self, id: &ConnectionId) {
        self.peers.remove(id);
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }
}

impl Transport for PeerDirectory {
    fn send(&self, to: &ConnectionId, message: ServerMessage) -> bool {
        match self.peers.get(to) {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn delivers_to_addressed_peer_only() {
        let directory = PeerDirectory::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (a, b) = (ConnectionId::from("a"), ConnectionId::from("b"));
        directory.attach(a.clone(), tx_a);
        directory.attach(b.clone(), tx_b);

        directory.deliver(vec![
            Outbound::new(b.clone(), ServerMessage::Attack(1)),
            Outbound::new(b.clone(), ServerMessage::GameOver),
        ]);

        assert_eq!(rx_b.recv().await, Some(ServerMessage::Attack(1)));
        assert_eq!(rx_b.recv().await, Some(ServerMessage::GameOver));
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn send_to_detached_or_closed_peer_fails() {
        let directory = PeerDirectory::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let a = ConnectionId::from("a");
        directory.attach(a.clone(), tx);

        drop(rx);
        assert!(!directory.send(&a, ServerMessage::GameStart));

        directory.detach(&a);
        assert_eq!(directory.len(), 0);
        assert!(!directory.send(&a, ServerMessage::GameStart));
    }
}
