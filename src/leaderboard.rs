//! 리더보드 저장소
//!
//! 릴레이와는 무관하다. 점수 추가와 새 점수 구독만 제공한다.

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// 플레이어 이니셜
    pub label: String,
    pub score: i64,
}

pub trait Leaderboard: Send + Sync {
    fn append(&self, entry: ScoreEntry);

    /// 호출 이후에 추가되는 점수만 흘려보내는 무한 스트림. 기록을 다시 재생하지 않는다.
    fn subscribe_new_entries(&self) -> BoxStream<'static, ScoreEntry>;

    /// 높은 점수 순
    fn top(&self, limit: usize) -> Vec<ScoreEntry>;
}

pub struct InMemoryLeaderboard {
    entries: RwLock<Vec<ScoreEntry>>,
    tx: broadcast::Sender<ScoreEntry>,
}

impl InMemoryLeaderboard {
    pub fn new(channel_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity);
        Self {
            entries: RwLock::new(Vec::new()),
            tx,
        }
    }
}

impl Leaderboard for InMemoryLeaderboard {
    fn append(&self, entry: ScoreEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());

        // 구독자가 없으면 실패하지만 무시한다
        let _ = self.tx.send(entry);
    }

    fn subscribe_new_entries(&self) -> BoxStream<'static, ScoreEntry> {
        stream::unfold(self.tx.subscribe(), |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(entry) => return Some((entry, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Leaderboard subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }

    fn top(&self, limit: usize) -> Vec<ScoreEntry> {
        let mut entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(limit);
        entries
    }
}
