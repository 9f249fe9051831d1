//! InMemory SessionStore 実装
//!
//! ドメイン層が定義する `SessionStore` trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! - コードスナップショット: Room ごとに最新の1件のみ保持
//! - チャット履歴: Room ごとに最大 `history_capacity` 件まで保持

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tandem_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, CodeSnapshot, RoomId, SessionStore, StoreError};

#[derive(Debug, Default)]
struct StoreState {
    snapshots: HashMap<RoomId, CodeSnapshot>,
    histories: HashMap<RoomId, Vec<ChatMessage>>,
}

/// インメモリ SessionStore 実装
pub struct InMemorySessionStore {
    state: Mutex<StoreState>,
    /// Room ごとのチャット履歴の上限
    history_capacity: usize,
    /// スナップショットの更新時刻に使う時計
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    /// 新しい InMemorySessionStore を作成
    pub fn new(history_capacity: usize) -> Self {
        Self::with_clock(history_capacity, Arc::new(SystemClock))
    }

    /// 時計を指定して InMemorySessionStore を作成（テスト用）
    pub fn with_clock(history_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            history_capacity,
            clock,
        }
    }

    /// Room の最新のコードスナップショットを取得
    pub async fn code_snapshot(&self, room_id: &RoomId) -> Option<CodeSnapshot> {
        let state = self.state.lock().await;
        state.snapshots.get(room_id).cloned()
    }

    /// Room のチャット履歴を古い順に取得
    pub async fn chat_history(&self, room_id: &RoomId) -> Vec<ChatMessage> {
        let state = self.state.lock().await;
        state.histories.get(room_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_code_snapshot(
        &self,
        room_id: RoomId,
        code: String,
        language: String,
    ) -> Result<(), StoreError> {
        let snapshot = CodeSnapshot {
            room_id: room_id.clone(),
            code,
            language,
            updated_at: self.clock.now(),
        };

        let mut state = self.state.lock().await;
        state.snapshots.insert(room_id, snapshot);
        Ok(())
    }

    async fn append_chat_message(&self, message: ChatMessage) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let history = state.histories.entry(message.room_id.clone()).or_default();

        if history.len() >= self.history_capacity {
            return Err(StoreError::HistoryCapacityExceeded {
                room_id: message.room_id.into_string(),
                capacity: self.history_capacity,
            });
        }

        history.push(message);
        Ok(())
    }
}
