//! UseCase: 参加者切断処理
//!
//! 接続の終了を Registry に伝えるだけのユースケース。
//! 退出通知（猶予期間、user_left、user_list）は Registry が受け持つ。

use std::sync::Arc;

use crate::domain::{ConnectionIdentity, PresenceRegistry};

use super::error::DisconnectError;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// PresenceRegistry（在室管理の抽象化）
    registry: Arc<dyn PresenceRegistry>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn PresenceRegistry>) -> Self {
        Self { registry }
    }

    /// 参加者切断を実行
    ///
    /// 既に Registry から外れている接続（送信キューが溢れて切断された等）でも
    /// 成功として扱う。
    pub async fn execute(&self, identity: ConnectionIdentity) -> Result<(), DisconnectError> {
        self.registry.unregister(identity).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ConnectionIdFactory, MockPresenceRegistry, RegistryError, RoomId, UserId, Username,
    };

    fn identity() -> ConnectionIdentity {
        ConnectionIdentity::new(
            ConnectionIdFactory::generate(),
            UserId::new("alice".to_string()).unwrap(),
            Username::new("Alice".to_string()).unwrap(),
            RoomId::new("r1".to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_disconnect_unregisters_connection() {
        // テスト項目: 切断した接続が Registry から登録解除される
        // given (前提条件):
        let identity = identity();
        let expected = identity.clone();
        let mut registry = MockPresenceRegistry::new();
        registry
            .expect_unregister()
            .withf(move |actual| *actual == expected)
            .times(1)
            .returning(|_| Ok(()));
        let usecase = DisconnectParticipantUseCase::new(Arc::new(registry));

        // when (操作):
        let result = usecase.execute(identity).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_fails_when_coordinator_stopped() {
        // テスト項目: coordinator が停止しているとエラーが返る
        // given (前提条件):
        let mut registry = MockPresenceRegistry::new();
        registry
            .expect_unregister()
            .returning(|_| Err(RegistryError::CoordinatorUnavailable));
        let usecase = DisconnectParticipantUseCase::new(Arc::new(registry));

        // when (操作):
        let result = usecase.execute(identity()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DisconnectError::Registry(
                RegistryError::CoordinatorUnavailable
            ))
        );
    }
}
