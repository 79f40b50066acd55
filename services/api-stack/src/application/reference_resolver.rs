/// 参照リゾルバー
///
/// 名前空間・ステージ・リソース種類からレジストリキーを組み立て、
/// Parameter Storeから既存リソースのARNを取得する。
/// リソースの作成や変更は行わず、ハンドルを取り込むだけ。
use tracing::{error, info};

use super::stack_error::StackError;
use crate::domain::{ResolvedReferences, ResourceKind, ResourceReference, Stage};
use crate::infrastructure::{ParameterStore, ParameterStoreError};

pub struct ReferenceResolver<P>
where
    P: ParameterStore,
{
    store: P,
}

impl<P> ReferenceResolver<P>
where
    P: ParameterStore,
{
    pub fn new(store: P) -> Self {
        Self { store }
    }

    /// 1種類のリソースを解決する
    ///
    /// # エラー
    /// * `InvalidDeclaration` - 名前空間が空、または取得した値が期待するARNではない
    /// * `MissingReference` - キーが存在しない（再試行しない）
    /// * `Registry` - Parameter Store呼び出しの失敗
    pub async fn resolve(
        &self,
        namespace: &str,
        stage: Stage,
        kind: ResourceKind,
    ) -> Result<ResourceReference, StackError> {
        if namespace.trim().is_empty() {
            return Err(StackError::InvalidDeclaration("名前空間が空です".to_string()));
        }

        let key = kind.registry_key(namespace, stage);
        info!(kind = %kind, key = %key, "参照を解決");

        let value = self.store.get_parameter(&key).await.map_err(|err| {
            error!(kind = %kind, key = %key, error = %err, "参照の解決に失敗");
            match err {
                ParameterStoreError::NotFound(_) => StackError::MissingReference { key: key.clone() },
                ParameterStoreError::AwsSdkError(message) => StackError::Registry(message),
            }
        })?;

        let reference = ResourceReference::new(kind, key.as_str(), &value).map_err(|err| {
            StackError::InvalidDeclaration(format!("{} の値が不正です: {}", key, err))
        })?;

        info!(kind = %kind, key = %key, arn = %reference.arn(), "参照を解決しました");
        Ok(reference)
    }

    /// テーブルとメールキューを順に解決する
    pub async fn resolve_all(
        &self,
        namespace: &str,
        stage: Stage,
    ) -> Result<ResolvedReferences, StackError> {
        let table = self.resolve(namespace, stage, ResourceKind::Table).await?;
        let email_queue = self
            .resolve(namespace, stage, ResourceKind::EmailQueue)
            .await?;

        ResolvedReferences::new(table, email_queue).ok_or_else(|| {
            StackError::InvalidDeclaration("参照の種類が一致しません".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parameter_store::tests::MockParameterStore;

    const TABLE_ARN: &str = "arn:aws:dynamodb:ap-southeast-2:123456789012:table/acme-table-dev";
    const QUEUE_ARN: &str = "arn:aws:sqs:ap-southeast-2:123456789012:acme-email-queue-dev";

    fn populated_store() -> MockParameterStore {
        MockParameterStore::new()
            .with_parameter("acme-table-arn-dev", TABLE_ARN)
            .with_parameter("acme-email-queue-arn-dev", QUEUE_ARN)
    }

    #[tokio::test]
    async fn test_resolve_table_queries_exact_key() {
        let store = populated_store();
        let resolver = ReferenceResolver::new(store.clone());

        let reference = resolver
            .resolve("acme", Stage::Dev, ResourceKind::Table)
            .await
            .unwrap();

        assert_eq!(reference.arn().to_string(), TABLE_ARN);
        assert_eq!(reference.registry_key(), "acme-table-arn-dev");
        assert_eq!(store.requested_keys(), vec!["acme-table-arn-dev"]);
    }

    #[tokio::test]
    async fn test_resolve_all_queries_each_key_once() {
        let store = populated_store();
        let resolver = ReferenceResolver::new(store.clone());

        let references = resolver.resolve_all("acme", Stage::Dev).await.unwrap();

        assert_eq!(references.table_name(), "acme-table-dev");
        assert_eq!(references.email_queue_arn(), QUEUE_ARN);
        assert_eq!(
            store.requested_keys(),
            vec!["acme-table-arn-dev", "acme-email-queue-arn-dev"]
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_missing_reference() {
        let store = MockParameterStore::new().with_parameter("acme-table-arn-dev", TABLE_ARN);
        let resolver = ReferenceResolver::new(store.clone());

        let err = resolver.resolve_all("acme", Stage::Dev).await.unwrap_err();

        match err {
            StackError::MissingReference { key } => assert_eq!(key, "acme-email-queue-arn-dev"),
            other => panic!("Expected MissingReference, got {other:?}"),
        }
        // 再試行しない
        assert_eq!(store.requested_keys().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_table_stops_before_queue_lookup() {
        let store = MockParameterStore::new().with_parameter("acme-email-queue-arn-dev", QUEUE_ARN);
        let resolver = ReferenceResolver::new(store.clone());

        assert!(resolver.resolve_all("acme", Stage::Dev).await.is_err());
        assert_eq!(store.requested_keys(), vec!["acme-table-arn-dev"]);
    }

    #[tokio::test]
    async fn test_wrong_arn_is_invalid_declaration() {
        let store = MockParameterStore::new().with_parameter("acme-table-arn-dev", QUEUE_ARN);
        let resolver = ReferenceResolver::new(store);

        let err = resolver
            .resolve("acme", Stage::Dev, ResourceKind::Table)
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::InvalidDeclaration(msg) if msg.contains("acme-table-arn-dev")));
    }

    #[tokio::test]
    async fn test_registry_failure_is_propagated() {
        let resolver = ReferenceResolver::new(MockParameterStore::failing("throttled"));

        let err = resolver
            .resolve("acme", Stage::Prod, ResourceKind::EmailQueue)
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::Registry(msg) if msg == "throttled"));
    }

    #[tokio::test]
    async fn test_empty_namespace_is_rejected_without_lookup() {
        let store = populated_store();
        let resolver = ReferenceResolver::new(store.clone());

        let err = resolver
            .resolve("", Stage::Dev, ResourceKind::Table)
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::InvalidDeclaration(_)));
        assert!(store.requested_keys().is_empty());
    }
}
