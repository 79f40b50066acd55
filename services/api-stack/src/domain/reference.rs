//! 外部リソース参照
//!
//! このスタックが所有しない既存リソース（テーブル、メールキュー）を、
//! Parameter Storeに登録されたARN経由で参照する。

use super::arn::{Arn, ArnError};
use super::stage::Stage;

/// 参照するリソースの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// 購読者を保存するDynamoDBテーブル
    Table,
    /// メール送信用SQSキュー
    EmailQueue,
}

impl ResourceKind {
    /// レジストリキーに埋め込むリソース名
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Table => "table",
            ResourceKind::EmailQueue => "email-queue",
        }
    }

    /// ARNに期待するサービス名
    pub fn service(&self) -> &'static str {
        match self {
            ResourceKind::Table => "dynamodb",
            ResourceKind::EmailQueue => "sqs",
        }
    }

    /// Parameter Storeのキーを組み立てる
    ///
    /// 形式: `<namespace>-<resource>-arn-<stage>`
    pub fn registry_key(&self, namespace: &str, stage: Stage) -> String {
        format!("{}-{}-arn-{}", namespace, self.as_str(), stage)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解決済みの外部リソース参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    kind: ResourceKind,
    registry_key: String,
    arn: Arn,
}

impl ResourceReference {
    /// レジストリから取得した値を検証して参照を作成する
    ///
    /// 種類に応じたサービスのARNであり、テーブル名やキューURLを
    /// 導出できる形であることを確認する。
    pub fn new(
        kind: ResourceKind,
        registry_key: impl Into<String>,
        value: &str,
    ) -> Result<Self, ArnError> {
        let arn = Arn::parse(value.trim())?.expect_service(kind.service())?;
        match kind {
            ResourceKind::Table => {
                arn.dynamodb_table_name()?;
            }
            ResourceKind::EmailQueue => {
                arn.sqs_queue_url()?;
            }
        }

        Ok(Self {
            kind,
            registry_key: registry_key.into(),
            arn,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// 参照解決に使用したキー
    pub fn registry_key(&self) -> &str {
        &self.registry_key
    }

    pub fn arn(&self) -> &Arn {
        &self.arn
    }
}

/// テーブルとメールキューの解決結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReferences {
    table: ResourceReference,
    email_queue: ResourceReference,
}

impl ResolvedReferences {
    /// 種類が一致しない組み合わせは受け付けない
    pub fn new(table: ResourceReference, email_queue: ResourceReference) -> Option<Self> {
        (table.kind() == ResourceKind::Table && email_queue.kind() == ResourceKind::EmailQueue)
            .then_some(Self { table, email_queue })
    }

    pub fn table(&self) -> &ResourceReference {
        &self.table
    }

    pub fn email_queue(&self) -> &ResourceReference {
        &self.email_queue
    }

    pub fn table_arn(&self) -> String {
        self.table.arn.to_string()
    }

    /// インデックスを含むテーブルARN（`<table ARN>/index/*`）
    pub fn table_index_arn(&self) -> String {
        format!("{}/index/*", self.table.arn)
    }

    pub fn table_name(&self) -> &str {
        // 構築時に検証済み
        self.table.arn.dynamodb_table_name().unwrap_or_default()
    }

    pub fn email_queue_arn(&self) -> String {
        self.email_queue.arn.to_string()
    }

    pub fn email_queue_url(&self) -> String {
        self.email_queue.arn.sqs_queue_url().unwrap_or_default()
    }
}
