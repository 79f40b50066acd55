//! IAMポリシーステートメント
//!
//! 関数ごとの最小権限をアクション・リソースの組で表現する。

use serde::Serialize;

/// アクセス許可に使うIAMアクション名
pub mod actions {
    /// DynamoDB
    pub mod dynamodb {
        pub const PUT_ITEM: &str = "dynamodb:PutItem";
        pub const QUERY: &str = "dynamodb:Query";
        pub const DELETE_ITEM: &str = "dynamodb:DeleteItem";
    }

    /// Secrets Manager
    pub mod secrets_manager {
        pub const GET_SECRET_VALUE: &str = "secretsmanager:GetSecretValue";
    }

    /// SQS
    pub mod sqs {
        pub const SEND_MESSAGE: &str = "sqs:SendMessage";
    }
}

/// 許可（Allow）のみを表すポリシーステートメント
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    effect: &'static str,
    #[serde(rename = "Action")]
    actions: Vec<String>,
    #[serde(rename = "Resource")]
    resources: Vec<String>,
}

impl PolicyStatement {
    /// アクションとリソースの組から許可ステートメントを作成
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect: "Allow",
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }
}

/// IAMポリシードキュメント
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    version: &'static str,
    statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: "2012-10-17",
            statement,
        }
    }
}
