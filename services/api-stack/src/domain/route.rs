//! APIルート定義
//!
//! 各ルートのメソッド、パス、関数エントリ、環境変数、アクセス許可を
//! テーブルとして保持する。環境変数と許可は記号的な参照で記述し、
//! 合成時に解決済みの値へ束縛する。

use thiserror::Error;

use super::http_method::HttpMethod;
use super::iam::{actions, PolicyStatement};

/// ルート定義の不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteInvariantError {
    /// 環境変数で参照していないリソースへの許可
    #[error("ルート {route}: {target:?} への許可に対応する環境変数 {required} がありません")]
    GrantWithoutEnvironment {
        route: &'static str,
        target: GrantTarget,
        required: &'static str,
    },
    /// 同じ環境変数キーが重複している
    #[error("ルート {route}: 環境変数 {key} が重複しています")]
    DuplicateEnvironmentKey { route: &'static str, key: &'static str },
    /// 同じメソッド・パスの組が重複している
    #[error("ルート {method} /{path} が重複しています")]
    DuplicateRoute { method: HttpMethod, path: &'static str },
}

/// 環境変数の値の出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvSource {
    Stage,
    AdminTo,
    AdminFrom,
    ConfigSecretArn,
    EmailQueueUrl,
    TableName,
}

impl EnvSource {
    /// 関数に渡す環境変数名
    pub fn key(&self) -> &'static str {
        match self {
            EnvSource::Stage => "STAGE",
            EnvSource::AdminTo => "ADMIN_TO",
            EnvSource::AdminFrom => "ADMIN_FROM",
            EnvSource::ConfigSecretArn => "CONFIG_SECRET_ARN",
            EnvSource::EmailQueueUrl => "EMAIL_QUEUE_URL",
            EnvSource::TableName => "TABLE_NAME",
        }
    }
}

/// アクセス許可の対象リソース
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantTarget {
    /// 関数設定シークレット
    ConfigSecret,
    /// 購読テーブル
    Table,
    /// 購読テーブルのセカンダリインデックス（`/index/*`）
    TableIndexes,
    /// メール送信キュー
    EmailQueue,
}

impl GrantTarget {
    /// 許可対象を参照している必要がある環境変数
    pub fn required_env(&self) -> EnvSource {
        match self {
            GrantTarget::ConfigSecret => EnvSource::ConfigSecretArn,
            GrantTarget::Table | GrantTarget::TableIndexes => EnvSource::TableName,
            GrantTarget::EmailQueue => EnvSource::EmailQueueUrl,
        }
    }
}

/// アクション群と対象リソース群の組
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantSpec {
    pub actions: &'static [&'static str],
    pub targets: &'static [GrantTarget],
}

/// ルートの静的定義
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    /// 関数名などに使う識別子
    pub id: &'static str,
    pub method: HttpMethod,
    /// ルートからのパス（空文字はルートリソース）
    pub path: &'static str,
    /// 関数ソースのエントリポイント
    pub entry: &'static str,
    pub environment: &'static [EnvSource],
    pub grants: &'static [GrantSpec],
}

impl RouteSpec {
    /// `GET /`のような表示用パス
    pub fn display_path(&self) -> String {
        format!("/{}", self.path)
    }

    /// 許可対象がすべて環境変数で参照されていることを確認する
    pub fn validate(&self) -> Result<(), RouteInvariantError> {
        for (i, source) in self.environment.iter().enumerate() {
            if self.environment[..i].iter().any(|s| s.key() == source.key()) {
                return Err(RouteInvariantError::DuplicateEnvironmentKey {
                    route: self.id,
                    key: source.key(),
                });
            }
        }

        for grant in self.grants {
            for target in grant.targets {
                let required = target.required_env();
                if !self.environment.contains(&required) {
                    return Err(RouteInvariantError::GrantWithoutEnvironment {
                        route: self.id,
                        target: *target,
                        required: required.key(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// ルートテーブル全体の検証
pub fn validate_routes(routes: &[RouteSpec]) -> Result<(), RouteInvariantError> {
    for (i, route) in routes.iter().enumerate() {
        route.validate()?;
        if routes[..i]
            .iter()
            .any(|r| r.method == route.method && r.path == route.path)
        {
            return Err(RouteInvariantError::DuplicateRoute {
                method: route.method,
                path: route.path,
            });
        }
    }
    Ok(())
}

/// millhouse.dev APIのルート
pub const API_ROUTES: &[RouteSpec] = &[
    // 死活確認
    RouteSpec {
        id: "ping",
        method: HttpMethod::Get,
        path: "",
        entry: "lambdas/api/ping",
        environment: &[EnvSource::Stage],
        grants: &[],
    },
    RouteSpec {
        id: "subscribe",
        method: HttpMethod::Put,
        path: "subscribe",
        entry: "lambdas/api/subscribe",
        environment: &[
            EnvSource::AdminTo,
            EnvSource::AdminFrom,
            EnvSource::ConfigSecretArn,
            EnvSource::EmailQueueUrl,
            EnvSource::Stage,
            EnvSource::TableName,
        ],
        grants: &[
            GrantSpec {
                actions: &[actions::secrets_manager::GET_SECRET_VALUE],
                targets: &[GrantTarget::ConfigSecret],
            },
            GrantSpec {
                actions: &[actions::dynamodb::PUT_ITEM, actions::dynamodb::QUERY],
                targets: &[GrantTarget::Table, GrantTarget::TableIndexes],
            },
            GrantSpec {
                actions: &[actions::sqs::SEND_MESSAGE],
                targets: &[GrantTarget::EmailQueue],
            },
        ],
    },
    RouteSpec {
        id: "unsubscribe",
        method: HttpMethod::Get,
        path: "unsubscribe",
        entry: "lambdas/api/unsubscribe",
        environment: &[EnvSource::Stage, EnvSource::TableName],
        grants: &[GrantSpec {
            actions: &[actions::dynamodb::DELETE_ITEM],
            targets: &[GrantTarget::Table],
        }],
    },
];

/// 値を束縛済みのルート定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub id: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    pub entry: &'static str,
    /// 宣言順の環境変数（キー, 値）
    pub environment: Vec<(String, String)>,
    pub grants: Vec<PolicyStatement>,
}

impl RouteDefinition {
    pub fn env(&self, key: &str) -> Option<&str> {
        self.environment
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}
