/// スタック合成のエラー型
///
/// すべてデプロイ時（合成時）のエラーであり、発生した時点で合成全体を中断する。
/// 部分的なテンプレートは出力しない。
use thiserror::Error;

use crate::domain::{ArnError, PropsError, RouteInvariantError, StageParseError, TemplateError};
use crate::infrastructure::StackConfigError;

#[derive(Debug, Error)]
pub enum StackError {
    /// レジストリにキーが存在しない（上流のプロビジョニング漏れ）
    #[error("参照パラメータが見つかりません: {key}")]
    MissingReference { key: String },

    /// Apexドメインのホストゾーンが存在しない
    #[error("ホストゾーンが見つかりません: {domain}")]
    MissingZone { domain: String },

    /// 設定やルート定義の不備
    #[error("不正な宣言: {0}")]
    InvalidDeclaration(String),

    /// Parameter Store呼び出しの失敗
    #[error("Parameter Storeの参照に失敗しました: {0}")]
    Registry(String),

    /// Route 53呼び出しの失敗
    #[error("ホストゾーンの検索に失敗しました: {0}")]
    ZoneLookup(String),
}

impl StackError {
    pub fn invalid(err: impl std::fmt::Display) -> Self {
        StackError::InvalidDeclaration(err.to_string())
    }
}

impl From<ArnError> for StackError {
    fn from(err: ArnError) -> Self {
        StackError::invalid(err)
    }
}

impl From<PropsError> for StackError {
    fn from(err: PropsError) -> Self {
        StackError::invalid(err)
    }
}

impl From<RouteInvariantError> for StackError {
    fn from(err: RouteInvariantError) -> Self {
        StackError::invalid(err)
    }
}

impl From<StageParseError> for StackError {
    fn from(err: StageParseError) -> Self {
        StackError::invalid(err)
    }
}

impl From<TemplateError> for StackError {
    fn from(err: TemplateError) -> Self {
        StackError::invalid(err)
    }
}

impl From<StackConfigError> for StackError {
    fn from(err: StackConfigError) -> Self {
        StackError::invalid(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let missing = StackError::MissingReference {
            key: "acme-table-arn-dev".to_string(),
        };
        assert_eq!(
            missing.to_string(),
            "参照パラメータが見つかりません: acme-table-arn-dev"
        );

        let zone = StackError::MissingZone {
            domain: "millhouse.dev".to_string(),
        };
        assert_eq!(zone.to_string(), "ホストゾーンが見つかりません: millhouse.dev");
    }

    #[test]
    fn test_domain_errors_are_invalid_declarations() {
        let err: StackError = StageParseError("qa".to_string()).into();
        assert!(matches!(err, StackError::InvalidDeclaration(msg) if msg.contains("qa")));

        let err: StackError = PropsError::EmptyField("namespace").into();
        assert!(matches!(err, StackError::InvalidDeclaration(_)));
    }
}
