/// スタック設定
///
/// 合成に必要な入力値を環境変数から読み込む。
use thiserror::Error;

use crate::domain::{ApiStackProps, Stage};

/// スタック設定のエラー型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackConfigError {
    #[error("環境変数が設定されていません: {0}")]
    MissingEnvVar(String),
    #[error("環境変数 {var} の値が不正です: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// 名前空間
pub const NAMESPACE_ENV: &str = "STACK_NAMESPACE";
/// ステージ（dev/test/prod）
pub const STAGE_ENV: &str = "STACK_STAGE";
/// 管理者宛先アドレス
pub const ADMIN_TO_ENV: &str = "ADMIN_TO";
/// 管理者送信元アドレス
pub const ADMIN_FROM_ENV: &str = "ADMIN_FROM";
/// 関数設定シークレットARN
pub const LAMBDAS_CONFIG_ARN_ENV: &str = "LAMBDAS_CONFIG_ARN";
/// 関数バンドルのS3バケット（省略可）
pub const ASSET_BUCKET_ENV: &str = "ASSET_BUCKET";

/// スタック設定
///
/// 以下の環境変数から読み込む:
/// - STACK_NAMESPACE: 名前空間
/// - STACK_STAGE: ステージ
/// - ADMIN_TO / ADMIN_FROM: 管理者メールアドレス
/// - LAMBDAS_CONFIG_ARN: 関数設定シークレットARN
/// - ASSET_BUCKET: 関数バンドルのS3バケット（省略時は`<namespace>-lambda-assets-<stage>`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    props: ApiStackProps,
}

impl StackConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # エラー
    /// 必須の環境変数が未設定、またはステージが不正な場合
    pub fn from_env() -> Result<Self, StackConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// 任意のキー・値ソースから設定を読み込む
    pub fn from_source<F>(get: F) -> Result<Self, StackConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 空文字は未設定扱い
        let optional = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            optional(key).ok_or_else(|| StackConfigError::MissingEnvVar(key.to_string()))
        };

        let namespace = required(NAMESPACE_ENV)?;
        let stage_value = required(STAGE_ENV)?;
        let stage: Stage = stage_value
            .trim()
            .parse()
            .map_err(|err: crate::domain::StageParseError| StackConfigError::InvalidValue {
                var: STAGE_ENV.to_string(),
                reason: err.to_string(),
            })?;
        let admin_to = required(ADMIN_TO_ENV)?;
        let admin_from = required(ADMIN_FROM_ENV)?;
        let lambdas_config_arn = required(LAMBDAS_CONFIG_ARN_ENV)?;

        let mut props = ApiStackProps::new(namespace, stage, lambdas_config_arn, admin_to, admin_from);
        if let Some(bucket) = optional(ASSET_BUCKET_ENV) {
            props = props.with_asset_bucket(bucket);
        }

        Ok(Self { props })
    }

    /// 明示的な値で設定を作成（テスト用）
    pub fn new(props: ApiStackProps) -> Self {
        Self { props }
    }

    /// コマンドライン引数を優先して環境変数から読み込む
    ///
    /// 引数で指定した名前空間・ステージは環境変数が未設定でもよい。
    pub fn from_env_with_overrides(
        namespace: Option<String>,
        stage: Option<Stage>,
    ) -> Result<Self, StackConfigError> {
        Self::from_source_with_overrides(|key| std::env::var(key).ok(), namespace, stage)
    }

    /// 名前空間・ステージの上書きを先に引いてから任意のソースを引く
    pub fn from_source_with_overrides<F>(
        get: F,
        namespace: Option<String>,
        stage: Option<Stage>,
    ) -> Result<Self, StackConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_source(|key| {
            let overridden = match key {
                NAMESPACE_ENV => namespace.clone(),
                STAGE_ENV => stage.map(|stage| stage.to_string()),
                _ => None,
            };
            overridden.or_else(|| get(key))
        })
    }

    pub fn props(&self) -> &ApiStackProps {
        &self.props
    }

    pub fn into_props(self) -> ApiStackProps {
        self.props
    }
}
