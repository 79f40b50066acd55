//! Parameter Store操作モジュール
//!
//! 別スタックが登録したテーブル/キューのARNをSSM Parameter Storeから取得する。
//! 取得は合成時に一度だけ行い、再試行もフォールバックもしない。

use async_trait::async_trait;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::Client as SsmClient;
use thiserror::Error;
use tracing::{info, warn};

/// Parameter Store操作のエラー型
#[derive(Debug, Error)]
pub enum ParameterStoreError {
    /// パラメータが登録されていない
    #[error("パラメータが見つかりません: {0}")]
    NotFound(String),
    /// AWS SDK エラー
    #[error("AWS SSM APIエラー: {0}")]
    AwsSdkError(String),
}

/// 文字列キーで値を引くレジストリ（テスト用の抽象化）
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// パラメータの値を取得する
    ///
    /// # 戻り値
    /// * `Ok(String)` - パラメータ値
    /// * `Err(ParameterStoreError::NotFound)` - キーが存在しない
    async fn get_parameter(&self, name: &str) -> Result<String, ParameterStoreError>;
}

/// 実際のAWS SSM SDKを使用したParameter Store実装
pub struct AwsParameterStore {
    client: SsmClient,
}

impl AwsParameterStore {
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }

    /// AWS設定からデフォルトのクライアントを作成
    pub async fn from_config() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(SsmClient::new(&config))
    }
}

#[async_trait]
impl ParameterStore for AwsParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String, ParameterStoreError> {
        info!(parameter_name = %name, "GetParameter呼び出し");

        let response = self
            .client
            .get_parameter()
            .name(name)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_parameter_not_found())
                {
                    ParameterStoreError::NotFound(name.to_string())
                } else {
                    warn!(
                        parameter_name = %name,
                        error = %DisplayErrorContext(&err),
                        "GetParameterエラー"
                    );
                    ParameterStoreError::AwsSdkError(DisplayErrorContext(&err).to_string())
                }
            })?;

        response
            .parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| ParameterStoreError::NotFound(name.to_string()))
    }
}
