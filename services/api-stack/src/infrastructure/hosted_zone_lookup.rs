//! Route 53ホストゾーン検索モジュール
//!
//! Apexドメイン名から公開ホストゾーンを検索する。
//! ゾーンの作成は行わず、既存ゾーンの参照のみ。

use async_trait::async_trait;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::Client as Route53Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::HostedZone;

/// ホストゾーン検索のエラー型
#[derive(Debug, Error)]
pub enum HostedZoneLookupError {
    /// AWS SDK エラー
    #[error("AWS Route 53 APIエラー: {0}")]
    AwsSdkError(String),
}

/// ホストゾーン検索トレイト（テスト用の抽象化）
#[async_trait]
pub trait HostedZoneLookup: Send + Sync {
    /// ドメイン名に一致する公開ホストゾーンを検索する
    ///
    /// # 戻り値
    /// * `Ok(Some(HostedZone))` - 一致するゾーン
    /// * `Ok(None)` - ゾーンが存在しない
    async fn find_public_zone(
        &self,
        domain_name: &str,
    ) -> Result<Option<HostedZone>, HostedZoneLookupError>;
}

/// 実際のAWS Route 53 SDKを使用したホストゾーン検索実装
pub struct AwsHostedZoneLookup {
    client: Route53Client,
}

impl AwsHostedZoneLookup {
    pub fn new(client: Route53Client) -> Self {
        Self { client }
    }

    /// AWS設定からデフォルトのクライアントを作成
    pub async fn from_config() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Route53Client::new(&config))
    }
}

#[async_trait]
impl HostedZoneLookup for AwsHostedZoneLookup {
    async fn find_public_zone(
        &self,
        domain_name: &str,
    ) -> Result<Option<HostedZone>, HostedZoneLookupError> {
        info!(domain_name = %domain_name, "ListHostedZonesByName呼び出し");

        // 名前順の一覧は指定ドメインから始まるため先頭ページで判定できる
        let response = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(domain_name)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    domain_name = %domain_name,
                    error = %DisplayErrorContext(&err),
                    "ListHostedZonesByNameエラー"
                );
                HostedZoneLookupError::AwsSdkError(DisplayErrorContext(&err).to_string())
            })?;

        let zone = response
            .hosted_zones()
            .iter()
            .filter(|zone| !zone.config().is_some_and(|c| c.private_zone()))
            .map(|zone| HostedZone::new(zone.id(), zone.name()))
            .find(|zone| zone_name_matches(&zone.name, domain_name));

        Ok(zone)
    }
}

/// 末尾のドットと大文字小文字を無視してゾーン名を比較する
pub fn zone_name_matches(zone_name: &str, domain_name: &str) -> bool {
    zone_name
        .trim_end_matches('.')
        .eq_ignore_ascii_case(domain_name.trim_end_matches('.'))
}
