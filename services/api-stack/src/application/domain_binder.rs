/// カスタムドメインバインダー
///
/// Apexドメインの公開ホストゾーンを検索し、ステージに応じた
/// サブドメイン・証明書・エイリアスレコードの組を作る。
use tracing::{error, info};

use super::stack_error::StackError;
use crate::domain::{DomainBinding, Stage, APEX_DOMAIN};
use crate::infrastructure::HostedZoneLookup;

pub struct DomainBinder<Z>
where
    Z: HostedZoneLookup,
{
    lookup: Z,
    apex_domain: String,
}

impl<Z> DomainBinder<Z>
where
    Z: HostedZoneLookup,
{
    pub fn new(lookup: Z) -> Self {
        Self {
            lookup,
            apex_domain: APEX_DOMAIN.to_string(),
        }
    }

    pub fn apex_domain(&self) -> &str {
        &self.apex_domain
    }

    /// ステージのドメインバインディングを作る
    ///
    /// # エラー
    /// * `MissingZone` - 公開ホストゾーンが存在しない
    /// * `ZoneLookup` - Route 53呼び出しの失敗
    pub async fn bind(&self, stage: Stage) -> Result<DomainBinding, StackError> {
        info!(domain = %self.apex_domain, "ホストゾーンを検索");

        let zone = self
            .lookup
            .find_public_zone(&self.apex_domain)
            .await
            .map_err(|err| {
                error!(domain = %self.apex_domain, error = %err, "ホストゾーンの検索に失敗");
                StackError::ZoneLookup(err.to_string())
            })?
            .ok_or_else(|| {
                error!(domain = %self.apex_domain, "ホストゾーンが存在しません");
                StackError::MissingZone {
                    domain: self.apex_domain.clone(),
                }
            })?;

        let binding = DomainBinding::new(stage, zone);
        info!(
            zone_id = %binding.hosted_zone().id,
            domain = %binding.full_domain_name(),
            "カスタムドメインを宣言"
        );
        Ok(binding)
    }
}
