//! カスタムドメイン設定
//!
//! ステージからAPIのドメイン名を導出し、証明書とDNSエイリアスレコードの
//! 宣言をまとめる。

use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// ホストゾーンを持つApexドメイン
pub const APEX_DOMAIN: &str = "millhouse.dev";

/// エイリアスレコードのTTL（秒）
pub const ALIAS_RECORD_TTL_SECONDS: u32 = 60;

/// ステージからAPIの完全修飾ドメイン名を導出する
///
/// - prod: `api.<apex>`
/// - それ以外: `<stage>.api.<apex>`
pub fn full_domain_name(stage: Stage, apex: &str) -> String {
    if stage.is_production() {
        format!("api.{}", apex)
    } else {
        format!("{}.api.{}", stage, apex)
    }
}

/// Route 53ホストゾーン
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// `/hostedzone/`プレフィックスを除いたゾーンID
    pub id: String,
    /// 末尾のドットを除いたゾーン名
    pub name: String,
}

impl HostedZone {
    /// Route 53 APIの値から正規化して作成
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.trim_start_matches("/hostedzone/").to_string(),
            name: name.trim_end_matches('.').to_string(),
        }
    }
}

/// DNS検証による証明書リクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    pub domain_name: String,
    /// 検証用CNAMEを書き込むホストゾーンID
    pub validation_zone_id: String,
}

/// カスタムドメインを指すAレコード（エイリアス）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRecord {
    pub record_name: String,
    pub zone_id: String,
    pub ttl_seconds: u32,
}

/// ドメイン、証明書、DNSレコードの組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainBinding {
    full_domain_name: String,
    hosted_zone: HostedZone,
    certificate: CertificateRequest,
    alias_record: AliasRecord,
}

impl DomainBinding {
    /// 解決済みホストゾーンとステージからバインディングを作成
    pub fn new(stage: Stage, hosted_zone: HostedZone) -> Self {
        let full_domain_name = full_domain_name(stage, &hosted_zone.name);

        let certificate = CertificateRequest {
            domain_name: full_domain_name.clone(),
            validation_zone_id: hosted_zone.id.clone(),
        };

        let alias_record = AliasRecord {
            record_name: full_domain_name.clone(),
            zone_id: hosted_zone.id.clone(),
            ttl_seconds: ALIAS_RECORD_TTL_SECONDS,
        };

        Self {
            full_domain_name,
            hosted_zone,
            certificate,
            alias_record,
        }
    }

    pub fn full_domain_name(&self) -> &str {
        &self.full_domain_name
    }

    pub fn hosted_zone(&self) -> &HostedZone {
        &self.hosted_zone
    }

    pub fn certificate(&self) -> &CertificateRequest {
        &self.certificate
    }

    pub fn alias_record(&self) -> &AliasRecord {
        &self.alias_record
    }

    /// カスタムドメインのHTTPS URL
    pub fn url(&self) -> String {
        format!("https://{}/", self.full_domain_name)
    }
}
