//! 参照解決コンテキストファイル
//!
//! Parameter Storeの値とホストゾーンをJSONファイルにまとめておき、
//! AWSにアクセスせずに合成するための静的実装を提供する。
//!
//! ```json
//! {
//!   "parameters": {
//!     "acme-table-arn-dev": "arn:aws:dynamodb:ap-southeast-2:123456789012:table/acme-dev",
//!     "acme-email-queue-arn-dev": "arn:aws:sqs:ap-southeast-2:123456789012:acme-email-dev"
//!   },
//!   "hosted_zones": {
//!     "millhouse.dev": { "id": "Z0123456789ABC", "name": "millhouse.dev" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hosted_zone_lookup::{zone_name_matches, HostedZoneLookup, HostedZoneLookupError};
use super::parameter_store::{ParameterStore, ParameterStoreError};
use crate::domain::HostedZone;

/// コンテキストファイル読み込みのエラー型
#[derive(Debug, Error)]
pub enum LookupContextError {
    #[error("コンテキストファイルを読み込めません: {0}")]
    Io(#[from] std::io::Error),
    #[error("コンテキストファイルのJSONが不正です: {0}")]
    Parse(#[from] serde_json::Error),
    /// キーのドメイン名とゾーン名が一致しない
    #[error("ホストゾーン {key} のnameが一致しません: {name}")]
    ZoneNameMismatch { key: String, name: String },
}

/// 参照解決に使う値の集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupContext {
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// ドメイン名 → ホストゾーン
    #[serde(default)]
    pub hosted_zones: BTreeMap<String, HostedZone>,
}

impl LookupContext {
    pub fn from_json(json: &str) -> Result<Self, LookupContextError> {
        let context: Self = serde_json::from_str(json)?;
        context.validate()?;
        Ok(context)
    }

    /// ホストゾーンのキーと`name`が同じドメインを指すことを確認する
    pub fn validate(&self) -> Result<(), LookupContextError> {
        for (key, zone) in &self.hosted_zones {
            if !zone_name_matches(&zone.name, key) {
                return Err(LookupContextError::ZoneNameMismatch {
                    key: key.clone(),
                    name: zone.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LookupContextError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parameter Store実装とホストゾーン検索実装に分割する
    pub fn into_lookups(self) -> (StaticParameterStore, StaticHostedZoneLookup) {
        (
            StaticParameterStore::new(self.parameters),
            StaticHostedZoneLookup::new(self.hosted_zones),
        )
    }
}

/// 固定値を返すParameter Store
#[derive(Debug, Clone, Default)]
pub struct StaticParameterStore {
    parameters: BTreeMap<String, String>,
}

impl StaticParameterStore {
    pub fn new(parameters: BTreeMap<String, String>) -> Self {
        Self { parameters }
    }
}

#[async_trait]
impl ParameterStore for StaticParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String, ParameterStoreError> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| ParameterStoreError::NotFound(name.to_string()))
    }
}

/// ドメイン名をキーにした固定のゾーン一覧から検索するホストゾーン検索
#[derive(Debug, Clone, Default)]
pub struct StaticHostedZoneLookup {
    zones: Vec<(String, HostedZone)>,
}

impl StaticHostedZoneLookup {
    pub fn new(zones: impl IntoIterator<Item = (String, HostedZone)>) -> Self {
        Self {
            zones: zones
                .into_iter()
                .map(|(domain, zone)| (domain, HostedZone::new(&zone.id, &zone.name)))
                .collect(),
        }
    }
}

#[async_trait]
impl HostedZoneLookup for StaticHostedZoneLookup {
    async fn find_public_zone(
        &self,
        domain_name: &str,
    ) -> Result<Option<HostedZone>, HostedZoneLookupError> {
        Ok(self
            .zones
            .iter()
            .find(|(domain, _)| zone_name_matches(domain, domain_name))
            .map(|(_, zone)| zone.clone()))
    }
}
