//! ARN解析モジュール
//!
//! Parameter Storeから取得したARN文字列を分解し、
//! テーブル名やキューURLなど関数の環境変数に渡す値を導出する。

use thiserror::Error;

/// ARN解析のエラー型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArnError {
    /// `arn:partition:service:region:account:resource`の形式ではない
    #[error("ARNの形式が不正です: {0}")]
    Malformed(String),
    /// 想定と異なるサービスのARN
    #[error("{expected}のARNが必要ですが{actual}のARNが指定されました: {arn}")]
    UnexpectedService {
        expected: &'static str,
        actual: String,
        arn: String,
    },
    /// リソース部分の形式が想定と異なる
    #[error("ARNのリソース部分が不正です: {0}")]
    UnexpectedResource(String),
}

/// 分解済みのARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    partition: String,
    service: String,
    region: String,
    account: String,
    resource: String,
}

impl Arn {
    /// ARN文字列を解析する
    ///
    /// リソース部分にはコロンが含まれうるため、先頭5区切りのみで分割する。
    pub fn parse(value: &str) -> Result<Self, ArnError> {
        let mut parts = value.splitn(6, ':');
        let prefix = parts.next().unwrap_or_default();
        let (Some(partition), Some(service), Some(region), Some(account), Some(resource)) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(ArnError::Malformed(value.to_string()));
        };

        if prefix != "arn" || partition.is_empty() || service.is_empty() || resource.is_empty() {
            return Err(ArnError::Malformed(value.to_string()));
        }

        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account: account.to_string(),
            resource: resource.to_string(),
        })
    }

    /// 指定サービスのARNであることを確認する
    pub fn expect_service(self, expected: &'static str) -> Result<Self, ArnError> {
        if self.service == expected {
            Ok(self)
        } else {
            Err(ArnError::UnexpectedService {
                expected,
                actual: self.service.clone(),
                arn: self.to_string(),
            })
        }
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// DynamoDBテーブルARNからテーブル名を取り出す
    ///
    /// 形式: `arn:aws:dynamodb:<region>:<account>:table/<name>`
    pub fn dynamodb_table_name(&self) -> Result<&str, ArnError> {
        match self.resource.split_once('/') {
            Some(("table", name)) if !name.is_empty() && !name.contains('/') => Ok(name),
            _ => Err(ArnError::UnexpectedResource(self.to_string())),
        }
    }

    /// SQSキューARNからキュー名を取り出す
    ///
    /// 形式: `arn:aws:sqs:<region>:<account>:<name>`
    pub fn sqs_queue_name(&self) -> Result<&str, ArnError> {
        if self.resource.contains(':') || self.resource.contains('/') {
            return Err(ArnError::UnexpectedResource(self.to_string()));
        }
        Ok(&self.resource)
    }

    /// SQSキューARNからキューURLを導出する
    ///
    /// 形式: `https://sqs.<region>.<url-suffix>/<account>/<name>`
    pub fn sqs_queue_url(&self) -> Result<String, ArnError> {
        let name = self.sqs_queue_name()?;
        if self.region.is_empty() || self.account.is_empty() {
            return Err(ArnError::UnexpectedResource(self.to_string()));
        }
        Ok(format!(
            "https://sqs.{}.{}/{}/{}",
            self.region,
            url_suffix(&self.partition),
            self.account,
            name
        ))
    }
}

impl std::fmt::Display for Arn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}

/// パーティションごとのエンドポイントドメイン
fn url_suffix(partition: &str) -> &'static str {
    match partition {
        "aws-cn" => "amazonaws.com.cn",
        _ => "amazonaws.com",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_ARN: &str = "arn:aws:dynamodb:ap-southeast-2:123456789012:table/acme-subscriptions";
    const QUEUE_ARN: &str = "arn:aws:sqs:ap-southeast-2:123456789012:acme-email-queue";

    #[test]
    fn test_parse_table_arn() {
        let arn = Arn::parse(TABLE_ARN).unwrap();

        assert_eq!(arn.partition(), "aws");
        assert_eq!(arn.service(), "dynamodb");
        assert_eq!(arn.region(), "ap-southeast-2");
        assert_eq!(arn.account(), "123456789012");
        assert_eq!(arn.resource(), "table/acme-subscriptions");
        assert_eq!(arn.to_string(), TABLE_ARN);
    }

    #[test]
    fn test_resource_may_contain_colons() {
        let arn = Arn::parse("arn:aws:secretsmanager:us-east-1:123456789012:secret:config-AbC123").unwrap();
        assert_eq!(arn.resource(), "secret:config-AbC123");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for value in ["", "not-an-arn", "arn:aws:sqs", "urn:aws:sqs:r:a:q", "arn:aws:sqs:r:a:"] {
            assert_eq!(
                Arn::parse(value),
                Err(ArnError::Malformed(value.to_string())),
                "{value} should be malformed"
            );
        }
    }

    #[test]
    fn test_expect_service_mismatch() {
        let err = Arn::parse(QUEUE_ARN).unwrap().expect_service("dynamodb").unwrap_err();
        match err {
            ArnError::UnexpectedService { expected, actual, .. } => {
                assert_eq!(expected, "dynamodb");
                assert_eq!(actual, "sqs");
            }
            other => panic!("Expected UnexpectedService, got {other:?}"),
        }
    }

    #[test]
    fn test_dynamodb_table_name() {
        let arn = Arn::parse(TABLE_ARN).unwrap();
        assert_eq!(arn.dynamodb_table_name(), Ok("acme-subscriptions"));
    }

    #[test]
    fn test_dynamodb_index_arn_is_not_a_table() {
        let arn = Arn::parse(&format!("{TABLE_ARN}/index/by-email")).unwrap();
        assert!(arn.dynamodb_table_name().is_err());
    }

    #[test]
    fn test_sqs_queue_url() {
        let arn = Arn::parse(QUEUE_ARN).unwrap();
        assert_eq!(
            arn.sqs_queue_url().unwrap(),
            "https://sqs.ap-southeast-2.amazonaws.com/123456789012/acme-email-queue"
        );
    }

    #[test]
    fn test_sqs_queue_url_china_partition() {
        let arn = Arn::parse("arn:aws-cn:sqs:cn-north-1:123456789012:q").unwrap();
        assert_eq!(
            arn.sqs_queue_url().unwrap(),
            "https://sqs.cn-north-1.amazonaws.com.cn/123456789012/q"
        );
    }

    #[test]
    fn test_sqs_queue_url_requires_region_and_account() {
        let arn = Arn::parse("arn:aws:sqs:::q").unwrap();
        assert!(arn.sqs_queue_url().is_err());
    }
}
