/// APIスタックの入力値
///
/// 名前空間、ステージ、管理者メールアドレス、関数設定シークレットなど
/// 合成の起点となる設定をまとめる。
use thiserror::Error;

use super::arn::{Arn, ArnError};
use super::stage::Stage;

/// 入力値の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropsError {
    #[error("{0}が空です")]
    EmptyField(&'static str),
    #[error("{field}はメールアドレスではありません: {value}")]
    InvalidEmail { field: &'static str, value: String },
    #[error("関数設定シークレットのARNが不正です: {0}")]
    InvalidSecretArn(ArnError),
}

/// APIスタックの入力値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStackProps {
    pub namespace: String,
    pub stage: Stage,
    /// 関数設定シークレット（Secrets Manager）のARN
    pub lambdas_config_arn: String,
    pub admin_to: String,
    pub admin_from: String,
    /// 関数バンドルを置くS3バケット
    pub asset_bucket: String,
}

impl ApiStackProps {
    /// バンドルのバケットは`<namespace>-lambda-assets-<stage>`を既定とする
    pub fn new(
        namespace: impl Into<String>,
        stage: Stage,
        lambdas_config_arn: impl Into<String>,
        admin_to: impl Into<String>,
        admin_from: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        let asset_bucket = Self::default_asset_bucket(&namespace, stage);
        Self {
            namespace,
            stage,
            lambdas_config_arn: lambdas_config_arn.into(),
            admin_to: admin_to.into(),
            admin_from: admin_from.into(),
            asset_bucket,
        }
    }

    /// 既定のバンドル用バケット名
    pub fn default_asset_bucket(namespace: &str, stage: Stage) -> String {
        format!("{}-lambda-assets-{}", namespace, stage)
    }

    pub fn with_asset_bucket(mut self, asset_bucket: impl Into<String>) -> Self {
        self.asset_bucket = asset_bucket.into();
        self
    }

    /// `<namespace>-<name>-<stage>`形式のコンストラクトID
    pub fn construct_id(&self, name: &str) -> String {
        format!("{}-{}-{}", self.namespace, name, self.stage)
    }

    /// 外部APIを呼ぶ前に検出できる設定ミスを確認する
    pub fn validate(&self) -> Result<(), PropsError> {
        if self.namespace.trim().is_empty() {
            return Err(PropsError::EmptyField("namespace"));
        }
        if self.asset_bucket.trim().is_empty() {
            return Err(PropsError::EmptyField("asset_bucket"));
        }

        validate_email("admin_to", &self.admin_to)?;
        validate_email("admin_from", &self.admin_from)?;

        Arn::parse(&self.lambdas_config_arn)
            .and_then(|arn| arn.expect_service("secretsmanager"))
            .map_err(PropsError::InvalidSecretArn)?;

        Ok(())
    }
}

/// `local@domain`の形であることだけを確認する
///
/// `表示名 <local@domain>`の形式では山括弧内のアドレスを確認する。
fn validate_email(field: &'static str, value: &str) -> Result<(), PropsError> {
    if value.trim().is_empty() {
        return Err(PropsError::EmptyField(field));
    }

    let address = match value.trim().strip_suffix('>') {
        Some(rest) => rest.rsplit_once('<').map(|(_, address)| address),
        None => Some(value),
    };

    let valid = match address.and_then(|address| address.rsplit_once('@')) {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !local.contains(char::is_whitespace)
                && !domain.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(PropsError::InvalidEmail {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_ARN: &str = "arn:aws:secretsmanager:ap-southeast-2:123456789012:secret:acme-config-dev-AbC123";

    fn props() -> ApiStackProps {
        ApiStackProps::new(
            "acme",
            Stage::Dev,
            SECRET_ARN,
            "admin@millhouse.dev",
            "noreply@millhouse.dev",
        )
    }

    #[test]
    fn test_default_asset_bucket() {
        assert_eq!(props().asset_bucket, "acme-lambda-assets-dev");
        assert_eq!(props().with_asset_bucket("b").asset_bucket, "b");
    }

    #[test]
    fn test_construct_id() {
        assert_eq!(props().construct_id("rest-api"), "acme-rest-api-dev");
    }

    #[test]
    fn test_valid_props() {
        assert_eq!(props().validate(), Ok(()));
    }

    #[test]
    fn test_empty_namespace() {
        let mut props = props();
        props.namespace = " ".to_string();
        assert_eq!(props.validate(), Err(PropsError::EmptyField("namespace")));
    }

    #[test]
    fn test_invalid_email() {
        let mut props = props();
        props.admin_from = "not-an-address".to_string();
        assert_eq!(
            props.validate(),
            Err(PropsError::InvalidEmail {
                field: "admin_from",
                value: "not-an-address".to_string(),
            })
        );
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("f", "a@b.co").is_ok());
        assert!(validate_email("f", "@b.co").is_err());
        assert!(validate_email("f", "a@localhost").is_err());
        assert!(validate_email("f", "a b@b.co").is_err());
        assert!(validate_email("f", "a@b.co.").is_err());
    }

    #[test]
    fn test_display_name_address_is_accepted() {
        let props = ApiStackProps::new(
            "acme",
            Stage::Dev,
            SECRET_ARN,
            "admin@millhouse.dev",
            "Millhouse <noreply@millhouse.dev>",
        );
        assert_eq!(props.validate(), Ok(()));
    }

    #[test]
    fn test_display_name_shapes() {
        assert!(validate_email("f", "\"Mill House\" <a@b.co>").is_ok());
        assert!(validate_email("f", "Millhouse <>").is_err());
        assert!(validate_email("f", "Millhouse <a@localhost>").is_err());
        assert!(validate_email("f", "Millhouse a@b.co>").is_err());
    }

    #[test]
    fn test_secret_must_be_secrets_manager_arn() {
        let mut props = props();
        props.lambdas_config_arn = "arn:aws:sqs:ap-southeast-2:123456789012:q".to_string();
        assert!(matches!(
            props.validate(),
            Err(PropsError::InvalidSecretArn(ArnError::UnexpectedService { .. }))
        ));
    }
}
