/// ルートコンポーザー
///
/// ルートテーブルの記号的な環境変数・許可対象を、解決済みの参照と
/// スタック入力値に束縛してルート定義を作る。
/// 各ルートは互いに独立して計算される。
use tracing::debug;

use super::stack_error::StackError;
use crate::domain::route::{validate_routes, EnvSource, GrantTarget};
use crate::domain::{ApiStackProps, PolicyStatement, ResolvedReferences, RouteDefinition, RouteSpec};

pub struct RouteComposer<'a> {
    props: &'a ApiStackProps,
    references: &'a ResolvedReferences,
}

impl<'a> RouteComposer<'a> {
    pub fn new(props: &'a ApiStackProps, references: &'a ResolvedReferences) -> Self {
        Self { props, references }
    }

    /// ルートテーブル全体を束縛する
    pub fn compose(&self, routes: &[RouteSpec]) -> Result<Vec<RouteDefinition>, StackError> {
        validate_routes(routes)?;
        Ok(routes.iter().map(|route| self.bind(route)).collect())
    }

    /// 1ルートを束縛する
    pub fn bind(&self, route: &RouteSpec) -> RouteDefinition {
        let environment = route
            .environment
            .iter()
            .map(|source| (source.key().to_string(), self.env_value(*source)))
            .collect();

        let grants = route
            .grants
            .iter()
            .map(|grant| {
                PolicyStatement::allow(
                    grant.actions.iter().copied(),
                    grant.targets.iter().map(|target| self.grant_resource(*target)),
                )
            })
            .collect::<Vec<_>>();

        debug!(
            route = route.id,
            method = %route.method,
            path = %route.display_path(),
            grants = grants.len(),
            "ルートを宣言"
        );

        RouteDefinition {
            id: route.id,
            method: route.method,
            path: route.path,
            entry: route.entry,
            environment,
            grants,
        }
    }

    fn env_value(&self, source: EnvSource) -> String {
        match source {
            EnvSource::Stage => self.props.stage.to_string(),
            EnvSource::AdminTo => self.props.admin_to.clone(),
            EnvSource::AdminFrom => self.props.admin_from.clone(),
            EnvSource::ConfigSecretArn => self.props.lambdas_config_arn.clone(),
            EnvSource::EmailQueueUrl => self.references.email_queue_url(),
            EnvSource::TableName => self.references.table_name().to_string(),
        }
    }

    fn grant_resource(&self, target: GrantTarget) -> String {
        match target {
            GrantTarget::ConfigSecret => self.props.lambdas_config_arn.clone(),
            GrantTarget::Table => self.references.table_arn(),
            GrantTarget::TableIndexes => self.references.table_index_arn(),
            GrantTarget::EmailQueue => self.references.email_queue_arn(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::iam::actions;
    use crate::domain::{HttpMethod, ResourceKind, ResourceReference, Stage, API_ROUTES};

    const TABLE_ARN: &str = "arn:aws:dynamodb:ap-southeast-2:123456789012:table/acme-table-dev";
    const QUEUE_ARN: &str = "arn:aws:sqs:ap-southeast-2:123456789012:acme-email-queue-dev";
    const SECRET_ARN: &str = "arn:aws:secretsmanager:ap-southeast-2:123456789012:secret:acme-config";

    fn props() -> ApiStackProps {
        ApiStackProps::new(
            "acme",
            Stage::Dev,
            SECRET_ARN,
            "admin@millhouse.dev",
            "noreply@millhouse.dev",
        )
    }

    fn references() -> ResolvedReferences {
        ResolvedReferences::new(
            ResourceReference::new(ResourceKind::Table, "acme-table-arn-dev", TABLE_ARN).unwrap(),
            ResourceReference::new(ResourceKind::EmailQueue, "acme-email-queue-arn-dev", QUEUE_ARN)
                .unwrap(),
        )
        .unwrap()
    }

    fn compose() -> Vec<RouteDefinition> {
        let props = props();
        let references = references();
        RouteComposer::new(&props, &references).compose(API_ROUTES).unwrap()
    }

    fn route<'a>(routes: &'a [RouteDefinition], id: &str) -> &'a RouteDefinition {
        routes.iter().find(|r| r.id == id).unwrap()
    }

    #[test]
    fn test_three_routes_declared() {
        let routes = compose();
        let surface: Vec<(HttpMethod, &str)> = routes.iter().map(|r| (r.method, r.path)).collect();

        assert_eq!(
            surface,
            vec![
                (HttpMethod::Get, ""),
                (HttpMethod::Put, "subscribe"),
                (HttpMethod::Get, "unsubscribe"),
            ]
        );
    }

    #[test]
    fn test_ping_route() {
        let routes = compose();
        let ping = route(&routes, "ping");

        assert!(ping.is_root());
        assert_eq!(ping.entry, "lambdas/api/ping");
        assert_eq!(ping.environment, vec![("STAGE".to_string(), "dev".to_string())]);
        assert!(ping.grants.is_empty());
    }

    #[test]
    fn test_subscribe_environment() {
        let routes = compose();
        let subscribe = route(&routes, "subscribe");

        let keys: Vec<&str> = subscribe.environment.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["ADMIN_TO", "ADMIN_FROM", "CONFIG_SECRET_ARN", "EMAIL_QUEUE_URL", "STAGE", "TABLE_NAME"]
        );
        assert_eq!(subscribe.env("ADMIN_TO"), Some("admin@millhouse.dev"));
        assert_eq!(subscribe.env("ADMIN_FROM"), Some("noreply@millhouse.dev"));
        assert_eq!(subscribe.env("CONFIG_SECRET_ARN"), Some(SECRET_ARN));
        assert_eq!(
            subscribe.env("EMAIL_QUEUE_URL"),
            Some("https://sqs.ap-southeast-2.amazonaws.com/123456789012/acme-email-queue-dev")
        );
        assert_eq!(subscribe.env("STAGE"), Some("dev"));
        assert_eq!(subscribe.env("TABLE_NAME"), Some("acme-table-dev"));
    }

    #[test]
    fn test_subscribe_grants_are_exact() {
        let routes = compose();
        let subscribe = route(&routes, "subscribe");

        assert_eq!(
            subscribe.grants,
            vec![
                PolicyStatement::allow([actions::secrets_manager::GET_SECRET_VALUE], [SECRET_ARN]),
                PolicyStatement::allow(
                    [actions::dynamodb::PUT_ITEM, actions::dynamodb::QUERY],
                    [TABLE_ARN.to_string(), format!("{TABLE_ARN}/index/*")],
                ),
                PolicyStatement::allow([actions::sqs::SEND_MESSAGE], [QUEUE_ARN]),
            ]
        );
    }

    #[test]
    fn test_unsubscribe_route() {
        let routes = compose();
        let unsubscribe = route(&routes, "unsubscribe");

        assert_eq!(
            unsubscribe.environment,
            vec![
                ("STAGE".to_string(), "dev".to_string()),
                ("TABLE_NAME".to_string(), "acme-table-dev".to_string()),
            ]
        );
        assert_eq!(
            unsubscribe.grants,
            vec![PolicyStatement::allow([actions::dynamodb::DELETE_ITEM], [TABLE_ARN])]
        );
    }

    #[test]
    fn test_invalid_route_table_is_rejected() {
        use crate::domain::route::{GrantSpec, GrantTarget};

        let leaky = [RouteSpec {
            id: "leaky",
            method: HttpMethod::Get,
            path: "leaky",
            entry: "lambdas/api/leaky",
            environment: &[],
            grants: &[GrantSpec {
                actions: &[actions::dynamodb::DELETE_ITEM],
                targets: &[GrantTarget::Table],
            }],
        }];
        let props = props();
        let references = references();

        let err = RouteComposer::new(&props, &references).compose(&leaky).unwrap_err();
        assert!(matches!(err, StackError::InvalidDeclaration(_)));
    }
}
