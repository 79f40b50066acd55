/// APIスタックコンポーザー
///
/// 入力値の検証 → 参照解決 → ルート宣言 → ドメインバインディングの順に
/// 一度だけ実行し、完全な宣言を返す。途中で失敗した場合は何も返さない。
use tracing::{error, info};

use super::domain_binder::DomainBinder;
use super::reference_resolver::ReferenceResolver;
use super::route_composer::RouteComposer;
use super::stack_error::StackError;
use crate::domain::route::validate_routes;
use crate::domain::{
    ApiStackProps, CorsPolicy, DomainBinding, ResolvedReferences, RouteDefinition, RouteSpec,
    API_ROUTES,
};
use crate::infrastructure::{HostedZoneLookup, ParameterStore};

/// 合成済みのAPIスタック宣言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStackDeclaration {
    pub props: ApiStackProps,
    pub references: ResolvedReferences,
    pub cors: CorsPolicy,
    pub routes: Vec<RouteDefinition>,
    pub domain: DomainBinding,
}

pub struct ApiStackComposer<P, Z>
where
    P: ParameterStore,
    Z: HostedZoneLookup,
{
    resolver: ReferenceResolver<P>,
    binder: DomainBinder<Z>,
    routes: &'static [RouteSpec],
}

impl<P, Z> ApiStackComposer<P, Z>
where
    P: ParameterStore,
    Z: HostedZoneLookup,
{
    pub fn new(store: P, lookup: Z) -> Self {
        Self {
            resolver: ReferenceResolver::new(store),
            binder: DomainBinder::new(lookup),
            routes: API_ROUTES,
        }
    }

    /// ルートテーブルを差し替える
    pub fn with_routes(mut self, routes: &'static [RouteSpec]) -> Self {
        self.routes = routes;
        self
    }

    /// スタック宣言を合成する
    ///
    /// 宣言の不備はParameter Store・Route 53を呼ぶ前に検出する。
    pub async fn compose(&self, props: ApiStackProps) -> Result<ApiStackDeclaration, StackError> {
        info!(
            namespace = %props.namespace,
            stage = %props.stage,
            "スタック合成開始"
        );

        props.validate().map_err(|err| {
            error!(error = %err, "入力値が不正");
            StackError::from(err)
        })?;
        validate_routes(self.routes).map_err(|err| {
            error!(error = %err, "ルート定義が不正");
            StackError::from(err)
        })?;

        // 1. 参照解決
        let references = self
            .resolver
            .resolve_all(&props.namespace, props.stage)
            .await?;

        // 2. APIサーフェス
        let cors = CorsPolicy::for_stage(props.stage);
        let routes = RouteComposer::new(&props, &references).compose(self.routes)?;
        info!(
            routes = routes.len(),
            allow_origin = %cors.allow_origin(),
            "APIサーフェスを宣言"
        );

        // 3. ドメインバインディング（ルート登録の後）
        let domain = self.binder.bind(props.stage).await?;

        info!(
            namespace = %props.namespace,
            stage = %props.stage,
            domain_name = %domain.full_domain_name(),
            "スタック合成完了"
        );

        Ok(ApiStackDeclaration {
            props,
            references,
            cors,
            routes,
            domain,
        })
    }
}
