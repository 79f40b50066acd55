// ドメイン層モジュール
pub mod arn;
pub mod cors;
pub mod domain_binding;
pub mod http_method;
pub mod iam;
pub mod props;
pub mod reference;
pub mod route;
pub mod stage;
pub mod template;

// 再エクスポート
pub use arn::{Arn, ArnError};
pub use cors::CorsPolicy;
pub use domain_binding::{full_domain_name, DomainBinding, HostedZone, APEX_DOMAIN};
pub use http_method::HttpMethod;
pub use iam::{PolicyDocument, PolicyStatement};
pub use props::{ApiStackProps, PropsError};
pub use reference::{ResolvedReferences, ResourceKind, ResourceReference};
pub use route::{RouteDefinition, RouteInvariantError, RouteSpec, API_ROUTES};
pub use stage::{Stage, StageParseError};
pub use template::{Template, TemplateError};
