// アプリケーション層モジュール
pub mod domain_binder;
pub mod reference_resolver;
pub mod route_composer;
pub mod stack_composer;
pub mod stack_error;
pub mod template_renderer;

// 再エクスポート
pub use domain_binder::DomainBinder;
pub use reference_resolver::ReferenceResolver;
pub use route_composer::RouteComposer;
pub use stack_composer::{ApiStackComposer, ApiStackDeclaration};
pub use stack_error::StackError;
pub use template_renderer::render_template;
