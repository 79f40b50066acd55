// インフラストラクチャ層モジュール
pub mod config;
pub mod hosted_zone_lookup;
pub mod logging;
pub mod lookup_context;
pub mod parameter_store;

// 再エクスポート
pub use config::{StackConfig, StackConfigError};
pub use hosted_zone_lookup::{AwsHostedZoneLookup, HostedZoneLookup, HostedZoneLookupError};
pub use logging::{init_logging, LogFormat};
pub use lookup_context::{
    LookupContext, LookupContextError, StaticHostedZoneLookup, StaticParameterStore,
};
pub use parameter_store::{AwsParameterStore, ParameterStore, ParameterStoreError};
