/// CORSプリフライト設定
///
/// 本番環境ではサイトのオリジンのみ、それ以外では全オリジンを許可する。
use super::stage::Stage;

/// 本番環境で許可するオリジン
pub const PRODUCTION_ORIGIN: &str = "https://millhouse.dev";

/// プリフライトで許可するヘッダー
pub const DEFAULT_ALLOW_HEADERS: &[&str] = &[
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Amz-Security-Token",
    "X-Amz-User-Agent",
];

/// プリフライトで許可するメソッド
pub const DEFAULT_ALLOW_METHODS: &[&str] =
    &["OPTIONS", "GET", "PUT", "POST", "DELETE", "PATCH", "HEAD"];

/// オリジン許可ポリシー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// 全オリジンを許可（`*`）
    AllOrigins,
    /// 指定オリジンのみ許可
    Origin(String),
}

impl CorsPolicy {
    /// ステージからポリシーを決定する
    pub fn for_stage(stage: Stage) -> Self {
        if stage.is_production() {
            CorsPolicy::Origin(PRODUCTION_ORIGIN.to_string())
        } else {
            CorsPolicy::AllOrigins
        }
    }

    /// `Access-Control-Allow-Origin`に返す値
    pub fn allow_origin(&self) -> &str {
        match self {
            CorsPolicy::AllOrigins => "*",
            CorsPolicy::Origin(origin) => origin,
        }
    }

    /// 特定オリジンを返す場合はキャッシュのために`Vary: Origin`が必要
    pub fn requires_vary_header(&self) -> bool {
        matches!(self, CorsPolicy::Origin(_))
    }

    /// プリフライト応答ヘッダーの一覧（ヘッダー名, 値）
    pub fn response_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Access-Control-Allow-Headers", DEFAULT_ALLOW_HEADERS.join(",")),
            ("Access-Control-Allow-Origin", self.allow_origin().to_string()),
        ];
        if self.requires_vary_header() {
            headers.push(("Vary", "Origin".to_string()));
        }
        headers.push(("Access-Control-Allow-Methods", DEFAULT_ALLOW_METHODS.join(",")));
        headers
    }
}
