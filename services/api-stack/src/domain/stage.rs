/// デプロイステージ
///
/// CORSのオリジン制限とカスタムドメイン名の導出を決定する。
/// 合成時に一度だけ決まり、以降は変更されない。
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// ステージ文字列のパースエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("サポートされていないステージです: {0}")]
pub struct StageParseError(pub String);

/// デプロイステージ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 開発環境
    Dev,
    /// テスト環境
    Test,
    /// 本番環境
    Prod,
}

impl Stage {
    /// サポートしている全ステージ
    pub const ALL: [Stage; 3] = [Stage::Dev, Stage::Test, Stage::Prod];

    /// リソース名やドメイン名に埋め込む文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Dev => "dev",
            Stage::Test => "test",
            Stage::Prod => "prod",
        }
    }

    /// 本番環境かどうか
    pub fn is_production(&self) -> bool {
        matches!(self, Stage::Prod)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| StageParseError(s.to_string()))
    }
}
