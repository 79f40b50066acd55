/// APIスタック合成コマンド
///
/// 既存リソースの参照解決・ルート宣言・カスタムドメインの宣言を行い、
/// CloudFormationテンプレート（JSON）を出力する。デプロイ自体は行わない。
///
/// # 環境変数
/// - STACK_NAMESPACE: 名前空間（--namespace未指定時は必須）
/// - STACK_STAGE: ステージ dev/test/prod（--stage未指定時は必須）
/// - ADMIN_TO: 管理者宛先メールアドレス（必須）
/// - ADMIN_FROM: 送信元メールアドレス（必須）
/// - LAMBDAS_CONFIG_ARN: 関数設定シークレットのARN（必須）
/// - ASSET_BUCKET: 関数バンドルを置くS3バケット（デフォルト: <namespace>-lambda-assets-<stage>）
///
/// # ローカル実行
/// ```bash
/// export STACK_NAMESPACE=millhouse
/// export STACK_STAGE=dev
/// export ADMIN_TO=admin@millhouse.dev
/// export ADMIN_FROM=noreply@millhouse.dev
/// export LAMBDAS_CONFIG_ARN=arn:aws:secretsmanager:ap-southeast-2:123456789012:secret:millhouse-config
///
/// # AWSから参照を解決してテンプレートを出力
/// cargo run --bin synth -- --output api-stack.template.json
///
/// # コンテキストファイルを使ってオフラインで合成
/// cargo run --bin synth -- --context lookup-context.json --log-format pretty
/// ```
use std::path::PathBuf;
use std::process::ExitCode;

use api_stack::application::{render_template, ApiStackComposer, StackError};
use api_stack::domain::{ApiStackProps, Stage, Template};
use api_stack::infrastructure::{
    init_logging, AwsHostedZoneLookup, AwsParameterStore, HostedZoneLookup, LogFormat,
    LookupContext, ParameterStore, StackConfig,
};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "synth")]
#[command(about = "millhouse.dev APIスタックのCloudFormationテンプレートを合成")]
struct CliArgs {
    /// 名前空間（環境変数STACK_NAMESPACEより優先される）
    #[arg(long, short = 'n')]
    namespace: Option<String>,

    /// ステージ（環境変数STACK_STAGEより優先される）
    #[arg(long, short = 's')]
    stage: Option<Stage>,

    /// 出力先ファイル（省略時は標準出力）
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// 参照解決に使うコンテキストファイル（指定時はAWSにアクセスしない）
    #[arg(long, short = 'c')]
    context: Option<PathBuf>,

    /// 整形せずに1行で出力する
    #[arg(long)]
    compact: bool,

    /// ログ出力形式
    #[arg(long, value_enum, default_value_t = LogFormatArg::Json)]
    log_format: LogFormatArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Pretty => LogFormat::Pretty,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // 構造化ログを初期化（標準エラー）
    init_logging(args.log_format.into());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "スタック合成に失敗");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = StackConfig::from_env_with_overrides(args.namespace, args.stage)
        .map_err(StackError::from)?;
    let props = config.into_props();

    let template = match &args.context {
        Some(path) => {
            info!(path = %path.display(), "コンテキストファイルから参照を解決");
            let (store, lookup) = LookupContext::from_file(path)?.into_lookups();
            synthesize(store, lookup, props).await?
        }
        None => {
            info!("AWSから参照を解決");
            let store = AwsParameterStore::from_config().await;
            let lookup = AwsHostedZoneLookup::from_config().await;
            synthesize(store, lookup, props).await?
        }
    };

    let json = if args.compact {
        serde_json::to_string(&template)?
    } else {
        serde_json::to_string_pretty(&template)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, json + "\n")?;
            info!(
                path = %path.display(),
                resources = template.resources().len(),
                "テンプレートを書き出しました"
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// 参照解決からテンプレート生成までを実行する
async fn synthesize<P, Z>(
    store: P,
    lookup: Z,
    props: ApiStackProps,
) -> Result<Template, StackError>
where
    P: ParameterStore,
    Z: HostedZoneLookup,
{
    let declaration = ApiStackComposer::new(store, lookup).compose(props).await?;
    render_template(&declaration)
}
