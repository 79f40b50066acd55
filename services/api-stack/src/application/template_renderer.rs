/// テンプレートレンダラー
///
/// 合成済みのスタック宣言をCloudFormationテンプレートに変換する。
/// 論理IDは`<namespace>-<name>-<stage>`形式のコンストラクトIDから生成する。
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::stack_composer::ApiStackDeclaration;
use super::stack_error::StackError;
use crate::domain::template::{intrinsic, logical_id, Output, Resource};
use crate::domain::{CorsPolicy, HttpMethod, PolicyDocument, RouteDefinition, Template};

/// Lambda関数のランタイム（カスタムランタイム上のGoバイナリ）
pub const FUNCTION_RUNTIME: &str = "provided.al2";
/// カスタムランタイムのハンドラ名
pub const FUNCTION_HANDLER: &str = "bootstrap";

const BASIC_EXECUTION_POLICY: &str = ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// REST API本体の論理ID
const REST_API: &str = "rest-api";

/// デプロイメントの論理IDに付けるハッシュの長さ（16進文字数）
const DEPLOYMENT_HASH_LEN: usize = 16;

/// 宣言からテンプレートを生成する
pub fn render_template(declaration: &ApiStackDeclaration) -> Result<Template, StackError> {
    TemplateRenderer::new(declaration).render()
}

struct TemplateRenderer<'a> {
    declaration: &'a ApiStackDeclaration,
    template: Template,
    /// APIリソースパス → 論理ID（作成順）
    path_resources: Vec<(String, String)>,
    methods: Vec<String>,
}

impl<'a> TemplateRenderer<'a> {
    fn new(declaration: &'a ApiStackDeclaration) -> Self {
        let props = &declaration.props;
        let description = format!(
            "millhouse.dev API ({}/{})",
            props.namespace, props.stage
        );
        Self {
            declaration,
            template: Template::new(description),
            path_resources: Vec::new(),
            methods: Vec::new(),
        }
    }

    fn id(&self, name: &str) -> Result<String, StackError> {
        Ok(logical_id(&self.declaration.props.construct_id(name))?)
    }

    fn add(&mut self, logical_id: &str, resource: Resource) -> Result<(), StackError> {
        debug!(logical_id = %logical_id, resource_type = %resource.resource_type(), "リソースを追加");
        self.template.add_resource(logical_id, resource)?;
        Ok(())
    }

    fn render(mut self) -> Result<Template, StackError> {
        let declaration = self.declaration;
        let rest_api = self.render_rest_api()?;

        for route in &declaration.routes {
            self.render_route(&rest_api, route)?;
        }
        self.render_cors_preflight(&rest_api)?;

        let stage = self.render_deployment(&rest_api)?;
        self.render_domain(&rest_api, &stage)?;
        self.render_outputs(&rest_api);

        Ok(self.template)
    }

    fn render_rest_api(&mut self) -> Result<String, StackError> {
        let id = self.id(REST_API)?;
        let name = self.declaration.props.construct_id(REST_API);
        self.add(
            &id,
            Resource::new(
                "AWS::ApiGateway::RestApi",
                json!({
                    "Name": name,
                    "EndpointConfiguration": { "Types": ["REGIONAL"] },
                }),
            ),
        )?;
        Ok(id)
    }

    /// パスに対応するリソースIDの値（ルートはRootResourceId）
    fn resource_id(&mut self, rest_api: &str, path: &str) -> Result<Value, StackError> {
        let mut parent = intrinsic::get_att(rest_api, "RootResourceId");
        let mut prefix = String::new();

        for part in path.split('/').filter(|part| !part.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);

            let existing = self
                .path_resources
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, id)| id.clone());

            let id = match existing {
                Some(id) => id,
                None => {
                    let id = self.id(&format!("{}-resource", prefix))?;
                    self.add(
                        &id,
                        Resource::new(
                            "AWS::ApiGateway::Resource",
                            json!({
                                "ParentId": parent,
                                "PathPart": part,
                                "RestApiId": intrinsic::reference(rest_api),
                            }),
                        ),
                    )?;
                    self.path_resources.push((prefix.clone(), id.clone()));
                    id
                }
            };
            parent = intrinsic::reference(&id);
        }

        Ok(parent)
    }

    fn render_route(&mut self, rest_api: &str, route: &RouteDefinition) -> Result<(), StackError> {
        let asset_bucket = self.declaration.props.asset_bucket.clone();
        let role = self.id(&format!("{}-function-role", route.id))?;
        let function = self.id(&format!("{}-function", route.id))?;
        let method = self.id(&format!("{}-method", route.id))?;
        let permission = self.id(&format!("{}-permission", route.id))?;

        // 実行ロール（基本実行ポリシー + ルートごとの許可）
        let mut role_properties = json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" },
                    "Action": "sts:AssumeRole",
                }],
            },
            "ManagedPolicyArns": [
                intrinsic::join(vec![json!("arn:"), intrinsic::partition(), json!(BASIC_EXECUTION_POLICY)]),
            ],
        });
        if !route.grants.is_empty() {
            role_properties["Policies"] = json!([{
                "PolicyName": format!("{}-grants", route.id),
                "PolicyDocument": PolicyDocument::new(route.grants.clone()),
            }]);
        }
        self.add(&role, Resource::new("AWS::IAM::Role", role_properties))?;

        // 関数（名前はCloudFormationに生成させる）
        let variables: Map<String, Value> = route
            .environment
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        self.add(
            &function,
            Resource::new(
                "AWS::Lambda::Function",
                json!({
                    "Runtime": FUNCTION_RUNTIME,
                    "Handler": FUNCTION_HANDLER,
                    "Code": {
                        "S3Bucket": asset_bucket,
                        "S3Key": format!("{}.zip", route.entry),
                    },
                    "Role": intrinsic::get_att(&role, "Arn"),
                    "Environment": { "Variables": variables },
                }),
            )
            .depends_on([role.clone()]),
        )?;

        // メソッド（Lambdaプロキシ統合）
        let resource_id = self.resource_id(rest_api, route.path)?;
        self.add(
            &method,
            Resource::new(
                "AWS::ApiGateway::Method",
                json!({
                    "HttpMethod": route.method.as_str(),
                    "ResourceId": resource_id,
                    "RestApiId": intrinsic::reference(rest_api),
                    "AuthorizationType": "NONE",
                    "Integration": {
                        "Type": "AWS_PROXY",
                        "IntegrationHttpMethod": "POST",
                        "Uri": intrinsic::join(vec![
                            json!("arn:"),
                            intrinsic::partition(),
                            json!(":apigateway:"),
                            intrinsic::region(),
                            json!(":lambda:path/2015-03-31/functions/"),
                            intrinsic::get_att(&function, "Arn"),
                            json!("/invocations"),
                        ]),
                    },
                }),
            ),
        )?;
        self.methods.push(method);

        // API Gatewayからの呼び出し許可
        self.add(
            &permission,
            Resource::new(
                "AWS::Lambda::Permission",
                json!({
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": intrinsic::get_att(&function, "Arn"),
                    "Principal": "apigateway.amazonaws.com",
                    "SourceArn": intrinsic::join(vec![
                        json!("arn:"),
                        intrinsic::partition(),
                        json!(":execute-api:"),
                        intrinsic::region(),
                        json!(":"),
                        intrinsic::account_id(),
                        json!(":"),
                        intrinsic::reference(rest_api),
                        json!(format!("/*/{}/{}", route.method, route.path)),
                    ]),
                }),
            ),
        )?;

        Ok(())
    }

    /// ルートとすべてのパスにOPTIONSメソッド（MOCK統合）を追加する
    fn render_cors_preflight(&mut self, rest_api: &str) -> Result<(), StackError> {
        let cors = self.declaration.cors.clone();
        let mut paths = vec![String::new()];
        paths.extend(self.path_resources.iter().map(|(path, _)| path.clone()));

        for path in paths {
            let name = if path.is_empty() {
                "root-options-method".to_string()
            } else {
                format!("{}-options-method", path)
            };
            let id = self.id(&name)?;
            let resource_id = self.resource_id(rest_api, &path)?;
            self.add(
                &id,
                Resource::new(
                    "AWS::ApiGateway::Method",
                    preflight_method(rest_api, resource_id, &cors),
                ),
            )?;
            self.methods.push(id);
        }
        Ok(())
    }

    /// デプロイメントとステージ。デプロイメントはすべてのメソッドの後に作成する
    ///
    /// メソッドやリソースが変わると論理IDも変わり、新しいデプロイメントが作られる。
    fn render_deployment(&mut self, rest_api: &str) -> Result<String, StackError> {
        let deployment = self.id(&format!("deployment-{}", self.api_surface_hash()?))?;
        let stage = self.id("deployment-stage")?;
        let stage_name = self.declaration.props.stage.to_string();
        let description = format!("{} deployment", self.declaration.props.construct_id(REST_API));
        let methods = self.methods.clone();

        self.add(
            &deployment,
            Resource::new(
                "AWS::ApiGateway::Deployment",
                json!({
                    "RestApiId": intrinsic::reference(rest_api),
                    "Description": description,
                }),
            )
            .depends_on(methods),
        )?;

        self.add(
            &stage,
            Resource::new(
                "AWS::ApiGateway::Stage",
                json!({
                    "RestApiId": intrinsic::reference(rest_api),
                    "DeploymentId": intrinsic::reference(&deployment),
                    "StageName": stage_name,
                }),
            ),
        )?;
        Ok(stage)
    }

    /// メソッドとAPIリソースの定義から求めた安定なハッシュ
    fn api_surface_hash(&self) -> Result<String, StackError> {
        let mut hasher = Sha256::new();
        for resource_type in ["AWS::ApiGateway::Resource", "AWS::ApiGateway::Method"] {
            for (logical_id, resource) in self.template.resources_of_type(resource_type) {
                let bytes = serde_json::to_vec(resource).map_err(StackError::invalid)?;
                hasher.update(logical_id.as_bytes());
                hasher.update((bytes.len() as u32).to_le_bytes());
                hasher.update(&bytes);
            }
        }

        let digest = hasher.finalize();
        Ok(digest
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect::<String>()
            .chars()
            .take(DEPLOYMENT_HASH_LEN)
            .collect())
    }

    /// 証明書・カスタムドメイン・ベースパスマッピング・エイリアスレコード
    fn render_domain(&mut self, rest_api: &str, stage: &str) -> Result<(), StackError> {
        let domain = &self.declaration.domain;
        let full_domain_name = domain.full_domain_name().to_string();
        let certificate_request = domain.certificate().clone();
        let alias = domain.alias_record().clone();

        let certificate = self.id("api-certificate")?;
        let domain_name = self.id("api-domain-name")?;
        let mapping = self.id("base-path-mapping")?;
        let record = self.id("a-record")?;

        self.add(
            &certificate,
            Resource::new(
                "AWS::CertificateManager::Certificate",
                json!({
                    "DomainName": certificate_request.domain_name,
                    "ValidationMethod": "DNS",
                    "DomainValidationOptions": [{
                        "DomainName": certificate_request.domain_name,
                        "HostedZoneId": certificate_request.validation_zone_id,
                    }],
                }),
            ),
        )?;

        self.add(
            &domain_name,
            Resource::new(
                "AWS::ApiGateway::DomainName",
                json!({
                    "DomainName": full_domain_name,
                    "EndpointConfiguration": { "Types": ["REGIONAL"] },
                    "RegionalCertificateArn": intrinsic::reference(&certificate),
                    "SecurityPolicy": "TLS_1_2",
                }),
            ),
        )?;

        // デフォルトのベースパス
        self.add(
            &mapping,
            Resource::new(
                "AWS::ApiGateway::BasePathMapping",
                json!({
                    "DomainName": intrinsic::reference(&domain_name),
                    "RestApiId": intrinsic::reference(rest_api),
                    "Stage": intrinsic::reference(stage),
                }),
            ),
        )?;

        // エイリアスレコードにはTTLを指定できない（ターゲット側のTTLが使われる）
        self.add(
            &record,
            Resource::new(
                "AWS::Route53::RecordSet",
                json!({
                    "Name": format!("{}.", alias.record_name),
                    "Type": "A",
                    "HostedZoneId": alias.zone_id,
                    "AliasTarget": {
                        "DNSName": intrinsic::get_att(&domain_name, "RegionalDomainName"),
                        "HostedZoneId": intrinsic::get_att(&domain_name, "RegionalHostedZoneId"),
                    },
                }),
            ),
        )?;

        Ok(())
    }

    fn render_outputs(&mut self, rest_api: &str) {
        let stage_name = self.declaration.props.stage.to_string();
        self.template.add_output(
            "ApiEndpoint",
            Output::new(
                intrinsic::join(vec![
                    json!("https://"),
                    intrinsic::reference(rest_api),
                    json!(".execute-api."),
                    intrinsic::region(),
                    json!("."),
                    intrinsic::url_suffix(),
                    json!(format!("/{}/", stage_name)),
                ]),
                "execute-api endpoint",
            ),
        );
        self.template.add_output(
            "CustomDomainUrl",
            Output::new(json!(self.declaration.domain.url()), "custom domain endpoint"),
        );
    }
}

/// CORSプリフライト用のOPTIONSメソッド
fn preflight_method(rest_api: &str, resource_id: Value, cors: &CorsPolicy) -> Value {
    let mut integration_headers = Map::new();
    let mut method_headers = Map::new();
    for (name, value) in cors.response_headers() {
        let key = format!("method.response.header.{}", name);
        integration_headers.insert(key.clone(), json!(format!("'{}'", value)));
        method_headers.insert(key, json!(true));
    }

    json!({
        "HttpMethod": HttpMethod::Options.as_str(),
        "ResourceId": resource_id,
        "RestApiId": intrinsic::reference(rest_api),
        "AuthorizationType": "NONE",
        "Integration": {
            "Type": "MOCK",
            "RequestTemplates": { "application/json": "{ statusCode: 200 }" },
            "IntegrationResponses": [{
                "StatusCode": "204",
                "ResponseParameters": integration_headers,
            }],
        },
        "MethodResponses": [{
            "StatusCode": "204",
            "ResponseParameters": method_headers,
        }],
    })
}
