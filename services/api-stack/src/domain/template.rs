//! CloudFormationテンプレートモデル
//!
//! 合成結果のリソースグラフをCloudFormationのJSON形式で表現する。
//! リソースは論理IDの辞書順で出力されるため、同じ入力からは
//! 常に同じテンプレートが得られる。

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// テンプレート構築のエラー型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("論理IDが重複しています: {0}")]
    DuplicateLogicalId(String),
    #[error("論理IDを生成できません: {0:?}")]
    InvalidConstructId(String),
}

/// CloudFormationテンプレート
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(
        rename = "AWSTemplateFormatVersion",
        skip_serializing_if = "Option::is_none"
    )]
    format_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    resources: BTreeMap<String, Resource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<String, Output>,
}

/// テンプレート内の1リソース
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    resource_type: String,
    properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            depends_on: Vec::new(),
        }
    }

    /// 作成順序の依存先を追加
    pub fn depends_on<I, S>(mut self, logical_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(logical_ids.into_iter().map(Into::into));
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn properties(&self) -> &Value {
        &self.properties
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

/// スタック出力
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Output {
    pub fn new(value: Value, description: impl Into<String>) -> Self {
        Self {
            value,
            description: Some(description.into()),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Template {
    /// リソースを持たない空のテンプレート
    pub fn empty() -> Self {
        Self::default()
    }

    /// バージョンと説明付きのテンプレート
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: Some("2010-09-09".to_string()),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// リソースを追加する。論理IDの重複はエラー
    pub fn add_resource(
        &mut self,
        logical_id: impl Into<String>,
        resource: Resource,
    ) -> Result<(), TemplateError> {
        let logical_id = logical_id.into();
        if self.resources.contains_key(&logical_id) {
            return Err(TemplateError::DuplicateLogicalId(logical_id));
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    pub fn add_output(&mut self, name: impl Into<String>, output: Output) {
        self.outputs.insert(name.into(), output);
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    /// 指定タイプのリソースを論理IDとともに列挙
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
            .map(|(id, r)| (id.as_str(), r))
    }
}

/// コンストラクトIDから論理IDを生成する
///
/// 英数字以外で区切り、各区切りの先頭を大文字にして連結する。
/// 例: `acme-rest-api-dev` → `AcmeRestApiDev`
pub fn logical_id(construct_id: &str) -> Result<String, TemplateError> {
    let id: String = construct_id
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    match id.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => Ok(id),
        _ => Err(TemplateError::InvalidConstructId(construct_id.to_string())),
    }
}

/// 組み込み関数のヘルパー
pub mod intrinsic {
    use super::*;

    /// `{"Ref": id}`
    pub fn reference(logical_id: &str) -> Value {
        json!({ "Ref": logical_id })
    }

    /// `{"Fn::GetAtt": [id, attribute]}`
    pub fn get_att(logical_id: &str, attribute: &str) -> Value {
        json!({ "Fn::GetAtt": [logical_id, attribute] })
    }

    /// `{"Fn::Join": ["", parts]}`
    pub fn join(parts: Vec<Value>) -> Value {
        json!({ "Fn::Join": ["", parts] })
    }

    pub fn partition() -> Value {
        reference("AWS::Partition")
    }

    pub fn region() -> Value {
        reference("AWS::Region")
    }

    pub fn account_id() -> Value {
        reference("AWS::AccountId")
    }

    pub fn url_suffix() -> Value {
        reference("AWS::URLSuffix")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_template_has_no_resources() {
        let value = serde_json::to_value(Template::empty()).unwrap();
        assert_eq!(value, json!({ "Resources": {} }));
    }

    #[test]
    fn test_template_header() {
        let value = serde_json::to_value(Template::new("test stack")).unwrap();
        assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(value["Description"], "test stack");
        assert!(value.get("Outputs").is_none());
    }

    #[test]
    fn test_add_resource_rejects_duplicates() {
        let mut template = Template::empty();
        template
            .add_resource("Queue", Resource::new("AWS::SQS::Queue", json!({})))
            .unwrap();

        assert_eq!(
            template.add_resource("Queue", Resource::new("AWS::SQS::Queue", json!({}))),
            Err(TemplateError::DuplicateLogicalId("Queue".to_string()))
        );
    }

    #[test]
    fn test_resource_serialization() {
        let resource = Resource::new("AWS::ApiGateway::Deployment", json!({ "RestApiId": "x" }))
            .depends_on(["MethodA", "MethodB"]);

        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({
                "Type": "AWS::ApiGateway::Deployment",
                "Properties": { "RestApiId": "x" },
                "DependsOn": ["MethodA", "MethodB"]
            })
        );
    }

    #[test]
    fn test_resource_without_dependencies_omits_depends_on() {
        let value = serde_json::to_value(Resource::new("AWS::SQS::Queue", json!({}))).unwrap();
        assert!(value.get("DependsOn").is_none());
    }

    #[test]
    fn test_logical_id_from_construct_id() {
        assert_eq!(logical_id("acme-rest-api-dev").unwrap(), "AcmeRestApiDev");
        assert_eq!(
            logical_id("acme-subscribe-function-prod").unwrap(),
            "AcmeSubscribeFunctionProd"
        );
        assert_eq!(logical_id("acme/api.root--GET").unwrap(), "AcmeApiRootGET");
    }

    #[test]
    fn test_logical_id_must_start_with_letter() {
        assert!(logical_id("1acme").is_err());
        assert!(logical_id("---").is_err());
    }

    #[test]
    fn test_resources_of_type() {
        let mut template = Template::empty();
        template
            .add_resource("A", Resource::new("AWS::Lambda::Function", json!({})))
            .unwrap();
        template
            .add_resource("B", Resource::new("AWS::IAM::Role", json!({})))
            .unwrap();

        let ids: Vec<&str> = template
            .resources_of_type("AWS::Lambda::Function")
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["A"]);
    }

    #[test]
    fn test_intrinsics() {
        assert_eq!(intrinsic::reference("Api"), json!({ "Ref": "Api" }));
        assert_eq!(
            intrinsic::get_att("Fn", "Arn"),
            json!({ "Fn::GetAtt": ["Fn", "Arn"] })
        );
        assert_eq!(
            intrinsic::join(vec![json!("a"), intrinsic::region()]),
            json!({ "Fn::Join": ["", ["a", { "Ref": "AWS::Region" }]] })
        );
    }
}
