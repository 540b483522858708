#![deny(missing_docs)]

//! # API Gateway Integration
//!
//! Attaches an `x-amazon-apigateway-integration` HTTP-proxy block to every
//! operation of an OpenAPI document.
//!
//! - **Path Integrator**: `integrate_path` handles one Path Item.
//! - **Document Integrator**: `integrate_openapi` handles a whole document and
//!   declares the binary media types at the root.
//!
//! The generated backend URI only references stage variables, so one document
//! serves every stage of the API:
//!
//! ```text
//! http://${stageVariables.CustomDomainName}[/${stageVariables.ServicePrefix}][/${stageVariables.ApiVersion}]/users/{id}
//! ```

use crate::error::{AppError, AppResult};
use crate::params::{declared_path_parameters, ParameterScope, PathParameterSet};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Operation key under which the generated integration is stored.
pub const INTEGRATION_KEY: &str = "x-amazon-apigateway-integration";

/// Document root key declaring payload types passed through as binary.
pub const BINARY_MEDIA_TYPES_KEY: &str = "x-amazon-apigateway-binary-media-types";

/// Path Item keys treated as operations.
pub const HTTP_METHODS: [&str; 9] = [
    "get",
    "head",
    "options",
    "trace",
    "post",
    "put",
    "patch",
    "delete",
    "x-amazon-apigateway-any-method",
];

const BINARY_MEDIA_TYPES: [&str; 1] = ["multipart/form-data"];

const CUSTOM_DOMAIN_BASE: &str = "http://${stageVariables.CustomDomainName}";
const SERVICE_PREFIX_SEGMENT: &str = "/${stageVariables.ServicePrefix}";
const API_VERSION_SEGMENT: &str = "/${stageVariables.ApiVersion}";
const VPC_LINK_ID: &str = "${stageVariables.VpcLinkId}";

/// Settings that shape every generated integration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationOptions {
    /// API version tag. When present and non-empty the backend URI gains the
    /// `ApiVersion` stage variable segment. The tag value itself is not
    /// embedded.
    pub api_version: Option<String>,
    /// Adds the `ServicePrefix` stage variable segment to the backend URI.
    pub use_service_prefix: bool,
    /// How path parameters are shared between operations of one path.
    pub parameter_scope: ParameterScope,
}

impl IntegrationOptions {
    fn has_api_version(&self) -> bool {
        self.api_version.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// HTTP-proxy integration through a VPC link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    /// Always `http_proxy`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Always `ANY`: the backend receives the caller's method unchanged.
    pub http_method: String,
    /// Always `when_no_match`.
    pub passthrough_behavior: String,
    /// VPC link stage variable.
    pub connection_id: String,
    /// Always `VPC_LINK`.
    pub connection_type: String,
    /// Backend URI template.
    pub uri: String,
    /// `integration.request.path.<p>` -> `method.request.path.<p>`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub request_parameters: BTreeMap<String, String>,
}

impl Integration {
    /// Builds the proxy integration for `uri`, forwarding every parameter in
    /// `path_parameters`.
    pub fn http_proxy(uri: String, path_parameters: &PathParameterSet) -> Self {
        let request_parameters = path_parameters
            .iter()
            .map(|p| {
                (
                    format!("integration.request.path.{p}"),
                    format!("method.request.path.{p}"),
                )
            })
            .collect();

        Self {
            kind: "http_proxy".to_string(),
            http_method: "ANY".to_string(),
            passthrough_behavior: "when_no_match".to_string(),
            connection_id: VPC_LINK_ID.to_string(),
            connection_type: "VPC_LINK".to_string(),
            uri,
            request_parameters,
        }
    }
}

/// Returns true when `key` names an operation inside a Path Item.
pub fn is_http_method(key: &str) -> bool {
    HTTP_METHODS.contains(&key)
}

/// Builds the backend URI for a path template.
///
/// The greedy marker of `{proxy+}` is dropped so it does not leak into the
/// backend template.
pub fn backend_uri(path: &str, options: &IntegrationOptions) -> String {
    let mut uri = String::from(CUSTOM_DOMAIN_BASE);

    if options.use_service_prefix {
        uri.push_str(SERVICE_PREFIX_SEGMENT);
    }

    if options.has_api_version() {
        uri.push_str(API_VERSION_SEGMENT);
    }

    uri.push_str(&path.replace("proxy+", "proxy"));
    uri
}

/// Returns a copy of `path_item` where every operation carries an integration.
///
/// # Arguments
///
/// * `path` - The path template the item is declared under, e.g. `/users/{id}`.
/// * `path_item` - The Path Item mapping.
/// * `options` - URI and parameter settings.
pub fn integrate_path(
    path: &str,
    path_item: &Value,
    options: &IntegrationOptions,
) -> AppResult<Value> {
    let mut integrated = path_item.clone();
    let item = integrated.as_mapping_mut().ok_or_else(|| {
        AppError::InvalidDocument(format!("Path item `{}` is not a mapping", path))
    })?;

    attach_integrations(path, item, options)?;
    Ok(integrated)
}

fn attach_integrations(
    path: &str,
    item: &mut Mapping,
    options: &IntegrationOptions,
) -> AppResult<()> {
    let uri = backend_uri(path, options);
    let path_level: PathParameterSet = declared_path_parameters(item).into_iter().collect();
    let mut accumulated = path_level.clone();

    for (key, operation) in item.iter_mut() {
        // Skip siblings such as `parameters`, `description` or `$ref`.
        let Some(method) = key.as_str().filter(|k| is_http_method(k)) else {
            continue;
        };

        let operation = operation.as_mapping_mut().ok_or_else(|| {
            AppError::InvalidDocument(format!("Operation `{} {}` is not a mapping", method, path))
        })?;

        let own = declared_path_parameters(operation);
        let parameters = match options.parameter_scope {
            ParameterScope::Accumulate => {
                accumulated.extend(own);
                accumulated.clone()
            }
            ParameterScope::PerOperation => path_level.iter().cloned().chain(own).collect(),
        };

        tracing::debug!(path, method, parameters = ?parameters, "attaching integration");

        let integration = Integration::http_proxy(uri.clone(), &parameters);
        operation.insert(
            Value::from(INTEGRATION_KEY),
            serde_yaml::to_value(&integration)?,
        );
    }

    Ok(())
}

/// Returns a copy of `document` with every path integrated and the binary
/// media types declared at the root.
///
/// The input is left untouched.
pub fn integrate_openapi(document: &Value, options: &IntegrationOptions) -> AppResult<Value> {
    let mut integrated = document.clone();
    let root = integrated
        .as_mapping_mut()
        .ok_or_else(|| AppError::InvalidDocument("OpenAPI root is not a mapping".into()))?;

    let paths = root
        .get_mut("paths")
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| AppError::InvalidDocument("OpenAPI document has no `paths` mapping".into()))?;

    for (path, item) in paths.iter_mut() {
        let path = path.as_str().ok_or_else(|| {
            AppError::InvalidDocument(format!("Path key {:?} is not a string", path))
        })?;
        let item = item.as_mapping_mut().ok_or_else(|| {
            AppError::InvalidDocument(format!("Path item `{}` is not a mapping", path))
        })?;

        attach_integrations(path, item, options)?;
    }

    let media_types = BINARY_MEDIA_TYPES.iter().map(|t| Value::from(*t)).collect();
    root.insert(
        Value::from(BINARY_MEDIA_TYPES_KEY),
        Value::Sequence(media_types),
    );

    tracing::info!(paths = paths_len(&integrated), "integrated document");
    Ok(integrated)
}

fn paths_len(document: &Value) -> usize {
    document
        .get("paths")
        .and_then(Value::as_mapping)
        .map_or(0, Mapping::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use pretty_assertions::assert_eq;

    fn integration_of<'a>(doc: &'a Value, path: &str, method: &str) -> &'a Value {
        &doc["paths"][path][method][INTEGRATION_KEY]
    }

    #[test]
    fn test_backend_uri_plain() {
        let uri = backend_uri("/users/{id}", &IntegrationOptions::default());
        assert_eq!(uri, "http://${stageVariables.CustomDomainName}/users/{id}");
    }

    #[test]
    fn test_backend_uri_prefix_and_version() {
        let options = IntegrationOptions {
            api_version: Some("v2".into()),
            use_service_prefix: true,
            ..Default::default()
        };
        assert_eq!(
            backend_uri("/orders", &options),
            "http://${stageVariables.CustomDomainName}/${stageVariables.ServicePrefix}/${stageVariables.ApiVersion}/orders"
        );
    }

    #[test]
    fn test_backend_uri_empty_version_is_ignored() {
        let options = IntegrationOptions {
            api_version: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            backend_uri("/orders", &options),
            "http://${stageVariables.CustomDomainName}/orders"
        );
    }

    #[test]
    fn test_backend_uri_strips_greedy_marker() {
        let uri = backend_uri("/files/{proxy+}", &IntegrationOptions::default());
        assert_eq!(uri, "http://${stageVariables.CustomDomainName}/files/{proxy}");
    }

    #[test]
    fn test_integration_field_order() {
        let mut params = PathParameterSet::new();
        params.insert("id".into());
        let value = serde_yaml::to_value(Integration::http_proxy("http://x/{id}".into(), &params))
            .unwrap();

        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(
            keys,
            vec![
                "type",
                "httpMethod",
                "passthroughBehavior",
                "connectionId",
                "connectionType",
                "uri",
                "requestParameters",
            ]
        );
        assert_eq!(value["type"], Value::from("http_proxy"));
        assert_eq!(value["connectionId"], Value::from("${stageVariables.VpcLinkId}"));
        assert_eq!(value["connectionType"], Value::from("VPC_LINK"));
        assert_eq!(
            value["requestParameters"]["integration.request.path.id"],
            Value::from("method.request.path.id")
        );
    }

    #[test]
    fn test_integration_without_parameters_omits_mapping() {
        let value =
            serde_yaml::to_value(Integration::http_proxy("u".into(), &PathParameterSet::new()))
                .unwrap();
        assert!(value.get("requestParameters").is_none());
    }

    #[test]
    fn test_integrate_path_leaves_siblings_untouched() {
        let item = parse_document(
            r#"
description: user resource
parameters:
  - { name: id, in: path, required: true }
get:
  responses: {}
delete:
  responses: {}
"#,
        )
        .unwrap();

        let out = integrate_path("/users/{id}", &item, &IntegrationOptions::default()).unwrap();

        assert_eq!(out["description"], item["description"]);
        assert_eq!(out["parameters"], item["parameters"]);
        assert!(out["description"].get(INTEGRATION_KEY).is_none());
        for method in ["get", "delete"] {
            let integration = &out[method][INTEGRATION_KEY];
            assert_eq!(
                integration["requestParameters"]["integration.request.path.id"],
                Value::from("method.request.path.id")
            );
        }
        // The input is a borrowed copy and stays as it was.
        assert!(item["get"].get(INTEGRATION_KEY).is_none());
    }

    #[test]
    fn test_integrate_path_rejects_scalar_operation() {
        let item = parse_document("get: nope\n").unwrap();
        let err = integrate_path("/x", &item, &IntegrationOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidDocument(_)));
    }

    #[test]
    fn test_any_method_key_is_integrated() {
        let doc = parse_document(
            r#"
paths:
  /{proxy+}:
    x-amazon-apigateway-any-method:
      parameters:
        - { name: proxy, in: path, required: true }
"#,
        )
        .unwrap();

        let out = integrate_openapi(&doc, &IntegrationOptions::default()).unwrap();
        let integration = integration_of(&out, "/{proxy+}", "x-amazon-apigateway-any-method");

        assert_eq!(
            integration["uri"],
            Value::from("http://${stageVariables.CustomDomainName}/{proxy}")
        );
        assert_eq!(
            integration["requestParameters"]["integration.request.path.proxy"],
            Value::from("method.request.path.proxy")
        );
    }

    #[test]
    fn test_parameters_accumulate_across_methods() {
        let doc = parse_document(
            r#"
paths:
  /items/{id}:
    get:
      responses: {}
    put:
      parameters:
        - { name: id, in: path, required: true }
    post:
      responses: {}
"#,
        )
        .unwrap();

        let out = integrate_openapi(&doc, &IntegrationOptions::default()).unwrap();

        assert!(integration_of(&out, "/items/{id}", "get")
            .get("requestParameters")
            .is_none());
        assert!(integration_of(&out, "/items/{id}", "put")
            .get("requestParameters")
            .is_some());
        // Inherited from `put`, declared before it.
        assert!(integration_of(&out, "/items/{id}", "post")
            .get("requestParameters")
            .is_some());
    }

    #[test]
    fn test_per_operation_scope_does_not_inherit() {
        let doc = parse_document(
            r#"
paths:
  /items/{id}:
    parameters:
      - { name: tenant, in: path }
    put:
      parameters:
        - { name: id, in: path }
    post:
      responses: {}
"#,
        )
        .unwrap();
        let options = IntegrationOptions {
            parameter_scope: ParameterScope::PerOperation,
            ..Default::default()
        };

        let out = integrate_openapi(&doc, &options).unwrap();

        let put = &integration_of(&out, "/items/{id}", "put")["requestParameters"];
        assert_eq!(put.as_mapping().unwrap().len(), 2);
        let post = &integration_of(&out, "/items/{id}", "post")["requestParameters"];
        let keys: Vec<&str> = post.as_mapping().unwrap().keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["integration.request.path.tenant"]);
    }

    #[test]
    fn test_request_parameters_are_sorted() {
        let doc = parse_document(
            r#"
paths:
  /{zone}/{account}/{bucket}:
    parameters:
      - { name: zone, in: path }
      - { name: bucket, in: path }
    get:
      parameters:
        - { name: account, in: path }
        - { name: zone, in: path }
"#,
        )
        .unwrap();

        let out = integrate_openapi(&doc, &IntegrationOptions::default()).unwrap();
        let params = &integration_of(&out, "/{zone}/{account}/{bucket}", "get")["requestParameters"];
        let keys: Vec<&str> = params.as_mapping().unwrap().keys().filter_map(Value::as_str).collect();

        assert_eq!(
            keys,
            vec![
                "integration.request.path.account",
                "integration.request.path.bucket",
                "integration.request.path.zone",
            ]
        );
    }

    #[test]
    fn test_existing_integration_is_replaced() {
        let doc = parse_document(
            r#"
paths:
  /ping:
    get:
      x-amazon-apigateway-integration:
        type: mock
"#,
        )
        .unwrap();

        let out = integrate_openapi(&doc, &IntegrationOptions::default()).unwrap();
        let get = &out["paths"]["/ping"]["get"];

        assert_eq!(get.as_mapping().unwrap().len(), 1);
        assert_eq!(get[INTEGRATION_KEY]["type"], Value::from("http_proxy"));
    }

    #[test]
    fn test_binary_media_types_declared() {
        let doc = parse_document("openapi: 3.0.1\npaths: {}\n").unwrap();
        let out = integrate_openapi(&doc, &IntegrationOptions::default()).unwrap();

        assert_eq!(
            out[BINARY_MEDIA_TYPES_KEY],
            Value::Sequence(vec![Value::from("multipart/form-data")])
        );
        // Appended after existing root keys.
        let last = out.as_mapping().unwrap().keys().last().unwrap();
        assert_eq!(last, &Value::from(BINARY_MEDIA_TYPES_KEY));
    }

    #[test]
    fn test_missing_paths_is_invalid() {
        let doc = parse_document("openapi: 3.0.1\ninfo: {title: t}\n").unwrap();
        let err = integrate_openapi(&doc, &IntegrationOptions::default()).unwrap_err();
        assert!(format!("{}", err).contains("no `paths` mapping"));
    }

    #[test]
    fn test_non_mapping_root_is_invalid() {
        let doc = parse_document("- a\n- b\n").unwrap();
        let err = integrate_openapi(&doc, &IntegrationOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidDocument(_)));
    }
}
