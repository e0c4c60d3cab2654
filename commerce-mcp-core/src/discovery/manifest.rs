//! `*.tool.json` manifests.
//!
//! A manifest declares a tool that proxies one downstream request:
//!
//! ```json
//! {
//!   "name": "add_order_note",
//!   "description": "Add an internal note to an order",
//!   "inputSchema": { "type": "object", "properties": { "orderId": { "type": "string" } } },
//!   "request": {
//!     "method": "POST",
//!     "path": "/umbraco/commerce/management/api/v1/order/{orderId}/notes",
//!     "store": "{storeIdOrAlias}",
//!     "body": { "message": "{message}" }
//!   },
//!   "requiresSection": "commerce"
//! }
//! ```
//!
//! `{name}` placeholders are filled from the call arguments. A body string
//! that is exactly one placeholder takes the argument's JSON value as-is.
//! Manifests are parsed leniently at the top level so that shape problems
//! are reported by discovery; `request` itself is strict.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::FutureExt;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{DiscoveryError, ToolExport, ToolModule};
use crate::http::{AuthenticatedClient, STORE_HEADER};
use crate::session::Session;
use crate::tool::{AccessPredicate, ToolContext, ToolError, ToolFuture, ToolHandler, ToolResult};

/// Glob, relative to the manifest directory, that selects manifest files.
pub const MANIFEST_PATTERN: &str = "**/*.tool.json";

/// A parsed manifest file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolManifest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
    pub output_schema: Option<Value>,
    pub request: Option<ProxyRequest>,
    pub requires_section: Option<String>,
    #[serde(default)]
    pub requires_admin: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ToolManifest {
    /// Convert into a discovery candidate whose body proxies through `client`.
    pub fn into_module(self, path: impl Into<String>, client: Arc<AuthenticatedClient>) -> ToolModule {
        let execute = match self.request.map(|request| request.into_handler(client)) {
            Some(Ok(handler)) => Some(handler),
            Some(Err(reason)) => return ToolModule::failed(path, reason),
            None => None,
        };

        ToolModule::new(
            path,
            ToolExport {
                name: self.name,
                description: self.description,
                input_schema: self.input_schema,
                output_schema: self.output_schema,
                execute,
                can_access: access_predicate(self.requires_section, self.requires_admin),
                extra: self.extra,
            },
        )
    }
}

fn access_predicate(section: Option<String>, admin: bool) -> Option<AccessPredicate> {
    if section.is_none() && !admin {
        return None;
    }
    Some(Arc::new(move |session: &Session| {
        section
            .as_deref()
            .map_or(true, |section| session.has_capability(section))
            && (!admin || session.is_privileged())
    }))
}

/// The downstream request a manifest tool performs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyRequest {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl ProxyRequest {
    pub fn http_method(&self) -> Result<Method, String> {
        match self.method.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            _ => Err(format!("unsupported HTTP method `{}`", self.method)),
        }
    }

    fn into_handler(self, client: Arc<AuthenticatedClient>) -> Result<ToolHandler, String> {
        let method = self.http_method()?;
        let request = Arc::new(self);

        Ok(Arc::new(move |args: Value, _context: ToolContext| -> ToolFuture {
            let request = Arc::clone(&request);
            let client = Arc::clone(&client);
            let method = method.clone();
            async move { request.send(&client, method, &args).await }.boxed()
        }))
    }

    /// Render the request from `args`, send it and return the JSON response.
    pub async fn send(
        &self,
        client: &AuthenticatedClient,
        method: Method,
        args: &Value,
    ) -> Result<ToolResult, ToolError> {
        let path = render(&self.path, args, true)?;
        let mut builder = client.request(method, &path)?;
        if let Some(store) = &self.store {
            builder = builder.header(STORE_HEADER, render(store, args, false)?);
        }
        if let Some(body) = &self.body {
            builder = builder.json(&render_value(body, args)?);
        }

        let response: Value = client.send_json(builder).await?;
        Ok(ToolResult::json(&response)?)
    }
}

/// Scan `dir` recursively for manifests and load each one.
///
/// Files that cannot be read or parsed become failed candidates so that
/// discovery reports them; only an unreadable directory is an error.
pub async fn scan(
    dir: &Path,
    client: Arc<AuthenticatedClient>,
) -> Result<Vec<ToolModule>, DiscoveryError> {
    let scan_error = |reason: String| DiscoveryError::Scan {
        dir: dir.to_path_buf(),
        reason,
    };

    let metadata = tokio::fs::metadata(dir)
        .await
        .map_err(|e| scan_error(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(scan_error("not a directory".to_string()));
    }

    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        MANIFEST_PATTERN
    );
    let paths = tokio::task::spawn_blocking(move || find_manifests(&pattern))
        .await
        .map_err(|e| scan_error(e.to_string()))?
        .map_err(scan_error)?;

    let mut modules = Vec::with_capacity(paths.len());
    for path in paths {
        let label = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();
        modules.push(load(&path, label, &client).await);
    }

    debug!(dir = %dir.display(), manifests = modules.len(), "scanned manifest directory");
    Ok(modules)
}

fn find_manifests(pattern: &str) -> Result<Vec<PathBuf>, String> {
    let mut paths: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|e| e.to_string())?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();

    // Deterministic order for duplicate-name reporting
    paths.sort();
    Ok(paths)
}

async fn load(path: &Path, label: String, client: &Arc<AuthenticatedClient>) -> ToolModule {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => return ToolModule::failed(label, e.to_string()),
    };
    match serde_json::from_str::<ToolManifest>(&text) {
        Ok(manifest) => manifest.into_module(label, Arc::clone(client)),
        Err(e) => ToolModule::failed(label, e.to_string()),
    }
}

/// Fill `{name}` placeholders from `args`. Braces around anything that is not
/// an identifier are kept literally.
fn render(template: &str, args: &Value, in_path: bool) -> Result<String, ToolError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_identifier(&after[..close]) => {
                let key = &after[..close];
                let value = scalar_argument(args, key)?;
                if in_path && value.contains(['/', '?', '#']) {
                    return Err(ToolError::InvalidArguments(format!(
                        "argument `{}` must not contain '/', '?' or '#'",
                        key
                    )));
                }
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn render_value(template: &Value, args: &Value) -> Result<Value, ToolError> {
    match template {
        Value::String(text) => match whole_placeholder(text) {
            Some(key) => args
                .get(key)
                .filter(|value| !value.is_null())
                .cloned()
                .ok_or_else(|| missing(key)),
            None => Ok(Value::String(render(text, args, false)?)),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, args))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| Ok((key.clone(), render_value(value, args)?)))
            .collect::<Result<serde_json::Map<_, _>, ToolError>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn whole_placeholder(text: &str) -> Option<&str> {
    text.strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .filter(|key| is_identifier(key))
}

fn scalar_argument(args: &Value, key: &str) -> Result<String, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(missing(key)),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(value.to_string()),
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "argument `{}` must be a string, number or boolean",
            key
        ))),
    }
}

fn missing(key: &str) -> ToolError {
    ToolError::InvalidArguments(format!("missing argument `{}`", key))
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::credential::{ClientCredentialsExchange, CredentialManager, TOKEN_ENDPOINT_PATH};
    use crate::discovery::{discover, ShapeViolation};
    use crate::session::UserIdentity;
    use serde_json::json;
    use std::fs;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> Arc<AuthenticatedClient> {
        let config = ApiConfig::new(base, "client", "secret").unwrap();
        let http = reqwest::Client::new();
        let exchange = ClientCredentialsExchange::new(http.clone(), &config).unwrap();
        Arc::new(AuthenticatedClient::for_config(
            http,
            &config,
            Arc::new(CredentialManager::new(exchange)),
        ))
    }

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn note_manifest() -> String {
        json!({
            "name": "add_order_note",
            "description": "Add an internal note to an order",
            "inputSchema": {"type": "object"},
            "request": {
                "method": "post",
                "path": "/umbraco/commerce/management/api/v1/order/{orderId}/notes",
                "store": "{storeIdOrAlias}",
                "body": {"message": "{message}", "pinned": "{pinned}"}
            },
            "requiresSection": "commerce"
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_scan_collects_valid_and_reports_invalid_manifests() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "orders/add-note.tool.json", &note_manifest());
        write(
            dir.path(),
            "orders/no-request.tool.json",
            r#"{"name": "no_request", "description": "Has no request"}"#,
        );
        write(dir.path(), "broken.tool.json", "{ not json");
        write(dir.path(), "notes.json", r#"{"name": "ignored"}"#);

        let modules = scan(dir.path(), client("http://localhost")).await.unwrap();
        assert_eq!(modules.len(), 3);

        let report = discover(modules).unwrap();
        assert_eq!(report.names(), vec!["add_order_note"]);
        assert_eq!(report.rejected.len(), 2);
        assert!(matches!(report.rejected[0].reason, ShapeViolation::Load(_)));
        assert_eq!(report.rejected[0].path, "broken.tool.json");
        assert_eq!(
            report.rejected[1].reason,
            ShapeViolation::MissingField("execute")
        );
    }

    #[tokio::test]
    async fn test_unexpected_fields_and_strict_request() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "extra.tool.json",
            r#"{"name": "x", "description": "X", "handler": "eval", "request": {"method": "GET", "path": "/x"}}"#,
        );
        write(
            dir.path(),
            "loose.tool.json",
            r#"{"name": "y", "description": "Y", "request": {"method": "GET", "path": "/y", "script": "rm"}}"#,
        );
        write(
            dir.path(),
            "verb.tool.json",
            r#"{"name": "z", "description": "Z", "request": {"method": "TRACE", "path": "/z"}}"#,
        );

        let report = discover(scan(dir.path(), client("http://localhost")).await.unwrap()).unwrap();
        assert!(report.tools.is_empty());

        let reasons: Vec<_> = report.rejected.iter().map(|r| r.reason.clone()).collect();
        assert_eq!(
            reasons[0],
            ShapeViolation::UnexpectedFields(vec!["handler".to_string()])
        );
        assert!(matches!(&reasons[1], ShapeViolation::Load(msg) if msg.contains("script")));
        assert!(matches!(&reasons[2], ShapeViolation::Load(msg) if msg.contains("TRACE")));
    }

    #[tokio::test]
    async fn test_manifest_access_flags() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "refund.tool.json",
            r#"{"name": "refund", "description": "Refund", "requiresSection": "commerce", "requiresAdmin": true,
                "request": {"method": "POST", "path": "/refund"}}"#,
        );

        let report = discover(scan(dir.path(), client("http://localhost")).await.unwrap()).unwrap();
        let tool = &report.tools[0];

        let admin = Session::new(UserIdentity::new("1", "Ada").admin(), ["commerce"]);
        let editor = Session::new(UserIdentity::new("2", "Grace"), ["commerce"]);
        let outsider = Session::new(UserIdentity::new("3", "Linus").admin(), ["content"]);
        assert!(tool.is_accessible_by(&admin));
        assert!(!tool.is_accessible_by(&editor));
        assert!(!tool.is_accessible_by(&outsider));
    }

    #[tokio::test]
    async fn test_manifest_tool_proxies_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_ENDPOINT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "manifest-token",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/umbraco/commerce/management/api/v1/order/42/notes"))
            .and(header("store", "blendid"))
            .and(header("authorization", "Bearer manifest-token"))
            .and(body_json(json!({"message": "call back", "pinned": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "n-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "add-note.tool.json", &note_manifest());
        let report = discover(scan(dir.path(), client(&server.uri())).await.unwrap()).unwrap();

        let context = ToolContext::new(Arc::new(Session::new(UserIdentity::default(), ["commerce"])));
        let result = report.tools[0]
            .call(
                json!({"orderId": 42, "storeIdOrAlias": "blendid", "message": "call back", "pinned": true}),
                context,
            )
            .await
            .unwrap();

        assert!(!result.is_error());
        let body: Value = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(body["id"], "n-1");
    }

    #[tokio::test]
    async fn test_scan_of_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = scan(&missing, client("http://localhost")).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Scan { .. }));
    }

    #[test]
    fn test_render_placeholders() {
        let args = json!({"orderId": "abc", "page": 2});
        assert_eq!(
            render("/order/{orderId}?page={page}", &args, false).unwrap(),
            "/order/abc?page=2"
        );
        assert_eq!(render("{not a key}", &args, false).unwrap(), "{not a key}");
        assert!(matches!(
            render("/order/{missing}", &args, true),
            Err(ToolError::InvalidArguments(msg)) if msg == "missing argument `missing`"
        ));
    }

    #[test]
    fn test_render_rejects_path_injection() {
        let args = json!({"orderId": "../stores"});
        assert!(render("/order/{orderId}", &args, true).is_err());
        assert_eq!(
            render("note about {orderId}", &args, false).unwrap(),
            "note about ../stores"
        );
    }

    #[test]
    fn test_render_value_keeps_argument_types() {
        let args = json!({"lines": [{"id": 1}], "note": "hi"});
        let rendered = render_value(
            &json!({"orderLines": "{lines}", "text": "Note: {note}", "fixed": 3}),
            &args,
        )
        .unwrap();
        assert_eq!(
            rendered,
            json!({"orderLines": [{"id": 1}], "text": "Note: hi", "fixed": 3})
        );
    }
}
