//! Tool discovery.
//!
//! Discovery turns a set of candidate modules into validated
//! [`ToolDefinition`]s. A candidate is a [`ToolModule`]: a path plus the
//! untyped [`ToolExport`] the module declares. Only paths that follow the
//! tool naming convention are considered (see [`is_tool_module`]).
//!
//! Every export is checked against the same shape before it is trusted:
//!
//! - `name` and `description` are present and non-empty
//! - `execute` is present
//! - `inputSchema` / `outputSchema`, when present, are JSON objects
//! - no other top-level fields exist
//!
//! Modules that fail the check are skipped and listed in
//! [`DiscoveryReport::rejected`]; they never abort the pass. Two valid
//! modules declaring the same name do abort it with
//! [`DiscoveryError::DuplicateName`].
//!
//! Candidates come from two sources. Compiled command modules are listed
//! explicitly by the caller, and a manifest directory of `*.tool.json`
//! files can be scanned at startup (see [`manifest`]).

pub mod manifest;

pub use manifest::{ProxyRequest, ToolManifest, MANIFEST_PATTERN};

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::http::AuthenticatedClient;
use crate::tool::{AccessPredicate, ToolDefinition, ToolHandler};

const TOOL_SUFFIXES: [&str; 3] = ["_tool", "-tool", ".tool"];
const EXCLUDED_SUFFIXES: [&str; 4] = ["_test", "-test", "_spec", "-spec"];
const EXCLUDED_MARKERS: [&str; 2] = ["test", "spec"];
const STRIPPED_EXTENSIONS: [&str; 2] = [".rs", ".json"];

/// Why a candidate module was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeViolation {
    #[error("module has no default export")]
    MissingExport,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("unexpected top-level field(s): {}", .0.join(", "))]
    UnexpectedFields(Vec<String>),

    #[error("`{field}` is not a valid schema: {reason}")]
    InvalidSchema { field: &'static str, reason: String },

    #[error("failed to load module: {0}")]
    Load(String),
}

/// Errors that abort discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("duplicate tool name `{name}` declared by {first} and {second}")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },

    #[error("failed to scan {}: {reason}", .dir.display())]
    Scan { dir: PathBuf, reason: String },
}

/// Untyped default export of a tool module.
///
/// Every field is optional so that malformed modules can be represented and
/// reported instead of failing to load.
#[derive(Clone, Default)]
pub struct ToolExport {
    pub name: Option<String>,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
    pub output_schema: Option<Value>,
    pub execute: Option<ToolHandler>,
    pub can_access: Option<AccessPredicate>,
    /// Any other top-level fields declared by the module.
    pub extra: BTreeMap<String, Value>,
}

impl std::fmt::Debug for ToolExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExport")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema.is_some())
            .field("output_schema", &self.output_schema.is_some())
            .field("execute", &self.execute.is_some())
            .field("can_access", &self.can_access.is_some())
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolExport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn execute(mut self, handler: ToolHandler) -> Self {
        self.execute = Some(handler);
        self
    }

    pub fn can_access(mut self, predicate: AccessPredicate) -> Self {
        self.can_access = Some(predicate);
        self
    }

    /// Record an additional top-level field.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Check the export's shape and build a definition from it.
    pub fn validate(&self) -> Result<ToolDefinition, ShapeViolation> {
        let name = required_text(self.name.as_deref(), "name")?;
        let description = required_text(self.description.as_deref(), "description")?;
        let execute = self
            .execute
            .clone()
            .ok_or(ShapeViolation::MissingField("execute"))?;

        check_schema(self.input_schema.as_ref(), "inputSchema")?;
        check_schema(self.output_schema.as_ref(), "outputSchema")?;

        if !self.extra.is_empty() {
            return Err(ShapeViolation::UnexpectedFields(
                self.extra.keys().cloned().collect(),
            ));
        }

        let mut definition = ToolDefinition::from_parts(name, description, execute)
            .with_output_schema_opt(self.output_schema.clone())
            .with_access_predicate(self.can_access.clone());
        if let Some(schema) = &self.input_schema {
            definition = definition.with_input_schema(schema.clone());
        }
        Ok(definition)
    }
}

impl From<ToolDefinition> for ToolExport {
    fn from(definition: ToolDefinition) -> Self {
        Self {
            name: Some(definition.name().to_string()),
            description: Some(definition.description().to_string()),
            input_schema: definition.input_schema().cloned(),
            output_schema: definition.output_schema().cloned(),
            execute: Some(Arc::clone(definition.handler())),
            can_access: definition.can_access().cloned(),
            extra: BTreeMap::new(),
        }
    }
}

fn required_text<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ShapeViolation> {
    match value {
        None => Err(ShapeViolation::MissingField(field)),
        Some(text) if text.trim().is_empty() => Err(ShapeViolation::EmptyField(field)),
        Some(text) => Ok(text),
    }
}

fn check_schema(schema: Option<&Value>, field: &'static str) -> Result<(), ShapeViolation> {
    match schema {
        None | Some(Value::Object(_)) => Ok(()),
        Some(other) => Err(ShapeViolation::InvalidSchema {
            field,
            reason: format!("expected an object, found {}", json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A candidate module: where it came from and what it exports.
#[derive(Debug, Clone)]
pub struct ToolModule {
    path: String,
    export: Result<Option<ToolExport>, String>,
}

impl ToolModule {
    pub fn new(path: impl Into<String>, export: impl Into<ToolExport>) -> Self {
        Self {
            path: path.into(),
            export: Ok(Some(export.into())),
        }
    }

    /// A module that declares no default export.
    pub fn without_export(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            export: Ok(None),
        }
    }

    /// A module that could not be loaded at all.
    pub fn failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            export: Err(reason.into()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn validate(&self) -> Result<ToolDefinition, ShapeViolation> {
        match &self.export {
            Err(reason) => Err(ShapeViolation::Load(reason.clone())),
            Ok(None) => Err(ShapeViolation::MissingExport),
            Ok(Some(export)) => export.validate(),
        }
    }
}

/// A module skipped during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedModule {
    pub path: String,
    pub reason: ShapeViolation,
}

/// Outcome of a discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub tools: Vec<ToolDefinition>,
    pub rejected: Vec<RejectedModule>,
}

impl DiscoveryReport {
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolDefinition::name).collect()
    }
}

/// Whether a module path follows the tool naming convention.
///
/// The last path segment, minus a `.rs` or `.json` extension, must end in
/// `_tool`, `-tool` or `.tool`. Test and spec modules are excluded, as is
/// anything under a `tests` directory. Segments may be separated by `/`,
/// `\` or `::`.
pub fn is_tool_module(path: &str) -> bool {
    let normalized = path.replace("::", "/").replace('\\', "/");
    let mut segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

    let Some(file) = segments.pop() else {
        return false;
    };
    if segments.contains(&"tests") {
        return false;
    }

    let stem = STRIPPED_EXTENSIONS
        .iter()
        .find_map(|ext| file.strip_suffix(ext))
        .unwrap_or(file);

    let excluded = stem.split('.').any(|part| {
        EXCLUDED_MARKERS.contains(&part)
            || EXCLUDED_SUFFIXES.iter().any(|suffix| part.ends_with(suffix))
    });

    !excluded && TOOL_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix))
}

/// Validate candidate modules and collect the well-formed ones.
pub fn discover<I>(modules: I) -> Result<DiscoveryReport, DiscoveryError>
where
    I: IntoIterator<Item = ToolModule>,
{
    let mut report = DiscoveryReport::default();
    let mut seen: HashMap<String, String> = HashMap::new();

    for module in modules {
        if !is_tool_module(module.path()) {
            debug!(path = %module.path(), "not a tool module, skipping");
            continue;
        }

        match module.validate() {
            Ok(definition) => {
                if let Some(first) = seen.get(definition.name()) {
                    return Err(DiscoveryError::DuplicateName {
                        name: definition.name().to_string(),
                        first: first.clone(),
                        second: module.path,
                    });
                }
                debug!(path = %module.path(), tool = %definition.name(), "discovered tool");
                seen.insert(definition.name().to_string(), module.path);
                report.tools.push(definition);
            }
            Err(reason) => {
                warn!(path = %module.path(), %reason, "tool module failed validation");
                report.rejected.push(RejectedModule {
                    path: module.path,
                    reason,
                });
            }
        }
    }

    info!(
        discovered = report.tools.len(),
        rejected = report.rejected.len(),
        "tool discovery finished"
    );
    Ok(report)
}

/// Builder that gathers candidates from every source and runs discovery once.
///
/// ```rust,no_run
/// # async fn example(client: std::sync::Arc<commerce_mcp_core::AuthenticatedClient>) -> Result<(), commerce_mcp_core::DiscoveryError> {
/// use commerce_mcp_core::discovery::ToolDiscovery;
///
/// let report = ToolDiscovery::new()
///     .with_manifest_dir("./tools", client)
///     .run()
///     .await?;
/// println!("found {:?}", report.names());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ToolDiscovery {
    modules: Vec<ToolModule>,
    manifest_dirs: Vec<(PathBuf, Arc<AuthenticatedClient>)>,
}

impl ToolDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module: ToolModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn with_modules(mut self, modules: impl IntoIterator<Item = ToolModule>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Scan `dir` for `*.tool.json` manifests whose requests go through `client`.
    pub fn with_manifest_dir(
        mut self,
        dir: impl Into<PathBuf>,
        client: Arc<AuthenticatedClient>,
    ) -> Self {
        self.manifest_dirs.push((dir.into(), client));
        self
    }

    pub async fn run(self) -> Result<DiscoveryReport, DiscoveryError> {
        let mut modules = self.modules;
        for (dir, client) in self.manifest_dirs {
            modules.extend(manifest::scan(&dir, client).await?);
        }
        discover(modules)
    }
}
