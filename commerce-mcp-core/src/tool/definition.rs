use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::{Tool, ToolError, ToolResult};
use crate::session::Session;

/// Future returned by a [`ToolHandler`].
pub type ToolFuture = BoxFuture<'static, Result<ToolResult, ToolError>>;

/// Type-erased tool body: `(arguments, context) -> result`.
pub type ToolHandler = Arc<dyn Fn(Value, ToolContext) -> ToolFuture + Send + Sync>;

/// Predicate deciding whether a session may use a tool.
pub type AccessPredicate = Arc<dyn Fn(&Session) -> bool + Send + Sync>;

/// Per-invocation context handed to a tool body.
#[derive(Debug, Clone)]
pub struct ToolContext {
    session: Arc<Session>,
}

impl ToolContext {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// An immutable description of one tool: metadata, body and access predicate.
///
/// Every field is cheap to clone. Decorators in [`crate::decorators`] take a
/// definition by value and return a new one whose handler or predicate wraps
/// the previous one; nothing is mutated in place, so clones taken before
/// decoration keep their original behavior.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Option<Value>,
    output_schema: Option<Value>,
    handler: ToolHandler,
    can_access: Option<AccessPredicate>,
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema.is_some())
            .field("output_schema", &self.output_schema.is_some())
            .field("can_access", &self.can_access.is_some())
            .finish()
    }
}

impl ToolDefinition {
    /// Create a definition from a name, description and async body.
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResult, ToolError>> + Send + 'static,
    {
        Self::from_parts(name, description, into_handler(handler))
    }

    /// Create a definition around an already erased handler.
    pub fn from_parts(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: ToolHandler,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
            output_schema: None,
            handler,
            can_access: None,
        }
    }

    /// Erase a typed [`Tool`] into a definition.
    ///
    /// Arguments are deserialized into `T::Input` before the body runs;
    /// failures become [`ToolError::InvalidArguments`].
    pub fn from_tool<T: Tool + 'static>(tool: T) -> Self {
        let name = tool.name().to_string();
        let description = tool.description().to_string();
        let input_schema = tool.input_schema();
        let output_schema = tool.output_schema();
        let tool = Arc::new(tool);

        Self::new(name, description, move |args, context| {
            let tool = Arc::clone(&tool);
            async move {
                let input: T::Input = serde_json::from_value(args)
                    .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
                tool.execute(input, context).await
            }
        })
        .with_input_schema(input_schema)
        .with_output_schema_opt(output_schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }

    pub fn output_schema(&self) -> Option<&Value> {
        self.output_schema.as_ref()
    }

    pub fn handler(&self) -> &ToolHandler {
        &self.handler
    }

    pub fn can_access(&self) -> Option<&AccessPredicate> {
        self.can_access.as_ref()
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub(crate) fn with_output_schema_opt(mut self, schema: Option<Value>) -> Self {
        self.output_schema = schema;
        self
    }

    pub fn with_erased_handler(mut self, handler: ToolHandler) -> Self {
        self.handler = handler;
        self
    }

    /// Replace the access predicate.
    pub fn with_access<P>(self, predicate: P) -> Self
    where
        P: Fn(&Session) -> bool + Send + Sync + 'static,
    {
        self.with_access_predicate(Some(Arc::new(predicate)))
    }

    pub fn with_access_predicate(mut self, predicate: Option<AccessPredicate>) -> Self {
        self.can_access = predicate;
        self
    }

    /// Apply a decorator: `definition.decorate(requires_section("commerce"))`.
    pub fn decorate<D>(self, decorator: D) -> Self
    where
        D: FnOnce(Self) -> Self,
    {
        decorator(self)
    }

    /// Whether the session may use this tool. Tools without a predicate are open to all.
    pub fn is_accessible_by(&self, session: &Session) -> bool {
        self.can_access
            .as_ref()
            .map_or(true, |predicate| predicate(session))
    }

    /// Run the body.
    pub fn call(&self, args: Value, context: ToolContext) -> ToolFuture {
        (self.handler)(args, context)
    }
}

fn into_handler<F, Fut>(handler: F) -> ToolHandler
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolResult, ToolError>> + Send + 'static,
{
    Arc::new(move |args, context| handler(args, context).boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserIdentity;
    use schemars::JsonSchema;
    use serde::Deserialize;

    fn context() -> ToolContext {
        ToolContext::new(Arc::new(Session::new(UserIdentity::new("1", "Ada"), ["commerce"])))
    }

    #[derive(Deserialize, JsonSchema)]
    struct GreetInput {
        /// Who to greet
        name: String,
    }

    struct GreetTool;

    impl Tool for GreetTool {
        type Input = GreetInput;

        fn name(&self) -> &str {
            "greet"
        }

        fn description(&self) -> &str {
            "Say hello"
        }

        async fn execute(
            &self,
            input: Self::Input,
            context: ToolContext,
        ) -> Result<ToolResult, ToolError> {
            Ok(format!("Hello {} from {}", input.name, context.session().user().name).into())
        }
    }

    #[tokio::test]
    async fn test_closure_definition() {
        let definition = ToolDefinition::new("echo", "Echo arguments", |args, _ctx| async move {
            Ok(ToolResult::text(args["message"].as_str().unwrap_or_default()))
        });

        assert_eq!(definition.name(), "echo");
        assert!(definition.input_schema().is_none());
        let result = definition
            .call(serde_json::json!({"message": "hi"}), context())
            .await
            .unwrap();
        assert_eq!(result.as_text(), "hi");
    }

    #[tokio::test]
    async fn test_typed_tool_definition() {
        let definition = ToolDefinition::from_tool(GreetTool);

        let schema = definition.input_schema().unwrap();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["name"].is_object());
        assert!(definition.output_schema().is_none());

        let result = definition
            .call(serde_json::json!({"name": "Grace"}), context())
            .await
            .unwrap();
        assert_eq!(result.as_text(), "Hello Grace from Ada");
    }

    #[tokio::test]
    async fn test_typed_tool_rejects_bad_arguments() {
        let definition = ToolDefinition::from_tool(GreetTool);
        let err = definition
            .call(serde_json::json!({"nom": 1}), context())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_access_defaults_to_open() {
        let definition = ToolDefinition::new("open", "Open tool", |_, _| async {
            Ok(ToolResult::text("ok"))
        });
        let session = Session::new(UserIdentity::default(), Vec::<String>::new());
        assert!(definition.is_accessible_by(&session));

        let definition = definition.with_access(|session| session.is_privileged());
        assert!(!definition.is_accessible_by(&session));
    }
}
