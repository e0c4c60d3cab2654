use std::sync::Arc;

use commerce_mcp_core::{
    ApiConfig, AuthenticatedClient, ClientCredentialsExchange, CredentialManager, Session,
    ToolContext, ToolDefinition, ToolResult, UserIdentity, TOKEN_ENDPOINT_PATH,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ORDER_ID: &str = "4f8e3c2a-1b6d-4e9f-a7c5-0d2b8e6f1a3c";

/// A mock commerce API that already answers the token endpoint.
pub async fn commerce_api() -> (MockServer, Arc<AuthenticatedClient>) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tool-token",
            "token_type": "Bearer",
            "expires_in": 300
        })))
        .mount(&server)
        .await;

    let config = ApiConfig::new(&server.uri(), "mcp-client", "mcp-secret").unwrap();
    let http = reqwest::Client::new();
    let exchange = ClientCredentialsExchange::new(http.clone(), &config).unwrap();
    let credentials = Arc::new(CredentialManager::new(exchange));
    let client = Arc::new(AuthenticatedClient::for_config(http, &config, credentials));
    (server, client)
}

pub fn commerce_session() -> Session {
    Session::new(UserIdentity::new("7", "API User"), ["commerce"])
}

pub fn commerce_admin() -> Session {
    Session::new(UserIdentity::new("1", "Administrator").admin(), ["commerce"])
}

pub fn content_editor() -> Session {
    Session::new(UserIdentity::new("9", "Editor"), ["content"])
}

/// Call a definition the way the registry would, with error containment.
pub async fn call(definition: &ToolDefinition, args: Value) -> ToolResult {
    let contained = commerce_mcp_core::with_error_handling(definition.clone());
    let context = ToolContext::new(Arc::new(commerce_session()));
    contained.call(args, context).await.unwrap()
}
