//! Startup flow against a mocked back office: resolve the session, discover
//! compiled and manifest tools, register what the session may use.

use std::fs;
use std::sync::Arc;

use commerce_mcp_core::{
    discover_and_register, requires_admin, requires_section, ApiConfig, AuthenticatedClient,
    ClientCredentialsExchange, CredentialManager, McpToolServer, SessionResolver, SessionService,
    ToolDefinition, ToolDiscovery, ToolModule, ToolRegistrationContext, ToolResult,
    TOKEN_ENDPOINT_PATH,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn back_office(sections: &[&str], admin: bool) -> (MockServer, Arc<AuthenticatedClient>) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "startup-token",
            "token_type": "Bearer",
            "expires_in": 300
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/umbraco/management/api/v1/user/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c9f2b1a0-0000-4000-8000-000000000001",
            "name": "MCP API User",
            "isAdmin": admin,
            "allowedSections": sections
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

fn compiled_modules() -> Vec<ToolModule> {
    let tool = |name: &str| {
        ToolDefinition::new(name, format!("{} tool", name), |_, _| async {
            Ok(ToolResult::text("ok"))
        })
    };

    vec![
        ToolModule::new(
            "orders::get_order_by_id_tool",
            tool("get_order_by_id").decorate(requires_section("commerce")),
        ),
        ToolModule::new(
            "orders::refund_order_payment_tool",
            tool("refund_order_payment")
                .decorate(requires_section("commerce"))
                .decorate(requires_admin),
        ),
        ToolModule::new("system::server_time_tool", tool("server_time")),
        ToolModule::without_export("orders::draft_tool"),
    ]
}

fn manifest_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("stores")).unwrap();
    fs::write(
        dir.path().join("stores/get-store.tool.json"),
        json!({
            "name": "get_store",
            "description": "Fetch a store",
            "request": {"method": "GET", "path": "/umbraco/commerce/management/api/v1/store/{storeIdOrAlias}"},
            "requiresSection": "commerce"
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        dir.path().join("ping.tool.json"),
        json!({
            "name": "ping_back_office",
            "description": "Check the back office answers",
            "request": {"method": "GET", "path": "/umbraco/management/api/v1/server/status"}
        })
        .to_string(),
    )
    .unwrap();
    dir
}

async fn register(sections: &[&str], admin: bool) -> Vec<String> {
    let (_server, client) = back_office(sections, admin).await;
    let session = Arc::new(SessionService::new(Arc::clone(&client)).resolve().await.unwrap());
    let dir = manifest_dir();

    let discovery = ToolDiscovery::new()
        .with_modules(compiled_modules())
        .with_manifest_dir(dir.path(), client);

    let mut server = McpToolServer::new("commerce-mcp", "test", Arc::clone(&session));
    discover_and_register(ToolRegistrationContext::new(&mut server, session), discovery)
        .await
        .unwrap();

    server.tool_names().map(String::from).collect()
}

#[tokio::test]
async fn test_session_without_commerce_gets_no_commerce_tools() {
    let installed = register(&["content", "media"], false).await;
    assert_eq!(installed, vec!["ping_back_office", "server_time"]);
}

#[tokio::test]
async fn test_commerce_session_gets_commerce_tools() {
    let installed = register(&["commerce"], false).await;
    assert_eq!(
        installed,
        vec!["get_order_by_id", "get_store", "ping_back_office", "server_time"]
    );
}

#[tokio::test]
async fn test_admin_commerce_session_gets_everything() {
    let installed = register(&["commerce"], true).await;
    assert_eq!(
        installed,
        vec![
            "get_order_by_id",
            "get_store",
            "ping_back_office",
            "refund_order_payment",
            "server_time"
        ]
    );
}
