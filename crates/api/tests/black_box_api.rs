use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::json;

use clientdesk_api::app::services::AppServices;
use clientdesk_domain::AccessToken;
use clientdesk_store::{InMemoryStore, Store};

const ADMIN_KEY: &str = "test-admin-key";

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, but with an injected in-memory store so tests
        // can pre-seed state, bound to an ephemeral port.
        let store = Arc::new(InMemoryStore::new());
        let services = Arc::new(AppServices::with_store(
            store.clone() as Arc<dyn Store>,
            "http://reports.test",
        ));
        let app = clientdesk_api::app::build_router(services, ADMIN_KEY.to_string());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_client(client: &reqwest::Client, base: &str, name: &str) -> serde_json::Value {
    let res = client
        .post(format!("{base}/clients"))
        .header("x-admin-api-key", ADMIN_KEY)
        .json(&json!({ "name": name, "email": format!("{}@example.com", name.to_lowercase()) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn create_project(
    client: &reqwest::Client,
    base: &str,
    client_id: &str,
    budget: i64,
) -> serde_json::Value {
    let res = client
        .post(format!("{base}/projects"))
        .header("x-admin-api-key", ADMIN_KEY)
        .json(&json!({ "client_id": client_id, "name": "System Migration", "budget": budget }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn record_payment(
    client: &reqwest::Client,
    base: &str,
    project_id: &str,
    amount: i64,
) -> (StatusCode, serde_json::Value) {
    let res = client
        .post(format!("{base}/payments"))
        .header("x-admin-api-key", ADMIN_KEY)
        .json(&json!({
            "project_id": project_id,
            "date": "2025-01-15",
            "amount": amount,
            "type": "Hito",
        }))
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", server.base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_surface_requires_the_api_key() {
    let server = TestServer::spawn().await;
    let http = reqwest::Client::new();

    let res = http
        .post(format!("{}/clients", server.base_url))
        .json(&json!({ "name": "Acme", "email": "acme@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = http
        .post(format!("{}/admin-log", server.base_url))
        .header("x-admin-api-key", "wrong-key")
        .json(&json!({ "action": "ADMIN_LOG", "detail": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = http
        .post(format!("{}/admin-log", server.base_url))
        .header("x-admin-api-key", ADMIN_KEY)
        .json(&json!({ "action": "ADMIN_LOG", "detail": "manual note" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn full_ledger_and_report_flow() {
    let server = TestServer::spawn().await;
    let http = reqwest::Client::new();
    let base = &server.base_url;

    let client = create_client(&http, base, "Innovatech").await;
    let client_id = client["id"].as_str().unwrap();

    let project = create_project(&http, base, client_id, 15_000).await;
    let project_id = project["id"].as_str().unwrap();
    assert_eq!(project["balance"], json!(15_000));
    assert_eq!(project["status"], json!("active"));

    let (status, body) = record_payment(&http, base, project_id, 5_000).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["project"]["balance"], json!(10_000));
    assert!(body.get("warning").is_none());

    let (_, body) = record_payment(&http, base, project_id, 7_000).await;
    assert_eq!(body["project"]["balance"], json!(3_000));
    assert_eq!(body["project"]["status"], json!("active"));

    // Overpayment clamps at zero, closes the project, and warns.
    let (status, body) = record_payment(&http, base, project_id, 4_000).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["project"]["balance"], json!(0));
    assert_eq!(body["project"]["status"], json!("closed"));
    assert!(body["warning"].is_string());

    // Token issuance is part of the public surface.
    let res = http
        .post(format!("{base}/generate-token"))
        .json(&json!({ "client_id": client_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let issued: serde_json::Value = res.json().await.unwrap();
    assert_eq!(issued["success"], json!(true));
    let token = issued["token"].as_str().unwrap();
    assert!(issued["link"]
        .as_str()
        .unwrap()
        .starts_with("http://reports.test?token="));

    // Read-only report via GET ?token=...
    let res = http
        .get(format!("{base}/get-client-data?token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: serde_json::Value = res.json().await.unwrap();
    assert_eq!(report["data"]["client"]["id"], json!(client_id));
    assert_eq!(report["data"]["projects"].as_array().unwrap().len(), 1);
    assert_eq!(report["data"]["payments"].as_array().unwrap().len(), 3);

    // Same report via POST {token}.
    let res = http
        .post(format!("{base}/get-client-data"))
        .json(&json!({ "token": token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Audit trail is observable through the admin surface.
    let res = http
        .get(format!("{base}/logs"))
        .header("x-admin-api-key", ADMIN_KEY)
        .send()
        .await
        .unwrap();
    let logs: serde_json::Value = res.json().await.unwrap();
    let actions: Vec<&str> = logs["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"CLIENT_ACCESS"));
    assert!(actions.contains(&"LINK_GENERATED"));
    assert!(actions.contains(&"PAYMENT_CREATE"));
}

#[tokio::test]
async fn generate_token_input_errors() {
    let server = TestServer::spawn().await;
    let http = reqwest::Client::new();
    let base = &server.base_url;

    let res = http
        .post(format!("{base}/generate-token"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = http
        .post(format!("{base}/generate-token"))
        .json(&json!({ "client_id": uuid::Uuid::now_v7().to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_data_rejects_missing_unknown_and_expired_tokens() {
    let server = TestServer::spawn().await;
    let http = reqwest::Client::new();
    let base = &server.base_url;

    let res = http
        .get(format!("{base}/get-client-data"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = http
        .get(format!("{base}/get-client-data?token=TKN-UNKNOWN"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Seed an already-expired token directly in the store.
    let client = create_client(&http, base, "Global").await;
    let client_id = client["id"].as_str().unwrap().parse().unwrap();
    let expired = AccessToken {
        token: "TKN-EXPIRED00001".to_string(),
        client_id,
        expires_at: Utc::now() - Duration::hours(1),
    };
    server.store.insert_token(&expired).await.unwrap();

    let res = http
        .get(format!("{base}/get-client-data?token={}", expired.token))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The denial is audited.
    let res = http
        .get(format!("{base}/logs"))
        .header("x-admin-api-key", ADMIN_KEY)
        .send()
        .await
        .unwrap();
    let logs: serde_json::Value = res.json().await.unwrap();
    assert!(logs["items"]
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l["action"] == json!("ACCESS_DENIED")));
}

#[tokio::test]
async fn blocked_deletes_leave_rows_in_place() {
    let server = TestServer::spawn().await;
    let http = reqwest::Client::new();
    let base = &server.base_url;

    let client = create_client(&http, base, "Acme").await;
    let client_id = client["id"].as_str().unwrap();
    let project = create_project(&http, base, client_id, 10_000).await;
    let project_id = project["id"].as_str().unwrap();
    record_payment(&http, base, project_id, 2_000).await;

    let res = http
        .delete(format!("{base}/projects/{project_id}"))
        .header("x-admin-api-key", ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = http
        .delete(format!("{base}/clients/{client_id}"))
        .header("x-admin-api-key", ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Both rows are still there.
    let res = http
        .get(format!("{base}/projects/{project_id}"))
        .header("x-admin-api-key", ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = http
        .get(format!("{base}/clients/{client_id}"))
        .header("x-admin-api-key", ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn edit_project_recomputes_balance_over_http() {
    let server = TestServer::spawn().await;
    let http = reqwest::Client::new();
    let base = &server.base_url;

    let client = create_client(&http, base, "Dynamics").await;
    let project = create_project(&http, base, client["id"].as_str().unwrap(), 10_000).await;
    let project_id = project["id"].as_str().unwrap();
    record_payment(&http, base, project_id, 4_000).await;

    let res = http
        .patch(format!("{base}/projects/{project_id}"))
        .header("x-admin-api-key", ADMIN_KEY)
        .json(&json!({ "budget": 12_000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["balance"], json!(8_000));
    assert_eq!(body["status"], json!("active"));

    // Rejected amounts surface as 400.
    let (status, _) = {
        let res = http
            .post(format!("{base}/payments"))
            .header("x-admin-api-key", ADMIN_KEY)
            .json(&json!({
                "project_id": project_id,
                "amount": 0,
                "type": "Inicial",
            }))
            .send()
            .await
            .unwrap();
        (res.status(), res.text().await.unwrap())
    };
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
