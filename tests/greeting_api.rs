mod common;

use common::{create_user, open_session, TestApp, TEST_PASSWORD};
use serde_json::{json, Value};

async fn login_token(app: &TestApp, email: &str) -> String {
    let body: Value = app
        .client
        .post(app.url("/api/v1/login"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_hello_defaults_to_stranger() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/api/v1/hello")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Hello, stranger!");
}

#[tokio::test]
async fn test_hello_with_name() {
    let app = TestApp::new().await;

    let response = app
        .client
        .get(app.url("/api/v1/hello?name=Ana"))
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Hello, Ana!");
}

#[tokio::test]
async fn test_goodbye_without_token_returns_401() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/api/v1/goodbye")).send().await.unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Authentication Failed");
}

#[tokio::test]
async fn test_goodbye_with_login_token() {
    let app = TestApp::new().await;
    let (user_id, email) = create_user(&app, "client").await;
    let token = login_token(&app, &email).await;

    for authorization in [format!("Bearer {token}"), token.clone()] {
        let response = app
            .client
            .get(app.url("/api/v1/goodbye"))
            .header("authorization", authorization)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], format!("Goodbye, {user_id}!"));
    }
}

#[tokio::test]
async fn test_goodbye_rejects_tampered_token() {
    let app = TestApp::new().await;
    let (_, email) = create_user(&app, "client").await;
    let mut token = login_token(&app, &email).await;
    token.push('x');

    let response = app
        .client
        .get(app.url("/api/v1/goodbye"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_goodbye_accepts_session_access_token() {
    let app = TestApp::new().await;
    let (user_id, email) = create_user(&app, "client").await;
    let (access, _) = open_session(&app, &email).await;

    // Session claims carry `sub`, so the gate accepts them as well
    let response = app
        .bare_client()
        .get(app.url("/api/v1/goodbye"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], format!("Goodbye, {user_id}!"));
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/api/v1/health")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app
        .client
        .get(app.url("/api-docs/openapi.yml"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/yaml");
    let text = response.text().await.unwrap();
    assert!(text.starts_with("openapi:"));
    assert!(text.contains("/shift/summary:"));
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let app = TestApp::new().await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, app.url("/api/v1/session"))
        .header("origin", app.config.server.cors_origin.as_str())
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        app.config.server.cors_origin.as_str()
    );
    assert_eq!(response.headers()["access-control-allow-credentials"], "true");
}
