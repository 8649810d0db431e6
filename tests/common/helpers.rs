//! Shared test helper functions

use crate::common::TestApp;

pub const TEST_PASSWORD: &str = "SecurePass123!";

/// Generates a unique test email
pub fn generate_test_email() -> String {
    format!("test_{}@example.com", nanoid::nanoid!(12, &nanoid::alphabet::SAFE[2..]).to_lowercase())
}

/// Creates a user through the API and returns `(id, email)`
pub async fn create_user(app: &TestApp, user_type: &str) -> (String, String) {
    let email = generate_test_email();
    let response = app
        .client
        .post(app.url("/api/v1/user"))
        .json(&serde_json::json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": "Test User",
            "phone": "07700 900123",
            "type": user_type
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    (body["userId"].as_str().unwrap().to_string(), email)
}

/// Opens a session for `email` and returns `(accessToken, refreshToken)`
pub async fn open_session(app: &TestApp, email: &str) -> (String, String) {
    let response = app
        .client
        .post(app.url("/api/v1/session"))
        .header("user-agent", "shiftdesk-tests")
        .json(&serde_json::json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}
