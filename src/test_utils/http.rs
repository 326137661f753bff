use axum::{body::Body, http::StatusCode, response::Response};
use axum_test::TestServer;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{AppState, auth::LogInResponse, endpoints, routing::build_router};

pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

pub(crate) fn get_test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");

    AppState::new(connection, "foobar")
        .expect("could not create app state")
        .with_password_hash_cost(4)
}

pub(crate) fn get_test_server() -> TestServer {
    TestServer::try_new(build_router(get_test_app_state())).expect("could not create test server")
}

/// Register a user named "Test User" with [TEST_PASSWORD].
pub(crate) async fn register_test_user(server: &TestServer, email: &str) {
    server
        .post(endpoints::REGISTER)
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": "Test User",
        }))
        .await
        .assert_status(StatusCode::CREATED);
}

/// Register and log in a user, returning the log-in response with the bearer token.
pub(crate) async fn log_in_test_user(server: &TestServer, email: &str) -> LogInResponse {
    register_test_user(server, email).await;

    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    response.json::<LogInResponse>()
}

pub(crate) async fn parse_json_response<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body");

    serde_json::from_slice(&body).expect("Could not parse response body as JSON")
}
