use axum::Json;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use signup_client::{Client, PostErrorKind, SignupPayload, send_signup};
use sonic_rs::Value;
use tokio::net::TcpListener;

#[tokio::test]
async fn e2e_submission_roundtrip() {
    let server = TestServer::start().await;
    let client = Client::new();

    let reply = send_signup(&client, &server.url("/signup"), &SignupPayload::test_user())
        .await
        .expect("signup reply should parse");

    let expected: Value =
        sonic_rs::from_str(r#"{"Success":"Registration successful."}"#).expect("fixture is json");
    assert_eq!(reply, expected);
}

#[tokio::test]
async fn e2e_echoed_payload_round_trips() {
    let server = TestServer::start().await;
    let client = Client::new();
    let payload = SignupPayload::test_user();

    // The echo route only answers requests the Json extractor accepts, so a
    // matching reply also proves the content-type header went out as
    // application/json.
    let echoed: SignupPayload = client
        .send_as(server.url("/signup-echo"), &payload)
        .await
        .expect("echoed payload should parse back");
    assert_eq!(echoed, payload);
}

#[tokio::test]
async fn e2e_rejection_reply_resolves_with_its_body() {
    let server = TestServer::start().await;
    let client = Client::new();

    let reply = send_signup(
        &client,
        &server.url("/signup-reject"),
        &SignupPayload::test_user(),
    )
    .await
    .expect("a 400 with a json body should still resolve");

    let expected: Value = sonic_rs::from_str(r#"{"Error":"postcode is onjuist"}"#)
        .expect("fixture is json");
    assert_eq!(reply, expected);
}

#[tokio::test]
async fn e2e_non_json_reply_fails_with_parse_kind() {
    let server = TestServer::start().await;
    let client = Client::new();

    let err = send_signup(
        &client,
        &server.url("/signup-text"),
        &SignupPayload::test_user(),
    )
    .await
    .expect_err("plain-text reply should fail to parse");
    assert_eq!(err.kind(), PostErrorKind::Parse);
}

#[tokio::test]
async fn e2e_refused_connection_fails_with_transport_kind() {
    // Grab an ephemeral port, then close the listener so the connection is
    // refused.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = Client::new();
    let err = send_signup(
        &client,
        &format!("http://{}/signup", addr),
        &SignupPayload::test_user(),
    )
    .await
    .expect_err("refused connection should fail the submission");
    assert_eq!(err.kind(), PostErrorKind::Transport);
}

struct TestServer {
    base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let app = Router::new()
            .route("/signup", post(signup_handler))
            .route("/signup-echo", post(echo_handler))
            .route("/signup-reject", post(reject_handler))
            .route("/signup-text", post(text_handler));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url, task }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn signup_handler(Json(_enrollment): Json<Value>) -> (StatusCode, &'static str) {
    (StatusCode::OK, r#"{"Success":"Registration successful."}"#)
}

async fn echo_handler(Json(enrollment): Json<Value>) -> Json<Value> {
    Json(enrollment)
}

async fn reject_handler() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, r#"{"Error":"postcode is onjuist"}"#)
}

async fn text_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "definitely not json")
}
