//! PrusaLink client tests against an in-process fake printer.
//!
//! The fake speaks just enough of the v1 API (status + print) and enforces
//! digest authentication the way the printer does: an unauthenticated request
//! gets a challenge, a request with an outdated nonce gets `stale=true`.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use printqueue_core::printer::digest::{DigestChallenge, DigestRequest};
use printqueue_core::testing::fixtures;
use printqueue_core::{
    DataCollector, JsonlTelemetryLog, PollPolicy, PrinterClient, PrinterConfig, PrinterError,
    PrinterState, PrusaLinkClient, TelemetrySink,
};

const USERNAME: &str = "maker";
const PASSWORD: &str = "s3cret";
const REALM: &str = "Printer API";

#[derive(Default)]
struct FakeState {
    nonce_counter: u32,
    nonce: String,
    states: VecDeque<String>,
    challenges_issued: usize,
    stale_challenges: usize,
    nonce_counts: Vec<String>,
    prints: Vec<String>,
    print_reply: Option<(StatusCode, String)>,
    /// Rotate the nonce after this many authorized requests.
    rotate_after: Option<usize>,
    authorized_requests: usize,
}

#[derive(Clone, Default)]
struct FakePrinter {
    state: Arc<Mutex<FakeState>>,
}

enum AuthCheck {
    Ok,
    Missing,
    Stale,
    Wrong,
}

impl FakePrinter {
    fn with_states(states: &[&str]) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.states = states.iter().map(|s| s.to_string()).collect();
            rotate_nonce(&mut state);
        }
        fake
    }

    fn challenge_header(nonce: &str, stale: bool) -> String {
        let mut header = format!(
            r#"Digest realm="{}", nonce="{}", algorithm=MD5, qop="auth""#,
            REALM, nonce
        );
        if stale {
            header.push_str(", stale=true");
        }
        header
    }

    fn check(&self, headers: &HeaderMap, method: &str) -> AuthCheck {
        let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return AuthCheck::Missing;
        };
        let params = parse_authorization(value);

        let mut state = self.state.lock().unwrap();
        if params.get("nonce") != Some(&state.nonce) {
            return AuthCheck::Stale;
        }

        let challenge = DigestChallenge::parse(&Self::challenge_header(&state.nonce, false))
            .expect("fake challenge parses");
        let nc = params
            .get("nc")
            .and_then(|nc| u32::from_str_radix(nc, 16).ok())
            .unwrap_or_default();
        let expected = challenge.response(&DigestRequest {
            username: USERNAME,
            password: PASSWORD,
            method,
            uri: params.get("uri").map(String::as_str).unwrap_or_default(),
            nc,
            cnonce: params.get("cnonce").map(String::as_str).unwrap_or_default(),
        });

        if params.get("username").map(String::as_str) != Some(USERNAME)
            || params.get("response") != Some(&expected)
        {
            return AuthCheck::Wrong;
        }

        state.nonce_counts.push(params["nc"].clone());
        state.authorized_requests += 1;
        if state.rotate_after == Some(state.authorized_requests) {
            rotate_nonce(&mut state);
        }
        AuthCheck::Ok
    }

    /// Turn a failed check into the 401 the printer would send.
    fn unauthorized(&self, check: AuthCheck) -> Option<Response> {
        let stale = match check {
            AuthCheck::Ok => return None,
            AuthCheck::Stale => true,
            AuthCheck::Missing | AuthCheck::Wrong => false,
        };
        let mut state = self.state.lock().unwrap();
        state.challenges_issued += 1;
        if stale {
            state.stale_challenges += 1;
        }
        let challenge = Self::challenge_header(&state.nonce, stale);
        Some(
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, challenge)],
                "Unauthorized",
            )
                .into_response(),
        )
    }
}

fn rotate_nonce(state: &mut FakeState) {
    state.nonce_counter += 1;
    state.nonce = format!("{:016x}", 0xdca5_7767_0000_0000u64 + state.nonce_counter as u64);
}

/// Split `Digest k="v", k=v` into a map.
fn parse_authorization(value: &str) -> HashMap<String, String> {
    value
        .trim_start_matches("Digest ")
        .split(", ")
        .filter_map(|part| part.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim_matches('"').to_string()))
        .collect()
}

async fn status_handler(State(fake): State<FakePrinter>, headers: HeaderMap) -> Response {
    if let Some(denied) = fake.unauthorized(fake.check(&headers, "GET")) {
        return denied;
    }
    let mut state = fake.state.lock().unwrap();
    let current = if state.states.len() > 1 {
        state.states.pop_front().unwrap_or_default()
    } else {
        state.states.front().cloned().unwrap_or_else(|| "IDLE".to_string())
    };
    Json(fixtures::status_document(&current)).into_response()
}

async fn print_handler(
    State(fake): State<FakePrinter>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = fake.unauthorized(fake.check(&headers, "POST")) {
        return denied;
    }
    let mut state = fake.state.lock().unwrap();
    if let Some(file) = body.get("file").and_then(Value::as_str) {
        state.prints.push(file.to_string());
    }
    match &state.print_reply {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

async fn spawn_fake(fake: FakePrinter) -> SocketAddr {
    let app = Router::new()
        .route("/api/v1/status", get(status_handler))
        .route("/api/v1/print", post(print_handler))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr, password: &str) -> PrusaLinkClient {
    PrusaLinkClient::new(PrinterConfig {
        base_url: format!("http://{}/api/v1", addr),
        username: USERNAME.to_string(),
        password: password.to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_status_answers_digest_challenge() {
    let fake = FakePrinter::with_states(&["PRINTING", "PAUSED"]);
    let addr = spawn_fake(fake.clone()).await;
    let client = client_for(addr, PASSWORD);

    let first = client.status().await.unwrap();
    assert_eq!(first.state(), PrinterState::Printing);
    assert!(first.document()["printer"]["temp_nozzle"].is_number());

    let second = client.status().await.unwrap();
    assert_eq!(second.state(), PrinterState::Paused);

    let state = fake.state.lock().unwrap();
    // Only the first request had to be challenged; the nonce is reused after that.
    assert_eq!(state.challenges_issued, 1);
    assert_eq!(state.nonce_counts, vec!["00000001", "00000002"]);
}

#[tokio::test]
async fn test_wrong_password_fails_authentication() {
    let fake = FakePrinter::with_states(&["IDLE"]);
    let addr = spawn_fake(fake.clone()).await;
    let client = client_for(addr, "not-the-password");

    let err = client.status().await.unwrap_err();
    assert!(matches!(err, PrinterError::AuthenticationFailed(_)));
    assert_eq!(fake.state.lock().unwrap().challenges_issued, 2);
}

#[tokio::test]
async fn test_stale_nonce_is_renegotiated() {
    let fake = FakePrinter::with_states(&["PRINTING"]);
    fake.state.lock().unwrap().rotate_after = Some(1);
    let addr = spawn_fake(fake.clone()).await;
    let client = client_for(addr, PASSWORD);

    client.status().await.unwrap();
    let snapshot = client.status().await.unwrap();
    assert_eq!(snapshot.state(), PrinterState::Printing);

    let state = fake.state.lock().unwrap();
    assert_eq!(state.stale_challenges, 1);
    // The nonce count restarts with the new nonce.
    assert_eq!(state.nonce_counts, vec!["00000001", "00000001"]);
}

#[tokio::test]
async fn test_start_print_accepted() {
    let fake = FakePrinter::with_states(&["IDLE"]);
    let addr = spawn_fake(fake.clone()).await;
    let client = client_for(addr, PASSWORD);

    client.start_print("cube.bgcode").await.unwrap();
    assert_eq!(fake.state.lock().unwrap().prints, vec!["cube.bgcode"]);
}

#[tokio::test]
async fn test_start_print_rejected_carries_status_and_body() {
    let fake = FakePrinter::with_states(&["IDLE"]);
    fake.state.lock().unwrap().print_reply = Some((
        StatusCode::INTERNAL_SERVER_ERROR,
        "boom: file not found".to_string(),
    ));
    let addr = spawn_fake(fake.clone()).await;
    let client = client_for(addr, PASSWORD);

    match client.start_print("missing.bgcode").await {
        Err(PrinterError::Rejected { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_start_print_requires_200() {
    let fake = FakePrinter::with_states(&["IDLE"]);
    fake.state.lock().unwrap().print_reply = Some((StatusCode::NO_CONTENT, String::new()));
    let addr = spawn_fake(fake.clone()).await;
    let client = client_for(addr, PASSWORD);

    let err = client.start_print("cube.bgcode").await.unwrap_err();
    assert!(matches!(err, PrinterError::Rejected { status: 204, .. }));
}

#[tokio::test]
async fn test_unreachable_printer_is_connection_failure() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr, PASSWORD);
    let err = client.status().await.unwrap_err();
    assert!(matches!(err, PrinterError::ConnectionFailed(_)));
}

#[tokio::test]
async fn test_collector_writes_jsonl_from_live_client() {
    let fake = FakePrinter::with_states(&["IDLE", "PRINTING", "PRINTING", "FINISHED"]);
    let addr = spawn_fake(fake).await;
    let client: Arc<dyn PrinterClient> = Arc::new(client_for(addr, PASSWORD));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("printer_data_log.json");
    let sink: Arc<dyn TelemetrySink> = Arc::new(JsonlTelemetryLog::new(&path));

    let outcome = DataCollector::new(client, sink, PollPolicy::fixed(Duration::from_millis(5)))
        .run(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.entries_logged, 3);
    assert_eq!(outcome.final_state, PrinterState::Finished);

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2]["printer"]["state"], "FINISHED");
    for line in &lines {
        assert!(line["timestamp"].is_string());
    }
}
