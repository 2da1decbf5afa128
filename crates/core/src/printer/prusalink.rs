//! PrusaLink (local printer API v1) client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::PrinterConfig;

use super::digest::{DigestChallenge, DigestRequest};
use super::{PrinterClient, PrinterError, StatusSnapshot};

/// Upper bound on request attempts per call (unauthenticated probe,
/// authenticated request, one retry on a stale nonce).
const MAX_ATTEMPTS: usize = 3;

/// How much of an error body ends up in errors and logs.
const MAX_ERROR_BODY: usize = 200;

/// Cached digest challenge plus the nonce count used with it.
struct DigestSession {
    challenge: DigestChallenge,
    nc: u32,
}

/// PrusaLink client implementation.
pub struct PrusaLinkClient {
    client: Client,
    config: PrinterConfig,
    base: String,
    /// Last accepted challenge (refreshed on 401).
    session: RwLock<Option<DigestSession>>,
}

impl PrusaLinkClient {
    /// Create a new PrusaLink client.
    pub fn new(config: PrinterConfig) -> Result<Self, PrinterError> {
        let base = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base).map_err(|e| {
            PrinterError::ApiError(format!("invalid base_url {:?}: {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PrinterError::ApiError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            base,
            session: RwLock::new(None),
        })
    }

    /// Full URL for an API path such as `status`.
    fn endpoint(&self, path: &str) -> Result<Url, PrinterError> {
        let raw = format!("{}/{}", self.base, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| PrinterError::ApiError(format!("invalid URL {}: {}", raw, e)))
    }

    /// Build the next `Authorization` header if a challenge is cached.
    async fn next_authorization(&self, method: &Method, uri: &str) -> Option<String> {
        let mut session = self.session.write().await;
        let session = session.as_mut()?;
        session.nc = session.nc.wrapping_add(1);
        let cnonce = uuid::Uuid::new_v4().simple().to_string();

        Some(session.challenge.authorization(&DigestRequest {
            username: &self.config.username,
            password: &self.config.password,
            method: method.as_str(),
            uri,
            nc: session.nc,
            cnonce: &cnonce,
        }))
    }

    /// Send a request, answering digest challenges as needed.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, PrinterError> {
        let url = self.endpoint(path)?;
        let uri = request_uri(&url);
        let mut fresh_challenge = false;

        for _ in 0..MAX_ATTEMPTS {
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }
            let authorization = self.next_authorization(&method, &uri).await;
            let sent_auth = authorization.is_some();
            if let Some(authorization) = authorization {
                request = request.header(AUTHORIZATION, authorization);
            }

            let response = request.send().await.map_err(map_request_error)?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let header = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    PrinterError::AuthenticationFailed(
                        "401 without a WWW-Authenticate challenge".to_string(),
                    )
                })?;
            let challenge = DigestChallenge::parse(header)?;

            if sent_auth && fresh_challenge && !challenge.stale {
                return Err(PrinterError::AuthenticationFailed(
                    "credentials rejected".to_string(),
                ));
            }
            if sent_auth {
                warn!("PrusaLink digest nonce no longer accepted, re-authenticating");
            } else {
                debug!(realm = %challenge.realm, "Received PrusaLink digest challenge");
            }

            *self.session.write().await = Some(DigestSession { challenge, nc: 0 });
            fresh_challenge = true;
        }

        Err(PrinterError::AuthenticationFailed(format!(
            "still unauthorized after {} attempts",
            MAX_ATTEMPTS
        )))
    }
}

#[async_trait]
impl PrinterClient for PrusaLinkClient {
    fn name(&self) -> &str {
        "prusalink"
    }

    async fn status(&self) -> Result<StatusSnapshot, PrinterError> {
        let response = self.send(Method::GET, "status", None).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrinterError::Rejected {
                status: status.as_u16(),
                body: read_error_body(response).await,
            });
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| PrinterError::InvalidResponse(e.to_string()))?;

        StatusSnapshot::from_value(document)
    }

    async fn start_print(&self, file: &str) -> Result<(), PrinterError> {
        let body = json!({ "file": file });
        let response = self.send(Method::POST, "print", Some(&body)).await?;

        let status = response.status();
        if status == StatusCode::OK {
            debug!(file, "PrusaLink accepted print job");
            return Ok(());
        }

        Err(PrinterError::Rejected {
            status: status.as_u16(),
            body: read_error_body(response).await,
        })
    }
}

/// The request-target used in the digest `uri` field.
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn map_request_error(e: reqwest::Error) -> PrinterError {
    if e.is_timeout() {
        PrinterError::Timeout
    } else if e.is_connect() {
        PrinterError::ConnectionFailed(e.to_string())
    } else {
        PrinterError::ApiError(e.to_string())
    }
}

async fn read_error_body(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    truncate(body.trim(), MAX_ERROR_BODY)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}
