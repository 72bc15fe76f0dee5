//! OAuth 2.0 token endpoint exchanges.
//!
//! Two exchanges exist: refreshing an expired access token, and the
//! interactive Authorization Code flow with PKCE using a loopback redirect.
//!
//! # Consent flow
//!
//! 1. Generate a code verifier, its SHA-256 challenge and a random state
//! 2. Bind a listener on 127.0.0.1 (configured port range, or any port)
//! 3. Open the browser on Google's consent page
//! 4. Wait (bounded) for the redirect carrying the authorization code
//! 5. Exchange code + verifier for tokens

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::api::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

use super::config::{DEFAULT_TOKEN_URI, GoogleConfig, OAuthCredentials};
use super::credentials::{CredentialSet, expiry_from_now};
use super::http::transport_error;

/// Google's consent page.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Path the consent page redirects to.
const CALLBACK_PATH: &str = "/callback";

/// Pause between accept attempts on the non-blocking listener.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest wait for the request line of an accepted connection.
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// The token endpoint collaborator of the authenticator.
pub trait TokenEndpoint: Send + Sync {
    /// Exchanges the refresh token of `credentials` for a new access token.
    fn refresh<'a>(
        &'a self,
        credentials: &'a CredentialSet,
    ) -> BoxFuture<'a, ProviderResult<TokenGrant>>;

    /// Runs the interactive consent flow and returns a fresh credential set.
    fn authorize<'a>(
        &'a self,
        client: &'a OAuthCredentials,
        scopes: &'a [String],
    ) -> BoxFuture<'a, ProviderResult<CredentialSet>>;
}

/// What a token endpoint handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Only present when the endpoint rotated it.
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: Option<i64>,
    /// Only present when the endpoint reported the granted scopes.
    pub scopes: Option<Vec<String>>,
}

/// Response body of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Space separated.
    #[serde(default)]
    scope: Option<String>,
}

impl From<TokenResponse> for TokenGrant {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            scopes: response
                .scope
                .map(|scope| scope.split_whitespace().map(str::to_string).collect()),
        }
    }
}

/// Error body of the token endpoint, e.g. `{"error": "invalid_grant"}`.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Talks to Google's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
    port_range: (u16, u16),
    callback_timeout: Duration,
}

impl OAuthClient {
    pub fn new(http_client: reqwest::Client, config: &GoogleConfig) -> Self {
        Self {
            http_client,
            port_range: config.loopback_port_range,
            callback_timeout: config.callback_timeout,
        }
    }

    async fn refresh_grant(&self, credentials: &CredentialSet) -> ProviderResult<TokenGrant> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or_else(|| ProviderError::refresh_failed("no refresh token stored"))?;

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let grant = self.post_token(&credentials.token_uri, &params).await?;
        info!("refreshed access token");
        Ok(grant)
    }

    async fn consent(
        &self,
        client: &OAuthCredentials,
        scopes: &[String],
    ) -> ProviderResult<CredentialSet> {
        let pkce = PkceFlow::new();

        let (listener, port) = bind_loopback_server(self.port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);
        let auth_url = pkce.build_auth_url(&client.client_id, &redirect_uri, scopes)?;

        info!("starting OAuth consent flow on port {}", port);
        eprintln!("\nAuthorize gapi by visiting this URL:\n\n{}\n", auth_url);
        if let Err(e) = open::that(auth_url.as_str()) {
            warn!("failed to open browser: {}", e);
        }

        let timeout = self.callback_timeout;
        let (code, state) =
            tokio::task::spawn_blocking(move || wait_for_callback(listener, timeout))
                .await
                .map_err(|e| ProviderError::internal(format!("callback listener failed: {}", e)))??;

        if state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch in authorization redirect",
            ));
        }

        info!("received authorization code, exchanging for tokens");
        let params = [
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("code", code.as_str()),
            ("code_verifier", pkce.verifier.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        let grant = self.post_token(DEFAULT_TOKEN_URI, &params).await?;

        Ok(CredentialSet {
            token: grant.access_token,
            refresh_token: grant.refresh_token,
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            scopes: grant.scopes.unwrap_or_else(|| scopes.to_vec()),
            expiry: grant.expires_in.map(expiry_from_now),
        })
    }

    async fn post_token(&self, token_uri: &str, params: &[(&str, &str)]) -> ProviderResult<TokenGrant> {
        let response = self
            .http_client
            .post(token_uri)
            .form(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body.chars().take(200).collect(),
            };
            return Err(ProviderError::authentication(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
        })?;
        Ok(response.into())
    }
}

impl TokenEndpoint for OAuthClient {
    fn refresh<'a>(
        &'a self,
        credentials: &'a CredentialSet,
    ) -> BoxFuture<'a, ProviderResult<TokenGrant>> {
        Box::pin(self.refresh_grant(credentials))
    }

    fn authorize<'a>(
        &'a self,
        client: &'a OAuthCredentials,
        scopes: &'a [String],
    ) -> BoxFuture<'a, ProviderResult<CredentialSet>> {
        Box::pin(self.consent(client, scopes))
    }
}

/// Binds the loopback listener. `(0, 0)` asks the OS for a free port.
fn bind_loopback_server(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            let port = listener
                .local_addr()
                .map_err(|e| ProviderError::internal(format!("listener has no address: {}", e)))?
                .port();
            debug!("bound loopback server on port {}", port);
            return Ok((listener, port));
        }
    }
    Err(ProviderError::configuration(format!(
        "no available port in range {}-{}",
        port_range.0, port_range.1
    )))
}

/// Blocks until the redirect arrives or `timeout` elapses.
///
/// The listener is polled without blocking so it is dropped, and the port
/// released, as soon as the deadline passes. Stray requests (favicon etc.)
/// are answered and ignored.
fn wait_for_callback(listener: TcpListener, timeout: Duration) -> ProviderResult<(String, String)> {
    listener.set_nonblocking(true).map_err(|e| {
        ProviderError::internal(format!("failed to configure callback listener: {}", e))
            .with_source(e)
    })?;
    let deadline = Instant::now() + timeout;

    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                if let Some(result) = handle_callback(stream, deadline) {
                    return result;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => error!("failed to accept connection: {}", e),
        }

        if Instant::now() >= deadline {
            return Err(ProviderError::authentication(format!(
                "no authorization redirect within {}s",
                timeout.as_secs()
            )));
        }
        thread::sleep(ACCEPT_POLL_INTERVAL);
    }
}

fn handle_callback(
    mut stream: TcpStream,
    deadline: Instant,
) -> Option<ProviderResult<(String, String)>> {
    // Accepted sockets inherit non-blocking mode on some platforms.
    stream.set_nonblocking(false).ok()?;
    let read_timeout = deadline
        .saturating_duration_since(Instant::now())
        .clamp(Duration::from_millis(10), CALLBACK_READ_TIMEOUT);
    stream.set_read_timeout(Some(read_timeout)).ok()?;

    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let result = parse_callback(&request_line);

    let page = match &result {
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        Some(Ok(_)) => {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
            <html><body><h1>gapi is authorized</h1>\
            <p>You can close this window.</p></body></html>"
        }
        Some(Err(_)) => {
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
            <html><body><h1>Authorization failed</h1>\
            <p>You can close this window.</p></body></html>"
        }
    };
    let _ = stream.write_all(page.as_bytes());
    let _ = stream.flush();

    result
}

/// Reads `code` and `state` from `GET /callback?code=...&state=... HTTP/1.1`.
///
/// Returns `None` for requests that are not the redirect.
fn parse_callback(request_line: &str) -> Option<ProviderResult<(String, String)>> {
    let mut parts = request_line.split_whitespace();
    if parts.next() != Some("GET") {
        return None;
    }
    let target = parts.next()?;
    let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;
    if url.path() != CALLBACK_PATH {
        return None;
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Some(Err(ProviderError::authentication(format!(
                    "authorization denied: {}",
                    value
                ))));
            }
            _ => {}
        }
    }

    Some(match code {
        Some(code) => Ok((code, state.unwrap_or_default())),
        None => Err(ProviderError::authentication(
            "missing authorization code in redirect",
        )),
    })
}

/// PKCE (RFC 7636) verifier, challenge and CSRF state.
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the consent page URL. Offline access and forced consent make
    /// Google hand out a refresh token every time.
    pub fn build_auth_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> ProviderResult<Url> {
        let scope = scopes.join(" ");
        Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("code_challenge", self.challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("state", self.state.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| ProviderError::internal(format!("invalid authorization URL: {}", e)))
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}
