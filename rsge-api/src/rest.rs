//! Shared JSON-over-HTTP session for the invoice and customs services
//!
//! Both REST services wrap payloads the same way: business data under `DATA`,
//! an outcome under `STATUS` with a numeric `ID` (or `CODE`) and a message in
//! `TEXT` (or `MESSAGE`). A [`RestSession`] owns one HTTP agent plus the
//! authentication state of a single client instance.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::codec::json::{as_int, as_text, path};
use crate::config::ClientConfig;
use crate::error::{Result, RsgeError};

/// Authentication state of one client
///
/// ```text
/// Anonymous --authenticate--> PinPending --authenticate_pin--> Authenticated
///     ^            \________________________________________/        |
///     |__________________________sign_out_____________________________|
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    /// First factor accepted, waiting for the PIN sent to the user's phone
    PinPending { pin_token: String },
    Authenticated { access_token: String },
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Anonymous => write!(f, "Anonymous"),
            AuthState::PinPending { .. } => write!(f, "PinPending"),
            AuthState::Authenticated { .. } => write!(f, "Authenticated"),
        }
    }
}

/// Optional device metadata sent with two-factor authentication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_code: String,
    pub address: String,
    pub browser: String,
    pub oper_system: String,
}

impl DeviceInfo {
    pub fn new(device_code: &str) -> Self {
        Self {
            device_code: device_code.to_string(),
            ..Self::default()
        }
    }
}

/// The `STATUS` block of a REST response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub code: i64,
    pub text: String,
}

impl Status {
    /// Read `STATUS.ID` / `STATUS.TEXT`, falling back to `CODE` / `MESSAGE`
    pub fn from_response(response: &Value) -> Self {
        let status = path(response, &["STATUS"]);
        let code = status
            .get("ID")
            .and_then(as_int)
            .or_else(|| status.get("CODE").and_then(as_int))
            .unwrap_or(0);
        let text = status
            .get("TEXT")
            .or_else(|| status.get("MESSAGE"))
            .map(as_text)
            .unwrap_or_default();
        Self { code, text }
    }

    pub fn is_error(&self) -> bool {
        self.code < 0
    }

    fn message_or(&self, fallback: &str) -> String {
        if self.text.is_empty() {
            fallback.to_string()
        } else {
            self.text.clone()
        }
    }
}

/// One persistent HTTP session against a REST base URL
#[derive(Debug)]
pub struct RestSession {
    base_url: String,
    agent: Option<ureq::Agent>,
    state: AuthState,
}

impl RestSession {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            agent: Some(ureq::AgentBuilder::new().timeout(config.timeout).build()),
            state: AuthState::Anonymous,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    /// Fail fast when no access token is held
    pub fn require_auth(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(RsgeError::authentication(
                "Not authenticated. Call authenticate() first.",
            ))
        }
    }

    /// Record the tokens returned by an authentication endpoint
    ///
    /// An access token always wins; a PIN token alone moves the session to
    /// [`AuthState::PinPending`]. A response with neither leaves the state as
    /// it was.
    pub fn apply_tokens(&mut self, access_token: &str, pin_token: &str) {
        if !access_token.is_empty() {
            info!("session authenticated");
            self.state = AuthState::Authenticated {
                access_token: access_token.to_string(),
            };
        } else if !pin_token.is_empty() {
            info!("PIN verification required");
            self.state = AuthState::PinPending {
                pin_token: pin_token.to_string(),
            };
        }
    }

    /// POST and raise [`RsgeError::Api`] for a negative status
    pub fn post<P: Serialize>(&self, path: &str, payload: &P) -> Result<Value> {
        let response = self.raw_post(path, payload)?;
        let status = Status::from_response(&response);
        if status.is_error() {
            return Err(RsgeError::api(status.message_or("Unknown error")).with_code(status.code));
        }
        Ok(response)
    }

    /// POST to an authentication endpoint; a negative status is an
    /// authentication failure and the body is returned uninspected otherwise
    pub fn auth_post<P: Serialize>(&self, path: &str, payload: &P) -> Result<Value> {
        let response = self.raw_post(path, payload)?;
        let status = Status::from_response(&response);
        if status.is_error() {
            return Err(RsgeError::authentication(status.message_or("Authentication failed"))
                .with_code(status.code));
        }
        Ok(response)
    }

    /// GET with query parameters, no status inspection
    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let agent = self.agent()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let mut request = agent.get(&url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        if let Some(header) = self.bearer() {
            request = request.set("Authorization", &header);
        }

        let response = request.call().map_err(map_http_error)?;
        read_json(response)
    }

    /// Best-effort sign out
    ///
    /// A no-op when no token is held. Otherwise the sign-out request is sent,
    /// any failure is logged and swallowed, and the local state is cleared
    /// unconditionally.
    pub fn sign_out(&mut self, path: &str) {
        if !self.is_authenticated() {
            self.state = AuthState::Anonymous;
            return;
        }

        if let Err(e) = self.raw_post(path, &json!({})) {
            warn!(error = %e, "sign-out request failed, clearing session anyway");
        }
        self.state = AuthState::Anonymous;
        info!("session signed out");
    }

    /// Release the HTTP agent; idempotent
    pub fn close(&mut self) {
        if self.agent.take().is_some() {
            debug!(base_url = %self.base_url, "REST session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.agent.is_none()
    }

    fn raw_post<P: Serialize>(&self, path: &str, payload: &P) -> Result<Value> {
        let agent = self.agent()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let mut request = agent
            .post(&url)
            .set("Content-Type", "application/json");
        if let Some(header) = self.bearer() {
            request = request.set("Authorization", &header);
        }

        let response = request.send_json(payload).map_err(map_http_error)?;
        read_json(response)
    }

    fn agent(&self) -> Result<&ureq::Agent> {
        self.agent
            .as_ref()
            .ok_or_else(|| RsgeError::connection("REST session is closed"))
    }

    fn bearer(&self) -> Option<String> {
        match &self.state {
            AuthState::Authenticated { access_token } => Some(format!("bearer {}", access_token)),
            _ => None,
        }
    }
}

fn map_http_error(error: ureq::Error) -> RsgeError {
    match error {
        ureq::Error::Status(401, _) => {
            RsgeError::authentication("Unauthorized. Token may be expired.").with_code(401)
        }
        ureq::Error::Status(status, response) => {
            debug!(status, "HTTP error status");
            let remote_text = response
                .into_string()
                .ok()
                .and_then(|body| serde_json::from_str::<Value>(&body).ok())
                .map(|body| Status::from_response(&body).text)
                .filter(|text| !text.is_empty());
            let message = remote_text.unwrap_or_else(|| format!("HTTP error: {}", status));
            RsgeError::connection(message).with_code(i64::from(status))
        }
        ureq::Error::Transport(transport) => {
            RsgeError::connection(format!("Connection failed: {}", transport))
        }
    }
}

fn read_json(response: ureq::Response) -> Result<Value> {
    let body = response
        .into_string()
        .map_err(|e| RsgeError::connection(format!("Failed to read response: {}", e)))?;
    if body.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(&body)
        .map_err(|e| RsgeError::connection(format!("Response is not valid JSON: {}", e)))
}
