use serde_json::{json, Map};
use tracing::debug;

use super::models::{CustomsAuthResponse, CustomsDeclaration};
use crate::codec::json::{self, path};
use crate::config::ClientConfig;
use crate::error::{Result, RsgeError};
use crate::rest::{AuthState, DeviceInfo, RestSession, Status};

/// Client for the customs declarations service
///
/// Shares the authentication flow of the invoice service but lives under a
/// different base URL and reports status as `STATUS.CODE`/`STATUS.MESSAGE`.
#[derive(Debug)]
pub struct CustomsClient {
    session: RestSession,
}

impl Default for CustomsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomsClient {
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::customs())
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        Self {
            session: RestSession::new(config),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn auth_state(&self) -> &AuthState {
        self.session.state()
    }

    pub fn authenticate(
        &mut self,
        username: &str,
        password: &str,
        device_code: &str,
    ) -> Result<CustomsAuthResponse> {
        let mut payload = Map::new();
        payload.insert("USERNAME".to_string(), username.into());
        payload.insert("PASSWORD".to_string(), password.into());
        if !device_code.is_empty() {
            payload.insert("DEVICE_CODE".to_string(), device_code.into());
        }

        let response =
            CustomsAuthResponse::from_response(&self.session.auth_post("/Authenticate", &payload)?);
        self.session.apply_tokens(&response.access_token, &response.pin_token);
        Ok(response)
    }

    /// Complete two-factor authentication
    ///
    /// With `save_device` the service remembers the device and skips the PIN
    /// step on later logins with the same device code.
    pub fn authenticate_pin(
        &mut self,
        pin_token: &str,
        pin: &str,
        device: &DeviceInfo,
        save_device: bool,
    ) -> Result<CustomsAuthResponse> {
        let payload = json!({
            "PIN_TOKEN": pin_token,
            "PIN": pin,
            "DEVICE_CODE": device.device_code,
            "ADDRESS": device.address,
            "BROWSER": device.browser,
            "OPER_SYSTEM": device.oper_system,
            "SAVE_DEVICE": save_device,
        });

        let response =
            CustomsAuthResponse::from_response(&self.session.auth_post("/AuthenticatePin", &payload)?);
        self.session.apply_tokens(&response.access_token, &response.pin_token);
        Ok(response)
    }

    /// Invalidate the access token; never fails
    pub fn sign_out(&mut self) {
        self.session.sign_out("/SignOut");
    }

    /// Assessed declarations within a date range
    ///
    /// # Errors
    /// [`RsgeError::Api`] when the service answers with a non-zero
    /// `STATUS.CODE`.
    pub fn get_declarations(&self, date_from: &str, date_to: &str) -> Result<Vec<CustomsDeclaration>> {
        self.session.require_auth()?;
        let response = self.session.get(
            "/GetAsycudaDeclarations",
            &[("dateFrom", date_from), ("dateTo", date_to)],
        )?;

        let status = Status::from_response(&response);
        if status.code != 0 {
            let message = if status.text.is_empty() {
                "Unknown error".to_string()
            } else {
                status.text
            };
            return Err(RsgeError::api(message).with_code(status.code));
        }

        let declarations: Vec<CustomsDeclaration> = json::records(path(&response, &["DATA"]));
        debug!(count = declarations.len(), "declarations received");
        Ok(declarations)
    }

    /// Release the HTTP agent; idempotent
    pub fn close(&mut self) {
        self.session.close();
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_require_auth() {
        let client = CustomsClient::with_config(&ClientConfig::new("http://127.0.0.1:1"));
        let err = client.get_declarations("2024-01-01", "2024-01-31").unwrap_err();
        assert!(matches!(err, RsgeError::Authentication { .. }));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut client = CustomsClient::new();
        client.close();
        client.close();
        assert!(client.is_closed());
        assert!(!client.is_authenticated());
    }
}
