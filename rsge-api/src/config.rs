//! Endpoint configuration for the service clients

use std::time::Duration;

/// Default SOAP endpoint of the waybill service
pub const WAYBILL_URL: &str = "https://services.rs.ge/WayBillService/WayBillService.asmx";

/// Default base URL of the invoice and declaration REST service
pub const INVOICE_URL: &str = "https://eapi.rs.ge";

/// Default base URL of the customs declarations REST service
pub const CUSTOMS_URL: &str = "https://services.rs.ge";

/// Per-request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for one client instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint or base URL, stored without a trailing slash
    pub base_url: String,
    /// Upper bound on every blocking request
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize(base_url),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Preset for [`crate::WayBillClient`]
    pub fn waybill() -> Self {
        Self::new(WAYBILL_URL)
    }

    /// Preset for [`crate::InvoiceClient`]
    pub fn invoice() -> Self {
        Self::new(INVOICE_URL)
    }

    /// Preset for [`crate::CustomsClient`]
    pub fn customs() -> Self {
        Self::new(CUSTOMS_URL)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn normalize(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
