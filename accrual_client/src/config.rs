use std::time::Duration;

use crate::AccrualApiError;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Base URL of the accrual authority, e.g. `http://localhost:8081`. No trailing slash.
    pub base_url: String,
    /// Upper bound on a single status request, including reading the response body.
    pub request_timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self { base_url: String::default(), request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}

impl AccrualConfig {
    /// Creates a configuration for the given address. Addresses without a scheme are assumed to be plain `http`.
    pub fn new(address: &str) -> Result<Self, AccrualApiError> {
        let base_url = normalize_address(address)?;
        Ok(Self { base_url, ..Default::default() })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

}

fn normalize_address(address: &str) -> Result<String, AccrualApiError> {
    let address = address.trim().trim_end_matches('/');
    if address.is_empty() {
        return Err(AccrualApiError::InvalidAddress("the address is empty".into()));
    }
    if address.starts_with("http://") || address.starts_with("https://") {
        Ok(address.to_string())
    } else if address.contains("://") {
        Err(AccrualApiError::InvalidAddress(format!("unsupported scheme in {address}")))
    } else {
        Ok(format!("http://{address}"))
    }
}
