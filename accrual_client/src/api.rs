use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use log::*;
use loyalty_common::OrderNumber;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER},
    Client,
    StatusCode,
};

use crate::{
    config::AccrualConfig,
    data_objects::{AccrualOutcome, AccrualResponse, AccrualStatus, DEFAULT_RETRY_AFTER},
    AccrualApiError,
};

/// Anything that can be asked for the accrual status of an order.
///
/// The reconciliation engine only depends on this trait, which lets tests script the authority's behaviour.
#[async_trait]
pub trait AccrualService: Send + Sync {
    async fn fetch_status(&self, number: &OrderNumber) -> AccrualOutcome;
}

#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        if config.base_url.is_empty() {
            return Err(AccrualApiError::InvalidAddress("no accrual service address was configured".into()));
        }
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, number: &OrderNumber) -> String {
        format!("{}/api/orders/{}", self.config.base_url, number.as_str())
    }

    async fn query(&self, number: &OrderNumber) -> AccrualOutcome {
        let url = self.url(number);
        trace!("🌐️ GET {url}");
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return transport_failure(e),
        };
        let status = response.status();
        if status != StatusCode::OK {
            return classify_status(status, response.headers());
        }
        match response.bytes().await {
            Ok(body) => parse_body(number, &body),
            Err(e) => transport_failure(e),
        }
    }
}

#[async_trait]
impl AccrualService for AccrualApi {
    async fn fetch_status(&self, number: &OrderNumber) -> AccrualOutcome {
        let outcome = self.query(number).await;
        debug!("🌐️ Accrual authority replied for order {number}: {outcome}");
        outcome
    }
}

fn transport_failure(e: reqwest::Error) -> AccrualOutcome {
    let reason = if e.is_timeout() { format!("request timed out. {e}") } else { e.to_string() };
    AccrualOutcome::TransportFailure(reason)
}

/// Classifies every response other than `200 OK`.
pub(crate) fn classify_status(status: StatusCode, headers: &HeaderMap) -> AccrualOutcome {
    match status {
        StatusCode::NO_CONTENT => AccrualOutcome::Unknown,
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = retry_after(headers).unwrap_or_else(|| {
                warn!("🌐️ 429 response without a usable Retry-After header. Backing off for the default period");
                DEFAULT_RETRY_AFTER
            });
            AccrualOutcome::RateLimited { retry_after }
        },
        s if s.is_server_error() => AccrualOutcome::AuthorityUnavailable { status: s.as_u16() },
        s => AccrualOutcome::TransportFailure(format!("unexpected HTTP status {s}")),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Interprets the body of a `200 OK` response.
pub(crate) fn parse_body(number: &OrderNumber, body: &[u8]) -> AccrualOutcome {
    let response = match serde_json::from_slice::<AccrualResponse>(body) {
        Ok(r) => r,
        Err(e) => return AccrualOutcome::TransportFailure(format!("malformed accrual payload. {e}")),
    };
    if response.order.trim() != number.as_str() {
        return AccrualOutcome::TransportFailure(format!(
            "the authority answered for order {} instead of {number}",
            response.order
        ));
    }
    let accrual = match response.status {
        AccrualStatus::Processed => response.accrual,
        _ => None,
    };
    AccrualOutcome::Resolved { status: response.status, accrual }
}
