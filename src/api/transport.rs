use crate::config::RetryPolicy;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::{sync::Mutex, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "X-Riot-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Every attempt against the remote service failed. The service is
    /// presumed unavailable.
    #[error("Request to {url} failed after {attempts} attempts (last status: {last_status:?})")]
    TransportFailure {
        url: String,
        last_status: Option<u16>,
        attempts: u32
    }
}

/// A successful exchange with the remote service.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Body(T),
    /// HTTP 400. Used by the service to signal the end of a listing.
    EmptyPage,
    /// HTTP 404
    Absent
}

impl<T> Fetched<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Body(body) => Some(body),
            Fetched::EmptyPage | Fetched::Absent => None
        }
    }
}

impl<T> Fetched<Vec<T>> {
    pub fn into_list(self) -> Vec<T> {
        self.into_option().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusAction {
    Decode,
    EmptyPage,
    Absent,
    Retry
}

pub(crate) fn status_action(status: StatusCode) -> StatusAction {
    match status {
        StatusCode::OK => StatusAction::Decode,
        StatusCode::BAD_REQUEST => StatusAction::EmptyPage,
        StatusCode::NOT_FOUND => StatusAction::Absent,
        // 429 and everything else
        _ => StatusAction::Retry
    }
}

enum AttemptFailure {
    Status(u16),
    Decode,
    Connection(reqwest::Error)
}

/// Retrying GET transport over the remote match-data API.
///
/// One HTTP client is created lazily on first use and shared by every call
/// until a connection fault forces its replacement. Each request draws its
/// first backoff delay from the policy and doubles it after every failed
/// attempt.
pub struct Transport {
    api_key: String,
    policy: RetryPolicy,
    client: Mutex<Option<Client>>
}

impl Transport {
    pub fn new(api_key: impl Into<String>, policy: RetryPolicy) -> Transport {
        Transport {
            api_key: api_key.into(),
            policy,
            client: Mutex::new(None)
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<Fetched<T>, ApiError> {
        let mut delay = self.policy.initial_delay();
        let mut last_status = None;

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt::<T>(url).await {
                Ok(fetched) => return Ok(fetched),
                Err(AttemptFailure::Status(status)) => {
                    debug!(url, status, attempt, "Retrying request after status");
                    last_status = Some(status);
                }
                Err(AttemptFailure::Decode) => {
                    debug!(url, attempt, "Retrying request after undecodable body");
                    last_status = Some(StatusCode::OK.as_u16());
                }
                Err(AttemptFailure::Connection(e)) => {
                    warn!(url, attempt, "Connection fault, recreating client: {}", e);
                    self.reset_client();
                }
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(ApiError::TransportFailure {
            url: url.to_string(),
            last_status,
            attempts: self.policy.max_attempts
        })
    }

    async fn attempt<T: DeserializeOwned>(&self, url: &str) -> Result<Fetched<T>, AttemptFailure> {
        let client = self.client().map_err(AttemptFailure::Connection)?;
        let response = client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(AttemptFailure::Connection)?;

        let status = response.status();
        match status_action(status) {
            StatusAction::Decode => response.json::<T>().await.map(Fetched::Body).map_err(|e| {
                if e.is_decode() {
                    AttemptFailure::Decode
                } else {
                    AttemptFailure::Connection(e)
                }
            }),
            StatusAction::EmptyPage => Ok(Fetched::EmptyPage),
            StatusAction::Absent => Ok(Fetched::Absent),
            StatusAction::Retry => Err(AttemptFailure::Status(status.as_u16()))
        }
    }

    fn client(&self) -> Result<Client, reqwest::Error> {
        let mut guard = match self.client.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner()
        };

        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = ClientBuilder::new().timeout(REQUEST_TIMEOUT).build()?;
        *guard = Some(client.clone());

        Ok(client)
    }

    fn reset_client(&self) {
        let mut guard = match self.client.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner()
        };

        *guard = None;
    }
}
