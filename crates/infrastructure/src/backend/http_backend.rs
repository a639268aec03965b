//! HTTP resolution backend.
//!
//! ```text
//! GET <url>?name=<qname>&type=<qtype>
//!
//! 200 -> JSON answer payload
//! 404 -> name not found
//! any other status -> error
//! ```

use async_trait::async_trait;
use json_dns_application::ports::DnsBackend;
use json_dns_domain::{BackendAnswer, BackendConfig, BackendOutcome, DomainError};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub struct HttpDnsBackend {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpDnsBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| DomainError::UpstreamUnreachable(format!("HTTP client setup: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, DomainError> {
        Self::new(config.url.clone(), config.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl DnsBackend for HttpDnsBackend {
    async fn lookup(&self, name: &str, record_type: u16) -> Result<BackendOutcome, DomainError> {
        let deadline = Instant::now() + self.timeout;

        debug!(url = %self.url, name = %name, record_type, "Querying backend");

        let response = tokio::time::timeout_at(
            deadline,
            self.client
                .get(&self.url)
                .query(&[("name", name.to_string()), ("type", record_type.to_string())])
                .send(),
        )
        .await
        .map_err(|_| {
            DomainError::UpstreamUnreachable(format!("timeout querying backend {}", self.url))
        })?
        .map_err(|e| {
            DomainError::UpstreamUnreachable(format!("request to {} failed: {}", self.url, e))
        })?;

        let status = response.status();
        match status {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                debug!(name = %name, record_type, "Backend reported name not found");
                return Ok(BackendOutcome::NotFound);
            }
            other => return Err(DomainError::UpstreamUnexpectedStatus(other.as_u16())),
        }

        let body = tokio::time::timeout_at(deadline, response.bytes())
            .await
            .map_err(|_| {
                DomainError::UpstreamUnreachable(format!(
                    "timeout reading backend response from {}",
                    self.url
                ))
            })?
            .map_err(|e| {
                DomainError::UpstreamUnreachable(format!(
                    "failed to read backend response from {}: {}",
                    self.url, e
                ))
            })?;

        let answer = BackendAnswer::from_json(&body)
            .map_err(|e| DomainError::UpstreamMalformedPayload(e.to_string()))?;

        debug!(
            name = %name,
            rcode = answer.rcode,
            answers = answer.answers.len(),
            authenticated = answer.authenticated_data,
            "Backend answer received"
        );

        Ok(BackendOutcome::Answer(answer))
    }
}
