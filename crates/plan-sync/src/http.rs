//! HTTP client for the plan store
//!
//! ```text
//! GET /plan/{name}?tenantId=..            -> 200 { plan, planHash, encodedPlan, updatedAt }
//! PUT /plan/{name}?tenantId=..  if-match  -> 200 { ... } | 412 { error, planHash }
//! ```

use async_trait::async_trait;
use plan_model::{Plan, PlanHash};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::SyncConfig;
use crate::error::{TransportError, WriteError};
use crate::transport::PlanTransport;
use crate::types::{ConflictBody, ErrorBody, PlanEnvelope, PlanLocator, StoredPlan, WriteRequest};

/// Precondition header carrying the expected plan hash
pub const IF_MATCH: &str = "if-match";

/// [`PlanTransport`] over the store's HTTP API
#[derive(Debug, Clone)]
pub struct HttpPlanTransport {
    client: Client,
    base_url: String,
}

impl HttpPlanTransport {
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &SyncConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Use a preconfigured client
    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, locator: &PlanLocator) -> String {
        format!("{}/plan/{}", self.base_url, locator.name)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }

    async fn error_code(response: Response) -> Option<String> {
        let bytes = response.bytes().await.ok()?;
        serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .map(|body| body.error)
    }

    fn stored(envelope: PlanEnvelope) -> StoredPlan {
        match PlanHash::of_plan(&envelope.plan) {
            Ok(local) if local != envelope.plan_hash => {
                tracing::warn!(
                    reported = %envelope.plan_hash,
                    computed = %local,
                    "store hash differs from local canonical hash"
                );
            }
            _ => {}
        }
        envelope.into_stored()
    }
}

#[async_trait]
impl PlanTransport for HttpPlanTransport {
    async fn fetch_current(&self, locator: &PlanLocator) -> Result<StoredPlan, TransportError> {
        tracing::debug!(%locator, "GET plan");
        let response = self
            .client
            .get(self.url(locator))
            .query(&[("tenantId", locator.tenant_id.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Self::stored(Self::decode(response).await?)),
            StatusCode::NOT_FOUND => Err(TransportError::NotFound(locator.clone())),
            status => Err(TransportError::Status {
                status: status.as_u16(),
                code: Self::error_code(response).await,
            }),
        }
    }

    async fn write_if_match(
        &self,
        locator: &PlanLocator,
        candidate: &Plan,
        expected: &PlanHash,
    ) -> Result<StoredPlan, WriteError> {
        tracing::debug!(%locator, expected = %expected, "PUT plan");
        let body = WriteRequest {
            plan: candidate.clone(),
        };
        let response = self
            .client
            .put(self.url(locator))
            .query(&[("tenantId", locator.tenant_id.as_str())])
            .header(IF_MATCH, expected.to_string())
            .json(&body)
            .send()
            .await
            .map_err(TransportError::from)?;

        match response.status() {
            StatusCode::OK => Ok(Self::stored(Self::decode(response).await?)),
            StatusCode::PRECONDITION_FAILED => {
                let conflict: ConflictBody = Self::decode(response).await?;
                tracing::info!(
                    %locator,
                    current = %conflict.plan_hash,
                    "write precondition failed"
                );
                Err(WriteError::Conflict {
                    current_hash: conflict.plan_hash,
                })
            }
            StatusCode::NOT_FOUND => Err(TransportError::NotFound(locator.clone()).into()),
            status => {
                let status = status.as_u16();
                match Self::error_code(response).await {
                    Some(code) => Err(WriteError::Rejected { status, code }),
                    None => Err(TransportError::Status { status, code: None }.into()),
                }
            }
        }
    }
}
