//! Product lookup and purchase submission over HTTP.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use pos_core::{ApiConfig, Product, PurchaseRequest, PurchaseResponse};
use reqwest::{Client, Response, StatusCode, Url};

/// Backend the terminal talks to.
///
/// Implemented by [`PosApiClient`] for the real API; tests substitute their
/// own implementation.
#[async_trait]
pub trait PosBackend: Send + Sync {
    /// Look up a product by code.
    ///
    /// Returns `Ok(None)` when the product is not registered.
    ///
    /// # Errors
    /// Returns error on transport failure or an unexpected response.
    async fn lookup_product(&self, code: &str) -> Result<Option<Product>>;

    /// Submit a purchase transaction.
    ///
    /// # Errors
    /// Returns error on transport failure or an unexpected response.
    async fn submit_purchase(&self, request: &PurchaseRequest) -> Result<PurchaseResponse>;
}

/// Client for the product/purchase API.
#[derive(Debug, Clone)]
pub struct PosApiClient {
    client: Client,
    base_url: Url,
}

impl PosApiClient {
    /// Create a client for the API described by `config`.
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be created.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("invalid base URL {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidRequest(format!(
                "base URL cannot have a path: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::InvalidRequest(format!(
                    "base URL cannot have a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ClientError::ApiError {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PosBackend for PosApiClient {
    async fn lookup_product(&self, code: &str) -> Result<Option<Product>> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ClientError::InvalidRequest(
                "product code is empty".to_string(),
            ));
        }

        let url = self.endpoint(&["api", "products", code])?;
        tracing::debug!("Looking up product {} at {}", code, url);
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Product {} is not registered", code);
            return Ok(None);
        }
        let body = ensure_success(response).await?.text().await?;

        // The API answers an unknown code with `null` or an empty body.
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<Product>>(&body).map_err(|e| ClientError::ParseError {
            endpoint: "products".to_string(),
            message: format!("Failed to parse product: {e}"),
        })
    }

    async fn submit_purchase(&self, request: &PurchaseRequest) -> Result<PurchaseResponse> {
        let url = self.endpoint(&["api", "purchase"])?;
        tracing::debug!(
            "Submitting purchase of {} unit(s) to {}",
            request.items.len(),
            url
        );
        let response = self.client.post(url).json(request).send().await?;

        let response: PurchaseResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError {
                endpoint: "purchase".to_string(),
                message: format!("Failed to parse response: {e}"),
            })?;

        tracing::info!(
            "Purchase submitted: success={} total={} transaction={:?}",
            response.success,
            response.total_amount,
            response.transaction_id
        );
        Ok(response)
    }
}
