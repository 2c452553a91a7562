//! `GET {api_base}/models` in the OpenRouter response shape.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::provider::CatalogFetcher;
use crate::error::ProviderError;
use crate::http;
use crate::model::{DEFAULT_CONTEXT_LENGTH, ModelRecord};

pub struct HttpCatalog {
    provider: String,
    api_base: String,
    api_key: String,
    client: Client,
}

impl HttpCatalog {
    pub fn new(
        provider: impl Into<String>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            provider: provider.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: http::build_client()?,
        })
    }
}

#[async_trait]
impl CatalogFetcher for HttpCatalog {
    async fn fetch_models(&self) -> Result<Vec<ModelRecord>, ProviderError> {
        let url = format!("{}/models", self.api_base);
        debug!(url = %url, "Requesting model catalog");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| http::send_error(e, &url))?;
        let response = http::check_status(&self.provider, response).await?;
        let body = response.text().await.map_err(|e| http::send_error(e, &url))?;

        parse_catalog(&self.provider, &self.api_base, &body)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    data: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    context_length: Option<u64>,
    #[serde(default)]
    pricing: Option<Pricing>,
}

#[derive(Debug, Deserialize)]
struct Pricing {
    #[serde(default)]
    prompt: Option<Price>,
    #[serde(default)]
    completion: Option<Price>,
}

/// Prices arrive as decimal strings ("0.000002") or plain numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Price {
    Number(f64),
    Text(String),
}

impl Price {
    fn is_zero(&self) -> bool {
        match self {
            Price::Number(n) => *n == 0.0,
            Price::Text(s) => s.trim().parse::<f64>().is_ok_and(|n| n == 0.0),
        }
    }
}

impl Pricing {
    fn is_free(&self) -> bool {
        let zero = |price: &Option<Price>| price.as_ref().is_none_or(Price::is_zero);
        zero(&self.prompt) && zero(&self.completion)
    }
}

/// Normalize a catalog response body into model records.
///
/// Entries that fail validation are skipped.
pub fn parse_catalog(
    provider: &str,
    api_base: &str,
    body: &str,
) -> Result<Vec<ModelRecord>, ProviderError> {
    let response: CatalogResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse {
            provider: provider.to_string(),
            detail: format!("invalid model catalog: {e}"),
        })?;

    let total = response.data.len();
    let records: Vec<ModelRecord> = response
        .data
        .into_iter()
        .filter_map(|entry| {
            let name = entry
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| entry.id.clone());
            let is_free = entry.pricing.as_ref().is_none_or(Pricing::is_free);

            match ModelRecord::new(name, provider, api_base, &entry.id) {
                Ok(record) => Some(
                    record
                        .with_free(is_free)
                        .with_context_length(entry.context_length.unwrap_or(DEFAULT_CONTEXT_LENGTH))
                        .with_description(entry.description.unwrap_or_default()),
                ),
                Err(e) => {
                    debug!(id = %entry.id, error = %e, "Skipping catalog entry");
                    None
                }
            }
        })
        .collect();

    debug!(provider, total, kept = records.len(), "Parsed model catalog");
    Ok(records)
}
