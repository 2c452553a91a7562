//! Cache-first access to a provider catalog, plus ranking.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::cache::ModelCache;
use crate::error::{CacheError, CatalogError, ProviderError};
use crate::model::{ModelRecord, score};

/// Ids or names containing any of these belong to non-chat endpoints.
const NON_CHAT_MARKERS: &[&str] = &[
    "embed",
    "moderation",
    "whisper",
    "tts",
    "audio",
    "dall-e",
    "image-gen",
    "rerank",
];

/// Source of a provider's live model list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    async fn fetch_models(&self) -> Result<Vec<ModelRecord>, ProviderError>;
}

/// Best free and paid models, each ordered by descending score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopModels {
    pub free: Vec<ModelRecord>,
    pub paid: Vec<ModelRecord>,
}

impl TopModels {
    pub fn is_empty(&self) -> bool {
        self.free.is_empty() && self.paid.is_empty()
    }
}

/// Default filter: keep models usable for chat completions.
pub fn is_chat_model(model: &ModelRecord) -> bool {
    let id = model.model_id().to_lowercase();
    let name = model.name().to_lowercase();
    !NON_CHAT_MARKERS
        .iter()
        .any(|marker| id.contains(marker) || name.contains(marker))
}

pub struct ProviderClient<F> {
    provider: String,
    fetcher: F,
    cache: ModelCache,
}

impl<F: CatalogFetcher> ProviderClient<F> {
    pub fn new(provider: impl Into<String>, fetcher: F, cache: ModelCache) -> Self {
        Self {
            provider: provider.into(),
            fetcher,
            cache,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Cached catalog if present, otherwise a live fetch that refills the cache.
    pub async fn fetch_models(&self) -> Result<Vec<ModelRecord>, CatalogError> {
        match self.cache.load(&self.provider) {
            Ok(models) if !models.is_empty() => return Ok(models),
            Ok(_) => {}
            Err(CacheError::Corrupt { path, source }) => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "Discarding corrupt model cache, fetching a fresh catalog"
                );
            }
            Err(e) => return Err(e.into()),
        }

        debug!(provider = %self.provider, "Fetching remote catalog");
        let models = self.fetcher.fetch_models().await?;
        self.cache.save(&self.provider, &models)?;
        Ok(models)
    }

    /// Drop the cached catalog and fetch it again.
    pub async fn refresh(&self) -> Result<Vec<ModelRecord>, CatalogError> {
        self.cache.delete(&self.provider)?;
        self.fetch_models().await
    }

    pub async fn get_top_models<P>(
        &self,
        filter: P,
        free_count: usize,
        paid_count: usize,
    ) -> Result<TopModels, CatalogError>
    where
        P: Fn(&ModelRecord) -> bool,
    {
        let models = self.fetch_models().await?;
        Ok(rank_models(models, filter, free_count, paid_count))
    }
}

/// Filter, split by price, sort by score (stable) and truncate.
pub fn rank_models<P>(
    models: Vec<ModelRecord>,
    filter: P,
    free_count: usize,
    paid_count: usize,
) -> TopModels
where
    P: Fn(&ModelRecord) -> bool,
{
    let (mut free, mut paid): (Vec<_>, Vec<_>) = models
        .into_iter()
        .filter(|model| filter(model))
        .partition(ModelRecord::is_free);

    sort_by_score(&mut free);
    sort_by_score(&mut paid);
    free.truncate(free_count);
    paid.truncate(paid_count);

    TopModels { free, paid }
}

fn sort_by_score(models: &mut [ModelRecord]) {
    models.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_BASE: &str = "https://openrouter.ai/api/v1";

    fn model(name: &str, id: &str, context_length: u64, is_free: bool) -> ModelRecord {
        ModelRecord::new(name, "openrouter", API_BASE, id)
            .unwrap()
            .with_context_length(context_length)
            .with_free(is_free)
    }

    /// Three free models scoring 10, 30 and 20.
    fn scored_trio() -> Vec<ModelRecord> {
        vec![
            model("Model A", "vendor/model-a", 100_000, true),
            model("Mistral Large", "mistralai/mistral-large", 1_000_000, true),
            model("Model C", "vendor/model-c", 1_000_000, true),
        ]
    }

    #[test]
    fn test_trio_scores() {
        let scores: Vec<f64> = scored_trio().iter().map(score).collect();
        assert_eq!(scores, vec![10.0, 30.0, 20.0]);
    }

    #[test]
    fn test_rank_picks_highest_free() {
        let top = rank_models(scored_trio(), is_chat_model, 1, 5);
        assert_eq!(top.free.len(), 1);
        assert_eq!(top.free[0].name(), "Mistral Large");
        assert!(top.paid.is_empty());
    }

    #[test]
    fn test_rank_splits_and_sorts() {
        let models = vec![
            model("Paid Small", "vendor/paid-small", 8_000, false),
            model("Free Small", "vendor/free-small", 8_000, true),
            model("Paid Large", "vendor/paid-large", 200_000, false),
        ];
        let top = rank_models(models, |_| true, 10, 10);
        let paid: Vec<_> = top.paid.iter().map(ModelRecord::name).collect();
        assert_eq!(paid, vec!["Paid Large", "Paid Small"]);
        assert_eq!(top.free.len(), 1);
    }

    #[test]
    fn test_rank_keeps_catalog_order_for_ties() {
        let models = vec![
            model("First", "vendor/first", 32_000, true),
            model("Second", "vendor/second", 32_000, true),
            model("Third", "vendor/third", 32_000, true),
        ];
        let top = rank_models(models, |_| true, 10, 10);
        let names: Vec<_> = top.free.iter().map(ModelRecord::name).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_is_chat_model() {
        assert!(is_chat_model(&model("GPT-4o", "openai/gpt-4o", 128_000, false)));
        assert!(!is_chat_model(&model("Embed", "openai/text-embedding-3-large", 8_000, false)));
        assert!(!is_chat_model(&model("Whisper", "openai/whisper-1", 0, false)));
        assert!(!is_chat_model(&model("Mod", "openai/omni-moderation-latest", 0, false)));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path());
        cache.save("openrouter", &scored_trio()).unwrap();

        let mut fetcher = MockCatalogFetcher::new();
        fetcher.expect_fetch_models().never();

        let client = ProviderClient::new("openrouter", fetcher, cache);
        let top = client.get_top_models(is_chat_model, 1, 1).await.unwrap();
        assert_eq!(top.free[0].name(), "Mistral Large");
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path());

        let mut fetcher = MockCatalogFetcher::new();
        fetcher
            .expect_fetch_models()
            .times(1)
            .returning(|| Ok(scored_trio()));

        let client = ProviderClient::new("openrouter", fetcher, cache.clone());
        let models = client.fetch_models().await.unwrap();
        assert_eq!(models.len(), 3);
        assert_eq!(cache.load("openrouter").unwrap(), scored_trio());
    }

    #[tokio::test]
    async fn test_corrupt_cache_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path());
        std::fs::write(cache.file_path("openrouter"), "[{\"broken\"").unwrap();

        let mut fetcher = MockCatalogFetcher::new();
        fetcher
            .expect_fetch_models()
            .times(1)
            .returning(|| Ok(scored_trio()));

        let client = ProviderClient::new("openrouter", fetcher, cache);
        let top = client.get_top_models(|_| true, 3, 0).await.unwrap();
        assert_eq!(top.free.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_without_caching() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path());

        let mut fetcher = MockCatalogFetcher::new();
        fetcher.expect_fetch_models().times(1).returning(|| {
            Err(ProviderError::InvalidCredentials {
                provider: "openrouter".to_string(),
            })
        });

        let client = ProviderClient::new("openrouter", fetcher, cache.clone());
        let err = client.fetch_models().await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Provider(ProviderError::InvalidCredentials { .. })
        ));
        assert!(!cache.file_path("openrouter").exists());
    }

    #[tokio::test]
    async fn test_refresh_ignores_existing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path());
        cache
            .save("openrouter", &[model("Stale", "vendor/stale", 0, true)])
            .unwrap();

        let mut fetcher = MockCatalogFetcher::new();
        fetcher
            .expect_fetch_models()
            .times(1)
            .returning(|| Ok(scored_trio()));

        let client = ProviderClient::new("openrouter", fetcher, cache);
        let models = client.refresh().await.unwrap();
        assert_eq!(models, scored_trio());
    }
}
