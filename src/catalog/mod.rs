//! Provider model catalogs: remote listing, single-use cache and ranking.

pub mod cache;
pub mod openrouter;
pub mod provider;

pub use cache::{ModelCache, sanitize_file_name};
pub use openrouter::{HttpCatalog, parse_catalog};
pub use provider::{CatalogFetcher, ProviderClient, TopModels, is_chat_model, rank_models};

/// A provider that `gitk init` can configure from its live catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub display_name: &'static str,
    pub api_base: &'static str,
    pub key_instructions: &'static str,
}

pub const OPENROUTER: ProviderInfo = ProviderInfo {
    id: "openrouter",
    display_name: "OpenRouter",
    api_base: "https://openrouter.ai/api/v1",
    key_instructions: "Get your API key at https://openrouter.ai/keys",
};

/// Providers offered during setup.
pub const CATALOG_PROVIDERS: &[ProviderInfo] = &[OPENROUTER];

pub fn find_provider(id: &str) -> Option<&'static ProviderInfo> {
    CATALOG_PROVIDERS.iter().find(|p| p.id == id)
}
