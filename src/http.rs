//! Shared reqwest plumbing for provider endpoints.

use std::env;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::warn;

use crate::error::ProviderError;

/// Default request timeout (30 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable to override the request timeout in seconds.
pub const TIMEOUT_ENV_VAR: &str = "GITK_HTTP_TIMEOUT";

/// Request timeout from the environment or default.
pub fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

pub fn build_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(get_timeout())
        .user_agent(concat!("gitk/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ProviderError::ClientBuild)
}

/// Classify a transport failure (no HTTP status available).
pub fn send_error(err: reqwest::Error, url: &str) -> ProviderError {
    let url = url.to_string();
    if err.is_timeout() {
        ProviderError::Timeout { url }
    } else if err.is_connect() {
        ProviderError::Unreachable { url, source: err }
    } else {
        ProviderError::Network { url, source: err }
    }
}

/// Pass successful responses through and map error statuses.
pub async fn check_status(provider: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(status_error(provider, status, body))
}

fn status_error(provider: &str, status: StatusCode, body: String) -> ProviderError {
    let provider = provider.to_string();
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::InvalidCredentials { provider },
        StatusCode::FORBIDDEN => ProviderError::Forbidden { provider, body },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { provider, body },
        _ => ProviderError::Api {
            provider,
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_timeout_default() {
        temp_env::with_var_unset(TIMEOUT_ENV_VAR, || {
            assert_eq!(get_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }

    #[test]
    #[serial]
    fn test_timeout_override() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("5"), || {
            assert_eq!(get_timeout(), Duration::from_secs(5));
        });
    }

    #[test]
    #[serial]
    fn test_timeout_invalid_falls_back() {
        for value in ["soon", "0", "-3"] {
            temp_env::with_var(TIMEOUT_ENV_VAR, Some(value), || {
                assert_eq!(get_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
            });
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error("openrouter", StatusCode::UNAUTHORIZED, String::new()),
            ProviderError::InvalidCredentials { .. }
        ));
        assert!(matches!(
            status_error("openrouter", StatusCode::FORBIDDEN, String::new()),
            ProviderError::Forbidden { .. }
        ));
        assert!(matches!(
            status_error("openrouter", StatusCode::TOO_MANY_REQUESTS, String::new()),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            status_error("openrouter", StatusCode::BAD_GATEWAY, "down".to_string()),
            ProviderError::Api { status: 502, .. }
        ));
    }
}
