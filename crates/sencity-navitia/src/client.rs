//! HTTP client for the Navitia REST API.
//!
//! Wraps `reqwest` with Navitia authentication (the token is sent as the
//! basic-auth username), error-body decoding and retry. Endpoint methods live
//! next to the types they produce: journeys in `journeys`, points of interest
//! in `poi`, reverse geocoding and autocomplete in `places`.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use sencity_core::{AppConfig, PlaceResolver};

use crate::error::NavitiaError;
use crate::retry::retry_with_backoff;
use crate::types::ErrorEnvelope;

const DEFAULT_BASE_URL: &str = "https://api.navitia.io/v1/";

/// Connection parameters for [`NavitiaClient`].
#[derive(Clone)]
pub struct NavitiaSettings {
    pub token: String,
    pub coverage: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl NavitiaSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            token: config.navitia_token.clone(),
            coverage: config.navitia_coverage.clone(),
            timeout_secs: config.navitia_timeout_secs,
            max_retries: config.navitia_max_retries,
            backoff_base_ms: config.navitia_backoff_base_ms,
        }
    }
}

impl std::fmt::Debug for NavitiaSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavitiaSettings")
            .field("token", &"[redacted]")
            .field("coverage", &self.coverage)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish()
    }
}

/// Client for the Navitia REST API.
///
/// Use [`NavitiaClient::new`] for production or
/// [`NavitiaClient::with_base_url`] to point at a mock server in tests.
pub struct NavitiaClient {
    client: Client,
    token: String,
    base_url: Url,
    pub(crate) coverage: String,
    max_retries: u32,
    backoff_base_ms: u64,
    pub(crate) resolver: PlaceResolver,
}

impl NavitiaClient {
    /// Creates a client pointed at the public Navitia API.
    ///
    /// # Errors
    ///
    /// Returns [`NavitiaError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(settings: NavitiaSettings, resolver: PlaceResolver) -> Result<Self, NavitiaError> {
        Self::with_base_url(settings, resolver, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`NavitiaError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`NavitiaError::InvalidRequest`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        settings: NavitiaSettings,
        resolver: PlaceResolver,
        base_url: &str,
    ) -> Result<Self, NavitiaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("sencity/0.1 (route-enhancement)")
            .build()?;

        // Exactly one trailing slash so relative endpoint paths are appended
        // to the base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            NavitiaError::InvalidRequest(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            token: settings.token,
            base_url,
            coverage: settings.coverage,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
            resolver,
        })
    }

    #[must_use]
    pub fn resolver(&self) -> &PlaceResolver {
        &self.resolver
    }

    /// Resolves `path` against the base URL and appends query parameters.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, NavitiaError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| NavitiaError::InvalidRequest(format!("invalid path '{path}': {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// GETs `url` with retry and deserializes the body into `T`.
    pub(crate) async fn get_json<T>(&self, url: &Url, context: &str) -> Result<T, NavitiaError>
    where
        T: DeserializeOwned,
    {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.get_json_once(url, context)
        })
        .await
    }

    async fn get_json_once<T>(&self, url: &Url, context: &str) -> Result<T, NavitiaError>
    where
        T: DeserializeOwned,
    {
        tracing::debug!(context, path = url.path(), "navitia request");
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.token, None::<&str>)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status_error = response.error_for_status_ref().err();
        if let Some(status_error) = status_error {
            // Navitia reports semantic failures (no_solution, unknown_object,
            // ...) as 4xx with a JSON error body.
            if response.status().is_client_error() {
                let body = response.text().await?;
                if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
                    return Err(NavitiaError::Api {
                        id: envelope.error.id,
                        message: envelope.error.message,
                    });
                }
            }
            return Err(NavitiaError::Http(status_error));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| NavitiaError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> NavitiaSettings {
        NavitiaSettings {
            token: "secret-token".to_string(),
            coverage: "fr-idf".to_string(),
            timeout_secs: 5,
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = NavitiaClient::with_base_url(
            settings(),
            PlaceResolver::default(),
            "http://localhost/v1",
        )
        .unwrap();
        let url = client
            .endpoint("coverage/fr-idf/journeys", &[("from", "2.3;48.8")])
            .unwrap();
        assert_eq!(url.path(), "/v1/coverage/fr-idf/journeys");
        assert_eq!(url.query(), Some("from=2.3%3B48.8"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result =
            NavitiaClient::with_base_url(settings(), PlaceResolver::default(), "not a url");
        assert!(matches!(result, Err(NavitiaError::InvalidRequest(_))));
    }

    #[test]
    fn settings_debug_redacts_token() {
        let debug = format!("{:?}", settings());
        assert!(!debug.contains("secret-token"));
    }
}
