//! HTTP client for the imagery lookup service.
//!
//! Wraps `reqwest` with envelope status handling and typed response
//! deserialization. Retries are left to the caller so the retry policy lives
//! in one place.

use std::time::Duration;

use panofind_core::{CoverageTier, FinderConfig, GeoPoint, PanoramaRecord};
use reqwest::{Client, StatusCode, Url};

use crate::error::ImageryError;
use crate::normalize::{normalize_panorama, Fetched};
use crate::provider::PanoramaProvider;
use crate::types::{ApiResponse, STATUS_ERROR, STATUS_OK, STATUS_ZERO_RESULTS};

/// Client for the imagery lookup service.
///
/// Use [`ImageryClient::new`] with an explicit base URL (a mock server in
/// tests) or [`ImageryClient::from_config`] with a loaded [`FinderConfig`].
pub struct ImageryClient {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
}

impl ImageryClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ImageryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ImageryError::InvalidRequest`] if
    /// `base_url` is not a valid URL.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ImageryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so joined paths append rather than
        // replace the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            ImageryError::InvalidRequest(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            api_key: api_key.map(str::to_owned),
            base_url,
        })
    }

    /// Creates a client from the imagery section of a [`FinderConfig`].
    ///
    /// # Errors
    ///
    /// See [`ImageryClient::new`].
    pub fn from_config(config: &FinderConfig) -> Result<Self, ImageryError> {
        Self::new(
            &config.imagery_base_url,
            config.imagery_api_key.as_deref(),
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Builds a request URL from path segments and query parameters, with
    /// the API key appended when configured.
    fn build_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ImageryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ImageryError::InvalidRequest(format!("base URL '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        if self.api_key.is_some() || !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET request and decodes the envelope.
    ///
    /// Returns `Ok(None)` for HTTP 404 and for a `ZERO_RESULTS` envelope.
    ///
    /// # Errors
    ///
    /// - [`ImageryError::Http`] on network failure or another non-2xx status.
    /// - [`ImageryError::Deserialize`] if the body is not a valid envelope.
    /// - [`ImageryError::ApiError`] if the envelope reports an error.
    async fn request(&self, url: Url) -> Result<Option<ApiResponse>, ImageryError> {
        // Error contexts use the path only so the API key never lands in logs.
        let context = url.path().to_owned();
        tracing::debug!(path = %context, "imagery request");
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(path = %context, "imagery lookup returned 404");
            return Ok(None);
        }
        let response = response.error_for_status()?;
        let body = response.text().await?;
        let envelope: ApiResponse =
            serde_json::from_str(&body).map_err(|e| ImageryError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        match envelope.status.as_str() {
            STATUS_OK => Ok(Some(envelope)),
            STATUS_ZERO_RESULTS => Ok(None),
            STATUS_ERROR => Err(ImageryError::ApiError(
                envelope
                    .message
                    .unwrap_or_else(|| "unknown error".to_owned()),
            )),
            other => Err(ImageryError::ApiError(format!(
                "unexpected status \"{other}\" from {context}"
            ))),
        }
    }

    async fn request_single(
        &self,
        url: Url,
        fetched: Fetched,
    ) -> Result<Option<PanoramaRecord>, ImageryError> {
        let context = url.path().to_owned();
        let Some(envelope) = self.request(url).await? else {
            return Ok(None);
        };
        let wire = envelope
            .panorama
            .ok_or_else(|| ImageryError::malformed(context, "OK response without a panorama"))?;
        normalize_panorama(wire, fetched).map(Some)
    }
}

impl PanoramaProvider for ImageryClient {
    async fn find_panorama(
        &self,
        point: GeoPoint,
        radius_m: u32,
        locale: &str,
        tier: CoverageTier,
    ) -> Result<Option<PanoramaRecord>, ImageryError> {
        if !point.is_valid() {
            return Err(ImageryError::InvalidRequest(format!(
                "coordinates out of range: {point}"
            )));
        }
        let url = self.build_url(
            &["panoramas", "nearest"],
            &[
                ("lat", &point.lat.to_string()),
                ("lng", &point.lng.to_string()),
                ("radius", &radius_m.to_string()),
                ("locale", locale),
                ("coverage", &tier.to_string()),
            ],
        )?;
        self.request_single(url, Fetched::SEARCH).await
    }

    async fn find_panorama_by_id(
        &self,
        id: &str,
        locale: &str,
        want_depth: bool,
    ) -> Result<Option<PanoramaRecord>, ImageryError> {
        if id.is_empty() {
            return Err(ImageryError::InvalidRequest("empty panorama id".to_owned()));
        }
        let url = self.build_url(
            &["panoramas", id],
            &[
                ("locale", locale),
                ("depth", if want_depth { "true" } else { "false" }),
            ],
        )?;
        self.request_single(url, Fetched::by_id(want_depth)).await
    }

    async fn get_tile_coverage(
        &self,
        tile_x: u32,
        tile_y: u32,
    ) -> Result<Vec<PanoramaRecord>, ImageryError> {
        let url = self.build_url(
            &["coverage", "tiles", &tile_x.to_string(), &tile_y.to_string()],
            &[],
        )?;
        let Some(envelope) = self.request(url).await? else {
            return Ok(Vec::new());
        };
        envelope
            .panoramas
            .into_iter()
            .map(|wire| normalize_panorama(wire, Fetched::TILE))
            .collect()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
