//! Request builder, response parser and async driver for the NeoWs API.
//!
//! # Design
//! `NeoClient` holds only the API key and base URL and carries no mutable
//! state between calls. Each endpoint is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`; both are pure. The `fetch_*` methods glue the two around a
//! caller-supplied `Transport`, and the `*_notify` variants additionally hand
//! the very same classified result to a completion callback.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{ApiKey, ItemDetail, PageIndex, PageListing};

/// Stateless client for the two NeoWs endpoints:
///
/// - listing: `GET <base>/browse?api_key=<key>&page=<n>`
/// - detail: `GET <base>/<id>?api_key=<key>`
#[derive(Debug, Clone)]
pub struct NeoClient {
    api_key: ApiKey,
    base_url: Url,
}

impl NeoClient {
    pub fn new(api_key: ApiKey, base_url: &str) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { api_key, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.api_key.clone(), &config.base_url)
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build the listing request. `None` and `PageIndex::NONE` both ask for page 1.
    pub fn build_listing(&self, page: Option<PageIndex>) -> HttpRequest {
        let page = page.unwrap_or(PageIndex::NONE).or_first();
        let mut url = self.endpoint("browse");
        url.query_pairs_mut()
            .append_pair("api_key", self.api_key.as_str())
            .append_pair("page", &page.to_string());
        HttpRequest::get(url)
    }

    /// Build the detail request. The id is encoded as a single path segment.
    pub fn build_detail(&self, item_id: &str) -> HttpRequest {
        let mut url = self.endpoint(item_id);
        url.query_pairs_mut()
            .append_pair("api_key", self.api_key.as_str());
        HttpRequest::get(url)
    }

    pub fn parse_listing(&self, response: HttpResponse) -> Result<PageListing, ApiError> {
        decode(response)
    }

    pub fn parse_detail(&self, response: HttpResponse) -> Result<ItemDetail, ApiError> {
        decode(response)
    }

    pub async fn fetch_listing<T>(
        &self,
        transport: &T,
        page: Option<PageIndex>,
    ) -> Result<PageListing, ApiError>
    where
        T: Transport + ?Sized,
    {
        let request = self.build_listing(page);
        debug!(
            page = %page.unwrap_or(PageIndex::NONE).or_first(),
            api_key = %self.api_key,
            "GET browse"
        );
        let response = transport.execute(request).await?;
        log_response("browse", &response);
        self.parse_listing(response)
    }

    pub async fn fetch_detail<T>(&self, transport: &T, item_id: &str) -> Result<ItemDetail, ApiError>
    where
        T: Transport + ?Sized,
    {
        let request = self.build_detail(item_id);
        debug!(item = item_id, api_key = %self.api_key, "GET detail");
        let response = transport.execute(request).await?;
        log_response("detail", &response);
        self.parse_detail(response)
    }

    /// Like `fetch_listing`, but also reports the outcome to `callback`
    /// exactly once before returning it.
    pub async fn fetch_listing_notify<T, F>(
        &self,
        transport: &T,
        page: Option<PageIndex>,
        callback: F,
    ) -> Result<PageListing, ApiError>
    where
        T: Transport + ?Sized,
        F: FnOnce(Result<&PageListing, &ApiError>),
    {
        let result = self.fetch_listing(transport, page).await;
        callback(result.as_ref());
        result
    }

    /// Like `fetch_detail`, but also reports the outcome to `callback`
    /// exactly once before returning it.
    pub async fn fetch_detail_notify<T, F>(
        &self,
        transport: &T,
        item_id: &str,
        callback: F,
    ) -> Result<ItemDetail, ApiError>
    where
        T: Transport + ?Sized,
        F: FnOnce(Result<&ItemDetail, &ApiError>),
    {
        let result = self.fetch_detail(transport, item_id).await;
        callback(result.as_ref());
        result
    }

    fn endpoint(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Checked in `new`: the base URL can always be a base.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }
}

fn log_response(endpoint: &str, response: &HttpResponse) {
    debug!(
        endpoint,
        status = response.status,
        content_type = response.header("content-type").unwrap_or("-"),
        bytes = response.body.len(),
        "response"
    );
}

/// Map non-2xx statuses to `ApiError::Request`, then decode the JSON body.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Request {
            status: response.status,
            status_text: response.status_text(),
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
