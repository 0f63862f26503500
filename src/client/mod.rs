//! # Magento REST Client
//!
//! Minimal client bound to one base URL, one bearer token and one
//! resource-collection path. It issues GET/POST/PUT/DELETE and hands the
//! raw [`reqwest::Response`] back; status handling and payload shaping
//! belong to the adapters in [`crate::external`].
//!
//! A client is built per reconcile by the connector and never shared
//! between reconciles.

use crate::error::Result;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, info_span, Instrument};
use zeroize::Zeroizing;

/// REST client for one Magento installation and one collection path
#[derive(Clone)]
pub struct MagentoClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: Zeroizing<String>,
    path: String,
}

impl std::fmt::Debug for MagentoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagentoClient")
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl MagentoClient {
    /// Create a client for `base_url` authenticating with `access_token`
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ProviderError::Transport`] if the TLS backend
    /// cannot be initialised.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: Zeroizing::new(access_token.into()),
            path: String::new(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current resource-collection path, e.g. `/rest/V1/products`
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into().trim_end_matches('/').to_string();
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.set_path(path);
        self
    }

    fn url(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}{}", self.base_url, self.path)
        } else {
            format!(
                "{}{}/{}",
                self.base_url,
                self.path,
                suffix.trim_start_matches('/')
            )
        }
    }

    fn make_request(&self, method: Method, suffix: &str, body: Option<&Value>) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, self.url(suffix))
            .bearer_auth(self.access_token.as_str())
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    async fn send(&self, request: RequestBuilder, method: &Method, suffix: &str) -> Result<Response> {
        let span = info_span!(
            "magento.request",
            http.method = %method,
            magento.path = %self.path,
            magento.suffix = suffix,
        );
        async move {
            let response = request.send().await?;
            debug!(status = response.status().as_u16(), "Magento API responded");
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// `GET <path>/<suffix>` with optional query parameters
    pub async fn get(&self, suffix: &str, query: &[(&str, &str)]) -> Result<Response> {
        let mut request = self.make_request(Method::GET, suffix, None);
        if !query.is_empty() {
            request = request.query(query);
        }
        self.send(request, &Method::GET, suffix).await
    }

    /// `POST <path>` with a JSON body
    pub async fn post(&self, body: &Value) -> Result<Response> {
        let request = self.make_request(Method::POST, "", Some(body));
        self.send(request, &Method::POST, "").await
    }

    /// `PUT <path>/<id>` with a JSON body
    pub async fn put(&self, id: &str, body: &Value) -> Result<Response> {
        let request = self.make_request(Method::PUT, id, Some(body));
        self.send(request, &Method::PUT, id).await
    }

    /// `DELETE <path>/<id>`
    pub async fn delete(&self, id: &str) -> Result<Response> {
        let request = self.make_request(Method::DELETE, id, None);
        self.send(request, &Method::DELETE, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_path_and_id() {
        let client = MagentoClient::new("https://shop.example.com/", "token")
            .unwrap()
            .with_path("/rest/V1/products/");

        assert_eq!(client.url(""), "https://shop.example.com/rest/V1/products");
        assert_eq!(client.url("42"), "https://shop.example.com/rest/V1/products/42");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = MagentoClient::new("https://shop.example.com", "s3cr3t").unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("redacted"));
    }
}
