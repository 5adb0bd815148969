//! Thin HTTP client used by every catalog hop.
//!
//! Requests are issued once; failures are reported to the caller, never
//! retried.

use log::debug;
use reqwest::{Client, Response};
use std::io::Write;

use crate::error::AddonError;
use crate::html::{LinkScanner, LinkTarget};

const USER_AGENT: &str = "eso-addons-cli";

/// Build the shared reqwest client.
pub fn build_http_client() -> Result<HttpClient, reqwest::Error> {
    let client = Client::builder().user_agent(USER_AGENT).build()?;
    Ok(HttpClient::new(client))
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET a URL, failing on transport errors and non-success statuses.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, url: &str) -> Result<Response, AddonError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AddonError::network(url, e))?;
        response
            .error_for_status()
            .map_err(|e| AddonError::network(url, e))
    }

    /// POST an urlencoded form.
    #[tracing::instrument(skip(self))]
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Response, AddonError> {
        debug!("POST {} {:?}", url, form);
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| AddonError::network(url, e))?;
        response
            .error_for_status()
            .map_err(|e| AddonError::network(url, e))
    }

    /// Read a response body chunk by chunk until `target` is found.
    ///
    /// The response is dropped on every return path, releasing the
    /// connection even when the rest of the body was never read.
    pub async fn scan_response(
        &self,
        mut response: Response,
        target: &LinkTarget,
    ) -> Result<String, AddonError> {
        let url = response.url().to_string();
        let mut scanner = LinkScanner::new(target.clone());

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AddonError::network(&url, e))?
        {
            if let Some(link) = scanner.feed(&chunk) {
                debug!("Found {} at {}: {}", target, url, link);
                return Ok(link);
            }
        }

        scanner
            .finish()
            .ok_or_else(|| AddonError::link_not_found(url, target.to_string()))
    }

    /// Stream a URL into the writer returned by `create_writer`.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64, AddonError>
    where
        W: Write,
        F: FnOnce() -> Result<W, AddonError>,
    {
        let mut response = self.get(url).await?;
        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AddonError::network(url, e))?
        {
            writer
                .write_all(&chunk)
                .map_err(|e| AddonError::io("Failed to write chunk to file", e))?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer
            .flush()
            .map_err(|e| AddonError::io("Failed to flush downloaded file", e))?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}
