//! Catalog link resolution.
//!
//! The catalog has no API, so a download URL is found by walking its pages:
//!
//! 1. POST the search form and pick the anchor labelled `Download`, or, when
//!    the search lands on a results listing, the anchor labelled with the
//!    add-on name itself.
//! 2. GET that page and take the `src` of its first `<iframe>`, which points
//!    at the CDN.
//!
//! Direct URLs skip the search and go straight to step 2.

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Url;

use crate::error::AddonError;
use crate::html::LinkTarget;
use crate::http::HttpClient;
use crate::manifest::is_url;

pub const DEFAULT_CATALOG_URL: &str = "https://www.esoui.com";
pub const SEARCH_PATH: &str = "/downloads/search.php";

const DOWNLOAD_LABEL: &str = "Download";

/// Search term for an identifier: everything before the first `-`.
///
/// The catalog search does not understand pinned version suffixes such as
/// `Bar-3.2`.
pub fn search_term(identifier: &str) -> &str {
    identifier.split('-').next().unwrap_or(identifier)
}

/// Turns an add-on identifier into a binary download URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<String, AddonError>;
}

/// [`LinkResolver`] that scrapes the catalog website.
pub struct CatalogResolver {
    http: HttpClient,
    base_url: Url,
}

impl CatalogResolver {
    pub fn new(http: HttpClient, base_url: &str) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid catalog URL: {}", base_url))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Search hop: POST the search form and scan the result for `target`.
    async fn search(&self, term: &str, target: &LinkTarget) -> Result<String, AddonError> {
        let search_url = join(&self.base_url, SEARCH_PATH)?;
        let response = self
            .http
            .post_form(
                search_url.as_str(),
                &[("x", "0"), ("y", "0"), ("search", term)],
            )
            .await?;
        self.http.scan_response(response, target).await
    }

    /// Find the page that wraps the download frame for `identifier`.
    async fn find_download_page(&self, identifier: &str) -> Result<Url, AddonError> {
        let term = search_term(identifier);
        info!("Searching catalog for {}", term);

        let download = LinkTarget::AnchorLabelled(DOWNLOAD_LABEL.to_string());
        let href = match self.search(term, &download).await {
            Ok(href) => href,
            Err(e) if e.is_link_not_found() => {
                // Ambiguous searches land on a listing; take the first entry
                // labelled exactly like the add-on.
                debug!("No download button for {}, trying results listing", term);
                let listing = LinkTarget::AnchorLabelled(identifier.to_string());
                self.search(term, &listing).await.inspect_err(|_| {
                    warn!(
                        "Failed to find add-on {}; consider pasting a direct link",
                        identifier
                    )
                })?
            }
            Err(e) => return Err(e),
        };

        join(&self.base_url, &href)
    }

    /// Redirect hop: the page embeds the CDN link in its first iframe.
    async fn find_download_frame(&self, page: &Url) -> Result<String, AddonError> {
        let response = self.http.get(page.as_str()).await?;
        let page_url = response.url().clone();
        let src = self
            .http
            .scan_response(response, &LinkTarget::FirstIframe)
            .await?;
        Ok(join(&page_url, &src)?.to_string())
    }
}

#[async_trait(?Send)]
impl LinkResolver for CatalogResolver {
    #[tracing::instrument(skip(self))]
    async fn resolve(&self, identifier: &str) -> Result<String, AddonError> {
        let page = if is_url(identifier) {
            Url::parse(identifier)
                .map_err(|e| AddonError::link_not_found(identifier, format!("valid URL ({})", e)))?
        } else {
            self.find_download_page(identifier).await?
        };

        let link = self.find_download_frame(&page).await?;
        debug!("Resolved {} to {}", identifier, link);
        Ok(link)
    }
}

fn join(base: &Url, link: &str) -> Result<Url, AddonError> {
    base.join(link)
        .map_err(|e| AddonError::link_not_found(base.as_str(), format!("usable link in {:?} ({})", link, e)))
}
