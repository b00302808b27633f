//! Remote content fetching.
//!
//! URL-based includes, `extends` sources, themes and remote image content
//! all go through the [`UrlFetcher`] trait. The default implementation is
//! [`HttpFetcher`]; embedders can substitute their own, which is also how
//! the parser tests avoid the network.

use std::fmt;

use crate::error::{ErrorCode, ParserError, Result};

/// Text content fetched from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub content: String,
    /// The raw `content-type` header value, if the server sent one.
    pub content_type: Option<String>,
}

/// Fetches text content from a URL.
pub trait UrlFetcher: fmt::Debug {
    /// Fetch `url`, erroring on any transport failure or non-success
    /// status.
    fn fetch(&self, url: &str) -> Result<FetchedContent>;
}

pub(crate) fn remote_error(url: &str, cause: &str) -> ParserError {
    ParserError::new(
        ErrorCode::E601,
        format!("could not fetch \"{url}\": {cause}"),
    )
}

/// Fetcher backed by a blocking HTTP client.
#[cfg(feature = "http")]
#[derive(Debug, Default)]
pub struct HttpFetcher;

#[cfg(feature = "http")]
impl UrlFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedContent> {
        use log::debug;

        debug!(url; "fetching remote content");
        let agent = ureq::Agent::new_with_defaults();
        let response = agent
            .get(url)
            .call()
            .map_err(|e| remote_error(url, &e.to_string()))?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let content = response
            .into_body()
            .read_to_string()
            .map_err(|e| remote_error(url, &e.to_string()))?;
        Ok(FetchedContent {
            content,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct CannedFetcher;

    impl UrlFetcher for CannedFetcher {
        fn fetch(&self, url: &str) -> Result<FetchedContent> {
            if url.ends_with(".dsl") {
                Ok(FetchedContent {
                    content: "workspace {}".to_owned(),
                    content_type: Some("text/plain".to_owned()),
                })
            } else {
                Err(remote_error(url, "not found"))
            }
        }
    }

    #[test]
    fn fetchers_are_substitutable_through_the_trait() {
        let fetcher: Box<dyn UrlFetcher> = Box::new(CannedFetcher);
        let fetched = fetcher.fetch("https://example.com/system.dsl").unwrap();
        assert_eq!(fetched.content, "workspace {}");
        assert_eq!(fetched.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn fetch_failures_carry_the_url() {
        let err = CannedFetcher.fetch("https://example.com/missing").unwrap_err();
        assert_eq!(err.code(), ErrorCode::E601);
        assert!(err.message().contains("https://example.com/missing"));
    }
}
