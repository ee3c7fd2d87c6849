//! Memoizing specs index fetcher.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::decode::decode_index;
use super::types::{DecodedIndex, IndexSource};
use crate::error::PreloadResult;
use crate::transport::HttpClient;

/// Downloads and decodes a repository's specs index.
///
/// The first successful [`fetch`](Self::fetch) is cached for the lifetime of
/// the fetcher; failures are not cached, so a later call retries.
pub struct IndexFetcher<'a, C: HttpClient + ?Sized> {
    client: &'a C,
    source: IndexSource,
    cached: Mutex<Option<Arc<DecodedIndex>>>,
}

impl<'a, C: HttpClient + ?Sized> IndexFetcher<'a, C> {
    /// Create a fetcher for the given index source.
    pub fn new(client: &'a C, source: IndexSource) -> Self {
        Self {
            client,
            source,
            cached: Mutex::new(None),
        }
    }

    /// The index this fetcher downloads.
    pub fn source(&self) -> IndexSource {
        self.source
    }

    /// Whether an index has already been fetched.
    pub fn is_cached(&self) -> bool {
        self.cached.lock().is_some()
    }

    /// Fetch and decode the index, or return the cached copy.
    ///
    /// Concurrent callers wait on the first download rather than starting
    /// their own.
    pub fn fetch(&self) -> PreloadResult<Arc<DecodedIndex>> {
        let mut cached = self.cached.lock();
        if let Some(index) = cached.as_ref() {
            debug!(resource = self.source.resource_name(), "Using cached specs index");
            return Ok(Arc::clone(index));
        }

        let resource = self.source.resource_name();
        info!(resource, "Fetching specs index");
        let body = self.client.get(resource)?;
        let index = Arc::new(decode_index(&body)?);
        info!(
            resource,
            bytes = body.len(),
            entries = index.len(),
            "Decoded specs index"
        );

        *cached = Some(Arc::clone(&index));
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::specs_gz;
    use super::*;
    use crate::error::PreloadError;
    use crate::transport::{MockHttpClient, TransportError};

    fn full_specs() -> Vec<u8> {
        specs_gz(&[("latest_gem", "1.0.0", ""), ("other", "0.1.0", "")])
    }

    #[test]
    fn test_fetches_full_specs_by_default() {
        let client = MockHttpClient::new().with_body("specs.4.8.gz", full_specs());
        let fetcher = IndexFetcher::new(&client, IndexSource::default());

        let index = fetcher.fetch().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[0].to_string(), "latest_gem-1.0.0");
        assert_eq!(index.entries()[1].to_string(), "other-0.1.0");
        assert_eq!(client.get_calls(), vec!["specs.4.8.gz".to_string()]);
    }

    #[test]
    fn test_fetches_latest_specs_when_requested() {
        let client = MockHttpClient::new().with_body(
            "latest_specs.4.8.gz",
            specs_gz(&[("latest_gem", "1.0.0", "")]),
        );
        let fetcher = IndexFetcher::new(&client, IndexSource::Latest);

        let index = fetcher.fetch().unwrap();
        assert_eq!(index.entries().last().unwrap().to_string(), "latest_gem-1.0.0");
        assert_eq!(client.get_calls(), vec!["latest_specs.4.8.gz".to_string()]);
    }

    #[test]
    fn test_fetch_is_memoized() {
        let client = MockHttpClient::new().with_body("specs.4.8.gz", full_specs());
        let fetcher = IndexFetcher::new(&client, IndexSource::Full);
        assert!(!fetcher.is_cached());

        let first = fetcher.fetch().unwrap();
        let second = fetcher.fetch().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(fetcher.is_cached());
        assert_eq!(client.get_calls().len(), 1);
    }

    #[test]
    fn test_concurrent_fetches_share_one_download() {
        let client = MockHttpClient::new().with_body("specs.4.8.gz", full_specs());
        let fetcher = IndexFetcher::new(&client, IndexSource::Full);

        let results: Vec<Arc<DecodedIndex>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| fetcher.fetch().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(client.get_calls().len(), 1);
        assert!(results.iter().all(|index| Arc::ptr_eq(index, &results[0])));
    }

    #[test]
    fn test_transport_failure_is_not_cached() {
        let client = MockHttpClient::new().with_get_failure(
            "specs.4.8.gz",
            TransportError::Request {
                url: "specs.4.8.gz".to_string(),
                reason: "connection reset".to_string(),
            },
        );
        let fetcher = IndexFetcher::new(&client, IndexSource::Full);

        assert!(matches!(fetcher.fetch(), Err(PreloadError::Transport(_))));
        assert!(matches!(fetcher.fetch(), Err(PreloadError::Transport(_))));
        assert!(!fetcher.is_cached());
        assert_eq!(client.get_calls().len(), 2);
    }

    #[test]
    fn test_garbage_body_is_format_error() {
        let client = MockHttpClient::new().with_body("specs.4.8.gz", b"<html>".to_vec());
        let fetcher = IndexFetcher::new(&client, IndexSource::Full);

        assert!(matches!(fetcher.fetch(), Err(PreloadError::Format(_))));
    }

    #[test]
    fn test_works_with_trait_objects() {
        let client = MockHttpClient::new().with_body("specs.4.8.gz", full_specs());
        let dyn_client: &dyn HttpClient = &client;
        let fetcher = IndexFetcher::new(dyn_client, IndexSource::Full);
        assert_eq!(fetcher.fetch().unwrap().len(), 2);
        assert_eq!(fetcher.source(), IndexSource::Full);
    }
}
