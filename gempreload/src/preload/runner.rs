//! Bounded-concurrency probe runner.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use super::config::RunConfig;
use super::error::ItemProbeError;
use crate::error::{PreloadError, PreloadResult};
use crate::index::{IndexFetcher, IndexSource, PackageIdentifier};
use crate::transport::HttpClient;

/// Progress callback for preload runs.
/// Arguments: (probes_completed, probes_selected)
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Callback receiving each failed probe.
pub type FailureCallback = Arc<dyn Fn(&ItemProbeError) + Send + Sync>;

/// Issues one HEAD request per gem in (a slice of) a specs index.
///
/// # Example
///
/// ```ignore
/// use gempreload::index::IndexSource;
/// use gempreload::preload::PreloadRunner;
/// use gempreload::transport::ReqwestClient;
///
/// let client = ReqwestClient::new("http://localhost:9292")?;
/// PreloadRunner::new(&client, IndexSource::Latest)
///     .with_workers(8)
///     .with_skip(1000)
///     .with_limit(500)
///     .run()?;
/// ```
pub struct PreloadRunner<'a, C: HttpClient + ?Sized> {
    client: &'a C,
    fetcher: IndexFetcher<'a, C>,
    config: RunConfig,
    on_progress: Option<ProgressCallback>,
    on_failure: Option<FailureCallback>,
}

impl<'a, C: HttpClient + ?Sized> PreloadRunner<'a, C> {
    /// Create a runner with the default configuration.
    pub fn new(client: &'a C, source: IndexSource) -> Self {
        Self {
            client,
            fetcher: IndexFetcher::new(client, source),
            config: RunConfig::default(),
            on_progress: None,
            on_failure: None,
        }
    }

    /// Replace the whole run configuration.
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the number of leading entries to skip.
    pub fn with_skip(mut self, skip: i64) -> Self {
        self.config.skip = skip;
        self
    }

    /// Cap the number of entries to probe.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.config.limit = Some(limit);
        self
    }

    /// Register a progress callback.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Register a callback for failed probes.
    pub fn with_failure_handler(mut self, callback: FailureCallback) -> Self {
        self.on_failure = Some(callback);
        self
    }

    /// The configuration the next run will use.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The underlying index fetcher.
    pub fn fetcher(&self) -> &IndexFetcher<'a, C> {
        &self.fetcher
    }

    /// Probe every selected gem and wait for all probes to finish.
    ///
    /// Only a failed index download or decode is returned as an error;
    /// individual probe failures are logged, passed to the failure
    /// callback, and otherwise ignored.
    pub fn run(&self) -> PreloadResult<()> {
        if self.config.is_disabled() {
            debug!(limit = ?self.config.limit, "Limit is not positive, nothing to preload");
            return Ok(());
        }

        let index = self.fetcher.fetch()?;
        let Some(selection) = self
            .config
            .selection(index.len())
            .and_then(|range| index.get(range))
        else {
            info!(
                total = index.len(),
                skip = self.config.skip,
                "No gems selected for preloading"
            );
            return Ok(());
        };

        let workers = self.config.effective_workers();
        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        info!(
            selected = selection.len(),
            total = index.len(),
            workers,
            "Preloading gems"
        );

        let probe = |identifier: &PackageIdentifier| {
            if let Err(e) = self.probe(identifier) {
                failed.fetch_add(1, Ordering::Relaxed);
                self.report_failure(&e);
            }
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref cb) = self.on_progress {
                cb(done, selection.len());
            }
        };

        if workers == 1 {
            selection.iter().for_each(probe);
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("gempreload-probe-{}", i))
                .build()
                .map_err(|e| PreloadError::WorkerPool(e.to_string()))?;
            pool.install(|| selection.par_iter().for_each(probe));
        }

        info!(
            probed = completed.load(Ordering::Relaxed),
            failed = failed.load(Ordering::Relaxed),
            "Preload complete"
        );
        Ok(())
    }

    fn probe(&self, identifier: &PackageIdentifier) -> Result<(), ItemProbeError> {
        let path = identifier.gem_path();
        match self.client.head(&path) {
            Ok(response) => {
                debug!(
                    gem = %identifier,
                    status = response.status,
                    size = ?response.content_length,
                    "Probed gem"
                );
                Ok(())
            }
            Err(source) => Err(ItemProbeError {
                identifier: identifier.clone(),
                path,
                source,
            }),
        }
    }

    fn report_failure(&self, error: &ItemProbeError) {
        warn!(
            gem = %error.identifier,
            url = error.source.url(),
            error = %error.source,
            "Error while processing gem"
        );
        if let Some(ref cb) = self.on_failure {
            cb(error);
        }
    }
}
