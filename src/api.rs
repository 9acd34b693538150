use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::downloader::{Downloader, ProgressFn};
use crate::error::FetchError;
use crate::http::{HttpConfig, ReqwestTransport, Transport};
use crate::install::{FetchOutcome, Install};
use crate::pattern::ArtifactPattern;
use crate::progress::default_progress_fn;
use crate::release::{ReleaseQuery, ReleaseSelector, GITHUB_API_BASE};

// ──────────────────────────────────────────────────────────────────────────────
// Api
// ──────────────────────────────────────────────────────────────────────────────

/// Top-level entry-point with a chainable builder API.
///
/// # Example
/// ```rust,no_run
/// use relfetch::{Api, ArtifactPattern};
///
/// let pattern = ArtifactPattern::new("runtime", "jar").unwrap();
/// let outcome = Api::new()
///     .set_target_dir("run/plugins")
///     .repo("owner/repo")
///     .unwrap()
///     .latest()
///     .fetch(&pattern)
///     .unwrap();
/// println!("runtime {}", outcome.version);
/// ```
pub struct Api {
    target_dir: PathBuf,
    api_base: String,
    token: Option<String>,
    http: HttpConfig,
    retry_count: u32,
    retry_delay: Duration,
    progress: Option<ProgressFn>,
    verify_archive: bool,
    transport: Option<Arc<dyn Transport>>,
}

impl Api {
    /// Create a new `Api` with sensible defaults.
    ///
    /// Nothing is read from the environment; pass credentials with
    /// [`Api::set_token`].
    pub fn new() -> Self {
        Self {
            target_dir: PathBuf::from("run/plugins"),
            api_base: GITHUB_API_BASE.to_owned(),
            token: None,
            http: HttpConfig::default(),
            retry_count: 0,
            retry_delay: Duration::from_secs(3),
            progress: Some(default_progress_fn()),
            verify_archive: true,
            transport: None,
        }
    }

    /// Set the directory the artifact is installed into (builder).
    pub fn set_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = dir.into();
        self
    }

    /// Set the bearer token; a blank token means anonymous requests (builder).
    pub fn set_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Point at a different API root, e.g. a GitHub Enterprise host (builder).
    pub fn set_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_owned();
        self
    }

    /// Set the overall request timeout (builder).
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    /// Set the connect timeout (builder).
    pub fn set_connect_timeout(mut self, timeout: Duration) -> Self {
        self.http.connect_timeout = timeout;
        self
    }

    /// Set an explicit HTTP/HTTPS proxy URL (builder).
    pub fn set_proxy(mut self, proxy: &str) -> Self {
        self.http.proxy = Some(proxy.to_owned());
        self
    }

    /// Set the number of retries for a transient release lookup failure (builder).
    pub fn set_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    /// Set the delay between retries (builder).
    pub fn set_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Override the progress callback (builder).
    pub fn set_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Disable progress output (builder).
    pub fn no_progress(mut self) -> Self {
        self.progress = None;
        self
    }

    /// Toggle zip verification of `.jar`/`.zip` downloads (builder).
    pub fn set_verify_archive(mut self, verify: bool) -> Self {
        self.verify_archive = verify;
        self
    }

    /// Use a custom transport instead of the reqwest client (builder).
    pub fn set_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Select a GitHub repository (`owner/name`) and return a [`RepoApi`].
    pub fn repo(self, repo: &str) -> Result<RepoApi, FetchError> {
        Ok(RepoApi {
            query: repo.parse()?,
            api: self,
        })
    }

    fn downloader(&self) -> Result<Downloader, FetchError> {
        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(ReqwestTransport::new(&self.http)?),
        };
        Ok(Downloader::with_config(
            transport,
            &self.api_base,
            self.token.clone(),
            self.retry_count,
            self.retry_delay,
            self.progress.clone(),
        ))
    }
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// RepoApi
// ──────────────────────────────────────────────────────────────────────────────

/// Intermediate builder after a repository has been specified.
pub struct RepoApi {
    api: Api,
    query: ReleaseQuery,
}

impl RepoApi {
    /// Target the latest release.
    pub fn latest(self) -> VersionApi {
        VersionApi {
            api: self.api,
            query: self.query,
            selector: ReleaseSelector::Latest,
        }
    }

    /// Target a specific release tag (e.g. `"v3.0.1"`).
    pub fn tag(self, tag: &str) -> VersionApi {
        VersionApi {
            api: self.api,
            query: self.query,
            selector: ReleaseSelector::Tag(tag.to_owned()),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// VersionApi
// ──────────────────────────────────────────────────────────────────────────────

/// Intermediate builder after a release has been chosen.
pub struct VersionApi {
    api: Api,
    query: ReleaseQuery,
    selector: ReleaseSelector,
}

impl VersionApi {
    /// Download the release asset matching `pattern` into the target
    /// directory, deleting older artifacts of the same family first.
    pub fn fetch(self, pattern: &ArtifactPattern) -> Result<FetchOutcome, FetchError> {
        let downloader = self.api.downloader()?;
        let mut install = Install::new(self.api.target_dir.clone(), pattern.clone(), downloader);
        install.verify_archive = self.api.verify_archive;
        install.install(&self.query, &self.selector)
    }
}
