use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::http::{HttpRequest, Transport};
use crate::release::{ReleaseAsset, ReleaseQuery, ReleaseResponse, ReleaseSelector};

/// Callback type for reporting download progress.
/// Arguments: source URL, bytes downloaded, total bytes, MiB/s, is_complete
pub type ProgressFn = Arc<dyn Fn(&str, u64, u64, f64, bool) + Send + Sync>;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const CHUNK_SIZE: usize = 64 * 1024;

/// Suffix of an in-flight download, renamed away once complete.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Queries release metadata and downloads release assets.
pub struct Downloader {
    transport: Arc<dyn Transport>,
    /// API root, `https://api.github.com` unless overridden.
    pub api_base: String,
    /// Bearer token sent with every request when present.
    pub token: Option<String>,
    /// Extra attempts for a failed release lookup (transient errors only).
    pub retry_count: u32,
    /// Delay between retries.
    pub retry_delay: Duration,
    /// Optional progress callback.
    pub progress: Option<ProgressFn>,
}

impl Downloader {
    /// Create a downloader with explicit configuration.
    pub fn with_config(
        transport: Arc<dyn Transport>,
        api_base: &str,
        token: Option<String>,
        retry_count: u32,
        retry_delay: Duration,
        progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.to_owned(),
            token: token.filter(|t| !t.trim().is_empty()),
            retry_count,
            retry_delay,
            progress,
        }
    }

    fn request(&self, url: &str) -> HttpRequest {
        let request = HttpRequest::get(url);
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token.trim())),
            None => request,
        }
    }

    /// List the assets of the latest release, in API order.
    pub fn list_latest_release_assets(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Vec<ReleaseAsset>, FetchError> {
        Ok(self.release(query, &ReleaseSelector::Latest)?.assets)
    }

    /// Fetch the release metadata for `selector`, retrying transient failures.
    pub fn release(
        &self,
        query: &ReleaseQuery,
        selector: &ReleaseSelector,
    ) -> Result<ReleaseResponse, FetchError> {
        let url = query.endpoint(&self.api_base, selector)?;
        let mut attempt = 0;
        loop {
            match self.get_release(&url) {
                Ok(release) => return Ok(release),
                Err(err) if attempt < self.retry_count && err.is_retryable() => {
                    attempt += 1;
                    warn!(%url, attempt, error = %err, "release lookup failed, retrying");
                    thread::sleep(self.retry_delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn get_release(&self, url: &str) -> Result<ReleaseResponse, FetchError> {
        debug!(%url, "querying release");
        let request = self
            .request(url)
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        let resp = self.transport.get(&request)?;

        let status = resp.status;
        let success = resp.is_success();
        let body = resp.text(url)?;
        if !success {
            return Err(FetchError::Upstream {
                url: url.to_owned(),
                status,
                body,
            });
        }

        ReleaseResponse::parse(url, &body)
    }

    /// Stream `url` into `target`, overwriting any existing file.
    ///
    /// The body is written to `<target>.part` first and renamed on success.
    /// Returns the number of bytes written.
    pub fn download_asset(&self, url: &str, target: &Path) -> Result<u64, FetchError> {
        debug!(%url, target = %target.display(), "downloading asset");
        let resp = self.transport.get(&self.request(url))?;
        if !resp.is_success() {
            let status = resp.status;
            let body = resp.text(url).unwrap_or_else(|err| {
                debug!(%url, error = %err, "failed to read error response body");
                String::new()
            });
            return Err(FetchError::Upstream {
                url: url.to_owned(),
                status,
                body,
            });
        }

        let partial = partial_path(target);
        let total = resp.content_length.unwrap_or(0);
        let written = match self.write_body(url, resp.body, &partial, total) {
            Ok(written) => written,
            Err(err) => {
                let _ = fs::remove_file(&partial);
                return Err(err);
            }
        };

        if let Err(e) = fs::rename(&partial, target) {
            let _ = fs::remove_file(&partial);
            return Err(FetchError::io(target, e));
        }
        Ok(written)
    }

    fn write_body(
        &self,
        url: &str,
        mut body: Box<dyn Read + Send>,
        dest: &Path,
        total: u64,
    ) -> Result<u64, FetchError> {
        let mut file = File::create(dest).map_err(|e| FetchError::io(dest, e))?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut downloaded: u64 = 0;
        let start = Instant::now();

        loop {
            let n = body.read(&mut buf).map_err(|e| FetchError::Transport {
                url: url.to_owned(),
                source: Box::new(e),
            })?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).map_err(|e| FetchError::io(dest, e))?;
            downloaded += n as u64;

            if let Some(progress) = &self.progress {
                progress(url, downloaded, total, mib_per_sec(downloaded, start), false);
            }
        }
        file.flush().map_err(|e| FetchError::io(dest, e))?;

        if let Some(progress) = &self.progress {
            progress(url, downloaded, total, mib_per_sec(downloaded, start), true);
        }
        Ok(downloaded)
    }
}

fn mib_per_sec(downloaded: u64, start: Instant) -> f64 {
    let elapsed = start.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        (downloaded as f64) / (1024.0 * 1024.0) / elapsed
    } else {
        0.0
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(PARTIAL_SUFFIX);
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_path_appends_suffix() {
        let target = Path::new("run/plugins/runtime-3.0.1.jar");
        assert_eq!(
            partial_path(target),
            PathBuf::from("run/plugins/runtime-3.0.1.jar.part")
        );
    }

    #[test]
    fn retry_only_transient_failures() {
        let upstream = |status| FetchError::Upstream {
            url: "https://api.test".to_owned(),
            status,
            body: String::new(),
        };
        assert!(upstream(429).is_retryable());
        assert!(upstream(503).is_retryable());
        assert!(!upstream(403).is_retryable());
        assert!(!upstream(404).is_retryable());
        assert!(!FetchError::NotFound("x".to_owned()).is_retryable());
    }
}
