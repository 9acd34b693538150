use std::fs::{self, File};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::downloader::{Downloader, PARTIAL_SUFFIX};
use crate::error::FetchError;
use crate::pattern::{extract_version, select_runtime_asset, ArtifactPattern};
use crate::release::{ReleaseQuery, ReleaseSelector};

/// What a completed fetch resolved and wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Version token taken from the asset name.
    pub version: String,
    /// Release tag, when the API reported one.
    pub tag_name: Option<String>,
    pub asset_name: String,
    /// Where the asset was downloaded from.
    pub source_url: String,
    /// Where it now lives.
    pub path: PathBuf,
    pub bytes: u64,
}

/// Installs the newest matching artifact into a directory, replacing older copies.
pub struct Install {
    /// Directory the artifact is written to. Created if absent.
    pub target_dir: PathBuf,
    pub pattern: ArtifactPattern,
    /// Open `.jar`/`.zip` downloads as archives before reporting success.
    pub verify_archive: bool,
    /// Downloader used for HTTP operations.
    pub downloader: Downloader,
}

impl Install {
    pub fn new(target_dir: impl Into<PathBuf>, pattern: ArtifactPattern, downloader: Downloader) -> Self {
        Self {
            target_dir: target_dir.into(),
            pattern,
            verify_archive: true,
            downloader,
        }
    }

    /// Resolve the release, pick the artifact, clear stale copies and download it.
    pub fn install(
        &self,
        query: &ReleaseQuery,
        selector: &ReleaseSelector,
    ) -> Result<FetchOutcome, FetchError> {
        fs::create_dir_all(&self.target_dir).map_err(|e| FetchError::io(&self.target_dir, e))?;

        let release = self.downloader.release(query, selector)?;
        let asset = select_runtime_asset(&release.assets, self.pattern.name_regex())
            .map_err(|_| {
                FetchError::NotFound(format!(
                    "unable to find a {} asset in the {} release of {query}",
                    self.pattern,
                    describe(selector)
                ))
            })?;
        let version = extract_version(&asset.name, self.pattern.version_regex())?;

        if !is_plain_file_name(&asset.name) {
            return Err(FetchError::MalformedResponse {
                url: query.endpoint(&self.downloader.api_base, selector)?,
                reason: format!("asset name '{}' is not a plain file name", asset.name),
            });
        }

        let removed = clear_stale_artifacts(&self.target_dir, self.pattern.name_regex())?;
        debug!(removed = removed.len(), dir = %self.target_dir.display(), "cleared stale artifacts");

        let path = self.target_dir.join(&asset.name);
        let bytes = self
            .downloader
            .download_asset(&asset.browser_download_url, &path)?;

        if self.verify_archive && is_archive(&path) {
            let entries = verify_archive(&path)?;
            debug!(entries, path = %path.display(), "archive verified");
        }

        info!(
            "Downloaded {} ({} {}) from {}",
            asset.name, query.name, version, asset.browser_download_url
        );

        Ok(FetchOutcome {
            version,
            tag_name: release.tag_name.clone(),
            asset_name: asset.name.clone(),
            source_url: asset.browser_download_url.clone(),
            path,
            bytes,
        })
    }
}

fn describe(selector: &ReleaseSelector) -> String {
    match selector {
        ReleaseSelector::Latest => "latest".to_owned(),
        ReleaseSelector::Tag(tag) => format!("'{tag}'"),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
}

/// Delete every entry in `dir` whose name matches `name_pattern`, along with
/// `<name>.part` leftovers of interrupted downloads.
///
/// Directories are left alone; symlinks are removed, not followed. Names are
/// matched lossily so non-UTF-8 names are still considered. An entry that
/// cannot be deleted is logged and skipped. A missing directory has nothing
/// to clear. Returns the paths that were removed.
pub fn clear_stale_artifacts(dir: &Path, name_pattern: &Regex) -> Result<Vec<PathBuf>, FetchError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(FetchError::io(dir, e)),
    };

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FetchError::io(dir, e))?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        let artifact = name.strip_suffix(PARTIAL_SUFFIX).unwrap_or(&*name);
        if !name_pattern.is_match(artifact) {
            continue;
        }
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            debug!(file = %name, "skipping directory matching the artifact pattern");
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) => warn!(file = %name, error = %e, "failed to delete stale artifact"),
        }
    }
    Ok(removed)
}

/// Open `path` as a zip archive (jars are zips) and return its entry count.
///
/// A file that fails to open as an archive is deleted.
pub fn verify_archive(path: &Path) -> Result<usize, FetchError> {
    let file = File::open(path).map_err(|e| FetchError::io(path, e))?;
    match zip::ZipArchive::new(file) {
        Ok(archive) => Ok(archive.len()),
        Err(e) => {
            if let Err(rm) = fs::remove_file(path) {
                warn!(file = %path.display(), error = %rm, "failed to delete corrupt artifact");
            }
            Err(FetchError::CorruptArtifact {
                path: path.to_owned(),
                reason: e.to_string(),
            })
        }
    }
}
