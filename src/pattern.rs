use std::fmt;

use regex::Regex;

use crate::error::FetchError;
use crate::release::ReleaseAsset;

/// Naming scheme of a versioned artifact, `<prefix>-<version>.<ext>`.
///
/// Holds two regexes: one to recognise artifact names (used for asset
/// selection and for stale-file cleanup) and one whose first capture group
/// is the version.
#[derive(Debug, Clone)]
pub struct ArtifactPattern {
    label: String,
    name: Regex,
    version: Regex,
}

impl ArtifactPattern {
    /// Pattern for `<prefix>-<version>.<extension>`, e.g. `runtime-3.0.1.jar`.
    pub fn new(prefix: &str, extension: &str) -> Result<Self, FetchError> {
        let extension = extension.trim_start_matches('.');
        if prefix.is_empty() || extension.is_empty() {
            return Err(FetchError::InvalidPattern(
                "prefix and extension must not be empty".to_owned(),
            ));
        }

        let prefix_re = regex::escape(prefix);
        let ext_re = regex::escape(extension);
        Ok(Self {
            label: format!("{prefix}-*.{extension}"),
            name: compile(&format!(r"^{prefix_re}-.*\.{ext_re}$"))?,
            version: compile(&format!(r"^{prefix_re}-(.+)\.{ext_re}$"))?,
        })
    }

    /// Pattern from explicit regexes. `version` must capture the version in
    /// its first group.
    pub fn from_regex(name: &str, version: &str) -> Result<Self, FetchError> {
        let name_re = compile(name)?;
        let version_re = compile(version)?;
        // captures_len counts the implicit whole-match group
        if version_re.captures_len() < 2 {
            return Err(FetchError::InvalidPattern(format!(
                "version pattern '{version}' has no capture group"
            )));
        }
        Ok(Self {
            label: name.to_owned(),
            name: name_re,
            version: version_re,
        })
    }

    pub fn name_regex(&self) -> &Regex {
        &self.name
    }

    pub fn version_regex(&self) -> &Regex {
        &self.version
    }

    /// Whether a file or asset name belongs to this artifact family.
    pub fn matches(&self, file_name: &str) -> bool {
        self.name.is_match(file_name)
    }
}

impl fmt::Display for ArtifactPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn compile(pattern: &str) -> Result<Regex, FetchError> {
    Regex::new(pattern).map_err(|e| FetchError::InvalidPattern(e.to_string()))
}

/// First asset, in API order, whose name matches `name_pattern`.
pub fn select_runtime_asset<'a>(
    assets: &'a [ReleaseAsset],
    name_pattern: &Regex,
) -> Result<&'a ReleaseAsset, FetchError> {
    assets
        .iter()
        .find(|asset| name_pattern.is_match(&asset.name))
        .ok_or_else(|| {
            FetchError::NotFound(format!(
                "unable to find an asset matching '{name_pattern}' among {} release assets",
                assets.len()
            ))
        })
}

/// Version token captured by the first group of `version_pattern`.
pub fn extract_version(asset_name: &str, version_pattern: &Regex) -> Result<String, FetchError> {
    version_pattern
        .captures(asset_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            FetchError::NotFound(format!(
                "unable to extract a version from asset name '{asset_name}'"
            ))
        })
}
