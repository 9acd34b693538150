use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use crate::error::FetchError;

/// Default GitHub REST API root.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// The upstream repository whose releases are polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseQuery {
    pub owner: String,
    pub name: String,
}

impl ReleaseQuery {
    pub fn new(owner: &str, name: &str) -> Result<Self, FetchError> {
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || owner.contains('/') || name.contains('/') {
            return Err(FetchError::InvalidRepository(format!("{owner}/{name}")));
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }

    /// Releases endpoint for this repository under `api_base`.
    ///
    /// Every component is pushed as its own path segment, so a tag such as
    /// `release/1.0` is sent as `release%2F1.0`.
    pub fn endpoint(&self, api_base: &str, selector: &ReleaseSelector) -> Result<String, FetchError> {
        let invalid = |reason: String| FetchError::InvalidUrl {
            url: api_base.to_owned(),
            reason,
        };
        let mut url = Url::parse(api_base).map_err(|e| invalid(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| invalid("cannot be a base URL".to_owned()))?;
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.name.as_str(), "releases"]);
            match selector {
                ReleaseSelector::Latest => {
                    segments.push("latest");
                }
                ReleaseSelector::Tag(tag) => {
                    segments.extend(["tags", tag.as_str()]);
                }
            }
        }
        Ok(url.into())
    }
}

impl FromStr for ReleaseQuery {
    type Err = FetchError;

    /// Parses `owner/name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) => {
                ReleaseQuery::new(owner, name).map_err(|_| FetchError::InvalidRepository(s.to_owned()))
            }
            None => Err(FetchError::InvalidRepository(s.to_owned())),
        }
    }
}

impl fmt::Display for ReleaseQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Which release of the repository to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReleaseSelector {
    #[default]
    Latest,
    /// A specific release tag, e.g. `"v3.0.1"`.
    Tag(String),
}

/// A release's asset. Does not contain all fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// A GitHub release. Does not contain all fields.
///
/// See the GitHub [docs](https://docs.github.com/en/rest/releases/releases?apiVersion=2022-11-28#get-the-latest-release)
/// for the full payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseResponse {
    #[serde(default)]
    pub tag_name: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseResponse {
    /// Decodes a release payload, naming `url` in the error.
    pub fn parse(url: &str, body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }
}
