//! # relfetch
//!
//! Fetches the latest versioned runtime artifact (`<prefix>-<version>.<ext>`)
//! from a repository's GitHub releases into a local directory, replacing any
//! older copy, with a chainable, builder-style API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relfetch::{Api, ArtifactPattern};
//!
//! fn main() -> Result<(), relfetch::FetchError> {
//!     let outcome = Api::new()
//!         .set_target_dir("run/plugins")
//!         .set_token(std::env::var("GITHUB_TOKEN").ok())
//!         .repo("haroldDOTsh/fulcrum")?
//!         .latest()
//!         .fetch(&ArtifactPattern::new("runtime", "jar")?)?;
//!     println!("installed runtime {}", outcome.version);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod pattern;
pub mod progress;
pub mod release;

pub use api::Api;
pub use downloader::Downloader;
pub use error::FetchError;
pub use install::{clear_stale_artifacts, verify_archive, FetchOutcome, Install};
pub use pattern::{extract_version, select_runtime_asset, ArtifactPattern};
pub use release::{ReleaseAsset, ReleaseQuery, ReleaseResponse, ReleaseSelector};
