//! Keeping the yt-dlp executable current

pub mod checker;
pub mod release;
pub mod version;

pub use checker::{ReleaseChecker, UpdateCheck, UpdateState};
pub use release::{GithubReleases, Release, ReleaseAsset, ReleaseSource};
pub use version::{VersionRecord, VersionStore};
