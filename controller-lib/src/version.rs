//! Controller image tag, read from the packaged `version` file.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

pub const VERSION_FILE: &str = "version";

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("unable to open version file at [{}]", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to determine image version from [{}]", .0.display())]
    NotFound(PathBuf),
}

/// `version` next to the running executable.
pub fn default_version_file() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map_or_else(|| PathBuf::from(VERSION_FILE), |dir| dir.join(VERSION_FILE)))
}

/// Read the image tag from the last `UNIFI_VERSION="..."` line of `path`.
pub fn load_image_tag(path: &Path) -> Result<String, VersionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| VersionError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_image_tag(&contents).ok_or_else(|| VersionError::NotFound(path.to_path_buf()))
}

pub fn parse_image_tag(contents: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r#"^UNIFI_VERSION="([^"]+)""#).expect("version pattern is valid")
    });

    contents
        .lines()
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| caps.get(1))
        .last()
        .map(|tag| tag.as_str().to_string())
}
