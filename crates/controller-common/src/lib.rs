// Types shared between the runtime client, the lifecycle actions and the CLI.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Pattern every resource-name prefix has to match.
pub const SERVER_PREFIX_PATTERN: &str = r"^[a-zA-Z0-9][a-zA-Z0-9_-]+[a-zA-Z0-9]$";

/// Prefix used when the caller does not pick one.
pub const SERVER_PREFIX_DEFAULT: &str = "unifi-network-controller";

pub const DEFAULT_IMAGE_TAG: &str = "latest";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    #[error("invalid --server-prefix of [{}], expecting {}", .0, SERVER_PREFIX_PATTERN)]
    Invalid(String),
}

fn prefix_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(SERVER_PREFIX_PATTERN).expect("prefix pattern is valid"))
}

// --- Resource Naming ---

pub fn server_container_name(prefix: &str) -> String {
    format!("{prefix}-server")
}

pub fn data_volume_name(prefix: &str) -> String {
    format!("{prefix}-data")
}

pub fn logs_volume_name(prefix: &str) -> String {
    format!("{prefix}-logs")
}

/// A validated resource-name prefix. Container and volume names are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerPrefix(String);

impl ServerPrefix {
    pub fn new(prefix: impl Into<String>) -> Result<Self, PrefixError> {
        let prefix = prefix.into();
        if !prefix_regex().is_match(&prefix) {
            return Err(PrefixError::Invalid(prefix));
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn server_container_name(&self) -> String {
        server_container_name(&self.0)
    }

    pub fn data_volume_name(&self) -> String {
        data_volume_name(&self.0)
    }

    pub fn logs_volume_name(&self) -> String {
        logs_volume_name(&self.0)
    }
}

impl FromStr for ServerPrefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for ServerPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `repository:tag` reference to an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Reference with the `latest` tag.
    pub fn latest(repository: impl Into<String>) -> Self {
        Self::new(repository, DEFAULT_IMAGE_TAG)
    }
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}
