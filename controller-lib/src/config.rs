use controller_common::ImageRef;
use controller_runtime::DOCKER_BINARY;

pub const CONTROLLER_REPOSITORY_NAME: &str = "magnetikonline/unifi-network-controller";
pub const CONTROLLER_PORT_COMMS: u16 = 8080;
pub const CONTROLLER_PORT_GUI: u16 = 8443;
pub const CONTROLLER_BASE_DIR: &str = "/usr/lib/unifi";

pub const BACKUP_REPOSITORY_NAME: &str = "alpine";
pub const BACKUP_RESTORE_BACKUP_PATH: &str = "/backup";
pub const BACKUP_RESTORE_VOLUME_MOUNT_PATH: &str = "/data";

/// Fixed settings used by the lifecycle actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Controller image repository; the tag comes from the version file.
    pub controller_repository: String,
    pub port_comms: u16,
    pub port_gui: u16,
    /// Directory inside the controller image holding `data` and `logs`.
    pub controller_base_dir: String,
    /// Throwaway image used to run tar for backup and restore.
    pub backup_image: ImageRef,
    pub backup_path: String,
    pub volume_mount_path: String,
    pub docker_binary: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_repository: CONTROLLER_REPOSITORY_NAME.to_string(),
            port_comms: CONTROLLER_PORT_COMMS,
            port_gui: CONTROLLER_PORT_GUI,
            controller_base_dir: CONTROLLER_BASE_DIR.to_string(),
            backup_image: ImageRef::latest(BACKUP_REPOSITORY_NAME),
            backup_path: BACKUP_RESTORE_BACKUP_PATH.to_string(),
            volume_mount_path: BACKUP_RESTORE_VOLUME_MOUNT_PATH.to_string(),
            docker_binary: DOCKER_BINARY.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Defaults, overridden by `UNIFI_CONTROLLER_IMAGE`, `UNIFI_BACKUP_IMAGE`
    /// (`repository` or `repository:tag`) and `UNIFI_DOCKER_BIN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(repository) = lookup("UNIFI_CONTROLLER_IMAGE") {
            config.controller_repository = repository;
        }
        if let Some(image) = lookup("UNIFI_BACKUP_IMAGE") {
            config.backup_image = parse_image(&image);
        }
        if let Some(binary) = lookup("UNIFI_DOCKER_BIN") {
            config.docker_binary = binary;
        }
        config
    }

    pub fn controller_image(&self, tag: &str) -> ImageRef {
        ImageRef::new(self.controller_repository.clone(), tag)
    }

    pub fn controller_data_dir(&self) -> String {
        format!("{}/data", self.controller_base_dir)
    }

    pub fn controller_logs_dir(&self) -> String {
        format!("{}/logs", self.controller_base_dir)
    }
}

// A colon after the last slash separates the tag; registry ports come before it.
fn parse_image(image: &str) -> ImageRef {
    let name_start = image.rfind('/').map_or(0, |i| i + 1);
    match image[name_start..].rfind(':') {
        Some(i) => ImageRef::new(&image[..name_start + i], &image[name_start + i + 1..]),
        None => ImageRef::latest(image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.backup_image.to_string(), "alpine:latest");
        assert_eq!(config.controller_data_dir(), "/usr/lib/unifi/data");
        assert_eq!(config.controller_logs_dir(), "/usr/lib/unifi/logs");
        assert_eq!(
            config.controller_image("8.0.24").to_string(),
            "magnetikonline/unifi-network-controller:8.0.24"
        );
        assert_eq!(config.docker_binary, "docker");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("UNIFI_CONTROLLER_IMAGE", "registry.local:5000/unifi"),
            ("UNIFI_BACKUP_IMAGE", "registry.local:5000/busybox:1.36"),
            ("UNIFI_DOCKER_BIN", "  "),
        ]);
        let config = ControllerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.controller_repository, "registry.local:5000/unifi");
        assert_eq!(config.backup_image, ImageRef::new("registry.local:5000/busybox", "1.36"));
        // Blank values are ignored
        assert_eq!(config.docker_binary, "docker");
    }

    #[test]
    fn test_parse_image_without_tag() {
        assert_eq!(parse_image("busybox"), ImageRef::latest("busybox"));
        assert_eq!(
            parse_image("registry.local:5000/busybox"),
            ImageRef::latest("registry.local:5000/busybox")
        );
    }
}
