//! Structured description of a `docker run` invocation.

use std::fmt::Display;

use controller_common::ImageRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: String,
    pub target: String,
}

impl Mount {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// TCP port published from the host into the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl Display for PortMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}/tcp", self.host, self.container)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: ImageRef,
    pub detach: bool,
    pub binds: Vec<Mount>,
    pub volumes: Vec<Mount>,
    pub name: Option<String>,
    pub network_host: bool,
    /// Ignored when `network_host` is set; the runtime rejects both together.
    pub publish: Vec<PortMapping>,
    pub remove_on_exit: bool,
    pub command: Vec<String>,
}

impl RunSpec {
    pub fn new(image: ImageRef) -> Self {
        Self {
            image,
            detach: false,
            binds: Vec::new(),
            volumes: Vec::new(),
            name: None,
            network_host: false,
            publish: Vec::new(),
            remove_on_exit: false,
            command: Vec::new(),
        }
    }

    pub fn detach(mut self) -> Self {
        self.detach = true;
        self
    }

    pub fn bind(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.binds.push(Mount::new(source, target));
        self
    }

    pub fn volume(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.volumes.push(Mount::new(source, target));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn network_host(mut self, enabled: bool) -> Self {
        self.network_host = enabled;
        self
    }

    pub fn publish(mut self, host: u16, container: u16) -> Self {
        self.publish.push(PortMapping { host, container });
        self
    }

    pub fn remove_on_exit(mut self) -> Self {
        self.remove_on_exit = true;
        self
    }

    pub fn command<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments following the binary, starting with `run`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string()];

        if self.detach {
            args.push("--detach".to_string());
        }

        for bind in &self.binds {
            args.push("--mount".to_string());
            args.push(format!("type=bind,src={},dst={}", bind.source, bind.target));
        }

        for volume in &self.volumes {
            args.push("--mount".to_string());
            args.push(format!(
                "type=volume,src={},dst={}",
                volume.source, volume.target
            ));
        }

        if let Some(name) = &self.name {
            args.push("--name".to_string());
            args.push(name.clone());
        }

        if self.network_host {
            args.push("--network".to_string());
            args.push("host".to_string());
        } else {
            for port in &self.publish {
                args.push("--publish".to_string());
                args.push(port.to_string());
            }
        }

        if self.remove_on_exit {
            args.push("--rm".to_string());
        }

        args.push(self.image.to_string());
        args.extend(self.command.iter().cloned());
        args
    }
}

/// Result of `docker run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The CLI printed exactly one line, taken to be the container id.
    Id(String),
    /// Anything else. Not a failure.
    NoIdCaptured,
}

impl RunOutcome {
    pub fn from_stdout(stdout: &[String]) -> Self {
        match stdout {
            [id] => RunOutcome::Id(id.clone()),
            _ => RunOutcome::NoIdCaptured,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            RunOutcome::Id(id) => Some(id),
            RunOutcome::NoIdCaptured => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_spec(network_host: bool) -> RunSpec {
        RunSpec::new(ImageRef::new("magnetikonline/unifi-network-controller", "8.0.24"))
            .detach()
            .name("p-server")
            .network_host(network_host)
            .publish(8080, 8080)
            .publish(8443, 8443)
            .remove_on_exit()
            .volume("p-data", "/usr/lib/unifi/data")
            .volume("p-logs", "/usr/lib/unifi/logs")
    }

    #[test]
    fn test_args_host_network() {
        assert_eq!(
            controller_spec(true).to_args(),
            vec![
                "run",
                "--detach",
                "--mount",
                "type=volume,src=p-data,dst=/usr/lib/unifi/data",
                "--mount",
                "type=volume,src=p-logs,dst=/usr/lib/unifi/logs",
                "--name",
                "p-server",
                "--network",
                "host",
                "--rm",
                "magnetikonline/unifi-network-controller:8.0.24",
            ]
        );
    }

    #[test]
    fn test_args_published_ports() {
        let args = controller_spec(false).to_args();
        assert!(!args.contains(&"--network".to_string()));
        let published: Vec<_> = args
            .windows(2)
            .filter(|pair| pair[0] == "--publish")
            .map(|pair| pair[1].as_str())
            .collect();
        assert_eq!(published, vec!["8080:8080/tcp", "8443:8443/tcp"]);
    }

    #[test]
    fn test_args_binds_before_volumes_and_trailing_command() {
        let args = RunSpec::new(ImageRef::latest("alpine"))
            .volume("p-data", "/data")
            .bind("/tmp/out", "/backup")
            .remove_on_exit()
            .command(["/bin/sh", "-c", "echo hi"])
            .to_args();
        assert_eq!(
            args,
            vec![
                "run",
                "--mount",
                "type=bind,src=/tmp/out,dst=/backup",
                "--mount",
                "type=volume,src=p-data,dst=/data",
                "--rm",
                "alpine:latest",
                "/bin/sh",
                "-c",
                "echo hi",
            ]
        );
    }

    #[test]
    fn test_run_outcome() {
        assert_eq!(
            RunOutcome::from_stdout(&["abc123".to_string()]),
            RunOutcome::Id("abc123".to_string())
        );
        assert_eq!(RunOutcome::from_stdout(&[]), RunOutcome::NoIdCaptured);
        assert_eq!(
            RunOutcome::from_stdout(&["Unable to find image".to_string(), "abc".to_string()]),
            RunOutcome::NoIdCaptured
        );
        assert_eq!(RunOutcome::NoIdCaptured.id(), None);
    }
}
