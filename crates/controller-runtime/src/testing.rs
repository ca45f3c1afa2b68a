//! In-memory stand-in for the Docker CLI, for tests that must not touch a real daemon.
//!
//! [`FakeDocker`] interprets the argument vectors produced by [`crate::DockerCli`]
//! against a small mutable model of images, containers and volumes, and records
//! every invocation so tests can assert on exactly what was issued.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde_json::json;

use crate::runner::{CommandOutput, CommandRunner};

pub const FAKE_BINARY_PATH: &str = "/usr/bin/docker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeContainer {
    pub id: String,
    pub image: String,
    pub status: String,
    pub auto_remove: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    missing_binary: bool,
    images: BTreeMap<String, String>,
    containers: BTreeMap<String, FakeContainer>,
    volumes: BTreeSet<String>,
    failures: HashSet<String>,
    run_stdout: Option<String>,
    next_id: u64,
}

impl FakeState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:012x}", 0xc0ffee000000_u64 + self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct FakeDocker {
    state: RefCell<FakeState>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeDocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `which` will not find the binary.
    pub fn without_binary(self) -> Self {
        self.state.borrow_mut().missing_binary = true;
        self
    }

    pub fn with_image(self, repository: &str, tag: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = state.next_id();
            state.images.insert(format!("{repository}:{tag}"), id);
        }
        self
    }

    /// Add a container, e.g. with status `Up 2 hours` or `Exited (0) 3 days ago`.
    pub fn with_container(self, name: &str, status: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = state.next_id();
            state.containers.insert(
                name.to_string(),
                FakeContainer {
                    id,
                    image: "magnetikonline/unifi-network-controller:latest".to_string(),
                    status: status.to_string(),
                    auto_remove: false,
                },
            );
        }
        self
    }

    pub fn with_volume(self, name: &str) -> Self {
        self.state.borrow_mut().volumes.insert(name.to_string());
        self
    }

    /// Make every invocation of `operation` exit non-zero.
    ///
    /// Operations are `images`, `ps`, `pull`, `run`, `stop`, `volume ls`,
    /// `volume create` and `volume rm`.
    pub fn fail_on(self, operation: &str) -> Self {
        self.state
            .borrow_mut()
            .failures
            .insert(operation.to_string());
        self
    }

    /// Replace whatever `run` would print on stdout.
    pub fn with_run_output(self, stdout: &str) -> Self {
        self.state.borrow_mut().run_stdout = Some(stdout.to_string());
        self
    }

    /// Every invocation, program first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Docker CLI invocations without the binary path.
    pub fn docker_calls(&self) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call[0] == FAKE_BINARY_PATH)
            .map(|call| call[1..].to_vec())
            .collect()
    }

    /// Invocations of a single operation, e.g. `volume create`.
    pub fn calls_for(&self, operation: &str) -> Vec<Vec<String>> {
        self.docker_calls()
            .into_iter()
            .filter(|args| operation_of(args) == operation)
            .collect()
    }

    pub fn has_image(&self, reference: &str) -> bool {
        self.state.borrow().images.contains_key(reference)
    }

    pub fn has_volume(&self, name: &str) -> bool {
        self.state.borrow().volumes.contains(name)
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state.borrow().containers.get(name).cloned()
    }

    fn handle(&self, args: &[String]) -> CommandOutput {
        let operation = operation_of(args);
        let mut state = self.state.borrow_mut();
        if state.failures.contains(operation) {
            return CommandOutput::failed(1, &format!("Error response from daemon: {operation} failed"));
        }

        match operation {
            "images" => json_lines(state.images.iter().map(|(key, id)| {
                let (repository, tag) = key.rsplit_once(':').unwrap_or((key.as_str(), "latest"));
                json!({"ID": id, "Repository": repository, "Tag": tag, "Size": "7.38MB"})
            })),
            "ps" => json_lines(state.containers.iter().map(|(name, c)| {
                json!({"ID": c.id, "Image": c.image, "Names": name, "Status": c.status})
            })),
            "volume ls" => json_lines(state.volumes.iter().map(|name| {
                json!({"Driver": "local", "Mountpoint": format!("/var/lib/docker/volumes/{name}/_data"), "Name": name})
            })),
            "volume create" => {
                let name = args[2].clone();
                state.volumes.insert(name.clone());
                CommandOutput::ok(&name)
            }
            "volume rm" => {
                if state.volumes.remove(&args[2]) {
                    CommandOutput::ok(&args[2])
                } else {
                    CommandOutput::failed(1, "Error response from daemon: get: no such volume")
                }
            }
            "pull" => {
                let reference = args[args.len() - 1].clone();
                let id = state.next_id();
                state.images.insert(reference.clone(), id);
                CommandOutput::ok(&format!("docker.io/{reference}"))
            }
            "run" => run(&mut state, args),
            "stop" => {
                let name = &args[1];
                let auto_remove = match state.containers.get_mut(name) {
                    Some(container) if container.status.starts_with("Up ") => {
                        container.status = "Exited (0) Less than a second ago".to_string();
                        container.auto_remove
                    }
                    Some(_) => return CommandOutput::ok(name),
                    None => {
                        return CommandOutput::failed(
                            1,
                            &format!("Error response from daemon: No such container: {name}"),
                        )
                    }
                };
                if auto_remove {
                    state.containers.remove(name);
                }
                CommandOutput::ok(name)
            }
            _ => CommandOutput::failed(125, "unknown command"),
        }
    }
}

fn run(state: &mut FakeState, args: &[String]) -> CommandOutput {
    let flag_value = |flag: &str| {
        args.windows(2)
            .find(|pair| pair[0] == flag)
            .map(|pair| pair[1].clone())
    };
    let has_flag = |flag: &str| args.iter().any(|a| a == flag);

    let name = flag_value("--name");
    if let Some(name) = &name {
        if state.containers.contains_key(name) {
            return CommandOutput::failed(
                125,
                &format!("docker: Error response from daemon: Conflict. The container name \"/{name}\" is already in use."),
            );
        }
    }

    let id = state.next_id();
    let detach = has_flag("--detach");
    if detach {
        // Image reference is the first argument after the last flag value
        let image = args
            .iter()
            .skip(1)
            .find(|a| a.contains(':') && !a.starts_with("type=") && !a.ends_with("/tcp"))
            .cloned()
            .unwrap_or_default();
        state.containers.insert(
            name.unwrap_or_else(|| format!("fake_{id}")),
            FakeContainer {
                id: id.clone(),
                image,
                status: "Up Less than a second".to_string(),
                auto_remove: has_flag("--rm"),
            },
        );
    }

    match &state.run_stdout {
        Some(stdout) => CommandOutput::ok(stdout),
        None if detach => CommandOutput::ok(&format!("{id}\n")),
        None => CommandOutput::ok(""),
    }
}

fn json_lines(values: impl Iterator<Item = serde_json::Value>) -> CommandOutput {
    let body: Vec<String> = values.map(|v| v.to_string()).collect();
    CommandOutput::ok(&body.join("\n"))
}

/// Name of the Docker operation an argument vector performs.
pub fn operation_of(args: &[String]) -> &'static str {
    match (
        args.first().map(String::as_str),
        args.get(1).map(String::as_str),
    ) {
        (Some("images"), _) => "images",
        (Some("ps"), _) => "ps",
        (Some("pull"), _) => "pull",
        (Some("run"), _) => "run",
        (Some("stop"), _) => "stop",
        (Some("volume"), Some("ls")) => "volume ls",
        (Some("volume"), Some("create")) => "volume create",
        (Some("volume"), Some("rm")) => "volume rm",
        _ => "unknown",
    }
}

impl CommandRunner for FakeDocker {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().cloned());
        self.calls.borrow_mut().push(call);

        if program == "which" {
            if self.state.borrow().missing_binary {
                return Ok(CommandOutput::failed(1, ""));
            }
            return Ok(CommandOutput::ok(&format!("{FAKE_BINARY_PATH}\n")));
        }

        if program != FAKE_BINARY_PATH {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{program}: not found"),
            ));
        }

        Ok(self.handle(args))
    }
}
