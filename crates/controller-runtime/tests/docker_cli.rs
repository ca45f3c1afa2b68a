//! Docker CLI client tests against the in-memory fake runtime.

use controller_runtime::common::ImageRef;
use controller_runtime::testing::{FakeDocker, FAKE_BINARY_PATH};
use controller_runtime::{
    CommandOutput, CommandRunner, DockerCli, RunOutcome, RunSpec, RuntimeError,
};
use std::cell::Cell;

#[test]
fn test_locate_caches_binary_path() {
    let fake = FakeDocker::new();
    let client = DockerCli::with_runner(&fake);

    assert!(client.locate());
    assert!(client.locate());
    client.list_volumes().unwrap();
    client.list_volumes().unwrap();

    let which_calls: Vec<_> = fake
        .calls()
        .into_iter()
        .filter(|call| call[0] == "which")
        .collect();
    assert_eq!(which_calls, vec![vec!["which".to_string(), "docker".to_string()]]);
    assert_eq!(client.binary().unwrap(), FAKE_BINARY_PATH);
}

#[test]
fn test_missing_binary() {
    let fake = FakeDocker::new().without_binary();
    let client = DockerCli::with_runner(&fake);

    assert!(!client.locate());
    assert!(matches!(client.list_images(), Err(RuntimeError::NotFound)));
    assert!(matches!(
        client.stop_container("x-server"),
        Err(RuntimeError::NotFound)
    ));
    assert!(fake.docker_calls().is_empty());
}

#[test]
fn test_listing_argument_vectors() {
    let fake = FakeDocker::new();
    let client = DockerCli::with_runner(&fake);

    client.list_images().unwrap();
    client.list_containers().unwrap();
    client.list_volumes().unwrap();

    assert_eq!(
        fake.docker_calls(),
        vec![
            vec!["images", "--format={{json .}}"],
            vec!["ps", "--all", "--format={{json .}}"],
            vec!["volume", "ls", "--format={{json .}}"],
        ]
    );
}

#[test]
fn test_listings_reflect_live_state() {
    let fake = FakeDocker::new()
        .with_image("alpine", "latest")
        .with_container("p-server", "Up 2 hours")
        .with_container("old", "Exited (2) 3 days ago")
        .with_volume("p-data");
    let client = DockerCli::with_runner(&fake);

    let images = client.list_images().unwrap().names().unwrap();
    assert_eq!(images, vec!["alpine:latest"]);

    let server = client
        .list_containers()
        .unwrap()
        .get("p-server")
        .unwrap()
        .unwrap();
    assert!(server.running);
    let old = client.list_containers().unwrap().get("old").unwrap().unwrap();
    assert!(!old.running);
    assert_eq!(old.exit_code, Some(2));

    assert!(client.list_volumes().unwrap().contains("p-data").unwrap());
    client.create_volume("p-logs").unwrap();
    // A fresh listing sees the new volume
    assert_eq!(
        client.list_volumes().unwrap().names().unwrap(),
        vec!["p-data", "p-logs"]
    );
}

#[test]
fn test_mutating_commands() {
    let fake = FakeDocker::new()
        .with_volume("p-data")
        .with_container("p-server", "Up 1 minute");
    let client = DockerCli::with_runner(&fake);

    client.pull_image(&ImageRef::latest("alpine")).unwrap();
    client.delete_volume("p-data").unwrap();
    client.stop_container("p-server").unwrap();

    assert_eq!(
        fake.docker_calls(),
        vec![
            vec!["pull", "--quiet", "alpine:latest"],
            vec!["volume", "rm", "p-data"],
            vec!["stop", "p-server"],
        ]
    );
    assert!(fake.has_image("alpine:latest"));
    assert!(!fake.has_volume("p-data"));
}

#[test]
fn test_delete_missing_volume_is_an_error() {
    let fake = FakeDocker::new();
    let client = DockerCli::with_runner(&fake);

    let err = client.delete_volume("nope").unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::CommandFailed {
            action: "unable to delete volume",
            code: Some(1)
        }
    ));
}

#[test]
fn test_failure_message_excludes_stderr() {
    let fake = FakeDocker::new().fail_on("pull");
    let client = DockerCli::with_runner(&fake);

    let err = client.pull_image(&ImageRef::latest("alpine")).unwrap_err();
    assert_eq!(err.to_string(), "unable to pull image");
}

#[test]
fn test_run_container_outcomes() {
    let fake = FakeDocker::new();
    let client = DockerCli::with_runner(&fake);

    let detached = RunSpec::new(ImageRef::latest("alpine"))
        .detach()
        .name("p-server")
        .remove_on_exit();
    let outcome = client.run_container(&detached).unwrap();
    let id = outcome.id().unwrap().to_string();
    assert_eq!(fake.container("p-server").unwrap().id, id);

    let throwaway = RunSpec::new(ImageRef::latest("alpine"))
        .remove_on_exit()
        .command(["true"]);
    assert_eq!(
        client.run_container(&throwaway).unwrap(),
        RunOutcome::NoIdCaptured
    );

    // Same name twice is rejected by the runtime
    assert!(matches!(
        client.run_container(&detached),
        Err(RuntimeError::CommandFailed {
            action: "unable to run image",
            ..
        })
    ));
}

#[test]
fn test_run_container_multi_line_output() {
    let fake = FakeDocker::new().with_run_output("Unable to find image locally\nabc123\n");
    let client = DockerCli::with_runner(&fake);

    let spec = RunSpec::new(ImageRef::latest("alpine")).detach();
    assert_eq!(
        client.run_container(&spec).unwrap(),
        RunOutcome::NoIdCaptured
    );
}

/// Runner whose subprocess never starts.
struct BrokenRunner {
    attempts: Cell<usize>,
}

impl CommandRunner for BrokenRunner {
    fn run(&self, program: &str, _args: &[String]) -> std::io::Result<CommandOutput> {
        self.attempts.set(self.attempts.get() + 1);
        if program == "which" {
            return Ok(CommandOutput::ok("/opt/docker\n"));
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ))
    }
}

#[test]
fn test_spawn_failure() {
    let runner = BrokenRunner {
        attempts: Cell::new(0),
    };
    let client = DockerCli::with_runner(&runner);

    let err = client.create_volume("v").unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Spawn {
            action: "unable to create volume",
            ..
        }
    ));
    assert_eq!(runner.attempts.get(), 2);
}

#[test]
#[ignore = "Requires Docker"] // Run with: cargo test --test docker_cli -- --ignored
fn test_real_docker_listings() {
    controller_runtime::require_docker!();

    let client = DockerCli::new();
    assert!(client.locate());
    for entry in client.list_containers().unwrap() {
        let (name, container) = entry.unwrap();
        assert!(!name.is_empty());
        assert!(!container.id.is_empty());
    }
    for entry in client.list_volumes().unwrap() {
        entry.unwrap();
    }
}
