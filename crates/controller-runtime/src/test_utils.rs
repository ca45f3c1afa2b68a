/// Test utilities for conditional test execution
use std::process::Command;

use crate::DOCKER_BINARY;

pub fn has_docker() -> bool {
    // Check if docker command exists and the daemon answers
    Command::new(DOCKER_BINARY)
        .arg("info")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Macro to skip tests when requirements aren't met
#[macro_export]
macro_rules! require_docker {
    () => {
        if !$crate::test_utils::has_docker() {
            eprintln!("Test ignored: Docker not available");
            return;
        }
    };
}
